use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

use super::types::Axis;

/// Descriptive terms an axis contributes once its belief crosses a threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisTerms {
    /// Short human label, used in explanation tags.
    pub label: String,
    /// Emitted when `mu` is above the positive threshold.
    #[serde(default)]
    pub positive: Vec<String>,
    /// Emitted when `mu` is below the negative threshold. Empty means the
    /// axis has no negative-direction vocabulary.
    #[serde(default)]
    pub negative: Vec<String>,
    /// Lowercase fragments matched against item genre tags, or against the
    /// content type and country for the format and origin axes.
    #[serde(default)]
    pub markers: Vec<String>,
}

impl AxisTerms {
    fn new(label: &str, positive: &[&str], negative: &[&str], markers: &[&str]) -> Self {
        let owned = |terms: &[&str]| terms.iter().map(|t| (*t).to_string()).collect();
        Self {
            label: label.to_string(),
            positive: owned(positive),
            negative: owned(negative),
            markers: owned(markers),
        }
    }

    /// True when `value` contains one of the markers, ignoring case.
    pub fn matches(&self, value: &str) -> bool {
        let value = value.to_lowercase();
        self.markers.iter().any(|marker| value.contains(marker.as_str()))
    }

    /// True when any of the item's genre tags contains one of the markers.
    pub fn matches_genres(&self, genres: &[String]) -> bool {
        genres.iter().any(|genre| self.matches(genre))
    }

    pub fn default_for(axis: Axis) -> Self {
        match axis {
            Axis::Valence => Self::new(
                "uplifting",
                &["uplifting", "warm", "feel-good"],
                &["melancholic", "bittersweet", "heavy"],
                &[],
            ),
            Axis::Arousal => Self::new(
                "energetic",
                &["energetic", "dynamic", "intense"],
                &["calm", "relaxing", "gentle pace"],
                &[],
            ),
            Axis::Tempo => Self::new(
                "fast-paced",
                &["fast-paced", "brisk"],
                &["slow-burn", "atmospheric", "contemplative"],
                &[],
            ),
            Axis::Darkness => Self::new(
                "dark",
                &["dark", "gritty", "serious"],
                &["light", "positive", "kind"],
                &[],
            ),
            Axis::Humor => Self::new("funny", &["funny", "comedy", "humor"], &[], &[]),
            Axis::ViolenceOk => Self::new(
                "intense",
                &["violent", "brutal", "action-packed"],
                &["gentle", "non-violent"],
                &[],
            ),
            Axis::Novelty => Self::new(
                "unusual",
                &["unusual", "experimental", "fresh"],
                &["familiar", "conventional"],
                &[],
            ),
            Axis::RuntimeShort => {
                Self::new("short runtime", &["short", "compact"], &["epic", "long"], &[])
            }
            Axis::NonEnglishOk => Self::new(
                "international",
                &["international", "foreign-language", "world cinema"],
                &[],
                &[],
            ),
            Axis::FamilyFriendly => {
                Self::new("family friendly", &["family", "for all ages"], &["adult"], &[])
            }
            Axis::HighQuality => {
                Self::new("highly rated", &["acclaimed", "well-crafted"], &[], &[])
            }
            Axis::PopularContent => Self::new(
                "popular",
                &["popular", "blockbuster"],
                &["hidden gem", "indie"],
                &[],
            ),
            Axis::RecentContent => Self::new(
                "recent release",
                &["new", "modern", "recent"],
                &["classic", "timeless"],
                &[],
            ),
            Axis::PreferMovies => Self::new(
                "movie",
                &["feature film", "movie"],
                &[],
                &["movie", "film", "фильм", "кино"],
            ),
            Axis::PreferSeries => Self::new(
                "series",
                &["series", "episodic"],
                &[],
                &["series", "tv show", "сериал"],
            ),
            Axis::PreferDomestic => Self::new(
                "domestic",
                &["domestic", "local production"],
                &[],
                &["russia", "ussr", "россия", "рф", "ссср", "советск"],
            ),
            // Foreign means "has a country and it is not domestic".
            Axis::PreferForeign => {
                Self::new("foreign", &["foreign", "international production"], &[], &[])
            }
            Axis::MatureContent => Self::new("for adults", &["mature", "adult"], &[], &[]),
            Axis::GenreAction => Self::new(
                "action",
                &["action", "adventure", "stunts"],
                &[],
                &["action", "adventure", "боевик", "экшн", "приключ"],
            ),
            Axis::GenreComedy => Self::new(
                "comedy",
                &["comedy", "funny", "humorous"],
                &[],
                &["comedy", "комедия"],
            ),
            Axis::GenreDrama => Self::new(
                "drama",
                &["drama", "emotional", "serious"],
                &[],
                &["drama", "драма"],
            ),
            Axis::GenreCrime => Self::new(
                "crime",
                &["crime", "detective", "investigation"],
                &[],
                &["crime", "mystery", "detective", "криминал", "детектив"],
            ),
            Axis::GenreScifi => Self::new(
                "sci-fi",
                &["science fiction", "sci-fi", "future"],
                &[],
                &["sci-fi", "science fiction", "фантастика"],
            ),
            Axis::GenreHorror => Self::new(
                "horror",
                &["horror", "scary", "supernatural"],
                &[],
                &["horror", "ужас"],
            ),
            Axis::GenreThriller => Self::new(
                "thriller",
                &["thriller", "tension", "suspense"],
                &[],
                &["thriller", "триллер"],
            ),
            Axis::GenreRomance => Self::new(
                "romance",
                &["romance", "love", "relationships"],
                &[],
                &["romance", "romantic", "романтик", "мелодрама"],
            ),
            Axis::GenreFantasy => Self::new(
                "fantasy",
                &["fantasy", "magic", "fairy tale"],
                &[],
                &["fantasy", "фэнтези", "сказка"],
            ),
            Axis::GenreAnimation => Self::new(
                "animation",
                &["animation", "animated", "cartoon"],
                &[],
                &["animation", "анимац", "мультфильм"],
            ),
            Axis::GenreDocumentary => Self::new(
                "documentary",
                &["documentary", "true story"],
                &[],
                &["documentary", "документальн"],
            ),
        }
    }
}

/// Axis → terms table consulted by the textualizer and the scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary {
    terms: BTreeMap<Axis, AxisTerms>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            terms: Axis::iter()
                .map(|axis| (axis, AxisTerms::default_for(axis)))
                .collect(),
        }
    }
}

impl Vocabulary {
    pub fn get(&self, axis: Axis) -> Option<&AxisTerms> {
        self.terms.get(&axis)
    }

    /// Replaces the entries for the axes present in `overrides`.
    #[must_use]
    pub fn with_overrides(mut self, overrides: BTreeMap<Axis, AxisTerms>) -> Self {
        self.terms.extend(overrides);
        self
    }
}
