use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter, EnumString};

/// Runtime, in minutes, at or under which an item counts as short.
pub const SHORT_RUNTIME_MIN: u32 = 60;

// Axis: one bipolar taste dimension. Closed set; a bank picks the subset it uses.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Axis {
    Valence,
    Arousal,
    Tempo,
    Darkness,
    Humor,
    ViolenceOk,
    Novelty,
    RuntimeShort,
    NonEnglishOk,
    FamilyFriendly,
    HighQuality,
    PopularContent,
    RecentContent,
    PreferMovies,
    PreferSeries,
    PreferDomestic,
    PreferForeign,
    MatureContent,
    GenreAction,
    GenreComedy,
    GenreDrama,
    GenreCrime,
    GenreScifi,
    GenreHorror,
    GenreThriller,
    GenreRomance,
    GenreFantasy,
    GenreAnimation,
    GenreDocumentary,
}

impl Axis {
    /// What the negative and positive poles of the axis mean.
    pub fn polarity(self) -> &'static str {
        match self {
            Self::Valence => "heavy, sad (-) / warm, joyful (+)",
            Self::Arousal => "calm (-) / energetic (+)",
            Self::Tempo => "slow (-) / fast (+)",
            Self::Darkness => "light (-) / dark, noir (+)",
            Self::Humor => "humor unimportant (-) / humor essential (+)",
            Self::ViolenceOk => "avoids harsh scenes (-) / tolerates violence (+)",
            Self::Novelty => "familiar (-) / experimental (+)",
            Self::RuntimeShort => "long-form ok (-) / prefers <= 60 min (+)",
            Self::NonEnglishOk => "english only (-) / any language (+)",
            Self::FamilyFriendly => "adult audience (-) / for all ages (+)",
            Self::HighQuality => "quality indifferent (-) / acclaimed only (+)",
            Self::PopularContent => "hidden gems (-) / crowd favourites (+)",
            Self::RecentContent => "classics (-) / new releases (+)",
            Self::PreferMovies => "indifferent (-) / feature films (+)",
            Self::PreferSeries => "indifferent (-) / series (+)",
            Self::PreferDomestic => "indifferent (-) / domestic productions (+)",
            Self::PreferForeign => "indifferent (-) / foreign productions (+)",
            Self::MatureContent => "avoids adult-rated (-) / adult-rated welcome (+)",
            Self::GenreAction => "avoids action (-) / seeks action (+)",
            Self::GenreComedy => "avoids comedy (-) / seeks comedy (+)",
            Self::GenreDrama => "avoids drama (-) / seeks drama (+)",
            Self::GenreCrime => "avoids crime (-) / seeks crime, mystery (+)",
            Self::GenreScifi => "avoids sci-fi (-) / seeks sci-fi (+)",
            Self::GenreHorror => "avoids horror (-) / seeks horror (+)",
            Self::GenreThriller => "avoids thrillers (-) / seeks thrillers (+)",
            Self::GenreRomance => "avoids romance (-) / seeks romance (+)",
            Self::GenreFantasy => "avoids fantasy (-) / seeks fantasy (+)",
            Self::GenreAnimation => "avoids animation (-) / seeks animation (+)",
            Self::GenreDocumentary => "avoids documentary (-) / seeks documentary (+)",
        }
    }

    pub fn is_genre(self) -> bool {
        matches!(
            self,
            Self::GenreAction
                | Self::GenreComedy
                | Self::GenreDrama
                | Self::GenreCrime
                | Self::GenreScifi
                | Self::GenreHorror
                | Self::GenreThriller
                | Self::GenreRomance
                | Self::GenreFantasy
                | Self::GenreAnimation
                | Self::GenreDocumentary
        )
    }
}

// AxisBelief: point estimate and uncertainty for one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBelief {
    pub mu: f64,
    pub sigma: f64,
}

impl AxisBelief {
    pub fn neutral(sigma_max: f64) -> Self {
        Self {
            mu: 0.0,
            sigma: sigma_max,
        }
    }

    /// Returns the belief with `mu` in [-1, 1] and `sigma` in the given band.
    #[must_use]
    pub fn clamped(self, sigma_min: f64, sigma_max: f64) -> Self {
        let mu = if self.mu.is_finite() {
            self.mu.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let sigma = if self.sigma.is_finite() {
            self.sigma.clamp(sigma_min, sigma_max)
        } else {
            sigma_max
        };
        Self { mu, sigma }
    }
}

// BeliefState: full per-axis belief map (BTreeMap for stable ordering)
pub type BeliefState = BTreeMap<Axis, AxisBelief>;

// RawAnswer: answer exactly as the caller supplied it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAnswer {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for RawAnswer {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for RawAnswer {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for RawAnswer {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for RawAnswer {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawAnswer {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

// NextQuestion: what the caller shows the user next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextQuestion {
    pub id: String,
    pub text: String,
    pub options: [String; 5],
}

// StepResponse: shared shape of `start()` and `step()`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResponse {
    pub session_id: String,
    pub confidence_pct: f64,
    pub complete: bool,
    pub next_question: Option<NextQuestion>,
    pub belief_preview: Vec<(Axis, f64)>,
}

// CatalogItem: read-only catalog entry supplied by a catalog provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub runtime_min: Option<u32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub votes: Option<u64>,
    #[serde(default)]
    pub mature: bool,
    /// Minimum viewer age, e.g. 16 for a "16+" title.
    #[serde(default)]
    pub age_rating: Option<u8>,
    /// Free-form format label such as "movie", "series" or "фильм".
    #[serde(default)]
    pub content_type: Option<String>,
    /// Production country as the catalog spells it.
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

// Adjustments: bounded additive terms applied on top of similarity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Adjustments {
    pub runtime: f64,
    pub recency: f64,
    pub quality: f64,
    pub popularity: f64,
    pub genre: f64,
    #[serde(default)]
    pub content_type: f64,
    #[serde(default)]
    pub country: f64,
    #[serde(default)]
    pub audience: f64,
}

impl Adjustments {
    pub fn total(&self) -> f64 {
        self.runtime
            + self.recency
            + self.quality
            + self.popularity
            + self.genre
            + self.content_type
            + self.country
            + self.audience
    }
}

// ScoredRecommendation: one ranked catalog item with its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecommendation {
    pub item_id: String,
    pub title: String,
    pub similarity: f64,
    pub adjustments: Adjustments,
    pub score: f64,
    pub explanation: Vec<String>,
}

// Degradation: why a ranking ran without one of its collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum Degradation {
    EmbeddingUnavailable(String),
    CatalogUnavailable(String),
}

// Ranking: result of `CatalogScorer::rank`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ranking {
    pub query: String,
    pub items: Vec<ScoredRecommendation>,
    #[serde(default)]
    pub degraded: Option<Degradation>,
}

impl Ranking {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}
