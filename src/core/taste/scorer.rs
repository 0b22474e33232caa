//! Catalog ranking: embedding similarity between the textualized profile and
//! each item, plus small bounded attribute adjustments.
//!
//! The scorer never fails outright. A missing embedding backend degrades to
//! attribute-only ranking, a missing catalog to an empty ranking; both are
//! reported through [`Ranking::degraded`].

use rayon::prelude::*;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use super::catalog::CatalogProvider;
use super::embedding::EmbeddingProvider;
use super::space::TasteSchema;
use super::textualizer::{NEGATIVE_THRESHOLD, POSITIVE_THRESHOLD, ProfileTextualizer};
use super::types::{
    Adjustments, Axis, BeliefState, CatalogItem, Degradation, Ranking, SHORT_RUNTIME_MIN,
    ScoredRecommendation,
};
use super::vocabulary::AxisTerms;
use crate::config::ScoringConfig;

const GENRE_BONUS: f64 = 0.1;
const GENRE_BONUS_CAP: f64 = 0.2;
const CONTENT_TYPE_BONUS: f64 = 0.1;
const DOMESTIC_BONUS: f64 = 0.15;
const FOREIGN_BONUS: f64 = 0.1;
const AUDIENCE_BONUS: f64 = 0.1;
const ADULT_PENALTY: f64 = 0.2;
const FAMILY_MAX_AGE: u8 = 12;
const MATURE_MIN_AGE: u8 = 16;
const ADULT_MIN_AGE: u8 = 18;
const HIGHLY_RATED: f64 = 7.0;
const MAX_EXPLANATION_TAGS: usize = 3;
const DEFAULT_EXPLANATION: &str = "general taste match";

pub struct CatalogScorer {
    schema: Arc<TasteSchema>,
    catalog: Arc<dyn CatalogProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: ScoringConfig,
}

impl CatalogScorer {
    pub fn new(
        schema: Arc<TasteSchema>,
        catalog: Arc<dyn CatalogProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: ScoringConfig,
    ) -> Self {
        Self {
            schema,
            catalog,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Ranks the catalog against `beliefs` and returns at most `top_k` items.
    pub async fn rank(&self, beliefs: &BeliefState, top_k: usize) -> Ranking {
        let query = ProfileTextualizer::new(&self.schema).textualize(beliefs).text();

        let catalog_timeout = Duration::from_millis(self.config.catalog_timeout_ms);
        let items = match tokio::time::timeout(catalog_timeout, self.catalog.snapshot()).await {
            Ok(Ok(items)) => items,
            Ok(Err(error)) => {
                tracing::warn!(catalog = self.catalog.name(), "catalog unavailable: {error:#}");
                return Self::unavailable(query, format!("{error:#}"));
            }
            Err(_) => {
                tracing::warn!(catalog = self.catalog.name(), "catalog snapshot timed out");
                return Self::unavailable(query, "timed out".into());
            }
        };

        let embed_timeout = Duration::from_millis(self.config.embed_timeout_ms);
        let (query_vec, degraded) =
            match tokio::time::timeout(embed_timeout, self.embedder.embed_one(&query)).await {
                Ok(Ok(vec)) if !vec.is_empty() => (Some(vec), None),
                Ok(Ok(_)) => (None, Some("empty query embedding".to_string())),
                Ok(Err(error)) => (None, Some(format!("{error:#}"))),
                Err(_) => (None, Some("timed out".to_string())),
            };
        if let Some(reason) = &degraded {
            tracing::warn!(
                provider = self.embedder.name(),
                reason = %reason,
                "embedding unavailable, ranking by attributes only"
            );
        }

        let candidates = items.len();
        let mut ranked = if candidates > self.config.parallel_threshold {
            // rayon work stays off the runtime workers.
            let schema = Arc::clone(&self.schema);
            let config = self.config.clone();
            let beliefs = beliefs.clone();
            let scored = tokio::task::spawn_blocking(move || {
                score_catalog(&schema, &config, &beliefs, &items, query_vec.as_deref())
            })
            .await;
            match scored {
                Ok(ranked) => ranked,
                Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
                Err(error) => {
                    tracing::warn!("scoring task cancelled: {error}");
                    return Self::unavailable(query, format!("scoring task failed: {error}"));
                }
            }
        } else {
            score_catalog(&self.schema, &self.config, beliefs, &items, query_vec.as_deref())
        };
        ranked.truncate(top_k);
        tracing::debug!(
            candidates,
            returned = ranked.len(),
            query = %query,
            "catalog ranked"
        );

        Ranking {
            query,
            items: ranked,
            degraded: degraded.map(Degradation::EmbeddingUnavailable),
        }
    }

    fn unavailable(query: String, reason: String) -> Ranking {
        Ranking {
            query,
            items: Vec::new(),
            degraded: Some(Degradation::CatalogUnavailable(reason)),
        }
    }

    /// Scores and sorts every eligible item. `query` of `None` means
    /// similarity is unavailable and items rank on adjustments alone.
    pub fn score_items(
        &self,
        beliefs: &BeliefState,
        items: &[CatalogItem],
        query: Option<&[f32]>,
    ) -> Vec<ScoredRecommendation> {
        score_catalog(&self.schema, &self.config, beliefs, items, query)
    }
}

fn score_catalog(
    schema: &TasteSchema,
    config: &ScoringConfig,
    beliefs: &BeliefState,
    items: &[CatalogItem],
    query: Option<&[f32]>,
) -> Vec<ScoredRecommendation> {
    let prefs = Preferences::from_beliefs(schema, beliefs);

    let mut skipped = 0usize;
    let candidates: Vec<(usize, &CatalogItem)> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| !(prefs.exclude_mature && item.mature))
        .filter(|(_, item)| match query {
            None => true,
            Some(q) => {
                let usable = item.embedding.as_ref().is_some_and(|e| e.len() == q.len());
                if !usable {
                    skipped += 1;
                }
                usable
            }
        })
        .collect();
    if skipped > 0 {
        tracing::warn!(skipped, "skipped items with missing or mismatched embeddings");
    }

    let context = CandidateContext::from_items(candidates.iter().map(|(_, item)| *item));
    let score_one = |&(index, item): &(usize, &CatalogItem)| {
        (index, score_item(item, query, &prefs, &context))
    };

    let mut scored: Vec<(usize, ScoredRecommendation)> =
        if candidates.len() > config.parallel_threshold {
            candidates.par_iter().map(score_one).collect()
        } else {
            candidates.iter().map(score_one).collect()
        };

    scored.sort_by(|a, b| match b.1.score.total_cmp(&a.1.score) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });
    scored.into_iter().map(|(_, rec)| rec).collect()
}

/// Belief values the adjustments and explanations depend on, resolved once
/// per ranking. Axes outside the schema's space read as neutral.
struct Preferences {
    exclude_mature: bool,
    runtime_short: f64,
    recent: f64,
    quality: f64,
    popular: f64,
    family: f64,
    mature_content: f64,
    violence: f64,
    movies: f64,
    series: f64,
    domestic: f64,
    foreign: f64,
    genres: Vec<AxisTerms>,
    movie_terms: AxisTerms,
    series_terms: AxisTerms,
    domestic_terms: AxisTerms,
    foreign_label: String,
    mature_label: String,
}

impl Preferences {
    fn from_beliefs(schema: &TasteSchema, beliefs: &BeliefState) -> Self {
        let mu = |axis: Axis| {
            if schema.space().contains(axis) {
                beliefs.get(&axis).map_or(0.0, |b| b.mu)
            } else {
                0.0
            }
        };
        let genres = schema
            .space()
            .axes()
            .iter()
            .filter(|axis| axis.is_genre() && mu(**axis) > POSITIVE_THRESHOLD)
            .map(|axis| schema.terms(*axis))
            .collect();

        Self {
            exclude_mature: mu(Axis::ViolenceOk) < NEGATIVE_THRESHOLD
                || mu(Axis::FamilyFriendly) > POSITIVE_THRESHOLD,
            runtime_short: mu(Axis::RuntimeShort),
            recent: mu(Axis::RecentContent),
            quality: mu(Axis::HighQuality),
            popular: mu(Axis::PopularContent),
            family: mu(Axis::FamilyFriendly),
            mature_content: mu(Axis::MatureContent),
            violence: mu(Axis::ViolenceOk),
            movies: mu(Axis::PreferMovies),
            series: mu(Axis::PreferSeries),
            domestic: mu(Axis::PreferDomestic),
            foreign: mu(Axis::PreferForeign),
            genres,
            movie_terms: schema.terms(Axis::PreferMovies),
            series_terms: schema.terms(Axis::PreferSeries),
            domestic_terms: schema.terms(Axis::PreferDomestic),
            foreign_label: schema.terms(Axis::PreferForeign).label,
            mature_label: schema.terms(Axis::MatureContent).label,
        }
    }

    /// Which preferred format the item is, if any. Movies win when both
    /// formats are wanted.
    fn content_type_match(&self, item: &CatalogItem) -> Option<&str> {
        let kind = item.content_type.as_deref()?;
        if self.movies > POSITIVE_THRESHOLD && self.movie_terms.matches(kind) {
            Some(self.movie_terms.label.as_str())
        } else if self.series > POSITIVE_THRESHOLD && self.series_terms.matches(kind) {
            Some(self.series_terms.label.as_str())
        } else {
            None
        }
    }

    /// Preferred origin the item satisfies, with its bonus.
    fn country_match(&self, item: &CatalogItem) -> Option<(&str, f64)> {
        let country = item.country.as_deref()?;
        let domestic = self.domestic_terms.matches(country);
        if self.domestic > POSITIVE_THRESHOLD && domestic {
            Some((self.domestic_terms.label.as_str(), DOMESTIC_BONUS))
        } else if self.foreign > POSITIVE_THRESHOLD && !domestic {
            Some((self.foreign_label.as_str(), FOREIGN_BONUS))
        } else {
            None
        }
    }

    fn is_family_fit(&self, item: &CatalogItem) -> bool {
        self.family > POSITIVE_THRESHOLD
            && !item.mature
            && item.age_rating.is_none_or(|age| age <= FAMILY_MAX_AGE)
    }

    fn is_mature_fit(&self, item: &CatalogItem) -> bool {
        self.mature_content > POSITIVE_THRESHOLD
            && item.age_rating.is_some_and(|age| age >= MATURE_MIN_AGE)
    }
}

/// Ranges over the candidate set that relative adjustments are scaled by.
struct CandidateContext {
    year_range: Option<(i32, i32)>,
    max_votes: u64,
}

impl CandidateContext {
    fn from_items<'a>(items: impl Iterator<Item = &'a CatalogItem>) -> Self {
        let mut year_range: Option<(i32, i32)> = None;
        let mut max_votes = 0;
        for item in items {
            if let Some(year) = item.year {
                year_range = Some(match year_range {
                    None => (year, year),
                    Some((lo, hi)) => (lo.min(year), hi.max(year)),
                });
            }
            max_votes = max_votes.max(item.votes.unwrap_or(0));
        }
        Self {
            year_range,
            max_votes,
        }
    }

    /// Item's position in the year range, 0 for the oldest and 1 for the
    /// newest. A single-year catalog sits in the middle.
    fn year_position(&self, year: i32) -> f64 {
        match self.year_range {
            Some((lo, hi)) if hi > lo => f64::from(year - lo) / f64::from(hi - lo),
            _ => 0.5,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn vote_share(&self, votes: u64) -> f64 {
        if self.max_votes == 0 {
            return 0.0;
        }
        (votes as f64).ln_1p() / (self.max_votes as f64).ln_1p()
    }
}

fn score_item(
    item: &CatalogItem,
    query: Option<&[f32]>,
    prefs: &Preferences,
    context: &CandidateContext,
) -> ScoredRecommendation {
    let similarity = match (query, item.embedding.as_deref()) {
        (Some(q), Some(e)) => f64::from(q.iter().zip(e).map(|(a, b)| a * b).sum::<f32>()),
        _ => 0.0,
    };
    let adjustments = adjustments_for(item, prefs, context);
    ScoredRecommendation {
        item_id: item.id.clone(),
        title: item.title.clone(),
        similarity,
        adjustments,
        score: similarity + adjustments.total(),
        explanation: explain(item, prefs, context),
    }
}

fn adjustments_for(item: &CatalogItem, prefs: &Preferences, context: &CandidateContext) -> Adjustments {
    let mut adj = Adjustments::default();

    if prefs.runtime_short > POSITIVE_THRESHOLD {
        if let Some(runtime) = item.runtime_min {
            adj.runtime = if runtime <= SHORT_RUNTIME_MIN {
                0.1 * prefs.runtime_short
            } else {
                -0.05 * prefs.runtime_short
            };
        }
    }

    if prefs.recent.abs() > POSITIVE_THRESHOLD {
        if let Some(year) = item.year {
            adj.recency = 0.1 * prefs.recent * (2.0 * context.year_position(year) - 1.0);
        }
    }

    if prefs.quality > POSITIVE_THRESHOLD {
        if let Some(rating) = item.rating {
            adj.quality = 0.1 * prefs.quality * rating.clamp(0.0, 10.0) / 10.0;
        }
    }

    if let Some(votes) = item.votes {
        adj.popularity = 0.05 * context.vote_share(votes) * (1.0 + prefs.popular) / 2.0;
    }

    let matches = prefs
        .genres
        .iter()
        .filter(|terms| terms.matches_genres(&item.genres))
        .count();
    #[allow(clippy::cast_precision_loss)]
    let genre = GENRE_BONUS * matches as f64;
    adj.genre = genre.min(GENRE_BONUS_CAP);

    if prefs.content_type_match(item).is_some() {
        adj.content_type = CONTENT_TYPE_BONUS;
    }

    if let Some((_, bonus)) = prefs.country_match(item) {
        adj.country = bonus;
    }

    if let Some(age) = item.age_rating {
        let family_fit = prefs.family > POSITIVE_THRESHOLD && age <= FAMILY_MAX_AGE;
        adj.audience = if family_fit || prefs.is_mature_fit(item) {
            AUDIENCE_BONUS
        } else if prefs.violence < NEGATIVE_THRESHOLD && age >= ADULT_MIN_AGE {
            -ADULT_PENALTY
        } else {
            0.0
        };
    }

    adj
}

/// Tags naming the preferences this particular item satisfies.
fn explain(item: &CatalogItem, prefs: &Preferences, context: &CandidateContext) -> Vec<String> {
    let mut tags = Vec::new();

    let genres: Vec<&str> = prefs
        .genres
        .iter()
        .filter(|terms| terms.matches_genres(&item.genres))
        .map(|terms| terms.label.as_str())
        .collect();
    if !genres.is_empty() {
        tags.push(format!("genre: {}", genres.join(", ")));
    }

    if let Some(label) = prefs.content_type_match(item) {
        tags.push(label.to_string());
    }

    if let Some((label, _)) = prefs.country_match(item) {
        tags.push(label.to_string());
    }

    if prefs.runtime_short > POSITIVE_THRESHOLD
        && item.runtime_min.is_some_and(|r| r <= SHORT_RUNTIME_MIN)
    {
        tags.push("short runtime".to_string());
    }

    if let Some(year) = item.year {
        let position = context.year_position(year);
        if prefs.recent > POSITIVE_THRESHOLD && position > 0.5 {
            tags.push("recent release".to_string());
        } else if prefs.recent < NEGATIVE_THRESHOLD && position < 0.5 {
            tags.push("classic".to_string());
        }
    }

    if prefs.quality > POSITIVE_THRESHOLD && item.rating.is_some_and(|r| r >= HIGHLY_RATED) {
        tags.push("highly rated".to_string());
    }

    if prefs.is_family_fit(item) {
        tags.push("family friendly".to_string());
    } else if prefs.is_mature_fit(item) {
        tags.push(prefs.mature_label.clone());
    }

    if prefs.popular > POSITIVE_THRESHOLD
        && item.votes.is_some_and(|v| context.vote_share(v) >= 0.5)
    {
        tags.push("popular".to_string());
    }

    tags.truncate(MAX_EXPLANATION_TAGS);
    if tags.is_empty() {
        tags.push(DEFAULT_EXPLANATION.to_string());
    }
    tags
}
