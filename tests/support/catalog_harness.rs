#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tastekit::config::ScoringConfig;
use tastekit::core::taste::embedding::LexicalEmbedding;
use tastekit::core::taste::{
    Axis, AxisBelief, BeliefState, CatalogItem, CatalogProvider, CatalogScorer, EmbeddingProvider,
    InMemoryCatalog, TasteSchema, banks,
};

pub const DIMS: usize = 256;

pub fn extended() -> Arc<TasteSchema> {
    Arc::new(banks::extended().unwrap())
}

/// Neutral extended-bank beliefs with the given `mu` overrides.
pub fn beliefs(values: &[(Axis, f64)]) -> BeliefState {
    let mut beliefs = extended().space().neutral_beliefs(1.0);
    for (axis, mu) in values {
        beliefs.insert(*axis, AxisBelief { mu: *mu, sigma: 0.4 });
    }
    beliefs
}

pub fn item(id: &str, title: &str, genres: &[&str], description: &str) -> CatalogItem {
    CatalogItem {
        id: id.into(),
        title: title.into(),
        genres: genres.iter().map(|g| (*g).to_string()).collect(),
        year: Some(2010),
        runtime_min: Some(110),
        rating: Some(7.0),
        votes: Some(10_000),
        mature: false,
        age_rating: None,
        content_type: None,
        country: None,
        description: Some(description.into()),
        embedding: None,
    }
}

/// Fills every item's embedding from its title, genres and description with
/// the lexical provider, the way a catalog build step would.
pub fn embed_catalog(items: &mut [CatalogItem]) {
    let lexical = LexicalEmbedding::new(DIMS);
    for item in items.iter_mut() {
        let text = format!(
            "{} {} {}",
            item.title,
            item.genres.join(" "),
            item.description.as_deref().unwrap_or("")
        );
        item.embedding = Some(lexical.vectorize(&text));
    }
}

pub fn sample_catalog() -> Vec<CatalogItem> {
    let mut items = vec![
        item(
            "heat",
            "Heat",
            &["crime", "thriller"],
            "dark gritty crime story about a detective investigation serious",
        ),
        item(
            "paddington",
            "Paddington",
            &["comedy", "family"],
            "light positive kind funny comedy for all ages",
        ),
        item(
            "arrival",
            "Arrival",
            &["sci-fi", "drama"],
            "science fiction future contemplative atmospheric slow-burn",
        ),
        item(
            "notebook",
            "The Notebook",
            &["romance", "drama"],
            "romance love relationships emotional",
        ),
    ];
    items[0].mature = true;
    embed_catalog(&mut items);
    items
}

pub fn scorer_with(
    catalog: Arc<dyn CatalogProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: ScoringConfig,
) -> CatalogScorer {
    CatalogScorer::new(extended(), catalog, embedder, config)
}

pub fn lexical_scorer(items: Vec<CatalogItem>) -> CatalogScorer {
    scorer_with(
        Arc::new(InMemoryCatalog::new(items)),
        Arc::new(LexicalEmbedding::new(DIMS)),
        ScoringConfig::default(),
    )
}

/// Catalog that always fails and counts how often it was asked.
#[derive(Default)]
pub struct BrokenCatalog {
    pub calls: AtomicUsize,
}

#[async_trait]
impl CatalogProvider for BrokenCatalog {
    fn name(&self) -> &str {
        "broken"
    }

    async fn snapshot(&self) -> anyhow::Result<Arc<Vec<CatalogItem>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("catalog backend offline")
    }
}

/// Catalog that answers only after `delay`.
pub struct SlowCatalog {
    pub delay: Duration,
    pub items: Arc<Vec<CatalogItem>>,
}

#[async_trait]
impl CatalogProvider for SlowCatalog {
    fn name(&self) -> &str {
        "slow"
    }

    async fn snapshot(&self) -> anyhow::Result<Arc<Vec<CatalogItem>>> {
        tokio::time::sleep(self.delay).await;
        Ok(Arc::clone(&self.items))
    }
}

/// Embedding backend that never answers in time.
pub struct StalledEmbedding;

#[async_trait]
impl EmbeddingProvider for StalledEmbedding {
    fn name(&self) -> &str {
        "stalled"
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    async fn embed(&self, _texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}
