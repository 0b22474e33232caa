use anyhow::Context;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::types::CatalogItem;

/// Read-only source of catalog snapshots.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Items in catalog order. The order is the scorer's tie-breaker.
    async fn snapshot(&self) -> anyhow::Result<Arc<Vec<CatalogItem>>>;
}

pub struct InMemoryCatalog {
    items: Arc<Vec<CatalogItem>>,
}

impl InMemoryCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }
}

#[async_trait]
impl CatalogProvider for InMemoryCatalog {
    fn name(&self) -> &str {
        "memory"
    }

    async fn snapshot(&self) -> anyhow::Result<Arc<Vec<CatalogItem>>> {
        Ok(Arc::clone(&self.items))
    }
}

/// JSON array of items on disk, loaded once on first use.
pub struct JsonCatalog {
    path: PathBuf,
    cache: OnceCell<Arc<Vec<CatalogItem>>>,
}

impl JsonCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: OnceCell::new(),
        }
    }

    async fn load(&self) -> anyhow::Result<Arc<Vec<CatalogItem>>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read catalog {}", self.path.display()))?;
        let items: Vec<CatalogItem> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse catalog {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), items = items.len(), "catalog loaded");
        Ok(Arc::new(items))
    }
}

#[async_trait]
impl CatalogProvider for JsonCatalog {
    fn name(&self) -> &str {
        "json"
    }

    async fn snapshot(&self) -> anyhow::Result<Arc<Vec<CatalogItem>>> {
        // A failed load is not cached, so the next request retries.
        let items = self.cache.get_or_try_init(|| self.load()).await?;
        Ok(Arc::clone(items))
    }
}
