use async_trait::async_trait;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use crate::config::EmbeddingConfig;

/// Converts text to L2-normalized vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Embedding dimensions
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts into vectors
    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut results = self.embed(&[text]).await?;
        results
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding result"))
    }
}

/// Scales `v` to unit length in place. Zero vectors are left as they are.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

// ── Lexical provider (hashing fallback) ──────────────────────

/// Signed feature hashing of word unigrams and bigrams.
///
/// Deterministic for a given dimension, so catalog vectors built with the
/// same settings stay comparable across runs.
pub struct LexicalEmbedding {
    dims: usize,
}

impl LexicalEmbedding {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    fn fnv1a64(bytes: &[u8]) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for &b in bytes {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        hash
    }

    fn tokens(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect()
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; self.dims];
        let tokens = Self::tokens(text);
        let bigrams = tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1]));
        for feature in tokens.iter().cloned().chain(bigrams) {
            let hash = Self::fnv1a64(feature.as_bytes());
            let bucket = (hash % self.dims as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        l2_normalize(&mut v);
        v
    }
}

#[async_trait]
impl EmbeddingProvider for LexicalEmbedding {
    fn name(&self) -> &str {
        "lexical"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }
}

// ── Noop provider (attribute-only ranking) ───────────────────

pub struct NoopEmbedding;

#[async_trait]
impl EmbeddingProvider for NoopEmbedding {
    fn name(&self) -> &str {
        "none"
    }

    fn dimensions(&self) -> usize {
        0
    }

    async fn embed(&self, _texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(Vec::new())
    }
}

// ── OpenAI-compatible embedding provider ─────────────────────

pub struct OpenAiEmbedding {
    client: reqwest::Client,
    cached_embeddings_url: String,
    cached_auth_header: String,
    model: String,
    dims: usize,
}

#[derive(Copy, Clone, Debug)]
struct CustomBaseUrlPolicy {
    allow_http: bool,
}

fn is_ssrf_blocked_ipv4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_ssrf_blocked_ipv6(ip: Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() {
        return true;
    }

    let seg0 = ip.segments()[0];
    let is_link_local = (seg0 & 0xffc0) == 0xfe80;
    let is_unique_local = (seg0 & 0xfe00) == 0xfc00;

    is_link_local || is_unique_local
}

fn is_ssrf_blocked_host(host: &str) -> bool {
    let host = host.trim_end_matches('.');
    let host = host.trim_start_matches('[').trim_end_matches(']');

    if host.eq_ignore_ascii_case("metadata.google.internal") || host.eq_ignore_ascii_case("localhost")
    {
        return true;
    }

    if let Ok(ip) = host.to_ascii_lowercase().parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(v4) => is_ssrf_blocked_ipv4(v4),
            IpAddr::V6(v6) => is_ssrf_blocked_ipv6(v6),
        };
    }

    false
}

fn validate_custom_base_url(raw: &str, policy: CustomBaseUrlPolicy) -> anyhow::Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        anyhow::bail!("custom embedding base URL is empty");
    }

    let url = reqwest::Url::parse(raw)
        .map_err(|_| anyhow::anyhow!("invalid custom embedding base URL"))?;

    match url.scheme() {
        "https" => {}
        "http" if policy.allow_http => {}
        "http" => anyhow::bail!("custom embedding base URL must use https"),
        _ => anyhow::bail!("custom embedding base URL must use http(s)"),
    }

    if !url.username().is_empty() || url.password().is_some() {
        anyhow::bail!("custom embedding base URL must not include userinfo");
    }

    if url.query().is_some() || url.fragment().is_some() {
        anyhow::bail!("custom embedding base URL must not include query or fragment");
    }

    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("custom embedding base URL missing host"))?;

    if is_ssrf_blocked_host(host) {
        anyhow::bail!("custom embedding base URL host is blocked");
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

impl OpenAiEmbedding {
    pub fn new(base_url: &str, api_key: &str, model: &str, dims: usize) -> Self {
        let base = base_url.trim_end_matches('/');
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            cached_embeddings_url: format!("{base}/v1/embeddings"),
            cached_auth_header: format!("Bearer {api_key}"),
            model: model.to_string(),
            dims,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    fn name(&self) -> &str {
        "openai"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
            "dimensions": self.dims,
        });

        let resp = self
            .client
            .post(&self.cached_embeddings_url)
            .header("Authorization", &self.cached_auth_header)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Embedding HTTP request failed: {e}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("Embedding API error {status}");
        }

        let json: serde_json::Value = resp.json().await?;
        let data = json
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| anyhow::anyhow!("Invalid embedding response: missing 'data'"))?;

        let mut embeddings = Vec::with_capacity(data.len());
        for item in data {
            let embedding = item
                .get("embedding")
                .and_then(|e| e.as_array())
                .ok_or_else(|| anyhow::anyhow!("Invalid embedding item"))?;

            #[allow(clippy::cast_possible_truncation)]
            let mut vec: Vec<f32> = embedding
                .iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect();

            if vec.len() != self.dims {
                anyhow::bail!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    self.dims,
                    vec.len()
                );
            }
            l2_normalize(&mut vec);
            embeddings.push(vec);
        }

        Ok(embeddings)
    }
}

// ── Factory ──────────────────────────────────────────────────

pub fn create_embedding_provider(config: &EmbeddingConfig) -> Box<dyn EmbeddingProvider> {
    let dims = config.dimensions;
    match config.provider.as_str() {
        "lexical" => Box::new(LexicalEmbedding::new(dims)),
        "openai" => {
            let key = config.api_key.as_deref().unwrap_or("");
            Box::new(OpenAiEmbedding::new(
                "https://api.openai.com",
                key,
                &config.model,
                dims,
            ))
        }
        name if name.starts_with("custom:") => {
            let base_url = name.strip_prefix("custom:").unwrap_or("");
            let key = config.api_key.as_deref().unwrap_or("");
            let policy = CustomBaseUrlPolicy {
                allow_http: cfg!(test),
            };

            match validate_custom_base_url(base_url, policy) {
                Ok(valid_base_url) => Box::new(OpenAiEmbedding::new(
                    &valid_base_url,
                    key,
                    &config.model,
                    dims,
                )),
                Err(error) => {
                    tracing::warn!("rejected custom embedding endpoint: {error}");
                    Box::new(NoopEmbedding)
                }
            }
        }
        "none" => Box::new(NoopEmbedding),
        other => {
            tracing::warn!(provider = other, "unknown embedding provider, similarity disabled");
            Box::new(NoopEmbedding)
        }
    }
}
