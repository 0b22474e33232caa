use serde::{Deserialize, Serialize};

/// Question selection, belief update and stopping parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElicitationConfig {
    /// `"compact"`, `"extended"` or a path to a TOML question bank
    #[serde(default = "default_bank")]
    pub bank: String,
    #[serde(default = "default_q_max")]
    pub q_max: usize,
    #[serde(default = "default_sigma_min")]
    pub sigma_min: f64,
    #[serde(default = "default_sigma_max")]
    pub sigma_max: f64,
    #[serde(default = "default_base_lr")]
    pub base_lr: f64,
    #[serde(default = "default_entropy_target")]
    pub entropy_target: f64,
    #[serde(default = "default_coverage_lambda")]
    pub coverage_lambda: f64,
    #[serde(default = "default_preview_len")]
    pub preview_len: usize,
    /// Resolved from the top-level `locale` at load time
    #[serde(skip, default = "default_locale")]
    pub locale: String,
}

fn default_bank() -> String {
    "extended".into()
}
fn default_q_max() -> usize {
    16
}
fn default_sigma_min() -> f64 {
    0.15
}
fn default_sigma_max() -> f64 {
    1.0
}
fn default_base_lr() -> f64 {
    0.6
}
fn default_entropy_target() -> f64 {
    0.35
}
fn default_coverage_lambda() -> f64 {
    0.10
}
fn default_preview_len() -> usize {
    6
}
fn default_locale() -> String {
    "en".into()
}

impl Default for ElicitationConfig {
    fn default() -> Self {
        Self {
            bank: default_bank(),
            q_max: default_q_max(),
            sigma_min: default_sigma_min(),
            sigma_max: default_sigma_max(),
            base_lr: default_base_lr(),
            entropy_target: default_entropy_target(),
            coverage_lambda: default_coverage_lambda(),
            preview_len: default_preview_len(),
            locale: default_locale(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_embed_timeout_ms")]
    pub embed_timeout_ms: u64,
    #[serde(default = "default_catalog_timeout_ms")]
    pub catalog_timeout_ms: u64,
    /// JSON catalog used when no `--catalog` is given
    #[serde(default)]
    pub catalog_path: Option<String>,
    /// Candidate count above which items are scored in parallel
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_top_k() -> usize {
    6
}
fn default_embed_timeout_ms() -> u64 {
    5_000
}
fn default_catalog_timeout_ms() -> u64 {
    5_000
}
fn default_parallel_threshold() -> usize {
    1024
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            embed_timeout_ms: default_embed_timeout_ms(),
            catalog_timeout_ms: default_catalog_timeout_ms(),
            catalog_path: None,
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "lexical" | "openai" | "custom:<https-url>" | "none"
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dims")]
    pub dimensions: usize,
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_embedding_provider() -> String {
    "lexical".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_embedding_dims() -> usize {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimensions: default_embedding_dims(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Persist sessions to SQLite so interrupted quizzes can be resumed
    #[serde(default = "default_true")]
    pub persist: bool,
    /// Relative paths resolve against the data directory
    #[serde(default = "default_db_file")]
    pub db_file: String,
}

fn default_true() -> bool {
    true
}
fn default_db_file() -> String {
    "sessions.db".into()
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            persist: default_true(),
            db_file: default_db_file(),
        }
    }
}
