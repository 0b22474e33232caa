use super::super::{
    ElicitationConfig, EmbeddingConfig, ObservabilityConfig, ScoringConfig, SessionsConfig,
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory - computed from home, not serialized
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default)]
    pub elicitation: ElicitationConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub sessions: SessionsConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_locale() -> String {
    "en".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            config_path: PathBuf::new(),
            locale: default_locale(),
            elicitation: ElicitationConfig::default(),
            scoring: ScoringConfig::default(),
            embedding: EmbeddingConfig::default(),
            sessions: SessionsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.elicitation;
        if e.sigma_min.is_nan() || e.sigma_min <= 0.0 {
            return Err(ConfigError::Validation(
                "elicitation.sigma_min must be > 0".into(),
            ));
        }
        if e.sigma_min > e.sigma_max {
            return Err(ConfigError::Validation(
                "elicitation.sigma_min must not exceed elicitation.sigma_max".into(),
            ));
        }
        if e.q_max < 1 {
            return Err(ConfigError::Validation(
                "elicitation.q_max must be >= 1".into(),
            ));
        }
        if e.base_lr.is_nan() || e.base_lr <= 0.0 {
            return Err(ConfigError::Validation(
                "elicitation.base_lr must be > 0".into(),
            ));
        }
        if self.scoring.top_k < 1 {
            return Err(ConfigError::Validation("scoring.top_k must be >= 1".into()));
        }
        Ok(())
    }

    /// Session database location; relative `db_file` values live under `data_dir`.
    pub fn sessions_db_path(&self) -> PathBuf {
        let file = PathBuf::from(&self.sessions.db_file);
        if file.is_absolute() {
            file
        } else {
            self.data_dir.join(file)
        }
    }
}
