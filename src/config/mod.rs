pub mod schema;

pub use schema::{
    Config, ElicitationConfig, EmbeddingConfig, ObservabilityConfig, ScoringConfig,
    SessionsConfig,
};
