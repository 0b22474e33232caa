mod core;
mod observability;
mod taste;

pub use core::Config;
pub use observability::ObservabilityConfig;
pub use taste::{ElicitationConfig, EmbeddingConfig, ScoringConfig, SessionsConfig};
