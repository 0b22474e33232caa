//! Adaptive taste elicitation and catalog ranking.
//!
//! An [`ElicitationEngine`] asks Likert-scale questions and keeps a
//! `(mu, sigma)` point estimate with uncertainty per taste axis, updated by
//! fixed heuristic rules. [`ProfileTextualizer`] turns those beliefs into a
//! descriptive query and [`CatalogScorer`] ranks catalog items against it.

pub mod answer;
pub mod banks;
pub mod catalog;
pub mod embedding;
pub mod engine;
pub mod scorer;
pub mod session;
pub mod space;
pub mod textualizer;
pub mod types;
pub mod vocabulary;

pub use answer::normalize_answer;
pub use catalog::{CatalogProvider, InMemoryCatalog, JsonCatalog};
pub use embedding::{EmbeddingProvider, create_embedding_provider};
pub use engine::ElicitationEngine;
pub use scorer::CatalogScorer;
pub use session::{ElicitationSession, HistoryEntry, SessionState, beliefs_from_json};
pub use space::{AxisSpace, Question, QuestionBank, TasteSchema};
pub use textualizer::{ProfileQuery, ProfileTextualizer};
pub use types::*;
pub use vocabulary::{AxisTerms, Vocabulary};

const LIKERT_KEYS: [&str; 5] = [
    "likert.not_at_all",
    "likert.rather_no",
    "likert.dont_know",
    "likert.rather_yes",
    "likert.yes",
];

/// The five answer labels, from -2 to +2, in `locale`.
pub fn likert_options(locale: &str) -> [String; 5] {
    LIKERT_KEYS.map(|key| t!(key, locale = locale).into_owned())
}
