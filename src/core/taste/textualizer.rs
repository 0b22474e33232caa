use serde::{Deserialize, Serialize};

use super::space::TasteSchema;
use super::types::BeliefState;

/// `mu` above this emits an axis's positive terms.
pub const POSITIVE_THRESHOLD: f64 = 0.2;
/// `mu` below this emits an axis's negative terms, if it has any.
pub const NEGATIVE_THRESHOLD: f64 = -0.2;

const NEUTRAL_TOKENS: [&str; 3] = ["interesting", "high quality", "popular"];

/// Descriptive query derived from a belief state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileQuery {
    pub tokens: Vec<String>,
    /// True when no axis crossed a threshold and the neutral default was used.
    pub neutral: bool,
}

impl ProfileQuery {
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Deterministic beliefs → query tokens, driven by the schema's vocabulary.
pub struct ProfileTextualizer<'a> {
    schema: &'a TasteSchema,
}

impl<'a> ProfileTextualizer<'a> {
    pub fn new(schema: &'a TasteSchema) -> Self {
        Self { schema }
    }

    pub fn textualize(&self, beliefs: &BeliefState) -> ProfileQuery {
        let mut tokens: Vec<String> = Vec::new();
        for axis in self.schema.space().axes() {
            let Some(belief) = beliefs.get(axis) else {
                continue;
            };
            let terms = self.schema.terms(*axis);
            let emitted = if belief.mu > POSITIVE_THRESHOLD {
                &terms.positive
            } else if belief.mu < NEGATIVE_THRESHOLD {
                &terms.negative
            } else {
                continue;
            };
            for term in emitted {
                if !tokens.contains(term) {
                    tokens.push(term.clone());
                }
            }
        }

        if tokens.is_empty() {
            return ProfileQuery {
                tokens: NEUTRAL_TOKENS.iter().map(|t| (*t).to_string()).collect(),
                neutral: true,
            };
        }
        ProfileQuery {
            tokens,
            neutral: false,
        }
    }
}
