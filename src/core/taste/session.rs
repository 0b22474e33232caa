use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use uuid::Uuid;

use super::space::AxisSpace;
use super::types::{Axis, AxisBelief, BeliefState, RawAnswer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Complete,
}

/// One processed answer with the beliefs on either side of the update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub question_id: String,
    pub raw_answer: RawAnswer,
    pub numeric_answer: i8,
    pub before: BeliefState,
    pub after: BeliefState,
    pub answered_at: String,
}

/// Per-user elicitation state. Mutated only by `ElicitationEngine::step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElicitationSession {
    pub id: String,
    pub state: SessionState,
    pub beliefs: BeliefState,
    #[serde(default)]
    pub asked: Vec<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl ElicitationSession {
    pub fn new(space: &AxisSpace, sigma_max: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: SessionState::Active,
            beliefs: space.neutral_beliefs(sigma_max),
            asked: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    pub fn has_asked(&self, question_id: &str) -> bool {
        self.asked.iter().any(|id| id == question_id)
    }

    pub fn mean_sigma(&self) -> f64 {
        if self.beliefs.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.beliefs.len() as f64;
        self.beliefs.values().map(|b| b.sigma).sum::<f64>() / n
    }

    /// Axes ordered by |mu|, strongest first; ties keep axis order.
    pub fn preview(&self, limit: usize) -> Vec<(Axis, f64)> {
        let mut pairs: Vec<(Axis, f64)> = self.beliefs.iter().map(|(a, b)| (*a, b.mu)).collect();
        pairs.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        pairs.truncate(limit);
        pairs
    }

    /// Brings the belief map back onto `space`: missing axes become neutral,
    /// axes outside the space are dropped and every value is clamped.
    /// Repeated ids in `asked` collapse to their first occurrence.
    /// Returns the number of axes added or dropped plus duplicate ids removed.
    pub fn repair(&mut self, space: &AxisSpace, sigma_min: f64, sigma_max: f64) -> usize {
        let (beliefs, repaired) = repair_beliefs(&self.beliefs, space, sigma_min, sigma_max);
        self.beliefs = beliefs;

        let before = self.asked.len();
        let mut seen = HashSet::new();
        self.asked.retain(|id| seen.insert(id.clone()));
        repaired + (before - self.asked.len())
    }
}

pub(crate) fn repair_beliefs(
    beliefs: &BeliefState,
    space: &AxisSpace,
    sigma_min: f64,
    sigma_max: f64,
) -> (BeliefState, usize) {
    let dropped = beliefs.keys().filter(|axis| !space.contains(**axis)).count();
    let mut added = 0;
    let repaired = space
        .axes()
        .iter()
        .map(|axis| {
            let belief = beliefs.get(axis).copied().unwrap_or_else(|| {
                added += 1;
                AxisBelief::neutral(sigma_max)
            });
            (*axis, belief.clamped(sigma_min, sigma_max))
        })
        .collect();
    (repaired, dropped + added)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExternalBelief {
    Full(AxisBelief),
    Mu(f64),
}

/// Parses beliefs supplied from outside the engine.
///
/// Accepts `{axis: {mu, sigma}}` as well as the bare `{axis: mu}` profile
/// shape; a bare `mu` gets `sigma = sigma_max`. Unknown axis names are
/// skipped with a warning, missing axes are re-initialized to neutral.
pub fn beliefs_from_json(
    value: &serde_json::Value,
    space: &AxisSpace,
    sigma_min: f64,
    sigma_max: f64,
) -> anyhow::Result<BeliefState> {
    let raw: BTreeMap<String, ExternalBelief> = serde_json::from_value(value.clone())
        .map_err(|e| anyhow::anyhow!("belief state must be an object keyed by axis: {e}"))?;

    let mut parsed = BeliefState::new();
    for (name, belief) in raw {
        let Ok(axis) = Axis::from_str(&name) else {
            tracing::warn!(axis = %name, "ignoring unknown axis in supplied belief state");
            continue;
        };
        let belief = match belief {
            ExternalBelief::Full(belief) => belief,
            ExternalBelief::Mu(mu) => AxisBelief {
                mu,
                sigma: sigma_max,
            },
        };
        parsed.insert(axis, belief);
    }

    let (beliefs, repaired) = repair_beliefs(&parsed, space, sigma_min, sigma_max);
    if repaired > 0 {
        tracing::warn!(repaired, "repaired partial belief state");
    }
    Ok(beliefs)
}
