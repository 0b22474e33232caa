use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use super::types::{Axis, AxisBelief, BeliefState};
use super::vocabulary::{AxisTerms, Vocabulary};
use crate::error::ElicitationError;

/// Ordered, duplicate-free set of axes a bank elicits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Axis>", into = "Vec<Axis>")]
pub struct AxisSpace {
    axes: Vec<Axis>,
}

impl AxisSpace {
    pub fn new(axes: Vec<Axis>) -> Result<Self, ElicitationError> {
        if axes.is_empty() {
            return Err(ElicitationError::InvalidBank("axis space is empty".into()));
        }
        let mut seen = HashSet::new();
        for axis in &axes {
            if !seen.insert(*axis) {
                return Err(ElicitationError::InvalidBank(format!(
                    "axis {axis} listed twice"
                )));
            }
        }
        Ok(Self { axes })
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn contains(&self, axis: Axis) -> bool {
        self.axes.contains(&axis)
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Beliefs for every axis at `mu = 0`, `sigma = sigma_max`.
    pub fn neutral_beliefs(&self, sigma_max: f64) -> BeliefState {
        self.axes
            .iter()
            .map(|axis| (*axis, AxisBelief::neutral(sigma_max)))
            .collect()
    }
}

impl TryFrom<Vec<Axis>> for AxisSpace {
    type Error = ElicitationError;

    fn try_from(axes: Vec<Axis>) -> Result<Self, Self::Error> {
        Self::new(axes)
    }
}

impl From<AxisSpace> for Vec<Axis> {
    fn from(space: AxisSpace) -> Self {
        space.axes
    }
}

// Question: prompt plus sparse, unnormalized axis weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub weights: BTreeMap<Axis, f64>,
}

impl Question {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        weights: impl IntoIterator<Item = (Axis, f64)>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            weights: weights.into_iter().collect(),
        }
    }

    /// Weights scaled to unit L2 norm. A zero vector yields an empty map.
    pub fn normalized_weights(&self) -> BTreeMap<Axis, f64> {
        let norm = self.weights.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm <= f64::EPSILON {
            return BTreeMap::new();
        }
        self.weights
            .iter()
            .map(|(axis, weight)| (*axis, weight / norm))
            .collect()
    }
}

/// Questions in bank order; bank order breaks selection ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Result<Self, ElicitationError> {
        let mut ids = HashSet::new();
        for question in &questions {
            if !ids.insert(question.id.as_str()) {
                return Err(ElicitationError::InvalidBank(format!(
                    "question id {} listed twice",
                    question.id
                )));
            }
            if let Some((axis, weight)) = question
                .weights
                .iter()
                .find(|(_, w)| !w.is_finite() || !(-1.0..=1.0).contains(*w))
            {
                return Err(ElicitationError::InvalidBank(format!(
                    "question {} weight {weight} for {axis} outside [-1, 1]",
                    question.id
                )));
            }
        }
        Ok(Self { questions })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn get(&self, id: &str) -> Result<&Question, ElicitationError> {
        self.find(id)
            .ok_or_else(|| ElicitationError::UnknownQuestion(id.to_string()))
    }
}

/// Axis space, question bank and vocabulary for one catalog, validated together.
#[derive(Debug, Clone)]
pub struct TasteSchema {
    pub name: String,
    space: AxisSpace,
    bank: QuestionBank,
    vocabulary: Vocabulary,
}

impl TasteSchema {
    pub fn new(
        name: impl Into<String>,
        space: AxisSpace,
        bank: QuestionBank,
        vocabulary: Vocabulary,
    ) -> Result<Self, ElicitationError> {
        for question in bank.questions() {
            if let Some(axis) = question.weights.keys().find(|axis| !space.contains(**axis)) {
                return Err(ElicitationError::InvalidBank(format!(
                    "question {} weights axis {axis} outside the axis space",
                    question.id
                )));
            }
        }
        Ok(Self {
            name: name.into(),
            space,
            bank,
            vocabulary,
        })
    }

    pub fn space(&self) -> &AxisSpace {
        &self.space
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Terms for `axis`, falling back to the built-in table.
    pub fn terms(&self, axis: Axis) -> AxisTerms {
        self.vocabulary
            .get(axis)
            .cloned()
            .unwrap_or_else(|| AxisTerms::default_for(axis))
    }

    /// Resolves a built-in bank name (`compact`, `extended`) or a TOML file path.
    pub fn resolve(bank: &str) -> anyhow::Result<Self> {
        match bank {
            "compact" => Ok(super::banks::compact()?),
            "extended" => Ok(super::banks::extended()?),
            path => Self::load(Path::new(path)),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read question bank {}", path.display()))?;
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("custom");
        Self::from_toml_str(name, &contents)
            .with_context(|| format!("Failed to parse question bank {}", path.display()))
    }

    pub fn from_toml_str(name: &str, contents: &str) -> anyhow::Result<Self> {
        let file: BankFile = toml::from_str(contents)?;
        let vocabulary = Vocabulary::default().with_overrides(file.vocabulary);
        Ok(Self::new(
            name,
            file.axes,
            QuestionBank::new(file.questions)?,
            vocabulary,
        )?)
    }
}

#[derive(Debug, Deserialize)]
struct BankFile {
    axes: AxisSpace,
    #[serde(default)]
    questions: Vec<Question>,
    #[serde(default)]
    vocabulary: BTreeMap<Axis, AxisTerms>,
}
