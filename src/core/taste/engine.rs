use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::answer::normalize_answer;
use super::session::{ElicitationSession, HistoryEntry, SessionState};
use super::space::{Question, TasteSchema};
use super::types::{Axis, NextQuestion, RawAnswer, StepResponse};
use crate::config::ElicitationConfig;
use crate::error::ElicitationError;

const KAPPA_MIN: f64 = 0.15;
const KAPPA_MAX: f64 = 0.95;
const MAX_SHRINK: f64 = 0.25;
const PASSIVE_DECAY: f64 = 0.995;
const PROGRESS_BONUS_PCT: f64 = 10.0;

/// Adaptive questionnaire: belief update, next-question choice, stopping rule.
///
/// The engine holds no session state of its own; callers pass the session
/// they own (see `sessions::SessionManager`).
pub struct ElicitationEngine {
    schema: Arc<TasteSchema>,
    config: ElicitationConfig,
}

impl ElicitationEngine {
    pub fn new(schema: Arc<TasteSchema>, config: ElicitationConfig) -> Self {
        Self { schema, config }
    }

    pub fn schema(&self) -> &TasteSchema {
        &self.schema
    }

    pub fn config(&self) -> &ElicitationConfig {
        &self.config
    }

    pub fn new_session(&self) -> ElicitationSession {
        ElicitationSession::new(self.schema.space(), self.config.sigma_max)
    }

    /// First question for a fresh (or restored) session.
    pub fn start(&self, session: &ElicitationSession) -> StepResponse {
        let complete = session.is_complete() || self.completion_reached(session);
        let next = if complete {
            None
        } else {
            self.select_next_question(session)
        };
        self.response(session, complete, next)
    }

    /// Applies one answer. On error the session is left untouched.
    pub fn step(
        &self,
        session: &mut ElicitationSession,
        question_id: &str,
        answer: &RawAnswer,
    ) -> Result<StepResponse, ElicitationError> {
        let numeric = normalize_answer(answer)?;
        let question = self.schema.bank().get(question_id)?;

        let before = session.beliefs.clone();
        self.apply_update(session, question, numeric);
        let after = session.beliefs.clone();

        session.history.push(HistoryEntry {
            question_id: question_id.to_string(),
            raw_answer: answer.clone(),
            numeric_answer: numeric,
            before,
            after,
            answered_at: Utc::now().to_rfc3339(),
        });
        if !session.has_asked(question_id) {
            session.asked.push(question_id.to_string());
        }

        if session.state == SessionState::Active && self.completion_reached(session) {
            session.state = SessionState::Complete;
            tracing::info!(
                session_id = %session.id,
                asked = session.asked.len(),
                mean_sigma = session.mean_sigma(),
                "elicitation complete"
            );
        }

        let complete = session.is_complete();
        let next = if complete {
            None
        } else {
            self.select_next_question(session)
        };

        tracing::debug!(
            session_id = %session.id,
            question_id,
            answer = numeric,
            next = next.map(|q| q.id.as_str()),
            "processed answer"
        );

        Ok(self.response(session, complete, next))
    }

    fn apply_update(&self, session: &mut ElicitationSession, question: &Question, answer: i8) {
        let weights = question.normalized_weights();
        if weights.is_empty() {
            return;
        }

        let cfg = &self.config;
        let ans_norm = f64::from(answer) / 2.0;

        let pred: f64 = weights
            .iter()
            .map(|(axis, w)| w * session.beliefs.get(axis).map_or(0.0, |b| b.mu))
            .sum();
        let err = ans_norm - pred;

        let kappa = self.learning_rate(session, &weights);

        for (axis, belief) in &mut session.beliefs {
            if let Some(w) = weights.get(axis) {
                belief.mu = (belief.mu + kappa * w * err).clamp(-1.0, 1.0);
                let shrink = MAX_SHRINK * w.abs() * ans_norm.abs();
                belief.sigma = (belief.sigma * (1.0 - shrink)).clamp(cfg.sigma_min, cfg.sigma_max);
            } else {
                belief.sigma = (belief.sigma * PASSIVE_DECAY).clamp(cfg.sigma_min, cfg.sigma_max);
            }
        }
    }

    /// `base_lr` scaled by how uncertain the touched axes still are.
    fn learning_rate(&self, session: &ElicitationSession, weights: &BTreeMap<Axis, f64>) -> f64 {
        let cfg = &self.config;
        let sigmas: Vec<f64> = weights
            .keys()
            .map(|axis| session.beliefs.get(axis).map_or(cfg.sigma_max, |b| b.sigma))
            .collect();
        #[allow(clippy::cast_precision_loss)]
        let avg_sigma = sigmas.iter().sum::<f64>() / sigmas.len().max(1) as f64;

        let range = cfg.sigma_max - cfg.sigma_min;
        let spread = if range <= f64::EPSILON {
            1.0
        } else {
            (avg_sigma - cfg.sigma_min) / range
        };
        (cfg.base_lr * (0.5 + 0.5 * spread)).clamp(KAPPA_MIN, KAPPA_MAX)
    }

    fn completion_reached(&self, session: &ElicitationSession) -> bool {
        session.asked.len() >= self.config.q_max
            || session.mean_sigma() <= self.config.entropy_target
    }

    /// Greedy info-gain pick among unasked questions.
    ///
    /// Score is `Σ |w|·sigma − coverage_lambda·touch_count·|w|` over the
    /// question's normalized weights, where `touch_count` is how many asked
    /// questions mention the axis at all. Strictly highest wins, so bank
    /// order breaks ties.
    pub fn select_next_question<'a>(&'a self, session: &ElicitationSession) -> Option<&'a Question> {
        let bank = self.schema.bank();

        let mut touch_count: BTreeMap<Axis, u32> = BTreeMap::new();
        for asked in session.asked.iter().filter_map(|id| bank.find(id)) {
            for axis in asked.weights.keys() {
                *touch_count.entry(*axis).or_default() += 1;
            }
        }

        let mut best: Option<(f64, &Question)> = None;
        for question in bank.questions().iter().filter(|q| !session.has_asked(&q.id)) {
            let score: f64 = question
                .normalized_weights()
                .iter()
                .map(|(axis, w)| {
                    let sigma = session
                        .beliefs
                        .get(axis)
                        .map_or(self.config.sigma_max, |b| b.sigma);
                    let touched = f64::from(touch_count.get(axis).copied().unwrap_or(0));
                    w.abs() * sigma - self.config.coverage_lambda * touched * w.abs()
                })
                .sum();
            if best.is_none_or(|(best_score, _)| score > best_score) {
                best = Some((score, question));
            }
        }
        best.map(|(_, question)| question)
    }

    /// Confidence in [0, 100]: shrinkage of mean sigma plus a progress bonus.
    pub fn confidence_pct(&self, session: &ElicitationSession) -> f64 {
        let cfg = &self.config;
        let range = cfg.sigma_max - cfg.sigma_min;
        let base = if range <= f64::EPSILON {
            100.0
        } else {
            100.0 * (cfg.sigma_max - session.mean_sigma()) / range
        };
        #[allow(clippy::cast_precision_loss)]
        let progress = PROGRESS_BONUS_PCT * session.asked.len() as f64 / cfg.q_max.max(1) as f64;
        (base + progress).clamp(0.0, 100.0)
    }

    fn response(
        &self,
        session: &ElicitationSession,
        complete: bool,
        next: Option<&Question>,
    ) -> StepResponse {
        StepResponse {
            session_id: session.id.clone(),
            confidence_pct: (self.confidence_pct(session) * 10.0).round() / 10.0,
            complete,
            next_question: next.map(|q| NextQuestion {
                id: q.id.clone(),
                text: q.text.clone(),
                options: super::likert_options(&self.config.locale),
            }),
            belief_preview: session.preview(self.config.preview_len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::taste::space::{AxisSpace, QuestionBank};
    use crate::core::taste::vocabulary::Vocabulary;

    fn engine(questions: Vec<Question>, config: ElicitationConfig) -> ElicitationEngine {
        let space = AxisSpace::new(vec![Axis::Darkness, Axis::Humor]).unwrap();
        let schema = TasteSchema::new(
            "test",
            space,
            QuestionBank::new(questions).unwrap(),
            Vocabulary::default(),
        )
        .unwrap();
        ElicitationEngine::new(Arc::new(schema), config)
    }

    fn darkness_only() -> ElicitationEngine {
        engine(
            vec![
                Question::new("q1", "Dark?", [(Axis::Darkness, 1.0)]),
                Question::new("q2", "Funny?", [(Axis::Humor, 1.0)]),
            ],
            ElicitationConfig::default(),
        )
    }

    #[test]
    fn worked_example_matches_hand_computation() {
        let engine = darkness_only();
        let mut session = engine.new_session();

        engine.step(&mut session, "q1", &RawAnswer::from("yes")).unwrap();

        let darkness = session.beliefs[&Axis::Darkness];
        let humor = session.beliefs[&Axis::Humor];
        assert!((darkness.mu - 0.6).abs() < 1e-12);
        assert!((darkness.sigma - 0.75).abs() < 1e-12);
        assert!(humor.mu.abs() < f64::EPSILON);
        assert!((humor.sigma - 0.995).abs() < 1e-12);
    }

    #[test]
    fn kappa_is_clamped() {
        let config = ElicitationConfig {
            base_lr: 5.0,
            ..ElicitationConfig::default()
        };
        let engine = engine(vec![Question::new("q1", "Dark?", [(Axis::Darkness, 1.0)])], config);
        let mut session = engine.new_session();
        engine.step(&mut session, "q1", &RawAnswer::Int(2)).unwrap();
        assert!((session.beliefs[&Axis::Darkness].mu - KAPPA_MAX).abs() < 1e-12);
    }

    #[test]
    fn neutral_answer_moves_nothing_but_decay() {
        let engine = darkness_only();
        let mut session = engine.new_session();
        engine.step(&mut session, "q1", &RawAnswer::Int(0)).unwrap();
        let darkness = session.beliefs[&Axis::Darkness];
        assert!(darkness.mu.abs() < f64::EPSILON);
        assert!((darkness.sigma - 1.0).abs() < f64::EPSILON);
        assert!((session.beliefs[&Axis::Humor].sigma - 0.995).abs() < 1e-12);
    }

    #[test]
    fn zero_weight_question_is_a_no_op_update() {
        let engine = engine(
            vec![Question::new("q0", "Nothing?", [(Axis::Darkness, 0.0)])],
            ElicitationConfig::default(),
        );
        let mut session = engine.new_session();
        let before = session.beliefs.clone();
        engine.step(&mut session, "q0", &RawAnswer::Int(2)).unwrap();
        assert_eq!(session.beliefs, before);
        assert_eq!(session.asked, vec!["q0".to_string()]);
        assert_eq!(session.history.len(), 1);
    }

    #[test]
    fn invalid_answer_leaves_session_unchanged() {
        let engine = darkness_only();
        let mut session = engine.new_session();
        let snapshot = session.clone();
        let err = engine
            .step(&mut session, "q1", &RawAnswer::from("whatever"))
            .unwrap_err();
        assert!(matches!(err, ElicitationError::InvalidAnswer(_)));
        assert_eq!(session, snapshot);
    }

    #[test]
    fn unknown_question_leaves_session_unchanged() {
        let engine = darkness_only();
        let mut session = engine.new_session();
        let snapshot = session.clone();
        let err = engine
            .step(&mut session, "q42", &RawAnswer::Int(1))
            .unwrap_err();
        assert!(matches!(err, ElicitationError::UnknownQuestion(_)));
        assert_eq!(session, snapshot);
    }

    #[test]
    fn repeated_question_is_not_double_counted() {
        let engine = darkness_only();
        let mut session = engine.new_session();
        engine.step(&mut session, "q1", &RawAnswer::Int(1)).unwrap();
        engine.step(&mut session, "q1", &RawAnswer::Int(1)).unwrap();
        assert_eq!(session.asked, vec!["q1".to_string()]);
        assert_eq!(session.history.len(), 2);
    }

    #[test]
    fn start_picks_first_of_tied_questions() {
        let engine = darkness_only();
        let session = engine.new_session();
        let response = engine.start(&session);
        assert_eq!(response.next_question.unwrap().id, "q1");
        assert!(!response.complete);
        assert!(response.confidence_pct.abs() < f64::EPSILON);
    }

    #[test]
    fn selection_prefers_uncertain_untouched_axes() {
        let engine = engine(
            vec![
                Question::new("a", "Dark?", [(Axis::Darkness, 1.0)]),
                Question::new("b", "Darker?", [(Axis::Darkness, 0.8)]),
                Question::new("c", "Funny?", [(Axis::Humor, 1.0)]),
            ],
            ElicitationConfig::default(),
        );
        let mut session = engine.new_session();
        let response = engine.step(&mut session, "a", &RawAnswer::Int(2)).unwrap();
        assert_eq!(response.next_question.unwrap().id, "c");
    }

    #[test]
    fn completes_at_q_max() {
        let config = ElicitationConfig {
            q_max: 1,
            ..ElicitationConfig::default()
        };
        let engine = engine(
            vec![
                Question::new("q1", "Dark?", [(Axis::Darkness, 1.0)]),
                Question::new("q2", "Funny?", [(Axis::Humor, 1.0)]),
            ],
            config,
        );
        let mut session = engine.new_session();
        let response = engine.step(&mut session, "q1", &RawAnswer::Int(0)).unwrap();
        assert!(response.complete);
        assert!(response.next_question.is_none());
        assert_eq!(session.state, SessionState::Complete);
    }

    #[test]
    fn completes_when_uncertainty_target_reached() {
        let config = ElicitationConfig {
            entropy_target: 0.9,
            ..ElicitationConfig::default()
        };
        let engine = engine(
            vec![
                Question::new("q1", "Dark and funny?", [(Axis::Darkness, 1.0), (Axis::Humor, 1.0)]),
                Question::new("q2", "Funny?", [(Axis::Humor, 1.0)]),
            ],
            config,
        );
        let mut session = engine.new_session();
        let response = engine.step(&mut session, "q1", &RawAnswer::Int(2)).unwrap();
        assert!(session.mean_sigma() <= 0.9);
        assert!(response.complete);
    }

    #[test]
    fn bank_exhaustion_yields_no_next_question() {
        let engine = darkness_only();
        let mut session = engine.new_session();
        engine.step(&mut session, "q1", &RawAnswer::Int(1)).unwrap();
        let response = engine.step(&mut session, "q2", &RawAnswer::Int(1)).unwrap();
        assert!(response.next_question.is_none());
    }

    #[test]
    fn confidence_includes_progress_bonus() {
        let engine = darkness_only();
        let mut session = engine.new_session();
        session.asked.push("q1".into());
        let pct = engine.confidence_pct(&session);
        assert!((pct - 10.0 / 16.0).abs() < 1e-9);
    }

    #[test]
    fn confidence_is_full_for_degenerate_sigma_range() {
        let config = ElicitationConfig {
            sigma_min: 0.5,
            sigma_max: 0.5,
            ..ElicitationConfig::default()
        };
        let engine = engine(vec![Question::new("q1", "Dark?", [(Axis::Darkness, 1.0)])], config);
        let session = engine.new_session();
        assert!((engine.confidence_pct(&session) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn response_options_are_localized() {
        let config = ElicitationConfig {
            locale: "ru".into(),
            ..ElicitationConfig::default()
        };
        let engine = engine(vec![Question::new("q1", "Dark?", [(Axis::Darkness, 1.0)])], config);
        let response = engine.start(&engine.new_session());
        let options = response.next_question.unwrap().options;
        assert_eq!(options[4], "Да");
    }
}
