use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tastekit::config::ElicitationConfig;
use tastekit::core::taste::{
    Axis, ElicitationEngine, ProfileTextualizer, RawAnswer, SessionState, TasteSchema, banks,
    beliefs_from_json, likert_options, normalize_answer,
};

fn engine(schema: TasteSchema, config: ElicitationConfig) -> ElicitationEngine {
    ElicitationEngine::new(Arc::new(schema), config)
}

mod full_quiz {
    use super::*;

    #[test]
    fn enthusiastic_answers_finish_within_q_max() {
        let engine = engine(banks::extended().unwrap(), ElicitationConfig::default());
        let mut session = engine.new_session();
        let mut response = engine.start(&session);
        let mut steps = 0;

        while let Some(question) = response.next_question.clone() {
            response = engine
                .step(&mut session, &question.id, &RawAnswer::from("yes"))
                .unwrap();
            steps += 1;
            assert!(steps <= engine.config().q_max, "quiz did not stop");
        }

        assert!(response.complete);
        assert_eq!(session.state, SessionState::Complete);
        assert_eq!(session.history.len(), steps);
        let mut asked = session.asked.clone();
        asked.sort();
        asked.dedup();
        assert_eq!(asked.len(), session.asked.len());
        assert!(response.belief_preview.len() <= engine.config().preview_len);

        let query = ProfileTextualizer::new(engine.schema()).textualize(&session.beliefs);
        assert!(!query.neutral);
    }

    #[test]
    fn confident_answers_can_stop_early_on_uncertainty() {
        let config = ElicitationConfig {
            entropy_target: 0.99,
            ..ElicitationConfig::default()
        };
        let engine = engine(banks::compact().unwrap(), config);
        let mut session = engine.new_session();
        let first = engine.start(&session);
        let qid = first.next_question.unwrap().id;

        let response = engine.step(&mut session, &qid, &RawAnswer::Int(-2)).unwrap();
        assert!(response.complete);
        assert!(response.next_question.is_none());
        assert!(session.mean_sigma() <= 0.99);
    }

    #[test]
    fn completed_session_stays_complete_after_more_answers() {
        let config = ElicitationConfig {
            q_max: 2,
            ..ElicitationConfig::default()
        };
        let engine = engine(banks::compact().unwrap(), config);
        let mut session = engine.new_session();
        engine.step(&mut session, "q1", &RawAnswer::Int(1)).unwrap();
        engine.step(&mut session, "q2", &RawAnswer::Int(1)).unwrap();
        assert_eq!(session.state, SessionState::Complete);

        let response = engine.step(&mut session, "q3", &RawAnswer::Int(2)).unwrap();
        assert!(response.complete);
        assert_eq!(session.state, SessionState::Complete);
        assert_eq!(session.history.len(), 3);
    }

    #[test]
    fn first_question_comes_with_localized_options() {
        let config = ElicitationConfig {
            locale: "ru".into(),
            ..ElicitationConfig::default()
        };
        let engine = engine(banks::compact().unwrap(), config);
        let response = engine.start(&engine.new_session());
        let question = response.next_question.unwrap();
        assert_eq!(question.options, likert_options("ru"));
        assert_eq!(question.options[1], "Скорее нет");
        assert!(response.confidence_pct.abs() < f64::EPSILON);
    }
}

mod invariants {
    use super::*;

    const PHRASES: [&str; 8] = [
        "да",
        "скорее нет",
        "не знаю",
        "Rather Yes",
        "  strongly disagree ",
        "skip",
        "no",
        "?",
    ];

    fn random_answer(rng: &mut StdRng) -> RawAnswer {
        match rng.random_range(0..3) {
            0 => RawAnswer::Int(rng.random_range(-2..=2)),
            1 => RawAnswer::Float(f64::from(rng.random_range(-20..=20)) / 10.0),
            _ => RawAnswer::from(PHRASES[rng.random_range(0..PHRASES.len())]),
        }
    }

    #[test]
    fn beliefs_and_confidence_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(0x7a57e);
        let engine = engine(banks::extended().unwrap(), ElicitationConfig::default());
        let cfg = engine.config().clone();
        let ids: Vec<String> = engine
            .schema()
            .bank()
            .questions()
            .iter()
            .map(|q| q.id.clone())
            .collect();

        for _ in 0..20 {
            let mut session = engine.new_session();
            for _ in 0..40 {
                let qid = &ids[rng.random_range(0..ids.len())];
                let response = engine
                    .step(&mut session, qid, &random_answer(&mut rng))
                    .unwrap();

                assert!((0.0..=100.0).contains(&response.confidence_pct));
                for belief in session.beliefs.values() {
                    assert!((-1.0..=1.0).contains(&belief.mu), "mu out of range: {belief:?}");
                    assert!(
                        belief.sigma >= cfg.sigma_min - 1e-12
                            && belief.sigma <= cfg.sigma_max + 1e-12,
                        "sigma out of range: {belief:?}"
                    );
                }
                assert_eq!(session.beliefs.len(), engine.schema().space().len());
            }
            assert_eq!(session.history.len(), 40);
        }
    }

    #[test]
    fn next_question_is_never_already_asked() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = ElicitationConfig {
            q_max: 100,
            entropy_target: 0.0,
            ..ElicitationConfig::default()
        };
        let engine = engine(banks::extended().unwrap(), config);
        let mut session = engine.new_session();
        let mut response = engine.start(&session);

        while let Some(question) = response.next_question.clone() {
            assert!(!session.has_asked(&question.id));
            response = engine
                .step(&mut session, &question.id, &random_answer(&mut rng))
                .unwrap();
        }
        assert_eq!(session.asked.len(), engine.schema().bank().len());
    }

    #[test]
    fn identical_answers_produce_identical_sessions() {
        let engine = engine(banks::compact().unwrap(), ElicitationConfig::default());
        let mut a = engine.new_session();
        let mut b = engine.new_session();
        for (qid, value) in [("q4", 2), ("q1", -1), ("q8", 1)] {
            let ra = engine.step(&mut a, qid, &RawAnswer::Int(value)).unwrap();
            let rb = engine.step(&mut b, qid, &RawAnswer::Int(value)).unwrap();
            assert_eq!(ra.next_question, rb.next_question);
            assert!((ra.confidence_pct - rb.confidence_pct).abs() < f64::EPSILON);
        }
        assert_eq!(a.beliefs, b.beliefs);
    }
}

mod answers {
    use super::*;

    #[test]
    fn every_localized_label_normalizes_to_its_position() {
        for locale in ["en", "ru"] {
            for (index, label) in likert_options(locale).iter().enumerate() {
                let expected = i8::try_from(index).unwrap() - 2;
                assert_eq!(
                    normalize_answer(&RawAnswer::from(label.as_str())).unwrap(),
                    expected,
                    "{locale}: {label}"
                );
            }
        }
    }

    #[test]
    fn out_of_scale_and_unknown_answers_are_rejected() {
        assert!(normalize_answer(&RawAnswer::Int(3)).is_err());
        assert!(normalize_answer(&RawAnswer::Float(f64::NAN)).is_err());
        assert!(normalize_answer(&RawAnswer::from("perhaps tomorrow")).is_err());
    }
}

mod custom_banks {
    use super::*;

    const BANK: &str = r#"
axes = ["darkness", "humor", "genre_horror"]

[[questions]]
id = "grim"
text = "Grim and frightening?"
weights = { darkness = 0.9, genre_horror = 0.7 }

[[questions]]
id = "laugh"
text = "Want to laugh?"
weights = { humor = 1.0 }

[vocabulary.genre_horror]
label = "spooky"
positive = ["haunted", "creepy"]
markers = ["horror"]
"#;

    #[test]
    fn toml_bank_drives_engine_and_vocabulary() {
        let schema = TasteSchema::from_toml_str("spooky", BANK).unwrap();
        assert_eq!(schema.space().len(), 3);
        assert_eq!(schema.terms(Axis::GenreHorror).label, "spooky");
        assert_eq!(schema.terms(Axis::Darkness).label, "dark");

        let engine = engine(schema, ElicitationConfig::default());
        let mut session = engine.new_session();
        let first = engine.start(&session);
        assert_eq!(first.next_question.as_ref().unwrap().id, "grim");

        engine.step(&mut session, "grim", &RawAnswer::Int(2)).unwrap();
        let query = ProfileTextualizer::new(engine.schema()).textualize(&session.beliefs);
        assert!(query.tokens.contains(&"haunted".to_string()));
        assert!(query.tokens.contains(&"dark".to_string()));
    }

    #[test]
    fn bank_file_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spooky.toml");
        std::fs::write(&path, BANK).unwrap();
        let schema = TasteSchema::resolve(path.to_str().unwrap()).unwrap();
        assert_eq!(schema.name, "spooky");
        assert_eq!(schema.bank().len(), 2);
    }

    #[test]
    fn question_outside_axis_space_is_rejected() {
        let bad = BANK.replace("humor = 1.0", "tempo = 1.0");
        assert!(TasteSchema::from_toml_str("bad", &bad).is_err());
    }
}

mod external_beliefs {
    use super::*;

    #[test]
    fn bare_profile_is_repaired_against_space() {
        let schema = banks::compact().unwrap();
        let value = serde_json::json!({
            "darkness": 0.7,
            "humor": {"mu": 3.0, "sigma": 0.01},
            "not_an_axis": 1.0
        });
        let beliefs = beliefs_from_json(&value, schema.space(), 0.15, 1.0).unwrap();

        assert_eq!(beliefs.len(), schema.space().len());
        assert!((beliefs[&Axis::Darkness].mu - 0.7).abs() < 1e-12);
        assert!((beliefs[&Axis::Darkness].sigma - 1.0).abs() < 1e-12);
        assert!((beliefs[&Axis::Humor].mu - 1.0).abs() < 1e-12);
        assert!((beliefs[&Axis::Humor].sigma - 0.15).abs() < 1e-12);
        assert!(beliefs[&Axis::Tempo].mu.abs() < f64::EPSILON);
    }

    #[test]
    fn non_object_profile_is_an_error() {
        let schema = banks::compact().unwrap();
        assert!(beliefs_from_json(&serde_json::json!([1, 2]), schema.space(), 0.15, 1.0).is_err());
    }
}
