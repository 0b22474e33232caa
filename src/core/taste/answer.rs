use super::types::RawAnswer;
use crate::error::ElicitationError;

/// Likert phrases, Russian and English, mapped to the [-2, 2] scale.
const LIKERT_LEXICON: &[(&str, i8)] = &[
    // ru
    ("совсем нет", -2),
    ("нет", -2),
    ("скорее нет", -1),
    ("не знаю", 0),
    ("пропустить", 0),
    ("скип", 0),
    ("скорее да", 1),
    ("да", 2),
    // en
    ("strongly disagree", -2),
    ("disagree", -2),
    ("not at all", -2),
    ("rather no", -1),
    ("somewhat no", -1),
    ("don't know", 0),
    ("dont know", 0),
    ("skip", 0),
    ("neutral", 0),
    ("idk", 0),
    ("unknown", 0),
    ("n/a", 0),
    ("rather yes", 1),
    ("somewhat yes", 1),
    ("agree", 2),
    ("strongly agree", 2),
];

const YES_SYNONYMS: &[&str] = &["y", "yes", "да!", "да.)", "ага"];
const NO_SYNONYMS: &[&str] = &["n", "no", "нет", "неа"];
const UNSURE_SYNONYMS: &[&str] = &["?", "не уверен", "неуверен", "maybe", "может быть"];

/// Normalizes a caller-supplied answer to an integer Likert value in [-2, 2].
pub fn normalize_answer(answer: &RawAnswer) -> Result<i8, ElicitationError> {
    match answer {
        RawAnswer::Int(value) => i8::try_from(*value)
            .ok()
            .filter(|v| (-2..=2).contains(v))
            .ok_or_else(|| {
                ElicitationError::InvalidAnswer(format!("numeric answer {value} outside [-2, 2]"))
            }),
        RawAnswer::Float(value) => {
            if !value.is_finite() {
                return Err(ElicitationError::InvalidAnswer(format!(
                    "non-finite answer {value}"
                )));
            }
            #[allow(clippy::cast_possible_truncation)]
            let rounded = value.clamp(-2.0, 2.0).round() as i8;
            Ok(rounded)
        }
        RawAnswer::Text(text) => lookup_phrase(text)
            .ok_or_else(|| ElicitationError::InvalidAnswer(format!("{text:?}"))),
    }
}

fn lookup_phrase(text: &str) -> Option<i8> {
    let key = text.trim().to_lowercase();
    if let Some((_, value)) = LIKERT_LEXICON.iter().find(|(phrase, _)| *phrase == key) {
        return Some(*value);
    }
    if YES_SYNONYMS.contains(&key.as_str()) {
        return Some(2);
    }
    if NO_SYNONYMS.contains(&key.as_str()) {
        return Some(-2);
    }
    if UNSURE_SYNONYMS.contains(&key.as_str()) {
        return Some(0);
    }
    None
}
