//! Built-in question banks.
//!
//! `compact` elicits mood and format only (13 axes). `extended` covers every
//! axis, adding genre, quality, popularity, recency, audience, content type
//! and origin so the scorer's attribute adjustments have beliefs to work with.

use super::space::{AxisSpace, Question, QuestionBank, TasteSchema};
use super::types::Axis::{
    self, Arousal, Darkness, FamilyFriendly, GenreAction, GenreAnimation, GenreComedy,
    GenreCrime, GenreDocumentary, GenreDrama, GenreFantasy, GenreHorror, GenreRomance,
    GenreScifi, GenreThriller, HighQuality, Humor, MatureContent, NonEnglishOk, Novelty,
    PopularContent, PreferDomestic, PreferForeign, PreferMovies, PreferSeries, RecentContent,
    RuntimeShort, Tempo, Valence, ViolenceOk,
};
use super::types::SHORT_RUNTIME_MIN;
use super::vocabulary::Vocabulary;
use crate::error::ElicitationError;

const COMPACT_AXES: [Axis; 13] = [
    Valence,
    Arousal,
    Tempo,
    Darkness,
    Humor,
    ViolenceOk,
    Novelty,
    RuntimeShort,
    NonEnglishOk,
    GenreCrime,
    GenreScifi,
    GenreRomance,
    GenreDocumentary,
];

fn compact_questions() -> Vec<Question> {
    vec![
        Question::new(
            "q1",
            "In the mood for something light and warm?",
            [(Valence, 0.8), (Darkness, -0.6), (Humor, 0.3)],
        ),
        Question::new(
            "q2",
            "Up for slow, atmospheric storytelling?",
            [(Tempo, -0.9), (Arousal, -0.3), (Darkness, 0.2)],
        ),
        Question::new("q3", "Is humor a must tonight?", [(Humor, 0.9), (Valence, 0.3)]),
        Question::new(
            "q4",
            "Are dark or grim themes okay?",
            [(Darkness, 0.9), (Valence, -0.4), (ViolenceOk, 0.4)],
        ),
        Question::new(
            "q5",
            format!("Want to keep it to {SHORT_RUNTIME_MIN} minutes or less?"),
            [(RuntimeShort, 0.9)],
        ),
        Question::new("q6", "Ready for something unusual or experimental?", [(Novelty, 0.9)]),
        Question::new(
            "q7",
            "Comfortable with harsh or violent scenes?",
            [(ViolenceOk, 0.9), (Darkness, 0.3)],
        ),
        Question::new(
            "q8",
            "Crime or detective rather than science fiction?",
            [(GenreCrime, 0.9), (GenreScifi, -0.6)],
        ),
        Question::new("q9", "Something new rather than a classic?", [(Novelty, 0.6)]),
        Question::new("q10", "Is a non-English film fine?", [(NonEnglishOk, 0.9)]),
        Question::new(
            "q11",
            "Is a romantic comedy a yes right now?",
            [(GenreRomance, 0.9), (Darkness, -0.7), (Humor, 0.5)],
        ),
        Question::new("q12", "Documentaries okay?", [(GenreDocumentary, 0.9)]),
    ]
}

/// Mood and format only.
pub fn compact() -> Result<TasteSchema, ElicitationError> {
    TasteSchema::new(
        "compact",
        AxisSpace::new(COMPACT_AXES.to_vec())?,
        QuestionBank::new(compact_questions())?,
        Vocabulary::default(),
    )
}

/// Every axis, with genre and catalog-attribute questions on top of `compact`.
pub fn extended() -> Result<TasteSchema, ElicitationError> {
    use strum::IntoEnumIterator;

    let mut questions = compact_questions();
    // In the extended bank recency has its own axis.
    if let Some(q9) = questions.iter_mut().find(|q| q.id == "q9") {
        q9.weights = [(RecentContent, 0.9), (Novelty, 0.3)].into_iter().collect();
    }
    questions.extend([
        Question::new(
            "q13",
            "Drawn to action and adventure?",
            [(GenreAction, 0.9), (Arousal, 0.4)],
        ),
        Question::new(
            "q14",
            "Fancy a horror film or a thriller?",
            [(GenreHorror, 0.8), (GenreThriller, 0.8), (Darkness, 0.3)],
        ),
        Question::new(
            "q15",
            "Are fantasy or animation interesting?",
            [(GenreFantasy, 0.8), (GenreAnimation, 0.7)],
        ),
        Question::new(
            "q16",
            "Watching with the whole family?",
            [(FamilyFriendly, 0.9), (ViolenceOk, -0.5)],
        ),
        Question::new(
            "q17",
            "Only critically acclaimed titles?",
            [(HighQuality, 0.9)],
        ),
        Question::new(
            "q18",
            "Big crowd-pleasing blockbusters?",
            [(PopularContent, 0.9), (GenreAction, 0.2)],
        ),
        Question::new(
            "q19",
            "Ready for a serious, emotional drama?",
            [(GenreDrama, 0.9), (Valence, -0.3)],
        ),
        Question::new(
            "q20",
            "Is a straight-up comedy what you want?",
            [(GenreComedy, 0.9), (Humor, 0.4)],
        ),
        Question::new(
            "q21",
            "A feature film rather than a series?",
            [(PreferMovies, 0.9), (PreferSeries, -0.6)],
        ),
        Question::new(
            "q22",
            "Up for a series you can binge?",
            [(PreferSeries, 0.9), (PreferMovies, -0.5)],
        ),
        Question::new(
            "q23",
            "Would you pick a domestic production?",
            [(PreferDomestic, 0.9), (PreferForeign, -0.6)],
        ),
        Question::new(
            "q24",
            "Rather something produced abroad?",
            [(PreferForeign, 0.9), (PreferDomestic, -0.6), (NonEnglishOk, 0.3)],
        ),
        Question::new(
            "q25",
            "Are adult-rated titles welcome?",
            [(MatureContent, 0.9), (FamilyFriendly, -0.4), (Darkness, 0.2)],
        ),
    ]);

    TasteSchema::new(
        "extended",
        AxisSpace::new(Axis::iter().collect())?,
        QuestionBank::new(questions)?,
        Vocabulary::default(),
    )
}
