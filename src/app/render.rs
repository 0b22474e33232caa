use std::fmt::Write;
use tastekit::core::taste::{Degradation, Ranking, StepResponse, TasteSchema};
use tastekit::sessions::SessionSummary;

pub fn questions(schema: &TasteSchema) -> String {
    let mut out = format!("◆ {}\n\n", t!("questions.title", bank = schema.name));
    for question in schema.bank().questions() {
        let weights = question
            .weights
            .iter()
            .map(|(axis, w)| format!("{axis} {w:+.1}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "  {:<4} {}", question.id, question.text);
        let _ = writeln!(out, "       {weights}");
    }
    out
}

pub fn completion(response: &StepResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\n◆ {}",
        t!("quiz.done", confidence = format!("{:.1}", response.confidence_pct))
    );
    for (axis, mu) in &response.belief_preview {
        let _ = writeln!(out, "  {axis:<20} {mu:+.2}");
    }
    out
}

pub fn ranking(ranking: &Ranking) -> String {
    let mut out = String::new();
    match &ranking.degraded {
        Some(Degradation::EmbeddingUnavailable(reason)) => {
            let _ = writeln!(out, "! {}", t!("rank.embedding_unavailable", reason = reason));
        }
        Some(Degradation::CatalogUnavailable(reason)) => {
            let _ = writeln!(out, "! {}", t!("rank.catalog_unavailable", reason = reason));
            return out;
        }
        None => {}
    }

    let _ = writeln!(out, "◆ {}: {}\n", t!("rank.query"), ranking.query);
    if ranking.items.is_empty() {
        let _ = writeln!(out, "  {}", t!("rank.empty"));
        return out;
    }
    for (i, item) in ranking.items.iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {}  ({:.3})", i + 1, item.title, item.score);
        let _ = writeln!(out, "      {}", item.explanation.join(" · "));
    }
    out
}

pub fn sessions(sessions: &[SessionSummary]) -> String {
    if sessions.is_empty() {
        return format!("{}\n", t!("sessions.none"));
    }
    let mut out = String::new();
    for session in sessions {
        let state = serde_json::to_value(session.state)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{}  {:<8}  {:>3}  {}",
            session.id, state, session.answered, session.updated_at
        );
    }
    out
}
