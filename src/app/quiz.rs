use anyhow::Result;
use console::style;
use dialoguer::Select;
use tastekit::core::taste::{BeliefState, RawAnswer};
use tastekit::sessions::SessionManager;

use super::render;

/// Asks questions until the engine reports completion or runs out of
/// questions, then returns the final beliefs.
pub fn run(manager: &SessionManager, resume: Option<&str>) -> Result<BeliefState> {
    let mut response = match resume {
        Some(id) => manager.resume(id)?,
        None => manager.start()?,
    };

    println!();
    println!(
        "  {} {}",
        style(t!("quiz.title")).white().bold(),
        style(format!("({})", response.session_id)).dim()
    );
    println!();

    while let Some(question) = response.next_question.clone() {
        let choice = Select::new()
            .with_prompt(format!(
                "{} {}",
                style(format!("[{:>5.1}%]", response.confidence_pct)).cyan(),
                question.text
            ))
            .items(&question.options)
            .default(2)
            .interact()?;
        response = manager.step(&response.session_id, &question.id, &likert_value(choice))?;
    }

    print!("{}", render::completion(&response));
    Ok(manager.beliefs(&response.session_id)?)
}

/// Option index 0..=4 to its Likert value -2..=2.
fn likert_value(choice: usize) -> RawAnswer {
    let index = i64::try_from(choice).unwrap_or(2);
    RawAnswer::from(index - 2)
}
