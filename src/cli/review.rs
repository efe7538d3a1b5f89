use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::load_session;
use crate::error::{Result, WeaverError};
use crate::fmt::{score_label, truncate};
use crate::session::{CandidateState, Session};
use crate::settings::load_settings;

fn reference_label(session: &Session, index: usize) -> String {
    session
        .reference
        .rows
        .get(index)
        .map(|row| format!("{} (row {})", row.text(&session.key_a), index + 1))
        .unwrap_or_default()
}

pub fn run(targets: bool) -> Result<()> {
    let settings = load_settings();
    let session = load_session(&settings)?;

    if session.candidates.is_empty() {
        println!("No unmatched rows. {} rows merged.", session.matched.len());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        format!("File B {}", session.key_b),
        "Best match".to_string(),
        "Score".to_string(),
        "Selected".to_string(),
    ]);
    for candidate in &session.candidates {
        let key = session.candidate_key(candidate);
        let best = candidate
            .best_match
            .map(|i| reference_label(&session, i))
            .unwrap_or_else(|| "-".to_string());
        let selected = session
            .selection(&key)
            .map(|i| reference_label(&session, i))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(truncate(&key, 40)),
            Cell::new(truncate(&best, 40)),
            Cell::new(score_label(candidate.score)),
            Cell::new(selected),
        ]);
    }
    println!("Unmatched rows ({})\n{table}", session.candidates.len());

    if targets {
        for candidate in &session.candidates {
            let key = session.candidate_key(candidate);
            let names: Vec<String> = session
                .available_targets(&key)
                .into_iter()
                .map(|i| reference_label(&session, i))
                .collect();
            println!("\n{}: {}", key.bold(), names.join(", "));
        }
    }

    println!(
        "\n{} selected. Use `weaver select <name> <match>` to choose, `weaver commit` to merge.",
        session.selections.len()
    );
    Ok(())
}

pub fn select(candidate: &str, target: Option<&str>, row: Option<usize>) -> Result<()> {
    let settings = load_settings();
    let mut session = load_session(&settings)?;

    let index = match (target, row) {
        (_, Some(n)) => n
            .checked_sub(1)
            .ok_or_else(|| WeaverError::UnknownTarget(format!("row {n}")))?,
        (Some(value), None) => session
            .find_target(value)
            .ok_or_else(|| WeaverError::UnknownTarget(value.to_string()))?,
        (None, None) => session
            .find_candidate(candidate)
            .ok_or_else(|| WeaverError::UnknownCandidate(candidate.to_string()))?
            .best_match
            .ok_or_else(|| WeaverError::UnknownTarget("no suggested match".to_string()))?,
    };

    session.select(candidate, index)?;
    session.save(&settings.session_path())?;
    println!("Selected {} for {candidate}.", reference_label(&session, index));
    Ok(())
}

pub fn deselect(candidate: &str) -> Result<()> {
    let settings = load_settings();
    let mut session = load_session(&settings)?;
    match session.state(candidate) {
        None => return Err(WeaverError::UnknownCandidate(candidate.to_string())),
        Some(CandidateState::Committed) => println!("{candidate} is already merged."),
        Some(CandidateState::Unresolved) => println!("{candidate} has no selection."),
        Some(CandidateState::Selected(_)) => {
            session.deselect(candidate);
            session.save(&settings.session_path())?;
            println!("Cleared the selection for {candidate}.");
        }
    }
    Ok(())
}

pub fn commit() -> Result<()> {
    let settings = load_settings();
    let mut session = load_session(&settings)?;
    let count = session.commit_all();
    if count == 0 {
        println!("Nothing selected; no changes.");
        return Ok(());
    }
    session.save(&settings.session_path())?;
    println!(
        "Committed {count} rows. {} merged, {} still unmatched.",
        session.matched.len(),
        session.candidates.len()
    );
    Ok(())
}
