use std::path::Path;

use colored::Colorize;

use crate::error::{Result, WeaverError};
use crate::importer::{drop_identified_rows, fingerprint, load_dataset};
use crate::session::{common_headers, require_id_column, suggest_merge_key, Session, SourceFile};
use crate::settings::load_settings;

pub fn run(file_a: &str, file_b: &str, key: Option<&str>, keep_identified: bool) -> Result<()> {
    let settings = load_settings();
    let reference = load_dataset(Path::new(file_a))?;
    let mut incoming = load_dataset(Path::new(file_b))?;
    require_id_column(&incoming)?;

    if !keep_identified {
        let removed = drop_identified_rows(&mut incoming, &settings.identity_field);
        if removed > 0 {
            println!(
                "Skipped {removed} File B rows that already have a {}.",
                settings.identity_field
            );
        }
    }

    let common = common_headers(&reference, &incoming);
    let merge_key = match key {
        Some(k) => k.to_string(),
        None => suggest_merge_key(
            &common,
            &settings.preferred_merge_key,
            settings.default_merge_key.as_deref(),
        )
        .ok_or(WeaverError::NoCommonColumn)?,
    };

    let mut session = Session::start(
        reference,
        incoming,
        &merge_key,
        &settings.identity_field,
        &settings.sequence_field,
    )?;
    session.sources = vec![
        SourceFile {
            path: file_a.to_string(),
            checksum: fingerprint(Path::new(file_a))?,
        },
        SourceFile {
            path: file_b.to_string(),
            checksum: fingerprint(Path::new(file_b))?,
        },
    ];
    session.save(&settings.session_path())?;

    println!("Merged on \"{merge_key}\".");
    println!("  Matched:        {}", session.matched.len());
    println!("  Unmatched:      {}", session.candidates.len());
    println!("  Auto-selected:  {}", session.selections.len());
    if !session.candidates.is_empty() {
        println!(
            "Run {} to check the suggestions, then {}.",
            "weaver review".bold(),
            "weaver commit".bold()
        );
    }
    Ok(())
}

pub fn reset() -> Result<()> {
    let settings = load_settings();
    let path = settings.session_path();
    if path.exists() {
        std::fs::remove_file(&path)?;
        println!("Session discarded.");
    } else {
        println!("No session to discard.");
    }
    Ok(())
}
