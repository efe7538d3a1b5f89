pub mod convert;
pub mod defaults;
pub mod duplicates;
pub mod export;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod merge;
pub mod normalize;
pub mod push;
pub mod report;
pub mod review;
pub mod sheet;
pub mod status;
pub mod tickets;
pub mod undo;

use std::path::Path;

use clap::{Parser, Subcommand, ValueEnum};

use crate::convert::{convert_json, DateFormat};
use crate::error::{Result, WeaverError};
use crate::importer::load_dataset;
use crate::models::Dataset;
use crate::session::Session;
use crate::settings::{shellexpand_path, Settings};
use crate::store::CsvWorkbook;

pub(crate) fn load_session(settings: &Settings) -> Result<Session> {
    Session::load(&settings.session_path())?.ok_or(WeaverError::NoSession)
}

/// The workbook named on the command line, else the saved default.
pub(crate) fn open_workbook(workbook: Option<&str>, settings: &Settings) -> Result<CsvWorkbook> {
    let location = workbook
        .map(str::to_string)
        .or_else(|| settings.default_workbook.clone())
        .ok_or_else(|| {
            WeaverError::Settings("no workbook given; pass --workbook or run `weaver defaults --workbook <dir>`".into())
        })?;
    CsvWorkbook::open(Path::new(&shellexpand_path(&location)))
}

/// Ticket rows from a converted file or straight from a JSON export.
pub(crate) fn load_ticket_rows(file: &str, settings: &Settings) -> Result<Dataset> {
    let path = Path::new(file);
    if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")) {
        let text = std::fs::read_to_string(path)?;
        convert_json(&text, &settings.header_template, &settings.ticket_layout.title_field)
    } else {
        load_dataset(path)
    }
}

pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Parser)]
#[command(name = "weaver", version, about = "Match, merge and reconcile tabular datasets.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DateArg {
    /// Keep exported values
    Origin,
    /// 07:05 PM
    Time,
    /// 2024-03-01 19:05
    Report,
}

impl From<DateArg> for DateFormat {
    fn from(arg: DateArg) -> Self {
        match arg {
            DateArg::Origin => DateFormat::Origin,
            DateArg::Time => DateFormat::Time,
            DateArg::Report => DateFormat::Report,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Join File B onto File A and start a review session.
    Merge {
        /// Reference file (File A), CSV or spreadsheet
        file_a: String,
        /// Incoming file (File B), CSV or spreadsheet
        file_b: String,
        /// Column to join on (default: suggested from the common headers)
        #[arg(long)]
        key: Option<String>,
        /// Keep File B rows that already carry an identity value
        #[arg(long = "keep-identified")]
        keep_identified: bool,
    },
    /// Show the current session and the last undoable change.
    Status,
    /// List unmatched rows with their best match.
    Review {
        /// Also list the File A rows available to each candidate
        #[arg(long)]
        targets: bool,
    },
    /// Choose the File A row for an unmatched File B row.
    Select {
        /// Merge-key value of the File B row
        candidate: String,
        /// Merge-key value of the File A row
        target: Option<String>,
        /// 1-based File A row number instead of a value
        #[arg(long, conflicts_with = "target")]
        row: Option<usize>,
    },
    /// Clear the selection for an unmatched File B row.
    Deselect {
        /// Merge-key value of the File B row
        candidate: String,
    },
    /// Merge every selected row into the result.
    Commit,
    /// Write the merged rows to CSV.
    Export {
        /// Output file (default: <data_dir>/Merged_Data.csv)
        #[arg(long)]
        output: Option<String>,
        /// Comma-separated columns (default: saved default headers)
        #[arg(long)]
        headers: Option<String>,
        /// Use every column of both files
        #[arg(long, conflicts_with = "headers")]
        all: bool,
    },
    /// Discard the current session.
    Reset,
    /// Show or change saved defaults.
    Defaults {
        #[arg(long = "merge-key")]
        merge_key: Option<String>,
        /// Comma-separated export columns
        #[arg(long)]
        headers: Option<String>,
        /// Workbook directory used by tickets, push and undo
        #[arg(long)]
        workbook: Option<String>,
        /// Comma-separated JSON conversion template
        #[arg(long)]
        template: Option<String>,
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Convert a ticket JSON export into template columns.
    Convert {
        /// JSON file (an object or an array of objects)
        file: String,
        /// Comma-separated template (default: saved template)
        #[arg(long)]
        template: Option<String>,
        /// How to render the date columns
        #[arg(long, value_enum, default_value = "origin")]
        dates: DateArg,
        /// Write the result to this CSV file instead of printing it
        #[arg(long)]
        output: Option<String>,
    },
    /// Copy columns of file A into file B by column letter, row by row.
    Normalize {
        /// Source file (A)
        file_a: String,
        /// File receiving the columns (B)
        file_b: String,
        /// Mappings from A to B, e.g. E:C,F:D (default: saved mappings)
        #[arg(long)]
        map: Option<String>,
        /// Remember --map for later runs
        #[arg(long, requires = "map")]
        save: bool,
        /// Output CSV (default: <data dir>/Normalized_<B>.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Daily case report from converted tickets or a JSON export.
    Report {
        /// Converted CSV/workbook, or a JSON export
        file: String,
        /// Report date, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
    /// Inspect a workbook.
    Sheet {
        #[command(subcommand)]
        command: SheetCommands,
    },
    /// Reconcile ticket status with the case sheet.
    Tickets {
        #[command(subcommand)]
        command: TicketsCommands,
    },
    /// Append new tickets to the case sheet, skipping titles already there.
    Push {
        /// Converted CSV/spreadsheet, or a JSON export
        file: String,
        #[arg(long)]
        workbook: Option<String>,
    },
    /// Reverse the last push or status update.
    Undo {
        #[arg(long)]
        workbook: Option<String>,
    },
    /// Download a shared spreadsheet's CSV export.
    #[cfg(feature = "fetch")]
    Fetch {
        /// Share link
        link: String,
        /// Output file (default: print a preview)
        #[arg(long)]
        output: Option<String>,
    },
    /// Check class lists for duplicated or missing student numbers.
    Duplicates {
        /// Spreadsheet files to check
        #[arg(required = true)]
        files: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum SheetCommands {
    /// Show a workbook's title and sheets.
    Info {
        #[arg(long)]
        workbook: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TicketsCommands {
    /// List the status changes an update would make.
    Preview {
        /// Converted CSV/spreadsheet, or a JSON export
        file: String,
        #[arg(long)]
        workbook: Option<String>,
    },
    /// Write status changes to the case sheet.
    Apply {
        /// Converted CSV/spreadsheet, or a JSON export
        file: String,
        #[arg(long)]
        workbook: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" No, ID ,,Nama"), vec!["No", "ID", "Nama"]);
    }

    #[test]
    fn test_open_workbook_requires_location() {
        let settings = Settings::default();
        assert!(matches!(open_workbook(None, &settings), Err(WeaverError::Settings(_))));
    }

    #[test]
    fn test_load_ticket_rows_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.json");
        std::fs::write(&path, r#"[{"Title": "Case #2", "Status": "open"}]"#).unwrap();
        let ds = load_ticket_rows(path.to_str().unwrap(), &Settings::default()).unwrap();
        assert_eq!(ds.rows[0].text("Status"), "L2");
        assert_eq!(ds.headers.len(), 12);
    }
}
