mod a1;
mod auto_matcher;
mod cli;
mod convert;
mod duplicates;
mod error;
mod export;
#[cfg(feature = "fetch")]
mod fetch;
mod fmt;
mod importer;
mod joiner;
mod links;
mod models;
mod normalize;
mod remap;
mod report;
mod scorer;
mod session;
mod settings;
mod store;
mod tickets;
mod undo;

use clap::Parser;

use cli::{Cli, Commands, SheetCommands, TicketsCommands};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("WEAVER_LOG", "warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Merge {
            file_a,
            file_b,
            key,
            keep_identified,
        } => cli::merge::run(&file_a, &file_b, key.as_deref(), keep_identified),
        Commands::Status => cli::status::run(),
        Commands::Review { targets } => cli::review::run(targets),
        Commands::Select {
            candidate,
            target,
            row,
        } => cli::review::select(&candidate, target.as_deref(), row),
        Commands::Deselect { candidate } => cli::review::deselect(&candidate),
        Commands::Commit => cli::review::commit(),
        Commands::Export {
            output,
            headers,
            all,
        } => cli::export::run(output.as_deref(), headers.as_deref(), all),
        Commands::Reset => cli::merge::reset(),
        Commands::Defaults {
            merge_key,
            headers,
            workbook,
            template,
            data_dir,
        } => cli::defaults::run(
            merge_key.as_deref(),
            headers.as_deref(),
            workbook.as_deref(),
            template.as_deref(),
            data_dir.as_deref(),
        ),
        Commands::Convert {
            file,
            template,
            dates,
            output,
        } => cli::convert::run(&file, template.as_deref(), dates, output.as_deref()),
        Commands::Normalize {
            file_a,
            file_b,
            map,
            save,
            output,
        } => cli::normalize::run(&file_a, &file_b, map.as_deref(), save, output.as_deref()),
        Commands::Report { file, date } => cli::report::run(&file, date),
        Commands::Sheet { command } => match command {
            SheetCommands::Info { workbook } => cli::sheet::info(workbook.as_deref()),
        },
        Commands::Tickets { command } => match command {
            TicketsCommands::Preview { file, workbook } => cli::tickets::preview(&file, workbook.as_deref()),
            TicketsCommands::Apply { file, workbook } => cli::tickets::apply(&file, workbook.as_deref()),
        },
        Commands::Push { file, workbook } => cli::push::run(&file, workbook.as_deref()),
        Commands::Undo { workbook } => cli::undo::run(workbook.as_deref()),
        #[cfg(feature = "fetch")]
        Commands::Fetch { link, output } => cli::fetch::run(&link, output.as_deref()),
        Commands::Duplicates { files } => cli::duplicates::run(&files),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
