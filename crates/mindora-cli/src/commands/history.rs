use chrono::Utc;
use clap::Subcommand;
use mindora_core::{build_report_csv, CompletionLog, Config, ReportPeriod};

use super::open_database;

#[derive(Subcommand)]
pub enum LogAction {
    /// List completed sessions as JSON
    List {
        /// Only sessions of this exercise id
        #[arg(long)]
        session: Option<String>,
    },
    /// Session count and total seconds per exercise
    Summary,
    /// Progress report as CSV
    Report {
        /// "30d" or "all"
        #[arg(long, default_value = "all")]
        period: ReportPeriod,
    },
    /// Delete the completion log
    Clear,
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = open_database(&config)?;
    let log = CompletionLog::new(&db, config.storage.log_key.as_str());

    match action {
        LogAction::List { session } => {
            let entries = match session {
                Some(id) => log.entries_for(&id)?,
                None => log.entries()?,
            };
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        LogAction::Summary => {
            let summary = log.summary()?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        LogAction::Report { period } => {
            let entries = log.entries()?;
            println!("{}", build_report_csv(&entries, period, Utc::now()));
        }
        LogAction::Clear => {
            log.clear()?;
            println!("completion log cleared");
        }
    }
    Ok(())
}
