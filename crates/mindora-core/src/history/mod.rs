mod log;
mod report;

pub use log::{CompletionLog, LogEntry, SessionSummary, DEFAULT_LOG_KEY};
pub use report::{build_report_csv, ReportPeriod, REPORT_HEADER};
