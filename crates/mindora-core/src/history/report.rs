//! CSV progress report built from the completion log.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::log::LogEntry;
use crate::error::ValidationError;

pub const REPORT_HEADER: &str = "Section,Date,Time,Detail,Duration";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportPeriod {
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "all")]
    All,
}

impl ReportPeriod {
    /// Earliest timestamp kept by this period, if any.
    pub fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ReportPeriod::Last30Days => Some(now - Duration::days(30)),
            ReportPeriod::All => None,
        }
    }
}

impl FromStr for ReportPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "30d" => Ok(ReportPeriod::Last30Days),
            "all" => Ok(ReportPeriod::All),
            other => Err(ValidationError::InvalidValue {
                field: "period".into(),
                message: format!("expected '30d' or 'all', got '{other}'"),
            }),
        }
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Render the report. Lines follow log order.
pub fn build_report_csv(entries: &[LogEntry], period: ReportPeriod, now: DateTime<Utc>) -> String {
    let cutoff = period.cutoff(now);
    let mut lines = vec![REPORT_HEADER.to_string()];
    for entry in entries {
        if cutoff.is_some_and(|c| entry.timestamp < c) {
            continue;
        }
        lines.push(format!(
            "Breathing,{},{},{},{}s",
            entry.timestamp.format("%Y-%m-%d"),
            entry.timestamp.format("%H:%M"),
            quote(&entry.session_type),
            entry.duration_seconds
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn renders_header_and_rows() {
        let entries = vec![LogEntry::at(
            "coaching-box",
            120,
            Utc.with_ymd_and_hms(2025, 6, 29, 7, 5, 0).unwrap(),
        )];
        let csv = build_report_csv(&entries, ReportPeriod::All, now());
        assert_eq!(
            csv,
            "Section,Date,Time,Detail,Duration\nBreathing,2025-06-29,07:05,\"coaching-box\",120s"
        );
    }

    #[test]
    fn last_30_days_drops_old_entries() {
        let entries = vec![
            LogEntry::at("box", 80, Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap()),
            LogEntry::at("calm", 76, Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap()),
        ];
        let csv = build_report_csv(&entries, ReportPeriod::Last30Days, now());
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("\"calm\""));
        assert!(!csv.contains("\"box\""));

        let all = build_report_csv(&entries, ReportPeriod::All, now());
        assert_eq!(all.lines().count(), 3);
    }

    #[test]
    fn quotes_are_escaped() {
        let entries = vec![LogEntry::at("my \"x\"", 10, now())];
        let csv = build_report_csv(&entries, ReportPeriod::All, now());
        assert!(csv.ends_with("\"my \"\"x\"\"\",10s"));
    }

    #[test]
    fn period_parses() {
        assert_eq!("30d".parse::<ReportPeriod>().unwrap(), ReportPeriod::Last30Days);
        assert_eq!("all".parse::<ReportPeriod>().unwrap(), ReportPeriod::All);
        assert!("week".parse::<ReportPeriod>().is_err());
    }
}
