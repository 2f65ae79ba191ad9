//! Date-range reports.

use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate};
use kubecron_core::Diagnostics;
use tracing::{debug, warn};

use crate::index::{ReportFile, ReportIndex};

const HEADER_FILL: &str = "++++++++++++++++++++++++++++++++++++++++";

/// Section header put in front of every day in a range report.
pub fn day_header(date: NaiveDate) -> String {
    format!("{HEADER_FILL}=== {} ==={HEADER_FILL}\n\n\n", date.format("%Y-%m-%d"))
}

/// Common ranges, all ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePreset {
    Today,
    /// Monday of the current week through today.
    ThisWeek,
    ThisMonth,
    ThisYear,
    /// The last 200 months.
    All,
}

impl RangePreset {
    /// Inclusive `(from, to)` for `today`.
    pub fn bounds(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let from = match self {
            RangePreset::Today => today,
            RangePreset::ThisWeek => {
                today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
            }
            RangePreset::ThisMonth => today.with_day(1).unwrap_or(today),
            RangePreset::ThisYear => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
            RangePreset::All => today.checked_sub_months(Months::new(200)).unwrap_or(NaiveDate::MIN),
        };
        (from, today)
    }
}

impl FromStr for RangePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "today" => Ok(RangePreset::Today),
            "this-week" | "week" => Ok(RangePreset::ThisWeek),
            "this-month" | "month" => Ok(RangePreset::ThisMonth),
            "this-year" | "year" => Ok(RangePreset::ThisYear),
            "all" => Ok(RangePreset::All),
            other => Err(format!(
                "unknown range '{other}' (expected today, this-week, this-month, this-year or all)"
            )),
        }
    }
}

/// Aggregated content of every day file in a range.
#[derive(Debug, Default)]
pub struct RangeReport {
    pub raw: String,
    /// Files included, in output order.
    pub files: Vec<ReportFile>,
    pub diagnostics: Diagnostics,
}

/// Concatenate every indexed day file dated within `[from, to]`, newest day
/// first, each preceded by [`day_header`] and followed by a blank line.
///
/// Files whose label is not an ISO date are ignored. Days held by several
/// groups appear once per group, groups in ascending order.
pub fn range_query(index: &ReportIndex, from: NaiveDate, to: NaiveDate) -> RangeReport {
    let mut matching: Vec<(NaiveDate, &ReportFile)> = index
        .files()
        .filter_map(|f| f.date().map(|d| (d, f)))
        .filter(|(d, _)| from <= *d && *d <= to)
        .collect();
    // files() yields groups ascending; a stable sort keeps that for equal days.
    matching.sort_by(|a, b| b.0.cmp(&a.0));

    let mut report = RangeReport::default();
    for (date, file) in matching {
        match file.read() {
            Ok(content) => {
                report.raw.push_str(&day_header(date));
                report.raw.push_str(&content);
                report.raw.push('\n');
                report.files.push(file.clone());
            }
            Err(e) => {
                warn!(path = %file.path.display(), "cannot read history file: {e}");
                report.diagnostics.notify(format!("Cannot read history: {e}"));
            }
        }
    }
    debug!(%from, %to, files = report.files.len(), "range report built");
    report
}
