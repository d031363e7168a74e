//! Month-sized query windows for listing events
use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Half-open UTC interval `[start, end)` covering one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl QueryWindow {
    /// Build the window for `month` of `year`. December rolls over into
    /// January of the following year.
    pub fn for_month(year: i32, month: i32) -> Result<Self> {
        let month = u32::try_from(month)
            .ok()
            .filter(|m| (1..=12).contains(m))
            .ok_or_else(|| anyhow!("month must be between 1 and 12, got {}", month))?;

        let (next_year, next_month) = if month == 12 {
            let next_year = year
                .checked_add(1)
                .ok_or_else(|| anyhow!("year {} is out of range", year))?;
            (next_year, 1)
        } else {
            (year, month + 1)
        };

        let start = first_instant(year, month)?;
        let end = first_instant(next_year, next_month)?;

        Ok(Self { start, end })
    }

    /// Lower bound formatted for the provider, e.g. `2024-02-01T00:00:00Z`
    pub fn time_min(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Upper bound (exclusive) formatted for the provider
    pub fn time_max(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

fn first_instant(year: i32, month: u32) -> Result<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| anyhow!("year {} is out of range", year))
}
