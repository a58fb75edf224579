//! Reporting periods and period bucket labels.

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Granularity of a report window or trend bucket.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
        }
    }

    /// Parses a query value, falling back to `Month` for missing or unknown input.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse::<Period>().ok())
            .unwrap_or_default()
    }

    /// Start of the trailing report window ending at `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let months_back = match self {
            Period::Week => return now - Duration::days(7),
            Period::Month => 1,
            Period::Quarter => 3,
            Period::Year => 12,
        };
        now.checked_sub_months(Months::new(months_back))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Number of buckets of this size in a year; weeks wrap at 52.
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Period::Week => 52,
            Period::Month => 12,
            Period::Quarter => 4,
            Period::Year => 1,
        }
    }

    /// Bucket label for a timestamp. Weeks use ISO week numbering.
    pub fn label_for(&self, at: DateTime<Utc>) -> PeriodLabel {
        match self {
            Period::Week => {
                let iso = at.iso_week();
                PeriodLabel::new(Period::Week, iso.year(), iso.week())
            }
            Period::Month => PeriodLabel::new(Period::Month, at.year(), at.month()),
            Period::Quarter => PeriodLabel::new(Period::Quarter, at.year(), at.month0() / 3 + 1),
            Period::Year => PeriodLabel::new(Period::Year, at.year(), 0),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "quarter" => Ok(Period::Quarter),
            "year" => Ok(Period::Year),
            _ => Err(format!("Invalid period: {}", s)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid period label: {0}")]
pub struct PeriodLabelError(pub String);

/// A bucket label such as `2024-W7`, `2024-3`, `2024-Q2` or `2024`.
///
/// Components are never zero-padded. Labels order chronologically within a
/// granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodLabel {
    pub period: Period,
    pub year: i32,
    /// Week, month or quarter number; zero for yearly labels.
    pub index: u32,
}

impl PeriodLabel {
    pub fn new(period: Period, year: i32, index: u32) -> Self {
        Self {
            period,
            year,
            index,
        }
    }

    /// The label `increment` buckets later, rolling over into following years.
    ///
    /// Weeks roll over past 52 regardless of the year's ISO week count, so
    /// `2026-W53` advances to `2027-W2` and `2026-W52` to `2027-W1`.
    pub fn advance(&self, increment: u32) -> PeriodLabel {
        if self.period == Period::Year {
            return PeriodLabel::new(Period::Year, self.year + increment as i32, 0);
        }

        let span = self.period.periods_per_year();
        let n = self.index + increment;
        PeriodLabel::new(
            self.period,
            self.year + ((n - 1) / span) as i32,
            (n - 1) % span + 1,
        )
    }
}

impl std::fmt::Display for PeriodLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.period {
            Period::Week => write!(f, "{}-W{}", self.year, self.index),
            Period::Month => write!(f, "{}-{}", self.year, self.index),
            Period::Quarter => write!(f, "{}-Q{}", self.year, self.index),
            Period::Year => write!(f, "{}", self.year),
        }
    }
}

impl FromStr for PeriodLabel {
    type Err = PeriodLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PeriodLabelError(s.to_string());
        let parse_parts = |year: &str, index: &str| -> Result<(i32, u32), PeriodLabelError> {
            let year = year.parse::<i32>().map_err(|_| invalid())?;
            let index = index.parse::<u32>().map_err(|_| invalid())?;
            Ok((year, index))
        };

        let (period, year, index) = if let Some((year, week)) = s.split_once("-W") {
            let (y, w) = parse_parts(year, week)?;
            (Period::Week, y, w)
        } else if let Some((year, quarter)) = s.split_once("-Q") {
            let (y, q) = parse_parts(year, quarter)?;
            (Period::Quarter, y, q)
        } else if let Some((year, month)) = s.split_once('-') {
            let (y, m) = parse_parts(year, month)?;
            (Period::Month, y, m)
        } else {
            let y = s.parse::<i32>().map_err(|_| invalid())?;
            (Period::Year, y, 0)
        };

        let max_index = match period {
            Period::Week => 53,
            Period::Month => 12,
            Period::Quarter => 4,
            Period::Year => 0,
        };
        if period != Period::Year && (index == 0 || index > max_index) {
            return Err(invalid());
        }

        Ok(PeriodLabel::new(period, year, index))
    }
}

impl TryFrom<String> for PeriodLabel {
    type Error = PeriodLabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PeriodLabel> for String {
    fn from(label: PeriodLabel) -> Self {
        label.to_string()
    }
}

/// Increments a textual period label. See [`PeriodLabel::advance`].
pub fn next_period(label: &str, increment: u32) -> Result<String, PeriodLabelError> {
    Ok(label.parse::<PeriodLabel>()?.advance(increment).to_string())
}
