use crate::error::{ParseError, Result};
use crate::models::GapReport;
use crate::timestamps::column_to_utc;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use once_cell::sync::Lazy;
use polars::prelude::DataFrame;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

static FREQUENCY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)?\s*([A-Za-z]+)\s*$").expect("frequency pattern is a valid regex"));

/// Fixed sampling step of a regular calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Frequency {
    step: Duration,
}

impl Frequency {
    pub fn new(step: Duration) -> std::result::Result<Self, ParseError> {
        if step <= Duration::zero() {
            return Err(ParseError::InvalidFrequency(format!("{}s", step.num_seconds())));
        }
        Ok(Self { step })
    }

    pub fn hourly() -> Self {
        Self { step: Duration::hours(1) }
    }

    pub fn quarter_hourly() -> Self {
        Self { step: Duration::minutes(15) }
    }

    pub fn as_duration(&self) -> Duration {
        self.step
    }
}

impl FromStr for Frequency {
    type Err = ParseError;

    /// Accepts a pandas-style or polars-style alias with an optional
    /// multiplier: `H`, `1h`, `15min`, `15T`, `15m`, `30s`, `D`, `500ms`.
    /// A bare `M` is refused because pandas reads it as month-end.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidFrequency(s.to_string());

        let caps = FREQUENCY_PATTERN.captures(s).ok_or_else(invalid)?;

        let count: i32 = match caps.get(1) {
            Some(m) => m.as_str().parse().map_err(|_| invalid())?,
            None => 1,
        };

        let unit = match caps.get(2).map(|m| m.as_str()) {
            Some("ms") | Some("L") => Duration::milliseconds(1),
            Some("s") | Some("S") | Some("sec") => Duration::seconds(1),
            Some("m") | Some("min") | Some("T") => Duration::minutes(1),
            Some("h") | Some("H") | Some("hr") | Some("hour") => Duration::hours(1),
            Some("d") | Some("D") | Some("day") => Duration::days(1),
            _ => return Err(invalid()),
        };

        let step = unit.checked_mul(count).ok_or_else(invalid)?;
        Frequency::new(step).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Frequency {
    type Error = ParseError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.step.num_milliseconds();
        if ms % 86_400_000 == 0 {
            write!(f, "{}d", ms / 86_400_000)
        } else if ms % 3_600_000 == 0 {
            write!(f, "{}h", ms / 3_600_000)
        } else if ms % 60_000 == 0 {
            write!(f, "{}min", ms / 60_000)
        } else if ms % 1_000 == 0 {
            write!(f, "{}s", ms / 1_000)
        } else {
            write!(f, "{}ms", ms)
        }
    }
}

fn calendar_points(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    frequency: Frequency,
) -> impl Iterator<Item = DateTime<Utc>> {
    let step = frequency.as_duration();
    std::iter::successors(Some(start), move |current| current.checked_add_signed(step))
        .take_while(move |current| *current <= end)
}

/// Every point from `start` to `end` (both inclusive) stepping by `frequency`,
/// anchored at `start`.
pub fn regular_calendar(start: DateTime<Utc>, end: DateTime<Utc>, frequency: Frequency) -> Vec<DateTime<Utc>> {
    calendar_points(start, end, frequency).collect()
}

/// Compare the observed timestamps of `column` against a regular calendar
/// spanning their own min and max.
///
/// Only interior gaps are visible: data missing before the first or after the
/// last observation cannot be detected here.
pub fn contains_datetime_gaps(df: &DataFrame, column: &str, frequency: Frequency) -> Result<GapReport> {
    let mut observed: Vec<DateTime<Utc>> = column_to_utc(df, column)?.into_iter().flatten().collect();
    observed.sort();

    let (first, last) = match (observed.first(), observed.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            debug!("Column '{}' has no timestamps, nothing to check", column);
            return Ok(GapReport::none());
        }
    };

    let present: BTreeSet<DateTime<Utc>> = observed.into_iter().collect();
    let missing: Vec<DateTime<Utc>> = calendar_points(first, last, frequency)
        .filter(|ts| !present.contains(ts))
        .collect();

    if !missing.is_empty() {
        info!(
            "Found {} gaps in '{}' at {} between {} and {}",
            missing.len(),
            column,
            frequency,
            first,
            last
        );
    }

    Ok(GapReport::new(missing))
}
