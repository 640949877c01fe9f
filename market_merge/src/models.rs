use crate::error::ParseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Raw ENTSO-E export columns
pub const MTU_COLUMN: &str = "MTU (UTC)";
pub const SEQUENCE_COLUMN: &str = "Sequence";
pub const RAW_PRICE_COLUMN: &str = "Day-ahead Price (EUR/MWh)";
pub const RAW_LOAD_COLUMN: &str = "Actual Total Load (MW)";
pub const RAW_GENERATION_COLUMN: &str = "Generation (MW)";
pub const RAW_PRODUCTION_TYPE_COLUMN: &str = "Production Type";

// Canonical columns
pub const START_TS_COLUMN: &str = "start_ts_utc";
pub const END_TS_COLUMN: &str = "end_ts_utc";
pub const PRICE_COLUMN: &str = "da_price_eur_mwh";
pub const LOAD_COLUMN: &str = "actual_load_mw";
pub const GENERATION_COLUMN: &str = "actual_generation_mw";
pub const PRODUCTION_TYPE_COLUMN: &str = "production_type";

pub const INTERVAL_KEY: [&str; 2] = [START_TS_COLUMN, END_TS_COLUMN];

/// Half-open `[start, end)` sampling period, the join key across sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Date-time layout of one side of a `"<start> - <end>"` MTU string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalFormat {
    WithSeconds,
    WithoutSeconds,
}

impl IntervalFormat {
    pub fn pattern(&self) -> &'static str {
        match self {
            IntervalFormat::WithSeconds => "%d/%m/%Y %H:%M:%S",
            IntervalFormat::WithoutSeconds => "%d/%m/%Y %H:%M",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Xlsx => "xlsx",
        }
    }
}

impl FromStr for FileFormat {
    type Err = ParseError;

    /// Accepts an extension with or without the leading dot.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" => Ok(FileFormat::Xlsx),
            _ => Err(ParseError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Outcome of a gap check: the calendar points absent from the observed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapReport {
    pub has_gaps: bool,
    pub missing: Vec<DateTime<Utc>>,
}

impl GapReport {
    pub fn new(missing: Vec<DateTime<Utc>>) -> Self {
        Self {
            has_gaps: !missing.is_empty(),
            missing,
        }
    }

    pub fn none() -> Self {
        Self::new(Vec::new())
    }
}
