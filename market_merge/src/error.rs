use crate::models::Interval;
use polars::prelude::PolarsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("configuration error: {0}")]
    Configuration(String),

    /// Two generation rows share an interval and production type, so the
    /// long-to-wide reshape has no single value to place.
    #[error("duplicate entry for production type '{production_type}' in interval {interval}")]
    DuplicateEntry {
        interval: Interval,
        production_type: String,
    },

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Error::Parse(_))
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::Toml(_))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("invalid interval '{value}': {reason}")]
    InvalidInterval { value: String, reason: String },

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid frequency '{0}'")]
    InvalidFrequency(String),

    #[error("column '{column}' holds non-numeric value '{value}'")]
    InvalidNumber { column: String, value: String },

    #[error("column '{column}' has type {dtype}, expected datetimes")]
    UnsupportedColumnType { column: String, dtype: String },
}
