//! UTC coercion for timestamp columns.
//!
//! Every timestamp leaving this module is a UTC instant. Naive inputs, whether
//! naive polars datetimes or strings without an offset, are read as UTC wall
//! time; offset-carrying inputs are converted.

use crate::error::{Error, ParseError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use polars::prelude::*;

pub const UTC_ZONE: &str = "UTC";

const MILLIS_PER_DAY: i64 = 86_400_000;

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// The dtype every parsed timestamp column is stored with.
pub fn utc_datetime_dtype() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, Some(UTC_ZONE.into()))
}

/// Build a tz-aware UTC datetime series.
pub fn datetime_series(name: &str, values: &[Option<DateTime<Utc>>]) -> Result<Series> {
    let millis: Vec<Option<i64>> = values
        .iter()
        .map(|value| value.map(|ts| ts.timestamp_millis()))
        .collect();

    Ok(Series::new(name.into(), millis).cast(&utc_datetime_dtype())?)
}

/// Parse a single timestamp string into a UTC instant.
pub fn parse_timestamp(value: &str) -> std::result::Result<DateTime<Utc>, ParseError> {
    let trimmed = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(trimmed, format) {
            return Ok(ts.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }

    Err(ParseError::InvalidTimestamp {
        value: value.to_string(),
        reason: "not a recognised date-time layout".to_string(),
    })
}

fn from_physical(raw: i64, unit: TimeUnit) -> Result<DateTime<Utc>> {
    let (secs, nanos) = match unit {
        TimeUnit::Nanoseconds => (raw.div_euclid(1_000_000_000), raw.rem_euclid(1_000_000_000)),
        TimeUnit::Microseconds => (raw.div_euclid(1_000_000), raw.rem_euclid(1_000_000) * 1_000),
        TimeUnit::Milliseconds => (raw.div_euclid(1_000), raw.rem_euclid(1_000) * 1_000_000),
    };

    DateTime::from_timestamp(secs, nanos as u32).ok_or_else(|| {
        Error::from(ParseError::InvalidTimestamp {
            value: raw.to_string(),
            reason: "out of range".to_string(),
        })
    })
}

/// Read a column as UTC instants. Nulls stay `None`.
///
/// Zoned datetimes already store UTC epoch values, so only the unit matters.
/// Dates become midnight UTC.
pub fn column_to_utc(df: &DataFrame, column: &str) -> Result<Vec<Option<DateTime<Utc>>>> {
    let series = df.column(column)?;

    match series.dtype() {
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let physical: &Int64Chunked = series.datetime()?;
            physical
                .into_iter()
                .map(|value| value.map(|raw| from_physical(raw, unit)).transpose())
                .collect()
        }
        DataType::Date => {
            let days: &Int32Chunked = series.date()?;
            days.into_iter()
                .map(|value| {
                    value
                        .map(|day| from_physical(i64::from(day) * MILLIS_PER_DAY, TimeUnit::Milliseconds))
                        .transpose()
                })
                .collect()
        }
        DataType::String => series
            .str()?
            .into_iter()
            .map(|value| value.map(parse_timestamp).transpose().map_err(Error::from))
            .collect(),
        other => Err(ParseError::UnsupportedColumnType {
            column: column.to_string(),
            dtype: other.to_string(),
        }
        .into()),
    }
}

/// Replace `column` with its UTC datetime rendition.
pub fn coerce_column_to_utc(df: &DataFrame, column: &str) -> Result<DataFrame> {
    let values = column_to_utc(df, column)?;
    let mut coerced = df.clone();
    coerced.with_column(datetime_series(column, &values)?)?;
    Ok(coerced)
}
