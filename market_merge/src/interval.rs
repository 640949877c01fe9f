use crate::error::{Error, ParseError, Result};
use crate::models::{Interval, IntervalFormat, END_TS_COLUMN, START_TS_COLUMN};
use crate::timestamps::datetime_series;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use polars::prelude::*;

pub const INTERVAL_SEPARATOR: &str = " - ";

fn invalid(value: &str, reason: impl Into<String>) -> ParseError {
    ParseError::InvalidInterval {
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_side(text: &str, side: &str, whole: &str, format: IntervalFormat) -> std::result::Result<DateTime<Utc>, ParseError> {
    NaiveDateTime::parse_from_str(text.trim(), format.pattern())
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| invalid(whole, format!("{} '{}' does not match {}: {}", side, text, format.pattern(), e)))
}

/// Parse an MTU string such as `"01/01/2024 00:00:00 - 01/01/2024 01:00:00"`.
///
/// Both sides are UTC wall time in the given format. The interval must be
/// non-empty (`end > start`).
pub fn parse_interval(text: &str, format: IntervalFormat) -> std::result::Result<Interval, ParseError> {
    let (start, end) = text
        .split_once(INTERVAL_SEPARATOR)
        .ok_or_else(|| invalid(text, format!("missing separator '{}'", INTERVAL_SEPARATOR)))?;

    let start = parse_side(start, "start", text, format)?;
    let end = parse_side(end, "end", text, format)?;

    if end <= start {
        return Err(invalid(text, "end does not follow start"));
    }

    Ok(Interval { start, end })
}

/// Inverse of [`parse_interval`] for the same precision.
pub fn format_interval(interval: &Interval, format: IntervalFormat) -> String {
    format!(
        "{}{}{}",
        interval.start.format(format.pattern()),
        INTERVAL_SEPARATOR,
        interval.end.format(format.pattern())
    )
}

/// Parse every row of `column` and append `start_ts_utc` / `end_ts_utc`.
///
/// Fails on the first null or malformed row; no partial frame is returned.
pub fn attach_interval_columns(df: &DataFrame, column: &str, format: IntervalFormat) -> Result<DataFrame> {
    let raw = df.column(column)?.str()?;

    let mut starts = Vec::with_capacity(df.height());
    let mut ends = Vec::with_capacity(df.height());

    for (idx, value) in raw.into_iter().enumerate() {
        let text = value.ok_or_else(|| {
            Error::from(invalid("", format!("row {} of '{}' is empty", idx, column)))
        })?;
        let interval = parse_interval(text, format)?;
        starts.push(Some(interval.start));
        ends.push(Some(interval.end));
    }

    let mut with_interval = df.clone();
    with_interval.with_column(datetime_series(START_TS_COLUMN, &starts)?)?;
    with_interval.with_column(datetime_series(END_TS_COLUMN, &ends)?)?;

    Ok(with_interval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamps::column_to_utc;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_parse_with_seconds() {
        let interval = parse_interval(
            "01/01/2024 23:00:00 - 02/01/2024 00:00:00",
            IntervalFormat::WithSeconds,
        )
        .unwrap();

        assert_eq!(interval.start, utc(2024, 1, 1, 23, 0));
        assert_eq!(interval.end, utc(2024, 1, 2, 0, 0));
    }

    #[test]
    fn test_parse_without_seconds() {
        let interval = parse_interval("15/06/2023 10:15 - 15/06/2023 10:30", IntervalFormat::WithoutSeconds).unwrap();

        assert_eq!(interval.start, utc(2023, 6, 15, 10, 15));
        assert_eq!(interval.end, utc(2023, 6, 15, 10, 30));
    }

    #[test]
    fn test_roundtrip_both_precisions() {
        for (text, format) in [
            ("31/12/2023 23:00:00 - 01/01/2024 00:00:00", IntervalFormat::WithSeconds),
            ("29/02/2024 07:45 - 29/02/2024 08:00", IntervalFormat::WithoutSeconds),
        ] {
            let interval = parse_interval(text, format).unwrap();
            assert_eq!(format_interval(&interval, format), text);
        }
    }

    #[test]
    fn test_missing_separator() {
        let err = parse_interval("01/01/2024 00:00:00", IntervalFormat::WithSeconds).unwrap_err();
        assert!(matches!(err, ParseError::InvalidInterval { .. }));
    }

    #[test]
    fn test_precision_mismatch_is_rejected() {
        assert!(parse_interval("01/01/2024 00:00 - 01/01/2024 01:00", IntervalFormat::WithSeconds).is_err());
        assert!(parse_interval("01/01/2024 00:00:00 - 01/01/2024 01:00:00", IntervalFormat::WithoutSeconds).is_err());
    }

    #[test]
    fn test_reversed_interval_is_rejected() {
        assert!(parse_interval("01/01/2024 01:00 - 01/01/2024 00:00", IntervalFormat::WithoutSeconds).is_err());
    }

    #[test]
    fn test_attach_interval_columns() {
        let df = df!(
            "MTU (UTC)" => &["01/01/2024 00:00 - 01/01/2024 01:00", "01/01/2024 01:00 - 01/01/2024 02:00"],
            "value" => &["1", "2"]
        )
        .unwrap();

        let parsed = attach_interval_columns(&df, "MTU (UTC)", IntervalFormat::WithoutSeconds).unwrap();

        assert_eq!(parsed.width(), 4);
        assert_eq!(
            column_to_utc(&parsed, START_TS_COLUMN).unwrap(),
            vec![Some(utc(2024, 1, 1, 0, 0)), Some(utc(2024, 1, 1, 1, 0))]
        );
        assert_eq!(
            column_to_utc(&parsed, END_TS_COLUMN).unwrap(),
            vec![Some(utc(2024, 1, 1, 1, 0)), Some(utc(2024, 1, 1, 2, 0))]
        );
    }

    #[test]
    fn test_attach_fails_fast_on_bad_row() {
        let df = df!("MTU (UTC)" => &["01/01/2024 00:00 - 01/01/2024 01:00", "garbage"]).unwrap();
        let err = attach_interval_columns(&df, "MTU (UTC)", IntervalFormat::WithoutSeconds).unwrap_err();
        assert!(err.is_parse_error());
    }
}
