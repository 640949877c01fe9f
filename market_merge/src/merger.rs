use crate::error::{ParseError, Result};
use crate::models::{END_TS_COLUMN, START_TS_COLUMN};
use log::debug;
use polars::prelude::*;

fn interval_key() -> [Expr; 2] {
    [col(START_TS_COLUMN), col(END_TS_COLUMN)]
}

/// Left join prices with load and generation on the interval key.
///
/// The price table fixes the row set and order. Keys are not deduplicated: a
/// right-hand table with repeated intervals fans the result out.
pub fn merge_sources(prices: &DataFrame, load: &DataFrame, generation: &DataFrame) -> Result<DataFrame> {
    let merged = prices
        .clone()
        .lazy()
        .join(load.clone().lazy(), interval_key(), interval_key(), JoinArgs::new(JoinType::Left))
        .join(generation.clone().lazy(), interval_key(), interval_key(), JoinArgs::new(JoinType::Left))
        .sort([START_TS_COLUMN], SortMultipleOptions::default().with_maintain_order(true))
        .collect()?;

    debug!(
        "Joined {} price rows with {} load and {} generation rows into {} rows",
        prices.height(),
        load.height(),
        generation.height(),
        merged.height()
    );

    Ok(merged)
}

/// Replace sentinel cells in every text column with nulls. Surrounding
/// whitespace is ignored, as it is when the values are parsed.
pub fn normalize_sentinels(df: &DataFrame, sentinels: &[String]) -> Result<DataFrame> {
    let mut normalized = df.clone();

    for series in df.get_columns() {
        if series.dtype() != &DataType::String {
            continue;
        }

        let name = series.name().to_string();
        let cleaned: Vec<Option<&str>> = series
            .str()?
            .into_iter()
            .map(|value| value.filter(|text| !sentinels.iter().any(|s| s.as_str() == text.trim())))
            .collect();

        normalized.with_column(Series::new(name.as_str().into(), cleaned))?;
    }

    Ok(normalized)
}

/// Convert every remaining text column to `Float64`.
///
/// Blank cells become nulls; anything else that does not parse aborts.
pub fn parse_measurements(df: &DataFrame) -> Result<DataFrame> {
    let mut parsed = df.clone();

    for series in df.get_columns() {
        if series.dtype() != &DataType::String {
            continue;
        }

        let name = series.name().to_string();
        let values = series
            .str()?
            .into_iter()
            .map(|value| match value.map(str::trim) {
                None | Some("") => Ok(None),
                Some(text) => text.parse::<f64>().map(Some).map_err(|_| ParseError::InvalidNumber {
                    column: name.clone(),
                    value: text.to_string(),
                }),
            })
            .collect::<std::result::Result<Vec<Option<f64>>, ParseError>>()?;

        parsed.with_column(Series::new(name.as_str().into(), values))?;
    }

    Ok(parsed)
}

/// Sentinel normalization followed by numeric conversion, run once on the
/// merged table.
pub fn finalize_measurements(merged: &DataFrame, sentinels: &[String]) -> Result<DataFrame> {
    parse_measurements(&normalize_sentinels(merged, sentinels)?)
}
