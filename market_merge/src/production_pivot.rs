use crate::error::{Error, ParseError, Result};
use crate::models::{Interval, END_TS_COLUMN, GENERATION_COLUMN, PRODUCTION_TYPE_COLUMN, START_TS_COLUMN};
use crate::timestamps::column_to_utc;
use log::debug;
use polars::prelude::*;

pub const GENERATION_PREFIX: &str = "actual_generation_mw_";

const ROW_COUNT: &str = "rows";

/// `"Wind Offshore"` -> `"actual_generation_mw_wind_offshore"`.
pub fn production_type_column(label: &str) -> String {
    format!("{}{}", GENERATION_PREFIX, label.to_lowercase().replace(' ', "_"))
}

/// Fail on the first `(interval, production_type)` pair seen more than once.
fn reject_duplicates(long: &DataFrame) -> Result<()> {
    let repeated = long
        .clone()
        .lazy()
        .group_by_stable([col(START_TS_COLUMN), col(END_TS_COLUMN), col(PRODUCTION_TYPE_COLUMN)])
        .agg([len().alias(ROW_COUNT)])
        .filter(col(ROW_COUNT).gt(lit(1)))
        .collect()?;

    if repeated.height() == 0 {
        return Ok(());
    }

    let starts = column_to_utc(&repeated, START_TS_COLUMN)?;
    let ends = column_to_utc(&repeated, END_TS_COLUMN)?;
    let label = repeated.column(PRODUCTION_TYPE_COLUMN)?.str()?.get(0);

    match (starts.first().copied().flatten(), ends.first().copied().flatten(), label) {
        (Some(start), Some(end), Some(label)) => Err(Error::DuplicateEntry {
            interval: Interval { start, end },
            production_type: label.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Reshape long `(interval, production_type, actual_generation_mw)` rows into
/// one row per interval with one column per production type.
///
/// Rows come out in interval order and type columns in label order. An
/// interval without a value for some type gets a null there. A repeated
/// `(interval, type)` pair is rejected rather than silently aggregated.
pub fn pivot_production_types(long: &DataFrame) -> Result<DataFrame> {
    let unbounded = long.column(START_TS_COLUMN)?.null_count() + long.column(END_TS_COLUMN)?.null_count();
    if unbounded > 0 {
        return Err(ParseError::InvalidInterval {
            value: String::new(),
            reason: "generation row without interval bounds".to_string(),
        }
        .into());
    }

    let labelled = long
        .clone()
        .lazy()
        .filter(col(PRODUCTION_TYPE_COLUMN).is_not_null())
        .select([
            col(START_TS_COLUMN),
            col(END_TS_COLUMN),
            col(PRODUCTION_TYPE_COLUMN),
            col(GENERATION_COLUMN).cast(DataType::String),
        ])
        .collect()?;

    reject_duplicates(&labelled)?;

    if labelled.height() == 0 {
        return Ok(labelled.select([START_TS_COLUMN, END_TS_COLUMN])?);
    }

    let wide = pivot::pivot_stable(
        &labelled,
        [PRODUCTION_TYPE_COLUMN],
        Some([START_TS_COLUMN, END_TS_COLUMN]),
        Some([GENERATION_COLUMN]),
        true,
        None,
        None,
    )?;

    let renamed: Vec<Expr> = wide
        .get_columns()
        .iter()
        .map(|series| {
            let name = series.name().to_string();
            if name == START_TS_COLUMN || name == END_TS_COLUMN {
                col(name.as_str())
            } else {
                col(name.as_str()).alias(production_type_column(&name).as_str())
            }
        })
        .collect();

    let wide = wide
        .lazy()
        .select(renamed)
        .sort(
            [START_TS_COLUMN, END_TS_COLUMN],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;

    debug!(
        "Pivoted {} generation rows into {} intervals x {} production types",
        long.height(),
        wide.height(),
        wide.width().saturating_sub(2)
    );

    Ok(wide)
}
