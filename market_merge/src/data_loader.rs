use crate::config::{GenerationSourceConfig, LoadSourceConfig, PipelineConfig, PriceSourceConfig};
use crate::error::{Error, ParseError, Result};
use crate::interval::attach_interval_columns;
use crate::merger::{finalize_measurements, merge_sources};
use crate::models::{
    FileFormat, END_TS_COLUMN, GENERATION_COLUMN, INTERVAL_KEY, LOAD_COLUMN, MTU_COLUMN, PRICE_COLUMN,
    PRODUCTION_TYPE_COLUMN, RAW_GENERATION_COLUMN, RAW_LOAD_COLUMN, RAW_PRICE_COLUMN, RAW_PRODUCTION_TYPE_COLUMN,
    SEQUENCE_COLUMN, START_TS_COLUMN,
};
use crate::production_pivot::pivot_production_types;
use glob::{glob, Pattern};
use log::{debug, info};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Read one CSV file with every column kept as text.
///
/// Sentinel strings such as `n/e` must survive until the merged table is
/// normalized, so no schema inference happens here.
pub fn read_csv_file(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    debug!("Read {} rows x {} columns from {}", df.height(), df.width(), path.display());
    Ok(df)
}

/// Read every `*.<ext>` file directly inside `dir` and stack them in path order.
pub fn read_from_dir_as_df(dir: &Path, format: FileFormat) -> Result<DataFrame> {
    if !dir.is_dir() {
        return Err(Error::Configuration(format!("Directory {} doesn't exist.", dir.display())));
    }

    if format != FileFormat::Csv {
        return Err(ParseError::UnsupportedFormat(format!(".{}", format.extension())).into());
    }

    let dir_str = dir
        .to_str()
        .ok_or_else(|| Error::Configuration(format!("Directory {} is not valid UTF-8", dir.display())))?;
    let pattern = format!("{}/*.{}", Pattern::escape(dir_str), format.extension());

    let mut files: Vec<PathBuf> = glob(&pattern)?.filter_map(|entry| entry.ok()).filter(|p| p.is_file()).collect();
    files.sort();

    if files.is_empty() {
        return Err(Error::Configuration(format!(
            "No .{} files found in {}",
            format.extension(),
            dir.display()
        )));
    }

    info!("Reading {} .{} files from {}", files.len(), format.extension(), dir.display());

    let frames = files
        .iter()
        .map(|file| read_csv_file(file).map(|df| df.lazy()))
        .collect::<Result<Vec<_>>>()?;

    let combined = concat(&frames, UnionArgs::default())?.collect()?;
    debug!("Combined {} rows from {}", combined.height(), dir.display());

    Ok(combined)
}

/// Persist a table as CSV, creating parent directories as needed.
pub fn save_csv(df: &DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut out = df.clone();
    CsvWriter::new(File::create(path)?)
        .include_header(true)
        .finish(&mut out)?;

    info!("Saved {} rows to {}", df.height(), path.display());
    Ok(())
}

fn project_sorted(df: DataFrame, columns: &[&str], sort_by: &[&str]) -> Result<DataFrame> {
    let exprs: Vec<Expr> = columns.iter().map(|c| col(*c)).collect();
    let sort_by: Vec<&str> = sort_by.to_vec();

    Ok(df
        .lazy()
        .select(exprs)
        .sort(sort_by, SortMultipleOptions::default().with_maintain_order(true))
        .collect()?)
}

/// Keep the primary sequence, rename the price and split the MTU interval.
pub fn normalize_prices(raw: DataFrame, config: &PriceSourceConfig) -> Result<DataFrame> {
    let filtered = raw
        .lazy()
        .filter(col(SEQUENCE_COLUMN).eq(lit(config.sequence.as_str())))
        .select([col(MTU_COLUMN), col(RAW_PRICE_COLUMN).alias(PRICE_COLUMN)])
        .collect()?;

    let parsed = attach_interval_columns(&filtered, MTU_COLUMN, config.interval_format)?;
    project_sorted(parsed, &[START_TS_COLUMN, END_TS_COLUMN, PRICE_COLUMN], &[START_TS_COLUMN])
}

pub fn normalize_load(raw: DataFrame, config: &LoadSourceConfig) -> Result<DataFrame> {
    let renamed = raw
        .lazy()
        .select([col(MTU_COLUMN), col(RAW_LOAD_COLUMN).alias(LOAD_COLUMN)])
        .collect()?;

    let parsed = attach_interval_columns(&renamed, MTU_COLUMN, config.interval_format)?;
    project_sorted(parsed, &[START_TS_COLUMN, END_TS_COLUMN, LOAD_COLUMN], &[START_TS_COLUMN])
}

/// Keep allow-listed production types and reshape them to one column per type.
pub fn normalize_generation(raw: DataFrame, config: &GenerationSourceConfig) -> Result<DataFrame> {
    let allowed = Series::new("allowed".into(), config.production_types.as_slice());

    let filtered = raw
        .lazy()
        .select([
            col(MTU_COLUMN),
            col(RAW_PRODUCTION_TYPE_COLUMN).alias(PRODUCTION_TYPE_COLUMN),
            col(RAW_GENERATION_COLUMN).alias(GENERATION_COLUMN),
        ])
        .filter(col(PRODUCTION_TYPE_COLUMN).is_in(lit(allowed)))
        .collect()?;

    let parsed = attach_interval_columns(&filtered, MTU_COLUMN, config.interval_format)?;
    let long = project_sorted(
        parsed,
        &[START_TS_COLUMN, END_TS_COLUMN, PRODUCTION_TYPE_COLUMN, GENERATION_COLUMN],
        &[PRODUCTION_TYPE_COLUMN, START_TS_COLUMN],
    )?;

    pivot_production_types(&long)
}

pub struct DataLoader {
    config: PipelineConfig,
}

impl DataLoader {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn load_raw_prices(&self) -> Result<DataFrame> {
        let raw = read_from_dir_as_df(&self.config.prices_dir(), self.config.file_format)?;
        let prices = normalize_prices(raw, &self.config.prices)?;
        info!("Loaded {} price intervals", prices.height());
        Ok(prices)
    }

    pub fn load_raw_consumption(&self) -> Result<DataFrame> {
        let raw = read_from_dir_as_df(&self.config.load_dir(), self.config.file_format)?;
        let load = normalize_load(raw, &self.config.load)?;
        info!("Loaded {} load intervals", load.height());
        Ok(load)
    }

    pub fn load_raw_production(&self) -> Result<DataFrame> {
        let raw = read_from_dir_as_df(&self.config.generation_dir(), self.config.file_format)?;
        let generation = normalize_generation(raw, &self.config.generation)?;
        info!(
            "Loaded {} generation intervals across {} production types",
            generation.height(),
            generation.width().saturating_sub(INTERVAL_KEY.len())
        );
        Ok(generation)
    }

    /// Load all three sources and left-join them onto the price intervals.
    pub fn load_merged(&self) -> Result<DataFrame> {
        let prices = self.load_raw_prices()?;
        let load = self.load_raw_consumption()?;
        let generation = self.load_raw_production()?;

        let merged = merge_sources(&prices, &load, &generation)?;
        let merged = finalize_measurements(&merged, &self.config.sentinels)?;

        info!("Merged table has {} rows and {} columns", merged.height(), merged.width());
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamps::column_to_utc;
    use chrono::{TimeZone, Utc};

    fn price_frame() -> DataFrame {
        df!(
            "MTU (UTC)" => &[
                "01/01/2024 01:00:00 - 01/01/2024 02:00:00",
                "01/01/2024 00:00:00 - 01/01/2024 01:00:00",
                "01/01/2024 00:00:00 - 01/01/2024 01:00:00",
            ],
            "Sequence" => &["Sequence Sequence 1", "Sequence Sequence 1", "Sequence Sequence 2"],
            "Day-ahead Price (EUR/MWh)" => &["80.5", "n/e", "99.0"]
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_prices_filters_and_sorts() {
        let prices = normalize_prices(price_frame(), &PriceSourceConfig::default()).unwrap();

        assert_eq!(prices.height(), 2);
        assert_eq!(
            column_to_utc(&prices, START_TS_COLUMN).unwrap(),
            vec![
                Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                Some(Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap()),
            ]
        );

        let values: Vec<Option<&str>> = prices.column(PRICE_COLUMN).unwrap().str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("n/e"), Some("80.5")]);
    }

    #[test]
    fn test_normalize_load_uses_minute_precision() {
        let raw = df!(
            "MTU (UTC)" => &["01/01/2024 00:00 - 01/01/2024 01:00"],
            "Actual Total Load (MW)" => &["41000"]
        )
        .unwrap();

        let load = normalize_load(raw, &LoadSourceConfig::default()).unwrap();
        assert_eq!(load.width(), 3);
        assert_eq!(load.column(LOAD_COLUMN).unwrap().str().unwrap().get(0), Some("41000"));
    }

    #[test]
    fn test_normalize_load_rejects_seconds_layout() {
        let raw = df!(
            "MTU (UTC)" => &["01/01/2024 00:00:00 - 01/01/2024 01:00:00"],
            "Actual Total Load (MW)" => &["41000"]
        )
        .unwrap();

        assert!(normalize_load(raw, &LoadSourceConfig::default()).unwrap_err().is_parse_error());
    }

    #[test]
    fn test_normalize_generation_keeps_allow_list() {
        let raw = df!(
            "MTU (UTC)" => &[
                "01/01/2024 00:00:00 - 01/01/2024 01:00:00",
                "01/01/2024 00:00:00 - 01/01/2024 01:00:00",
                "01/01/2024 00:00:00 - 01/01/2024 01:00:00",
            ],
            "Production Type" => &["Solar", "Fossil Gas", "Wind Onshore"],
            "Generation (MW)" => &["0", "5000", "12000"]
        )
        .unwrap();

        let generation = normalize_generation(raw, &GenerationSourceConfig::default()).unwrap();
        let names: Vec<String> = generation.get_columns().iter().map(|s| s.name().to_string()).collect();

        assert_eq!(
            names,
            vec![
                "start_ts_utc",
                "end_ts_utc",
                "actual_generation_mw_solar",
                "actual_generation_mw_wind_onshore",
            ]
        );
        assert_eq!(generation.height(), 1);
    }

    #[test]
    fn test_loader_keeps_raw_data_dir() {
        let loader = DataLoader::new(PipelineConfig::default().with_raw_data_dir("/data/entsoe"));

        assert_eq!(loader.config().raw_data_dir, Path::new("/data/entsoe"));
        assert_eq!(loader.config().prices_dir(), Path::new("/data/entsoe/prices"));
    }

    #[test]
    fn test_missing_directory_is_configuration_error() {
        let err = read_from_dir_as_df(Path::new("/no/such/raw/dir"), FileFormat::Csv).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_xlsx_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_from_dir_as_df(dir.path(), FileFormat::Xlsx).unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_empty_directory_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_from_dir_as_df(dir.path(), FileFormat::Csv).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_read_from_dir_stacks_files_as_text() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), "x,y\n1,n/e\n").unwrap();
        fs::write(dir.path().join("b.csv"), "x,y\n2,3.5\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let df = read_from_dir_as_df(dir.path(), FileFormat::Csv).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.column("x").unwrap().dtype(), &DataType::String);
        let ys: Vec<Option<&str>> = df.column("y").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(ys, vec![Some("n/e"), Some("3.5")]);
    }
}
