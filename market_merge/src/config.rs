use crate::error::{Error, Result};
use crate::models::{FileFormat, IntervalFormat};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PriceSourceConfig {
    pub subdir: String,
    /// Rows whose `Sequence` equals this value are kept.
    pub sequence: String,
    pub interval_format: IntervalFormat,
}

impl Default for PriceSourceConfig {
    fn default() -> Self {
        Self {
            subdir: "prices".to_string(),
            sequence: "Sequence Sequence 1".to_string(),
            interval_format: IntervalFormat::WithSeconds,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoadSourceConfig {
    pub subdir: String,
    pub interval_format: IntervalFormat,
}

impl Default for LoadSourceConfig {
    fn default() -> Self {
        Self {
            subdir: "consumption".to_string(),
            interval_format: IntervalFormat::WithoutSeconds,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationSourceConfig {
    pub subdir: String,
    pub interval_format: IntervalFormat,
    pub production_types: Vec<String>,
}

impl Default for GenerationSourceConfig {
    fn default() -> Self {
        Self {
            subdir: "production".to_string(),
            interval_format: IntervalFormat::WithSeconds,
            production_types: vec![
                "Solar".to_string(),
                "Wind Offshore".to_string(),
                "Wind Onshore".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub raw_data_dir: PathBuf,
    pub file_format: FileFormat,
    pub prices: PriceSourceConfig,
    pub load: LoadSourceConfig,
    pub generation: GenerationSourceConfig,
    /// Cell values meaning "not available" in the merged table.
    pub sentinels: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_data_dir: PathBuf::from("../data/raw"),
            file_format: FileFormat::Csv,
            prices: PriceSourceConfig::default(),
            load: LoadSourceConfig::default(),
            generation: GenerationSourceConfig::default(),
            sentinels: vec!["n/e".to_string(), "-".to_string()],
        }
    }
}

impl PipelineConfig {
    pub fn with_raw_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.raw_data_dir = dir.into();
        self
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load from a TOML file; missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Configuration(format!("cannot read config {}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    pub fn prices_dir(&self) -> PathBuf {
        self.raw_data_dir.join(&self.prices.subdir)
    }

    pub fn load_dir(&self) -> PathBuf {
        self.raw_data_dir.join(&self.load.subdir)
    }

    pub fn generation_dir(&self) -> PathBuf {
        self.raw_data_dir.join(&self.generation.subdir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_entsoe_exports() {
        let config = PipelineConfig::default();

        assert_eq!(config.prices.sequence, "Sequence Sequence 1");
        assert_eq!(config.prices.interval_format, IntervalFormat::WithSeconds);
        assert_eq!(config.load.interval_format, IntervalFormat::WithoutSeconds);
        assert_eq!(config.generation.production_types.len(), 3);
        assert_eq!(config.sentinels, vec!["n/e", "-"]);
        assert_eq!(config.prices_dir(), PathBuf::from("../data/raw/prices"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            raw_data_dir = "/data/raw"

            [generation]
            production_types = ["Solar", "Biomass"]
            "#,
        )
        .unwrap();

        assert_eq!(config.generation_dir(), PathBuf::from("/data/raw/production"));
        assert_eq!(config.generation.production_types, vec!["Solar", "Biomass"]);
        assert_eq!(config.generation.interval_format, IntervalFormat::WithSeconds);
        assert_eq!(config.load.subdir, "consumption");
    }

    #[test]
    fn test_interval_format_names() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [load]
            interval_format = "with_seconds"
            "#,
        )
        .unwrap();
        assert_eq!(config.load.interval_format, IntervalFormat::WithSeconds);
    }

    #[test]
    fn test_bad_toml_is_configuration_error() {
        let err = PipelineConfig::from_toml_str("file_format = \"parquet\"").unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = PipelineConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.is_configuration_error());
    }
}
