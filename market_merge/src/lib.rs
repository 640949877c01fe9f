pub mod config;
pub mod data_loader;
pub mod error;
pub mod gap_detector;
pub mod interval;
pub mod merger;
pub mod models;
pub mod production_pivot;
pub mod timestamps;
pub mod weather;

pub use config::PipelineConfig;
pub use data_loader::{read_csv_file, read_from_dir_as_df, save_csv, DataLoader};
pub use error::{Error, ParseError, Result};
pub use gap_detector::{contains_datetime_gaps, regular_calendar, Frequency};
pub use interval::{format_interval, parse_interval};
pub use merger::merge_sources;
pub use models::{FileFormat, GapReport, Interval, IntervalFormat};
pub use weather::{collect_city_forecasts, WeatherForecastSource};
