//! Per-city weather forecast collection.
//!
//! The forecast provider itself sits behind [`WeatherForecastSource`]; an
//! implementation owns its own HTTP, caching and retry policy. This module
//! only fans requests out over a city list and assembles one table.

use crate::error::{Error, Result};
use crate::timestamps::coerce_column_to_utc;
use chrono::NaiveDate;
use log::info;
use polars::prelude::*;

pub const DATETIME_COLUMN: &str = "datetime_utc";
pub const CITY_COLUMN: &str = "city";

const HISTORY_START: NaiveDate = match NaiveDate::from_ymd_opt(2023, 1, 1) {
    Some(date) => date,
    None => panic!("invalid history start"),
};

const HISTORY_END: NaiveDate = match NaiveDate::from_ymd_opt(2025, 6, 13) {
    Some(date) => date,
    None => panic!("invalid history end"),
};

/// Hourly variables requested for every coordinate.
pub const WEATHER_VARIABLES: [&str; 23] = [
    "temperature_2m",
    "dew_point_2m",
    "relative_humidity_2m",
    "rain",
    "showers",
    "snowfall",
    "snow_depth",
    "cloud_cover",
    "cloud_cover_low",
    "cloud_cover_mid",
    "cloud_cover_high",
    "wind_speed_10m",
    "wind_speed_120m",
    "wind_speed_80m",
    "wind_speed_180m",
    "wind_direction_10m",
    "wind_direction_80m",
    "wind_direction_180m",
    "wind_direction_120m",
    "wind_gusts_10m",
    "direct_radiation",
    "diffuse_radiation",
    "shortwave_radiation",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub name: String,
    pub coordinate: Coordinate,
}

impl City {
    pub fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            coordinate: Coordinate { latitude, longitude },
        }
    }
}

/// Ten large German cities spread across the bidding zone.
pub fn default_cities() -> Vec<City> {
    vec![
        City::new("Berlin", 52.5200, 13.4050),
        City::new("Hamburg", 53.5511, 9.9937),
        City::new("Munich", 48.1351, 11.5820),
        City::new("Cologne", 50.9375, 6.9603),
        City::new("Frankfurt", 50.1109, 8.6821),
        City::new("Leipzig", 51.3397, 12.3731),
        City::new("Stuttgart", 48.7758, 9.1829),
        City::new("Kiel", 54.3233, 10.1228),
        City::new("Nuremberg", 49.4521, 11.0767),
        City::new("Freiburg", 47.9990, 7.8421),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub coordinate: Coordinate,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub variables: Vec<String>,
    pub model: String,
}

impl ForecastRequest {
    /// Historical-forecast window used for the market dataset.
    pub fn historical(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            start_date: HISTORY_START,
            end_date: HISTORY_END,
            variables: WEATHER_VARIABLES.iter().map(|v| v.to_string()).collect(),
            model: "icon_seamless".to_string(),
        }
    }

    pub fn at(&self, coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            ..self.clone()
        }
    }
}

/// A provider of hourly forecasts for one coordinate.
///
/// Implementations return a table with a `datetime_utc` column plus one
/// numeric column per requested variable.
pub trait WeatherForecastSource {
    fn fetch(&self, request: &ForecastRequest) -> Result<DataFrame>;
}

/// Fetch every city, tag rows with the city name and stack the results
/// sorted by `city`, `datetime_utc`.
pub fn collect_city_forecasts<S: WeatherForecastSource>(
    source: &S,
    cities: &[City],
    template: &ForecastRequest,
) -> Result<DataFrame> {
    if cities.is_empty() {
        return Err(Error::Configuration("no cities to fetch forecasts for".to_string()));
    }

    let mut frames = Vec::with_capacity(cities.len());

    for city in cities {
        let forecast = source.fetch(&template.at(city.coordinate))?;
        let mut forecast = coerce_column_to_utc(&forecast, DATETIME_COLUMN)?;

        let names = vec![city.name.as_str(); forecast.height()];
        forecast.with_column(Series::new(CITY_COLUMN.into(), names))?;

        info!("Fetched {} forecast rows for {}", forecast.height(), city.name);
        frames.push(forecast.lazy());
    }

    Ok(concat(&frames, UnionArgs::default())?
        .sort([CITY_COLUMN, DATETIME_COLUMN], SortMultipleOptions::default().with_maintain_order(true))
        .collect()?)
}
