use chrono::{DateTime, Duration, TimeZone, Utc};
use market_merge::timestamps::datetime_series;
use market_merge::{contains_datetime_gaps, Frequency};
use polars::prelude::DataFrame;

fn main() {
    // Hourly day-ahead intervals for one day with two hours missing
    let base = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
    let observed: Vec<Option<DateTime<Utc>>> = (0..24)
        .filter(|hour| *hour != 3 && *hour != 17)
        .map(|hour| Some(base + Duration::hours(hour)))
        .collect();

    let df = DataFrame::new(vec![datetime_series("start_ts_utc", &observed).unwrap()]).unwrap();
    let report = contains_datetime_gaps(&df, "start_ts_utc", Frequency::hourly()).unwrap();

    println!("Gap Report");
    println!("==========");
    println!("Rows: {}", df.height());
    println!("Has gaps: {}", report.has_gaps);
    for ts in &report.missing {
        println!("  missing {}", ts.format("%Y-%m-%d %H:%M"));
    }
}
