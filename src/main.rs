use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use market_merge::{
    contains_datetime_gaps, read_csv_file, save_csv, DataLoader, Frequency, GapReport, PipelineConfig,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "power_data_prep")]
#[command(about = "Merge ENTSO-E price, load and generation exports and check time series for gaps")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the raw exports and left-join them on the price intervals
    Merge {
        /// Directory holding the prices/, consumption/ and production/ folders
        #[arg(long)]
        raw_dir: Option<PathBuf>,

        /// Pipeline configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the merged table to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report gaps in start_ts_utc at this frequency (e.g. 1h, 15min)
        #[arg(short, long)]
        frequency: Option<Frequency>,
    },

    /// Check a timestamp column of a CSV file against a regular calendar
    Gaps {
        /// CSV file to check
        #[arg(short, long)]
        file: PathBuf,

        /// Timestamp column name
        #[arg(short, long, default_value = "start_ts_utc")]
        column: String,

        /// Expected sampling frequency
        #[arg(long, default_value = "1h")]
        frequency: Frequency,

        /// Output format
        #[arg(short, long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Summary,
}

fn print_report(report: &GapReport, column: &str, frequency: Frequency, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Summary => {
            println!("Gap Check: {} @ {}", column, frequency);
            println!("===================");
            if report.has_gaps {
                println!("Missing timestamps: {}", report.missing.len());
                for ts in &report.missing {
                    println!("  {}", ts.format("%Y-%m-%d %H:%M:%S UTC"));
                }
            } else {
                println!("No gaps found");
            }
        }
    }
    Ok(())
}

fn run_merge(
    raw_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    frequency: Option<Frequency>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => PipelineConfig::load(&path).with_context(|| format!("loading {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = raw_dir {
        config = config.with_raw_data_dir(dir);
    }

    let loader = DataLoader::new(config);
    info!("Merging raw data from {}", loader.config().raw_data_dir.display());

    let merged = loader.load_merged()?;

    println!("{}", merged.head(Some(5)));
    println!("Merged rows: {}", merged.height());

    if let Some(frequency) = frequency {
        let report = contains_datetime_gaps(&merged, "start_ts_utc", frequency)?;
        if report.has_gaps {
            warn!("Merged table is missing {} intervals", report.missing.len());
        }
        print_report(&report, "start_ts_utc", frequency, &OutputFormat::Summary)?;
    }

    if let Some(path) = output {
        save_csv(&merged, &path)?;
        println!("Saved merged table to {}", path.display());
    }

    Ok(())
}

fn run_gaps(file: PathBuf, column: String, frequency: Frequency, output: OutputFormat) -> Result<()> {
    let df = read_csv_file(&file).with_context(|| format!("reading {}", file.display()))?;
    info!("Checking {} rows of {} for gaps", df.height(), file.display());

    let report = contains_datetime_gaps(&df, &column, frequency)?;
    print_report(&report, &column, frequency, &output)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Merge {
            raw_dir,
            config,
            output,
            frequency,
        } => run_merge(raw_dir, config, output, frequency),
        Command::Gaps {
            file,
            column,
            frequency,
            output,
        } => run_gaps(file, column, frequency, output),
    }
}
