//! Command-line parsing for the call-center curve tool.
//!
//! Argument parsing and command dispatch stay separate from the pipeline code;
//! `app::config_from_args` turns these structs into pipeline configuration.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{DayOfWeek, MetricKind, SeasonalityComponent, YearMonth};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "curves", version, about = "Call-center volume and TMA curves from historical tables")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build occurrence curves from a daily table and project target months.
    Daily(DailyArgs),
    /// Forecast intrahour slots for a month, reconciled to daily totals.
    Intrahour(IntrahourArgs),
    /// Print a previously exported curve JSON.
    Show(ShowArgs),
    /// Write synthetic daily and intrahour tables.
    Demo(DemoArgs),
}

/// Options shared by the daily and intrahour commands.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Metric to build curves for.
    #[arg(long, value_enum, default_value_t = MetricKind::Volume)]
    pub metric: MetricKind,

    /// Weekdays included in curves (comma-separated). Defaults to all.
    #[arg(long, value_enum, value_delimiter = ',')]
    pub days: Vec<DayOfWeek>,

    /// IQR multiplier for outlier bounds.
    #[arg(long = "iqr-k", default_value_t = 1.5, allow_negative_numbers = true)]
    pub iqr_k: f64,

    /// Groups smaller than this are not outlier-filtered.
    #[arg(long, default_value_t = 3)]
    pub min_group: usize,

    /// Seasonal components to model (repeatable). Defaults to automatic.
    #[arg(long, value_enum)]
    pub seasonality: Vec<SeasonalityComponent>,

    /// Holiday date fed to the forecaster (repeatable).
    #[arg(long = "holiday", value_name = "YYYY-MM-DD", value_parser = parse_day)]
    pub holidays: Vec<NaiveDate>,

    /// Also treat Brazilian national holidays as holidays.
    #[arg(long)]
    pub br_holidays: bool,

    /// Add Carnival and Corpus Christi to the national holidays.
    #[arg(long, requires = "br_holidays")]
    pub br_optional_holidays: bool,

    /// Write one CSV per result table into this directory.
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct DailyArgs {
    /// Daily table (CSV with `Data` and volume/`TMA` columns).
    #[arg(long, value_name = "CSV")]
    pub input: PathBuf,

    /// Month to project (repeatable). Defaults to the month after the data.
    #[arg(long = "month", value_name = "YYYY-MM")]
    pub months: Vec<YearMonth>,

    /// Weekdays whose occurrence groups are replaced by their mean (comma-separated).
    #[arg(long, value_enum, value_delimiter = ',', default_value = "sun")]
    pub collapse: Vec<DayOfWeek>,

    /// Disable collapsing entirely.
    #[arg(long, conflicts_with = "collapse")]
    pub no_collapse: bool,

    /// Days forecast after the last observation for weekday share and monthly totals.
    #[arg(long, default_value_t = 90)]
    pub horizon_days: u32,

    /// Export the first projected month's curve (or the baseline) to JSON.
    #[arg(long = "export-curve", value_name = "JSON")]
    pub export_curve: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct IntrahourArgs {
    /// Intrahour table (CSV with `Intervalo`, `Dia`, `Volume`, `TMA`).
    #[arg(long, value_name = "CSV")]
    pub input: PathBuf,

    /// Daily table whose forecast sets each day's total.
    #[arg(long, value_name = "CSV")]
    pub daily: Option<PathBuf>,

    /// Month to forecast.
    #[arg(long, value_name = "YYYY-MM")]
    pub month: YearMonth,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Options for printing a saved curve.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Curve JSON file produced by `curves daily --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,
}

#[derive(Debug, Parser)]
pub struct DemoArgs {
    /// Output directory.
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Number of days in the daily table.
    #[arg(long, default_value_t = 365)]
    pub days: u32,

    /// First date of the daily table.
    #[arg(long, value_parser = parse_day, default_value = "2024-01-01")]
    pub start: NaiveDate,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

fn parse_day(s: &str) -> Result<NaiveDate, String> {
    crate::io::ingest::parse_date(s)
}
