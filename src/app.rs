//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds the pipeline configuration
//! - runs the daily or intrahour pipeline
//! - prints reports and writes optional exports

use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::path::Path;

use chrono::NaiveDate;
use clap::Parser;

use crate::cli::{Command, CommonArgs, DailyArgs, DemoArgs, IntrahourArgs, ShowArgs};
use crate::data::{DemoConfig, generate_demo, write_demo};
use crate::domain::{
    DayOfWeek, IntrahourConfig, OutlierPolicy, RunConfig, Seasonality, SeasonalityChoice,
};
use crate::error::AppError;
use crate::forecast::{SeasonalForecaster, br_national_holidays, br_optional_holidays};
use crate::io::curve::{curve_file, read_curve_json, write_curve_json};
use crate::io::export::{
    ExportNames, ensure_export_dir, write_comparison_csv, write_curve_csv, write_monthly_csv, write_series_csv,
};

pub mod pipeline;

use pipeline::{DailyRun, IntrahourRun};

/// Years expanded when `--br-holidays` is given.
const BR_HOLIDAY_YEARS: RangeInclusive<i32> = 2000..=2050;

/// Entry point for the `curves` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Daily(args) => handle_daily(args),
        Command::Intrahour(args) => handle_intrahour(args),
        Command::Show(args) => handle_show(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_daily(args: DailyArgs) -> Result<(), AppError> {
    let config = config_from_args(&args)?;
    let forecaster = SeasonalForecaster::new(config.holidays.iter().copied());
    let run = pipeline::run_daily(&config, &forecaster)?;

    println!("{}", crate::report::format_daily_run(&run, &config));

    if let Some(dir) = &config.export_dir {
        export_daily(dir, &run)?;
        log::info!("exported daily sheets to '{}'", dir.display());
    }
    if let Some(path) = &config.export_curve {
        let file = match run.periods.first() {
            Some(period) => curve_file(&period.curve, Some(period.month), Some(period.source)),
            None => curve_file(&run.baseline, None, None),
        };
        write_curve_json(path, &file)?;
    }

    Ok(())
}

fn handle_intrahour(args: IntrahourArgs) -> Result<(), AppError> {
    let config = intrahour_config_from_args(&args)?;
    let forecaster = SeasonalForecaster::new(config.holidays.iter().copied());
    let run = pipeline::run_intrahour(&config, &forecaster)?;

    println!("{}", crate::report::format_intrahour_run(&run));

    if let Some(dir) = &config.export_dir {
        export_intrahour(dir, &run)?;
        log::info!("exported intrahour sheets to '{}'", dir.display());
    }
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let curve = read_curve_json(&args.curve)?;
    println!("{}", crate::report::format_curve_file(&curve));
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = DemoConfig {
        start: args.start,
        days: args.days,
        seed: args.seed,
        ..DemoConfig::default()
    };
    let data = generate_demo(&config)?;
    let (daily, intrahour) = write_demo(&args.out, &data)?;
    println!("Wrote {} ({} rows)", daily.display(), data.daily.rows.len());
    println!("Wrote {} ({} rows)", intrahour.display(), data.intrahour.rows.len());
    Ok(())
}

fn export_daily(dir: &Path, run: &DailyRun) -> Result<(), AppError> {
    let metric = run.metric;
    ensure_export_dir(dir)?;
    write_curve_csv(&dir.join(ExportNames::baseline(metric)), &run.baseline)?;
    for period in &run.periods {
        let month = period.month;
        write_curve_csv(&dir.join(ExportNames::period(month, metric)), &period.curve)?;
        write_comparison_csv(
            &dir.join(ExportNames::comparison(month, metric)),
            &period.comparison,
            "baseline",
            &month.to_string(),
        )?;
    }
    if let Some(weekday) = &run.weekday {
        write_curve_csv(&dir.join(ExportNames::weekday(metric)), weekday)?;
    }
    if !run.monthly.is_empty() {
        write_monthly_csv(&dir.join(ExportNames::monthly(metric)), &run.monthly)?;
    }
    Ok(())
}

fn export_intrahour(dir: &Path, run: &IntrahourRun) -> Result<(), AppError> {
    ensure_export_dir(dir)?;
    write_curve_csv(&dir.join(ExportNames::intrahour(run.month, run.metric)), &run.curve)?;
    write_series_csv(&dir.join(ExportNames::intrahour_series(run.month, run.metric)), &run.reconciled)?;
    Ok(())
}

/// Build the daily pipeline configuration from CLI flags.
pub fn config_from_args(args: &DailyArgs) -> Result<RunConfig, AppError> {
    let collapse_weekdays = if args.no_collapse {
        BTreeSet::new()
    } else {
        args.collapse.iter().copied().collect()
    };
    Ok(RunConfig {
        input: args.input.clone(),
        metric: args.common.metric,
        enabled_weekdays: enabled_weekdays(&args.common),
        projection_months: args.months.clone(),
        seasonality: seasonality_choice(&args.common),
        collapse_weekdays,
        outliers: outlier_policy(&args.common)?,
        holidays: holidays(&args.common),
        horizon_days: args.horizon_days,
        export_dir: args.common.export_dir.clone(),
        export_curve: args.export_curve.clone(),
    })
}

/// Build the intrahour pipeline configuration from CLI flags.
pub fn intrahour_config_from_args(args: &IntrahourArgs) -> Result<IntrahourConfig, AppError> {
    Ok(IntrahourConfig {
        input: args.input.clone(),
        daily_input: args.daily.clone(),
        metric: args.common.metric,
        month: args.month,
        enabled_weekdays: enabled_weekdays(&args.common),
        seasonality: seasonality_choice(&args.common),
        outliers: outlier_policy(&args.common)?,
        holidays: holidays(&args.common),
        export_dir: args.common.export_dir.clone(),
    })
}

fn enabled_weekdays(common: &CommonArgs) -> BTreeSet<DayOfWeek> {
    if common.days.is_empty() {
        DayOfWeek::all_set()
    } else {
        common.days.iter().copied().collect()
    }
}

fn seasonality_choice(common: &CommonArgs) -> SeasonalityChoice {
    if common.seasonality.is_empty() {
        SeasonalityChoice::Auto
    } else {
        SeasonalityChoice::Fixed(Seasonality::from_components(&common.seasonality))
    }
}

fn outlier_policy(common: &CommonArgs) -> Result<OutlierPolicy, AppError> {
    if !(common.iqr_k.is_finite() && common.iqr_k >= 0.0) {
        return Err(AppError::new(2, "--iqr-k must be a finite number >= 0."));
    }
    if common.min_group == 0 {
        return Err(AppError::new(2, "--min-group must be >= 1."));
    }
    Ok(OutlierPolicy {
        iqr_multiplier: common.iqr_k,
        min_group_size: common.min_group,
    })
}

fn holidays(common: &CommonArgs) -> Vec<NaiveDate> {
    let mut out: BTreeSet<NaiveDate> = common.holidays.iter().copied().collect();
    if common.br_holidays {
        out.extend(br_national_holidays(*BR_HOLIDAY_YEARS.start(), *BR_HOLIDAY_YEARS.end()));
    }
    if common.br_optional_holidays {
        out.extend(br_optional_holidays(*BR_HOLIDAY_YEARS.start(), *BR_HOLIDAY_YEARS.end()));
    }
    out.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::{MetricKind, YearMonth};

    fn daily_args(extra: &[&str]) -> DailyArgs {
        let mut argv = vec!["curves", "daily", "--input", "d.csv"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Daily(args) => args,
            other => panic!("expected daily, got {other:?}"),
        }
    }

    #[test]
    fn defaults_match_run_config_defaults() {
        let config = config_from_args(&daily_args(&[])).unwrap();
        let defaults = RunConfig::default();
        assert_eq!(config.enabled_weekdays, defaults.enabled_weekdays);
        assert_eq!(config.collapse_weekdays, defaults.collapse_weekdays);
        assert_eq!(config.outliers, defaults.outliers);
        assert_eq!(config.seasonality, SeasonalityChoice::Auto);
        assert_eq!(config.horizon_days, defaults.horizon_days);
        assert!(config.holidays.is_empty());
    }

    #[test]
    fn flags_flow_into_config() {
        let config = config_from_args(&daily_args(&[
            "--metric",
            "aht",
            "--days",
            "mon,fri",
            "--no-collapse",
            "--seasonality",
            "yearly",
            "--month",
            "2024/07",
            "--br-holidays",
            "--holiday",
            "2024-06-13",
        ]))
        .unwrap();
        assert_eq!(config.metric, MetricKind::Aht);
        assert_eq!(config.enabled_weekdays.len(), 2);
        assert!(config.collapse_weekdays.is_empty());
        assert_eq!(
            config.seasonality,
            SeasonalityChoice::Fixed(Seasonality {
                daily: false,
                weekly: false,
                yearly: true
            })
        );
        assert_eq!(config.projection_months, vec![YearMonth::new(2024, 7).unwrap()]);
        assert!(config.holidays.contains(&NaiveDate::from_ymd_opt(2024, 6, 13).unwrap()));
        assert!(config.holidays.contains(&NaiveDate::from_ymd_opt(2024, 9, 7).unwrap()));
        assert!(config.holidays.contains(&NaiveDate::from_ymd_opt(2024, 3, 29).unwrap()));
        assert!(!config.holidays.contains(&NaiveDate::from_ymd_opt(2024, 2, 13).unwrap()));

        let config = config_from_args(&daily_args(&["--br-holidays", "--br-optional-holidays"])).unwrap();
        assert!(config.holidays.contains(&NaiveDate::from_ymd_opt(2024, 2, 13).unwrap()));
        assert!(config.holidays.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn invalid_outlier_settings_exit_with_input_error() {
        let err = config_from_args(&daily_args(&["--iqr-k=-1"])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let err = config_from_args(&daily_args(&["--iqr-k", "-0.5"])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let err = config_from_args(&daily_args(&["--min-group", "0"])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn daily_exports_write_every_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let data = generate_demo(&DemoConfig {
            days: 120,
            intrahour_days: 14,
            ..DemoConfig::default()
        })
        .unwrap();
        let (daily, intrahour) = write_demo(dir.path(), &data).unwrap();

        let out = dir.path().join("out");
        let mut config = config_from_args(&daily_args(&[])).unwrap();
        config.input = daily;
        config.horizon_days = 45;
        let run = pipeline::run_daily(&config, &SeasonalForecaster::default()).unwrap();
        export_daily(&out, &run).unwrap();

        let month = run.periods[0].month;
        for name in [
            ExportNames::baseline(MetricKind::Volume),
            ExportNames::period(month, MetricKind::Volume),
            ExportNames::comparison(month, MetricKind::Volume),
            ExportNames::weekday(MetricKind::Volume),
            ExportNames::monthly(MetricKind::Volume),
        ] {
            assert!(out.join(&name).exists(), "missing {name}");
        }

        let icfg = IntrahourConfig {
            input: intrahour,
            daily_input: Some(config.input.clone()),
            metric: MetricKind::Volume,
            month,
            enabled_weekdays: DayOfWeek::all_set(),
            seasonality: SeasonalityChoice::Auto,
            outliers: OutlierPolicy::default(),
            holidays: Vec::new(),
            export_dir: None,
        };
        let run = pipeline::run_intrahour(&icfg, &SeasonalForecaster::default()).unwrap();
        export_intrahour(&out, &run).unwrap();
        assert!(out.join(ExportNames::intrahour(month, MetricKind::Volume)).exists());
    }
}
