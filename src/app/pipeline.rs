//! Shared pipeline logic behind the `daily` and `intrahour` commands.
//!
//! Daily flow:
//! table -> prepared series -> outlier filter -> baseline occurrence curve ->
//! per target month (historical coverage or forecast) -> occurrence curve ->
//! comparison against the baseline.
//!
//! Intrahour flow:
//! table -> prepared slots -> outlier filter -> slot forecast for the month ->
//! reconciliation against daily targets -> slot curve.
//!
//! The CLI only formats and exports what these functions return.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::calendar::label_points;
use crate::clean::{FilterReport, filter_by_occurrence, filter_grouped};
use crate::curve::{
    Comparison, build_occurrence_curve, build_slot_curve, build_weekday_curve, compare, daily_aggregate,
    monthly_totals, reconcile,
};
use crate::domain::{
    Curve, DayOfWeek, Granularity, IntrahourConfig, MetricKind, PeriodSource, RunConfig, Seasonality,
    TimeSeriesPoint, YearMonth,
};
use crate::error::PipelineError;
use crate::forecast::{
    ForecastRequest, Forecaster, covers_month, days_after, fit_and_predict, month_slots, month_timestamps,
    observed_slots,
};
use crate::io::ingest::{RawTable, TableKind, prepare_metric, read_csv_table};

/// One target month's curve and its comparison with the baseline.
#[derive(Debug, Clone)]
pub struct PeriodCurve {
    pub month: YearMonth,
    pub source: PeriodSource,
    pub series: Vec<TimeSeriesPoint>,
    pub curve: Curve,
    pub comparison: Comparison,
}

/// A target month that produced no curve.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPeriod {
    pub month: YearMonth,
    pub reason: String,
}

/// All computed outputs of a single `curves daily` run.
#[derive(Debug, Clone)]
pub struct DailyRun {
    pub metric: MetricKind,
    pub rows_read: usize,
    pub filter: FilterReport,
    pub seasonality: Seasonality,
    /// Occurrence curve of the cleaned history.
    pub baseline: Curve,
    pub periods: Vec<PeriodCurve>,
    pub skipped: Vec<SkippedPeriod>,
    /// Forecast over the configured horizon after the last observation.
    pub horizon: Vec<TimeSeriesPoint>,
    pub weekday: Option<Curve>,
    pub monthly: Vec<(YearMonth, f64)>,
}

/// Where the intrahour run's per-day targets came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyTargetSource {
    /// Forecast from the separate daily table.
    DailyTable,
    /// Forecast from per-day aggregates of the intrahour history.
    IntrahourTotals,
    /// Taken from the intrahour history itself (month already observed).
    History,
}

/// All computed outputs of a single `curves intrahour` run.
#[derive(Debug, Clone)]
pub struct IntrahourRun {
    pub metric: MetricKind,
    pub month: YearMonth,
    pub rows_read: usize,
    pub filter: FilterReport,
    pub slots: BTreeSet<NaiveTime>,
    pub source: PeriodSource,
    pub target_source: DailyTargetSource,
    pub daily_targets: BTreeMap<NaiveDate, f64>,
    pub reconciled: Vec<TimeSeriesPoint>,
    pub curve: Curve,
    /// Per-day sum or mean of the reconciled slots.
    pub day_totals: BTreeMap<NaiveDate, f64>,
}

/// Execute the daily pipeline on the file named in `config`.
pub fn run_daily(config: &RunConfig, forecaster: &dyn Forecaster) -> Result<DailyRun, PipelineError> {
    let table = read_csv_table(&config.input)?;
    run_daily_table(&table, config, forecaster)
}

/// Execute the daily pipeline on an already loaded table.
pub fn run_daily_table(
    table: &RawTable,
    config: &RunConfig,
    forecaster: &dyn Forecaster,
) -> Result<DailyRun, PipelineError> {
    let metric = config.metric;
    let prepared = prepare_metric(table, TableKind::Daily, metric)?;
    log::info!(
        "{} ({}): {} {} rows prepared",
        table.name,
        TableKind::Daily.name(),
        prepared.len(),
        metric.slug()
    );

    let filtered = filter_by_occurrence(&prepared, &config.collapse_weekdays, &config.outliers);
    let history = filtered.points;
    let baseline = build_occurrence_curve(&label_points(&history), metric, &config.enabled_weekdays);

    let months = target_months(config, &prepared)?;
    let seasonality = config.seasonality.resolve(&history);
    log::debug!("seasonality: {seasonality:?}");
    let floor = Granularity::Daily.forecast_floor();

    let mut periods = Vec::with_capacity(months.len());
    let mut skipped = Vec::new();
    for month in months {
        // Historical coverage wins over forecasting. Coverage is checked on the
        // prepared series since collapsing moves points out of their month.
        let (source, series) = if covers_month(&prepared, month) {
            let observed: Vec<TimeSeriesPoint> = prepared.iter().copied().filter(|p| month.contains(p.date())).collect();
            (PeriodSource::Historical, observed)
        } else {
            let request = ForecastRequest {
                history: history.clone(),
                future: month_timestamps(month),
            };
            match fit_and_predict(forecaster, request, &seasonality, floor) {
                Ok(points) => (PeriodSource::Forecast, points),
                Err(err @ PipelineError::InsufficientData { .. }) => {
                    log::warn!("{month}: skipped ({err})");
                    skipped.push(SkippedPeriod {
                        month,
                        reason: err.to_string(),
                    });
                    continue;
                }
                Err(err) => return Err(err),
            }
        };

        let curve = build_occurrence_curve(&label_points(&series), metric, &config.enabled_weekdays);
        let comparison = compare(&baseline, &curve);
        log::info!("{month}: {} curve built from {} points", source_name(source), series.len());
        periods.push(PeriodCurve {
            month,
            source,
            series,
            curve,
            comparison,
        });
    }

    let last_observed = prepared.last().map(TimeSeriesPoint::date);
    let horizon = horizon_forecast(config, last_observed, &history, &seasonality, forecaster)?;
    let weekday = (!horizon.is_empty()).then(|| build_weekday_curve(&horizon, metric, &config.enabled_weekdays));
    let monthly = monthly_totals(&horizon, metric);

    Ok(DailyRun {
        metric,
        rows_read: table.rows.len(),
        filter: filtered.report,
        seasonality,
        baseline,
        periods,
        skipped,
        horizon,
        weekday,
        monthly,
    })
}

/// Execute the intrahour pipeline on the file(s) named in `config`.
pub fn run_intrahour(config: &IntrahourConfig, forecaster: &dyn Forecaster) -> Result<IntrahourRun, PipelineError> {
    let table = read_csv_table(&config.input)?;
    let daily = match &config.daily_input {
        Some(path) => Some(read_csv_table(path)?),
        None => None,
    };
    run_intrahour_tables(&table, daily.as_ref(), config, forecaster)
}

/// Execute the intrahour pipeline on already loaded tables.
pub fn run_intrahour_tables(
    table: &RawTable,
    daily: Option<&RawTable>,
    config: &IntrahourConfig,
    forecaster: &dyn Forecaster,
) -> Result<IntrahourRun, PipelineError> {
    let metric = config.metric;
    let aggregation = metric.aggregation();
    let month = config.month;

    let prepared = prepare_metric(table, TableKind::Intrahour, metric)?;
    log::info!(
        "{} ({}): {} {} rows prepared",
        table.name,
        TableKind::Intrahour.name(),
        prepared.len(),
        metric.slug()
    );

    // Each (weekday, slot) cell is its own population.
    let filtered = filter_grouped(
        &prepared,
        |p| (DayOfWeek::of(p.date()), p.timestamp.time()),
        |_| false,
        &config.outliers,
    );
    let history = filtered.points;
    let slots = observed_slots(&history);

    let (source, target_source, fine, daily_targets) = if covers_month(&prepared, month) {
        let observed: Vec<TimeSeriesPoint> = prepared.iter().copied().filter(|p| month.contains(p.date())).collect();
        let targets = daily_aggregate(&observed, aggregation);
        (PeriodSource::Historical, DailyTargetSource::History, observed, targets)
    } else {
        let request = ForecastRequest {
            history: history.clone(),
            future: month_slots(month, &slots),
        };
        let seasonality = config.seasonality.resolve(&history);
        log::debug!("slot seasonality: {seasonality:?}");
        let fine = fit_and_predict(forecaster, request, &seasonality, Granularity::Intrahour.forecast_floor())?;
        let (target_source, targets) = forecast_daily_targets(daily, &history, config, forecaster)?;
        (PeriodSource::Forecast, target_source, fine, targets)
    };

    let reconciled = reconcile(&fine, &daily_targets, aggregation, &config.enabled_weekdays);
    let curve = build_slot_curve(&reconciled, metric, &config.enabled_weekdays);
    let day_totals = daily_aggregate(&reconciled, aggregation);
    log::info!(
        "{month}: {} slots x {} days reconciled ({})",
        slots.len(),
        day_totals.len(),
        source_name(source)
    );

    Ok(IntrahourRun {
        metric,
        month,
        rows_read: table.rows.len(),
        filter: filtered.report,
        slots,
        source,
        target_source,
        daily_targets,
        reconciled,
        curve,
        day_totals,
    })
}

/// Per-day forecast values for the intrahour month.
fn forecast_daily_targets(
    daily: Option<&RawTable>,
    intrahour_history: &[TimeSeriesPoint],
    config: &IntrahourConfig,
    forecaster: &dyn Forecaster,
) -> Result<(DailyTargetSource, BTreeMap<NaiveDate, f64>), PipelineError> {
    let metric = config.metric;
    let (source, history) = match daily {
        Some(table) => {
            let prepared = prepare_metric(table, TableKind::Daily, metric)?;
            let cleaned = filter_by_occurrence(&prepared, &BTreeSet::new(), &config.outliers).points;
            (DailyTargetSource::DailyTable, cleaned)
        }
        None => {
            let totals = daily_aggregate(intrahour_history, metric.aggregation())
                .into_iter()
                .map(|(day, value)| TimeSeriesPoint::daily(day, value))
                .collect();
            (DailyTargetSource::IntrahourTotals, totals)
        }
    };

    let request = ForecastRequest {
        history,
        future: month_timestamps(config.month),
    };
    let seasonality = config.seasonality.resolve(&request.history);
    let forecast = fit_and_predict(forecaster, request, &seasonality, Granularity::Daily.forecast_floor())?;
    let targets = forecast.into_iter().map(|p| (p.date(), p.value)).collect();
    Ok((source, targets))
}

/// Explicit months, or the month after the last observation.
fn target_months(config: &RunConfig, prepared: &[TimeSeriesPoint]) -> Result<Vec<YearMonth>, PipelineError> {
    if !config.projection_months.is_empty() {
        let unique: BTreeSet<YearMonth> = config.projection_months.iter().copied().collect();
        return Ok(unique.into_iter().collect());
    }
    match prepared.last() {
        Some(last) => Ok(vec![YearMonth::of(last.date()).next()]),
        None => Err(PipelineError::InsufficientData { needed: 2, got: 0 }),
    }
}

/// The next `horizon_days` days after `last_observed`, fitted on `history`.
///
/// `last_observed` comes from the prepared series: the cleaned history may end
/// earlier when its last day was collapsed or removed.
fn horizon_forecast(
    config: &RunConfig,
    last_observed: Option<NaiveDate>,
    history: &[TimeSeriesPoint],
    seasonality: &Seasonality,
    forecaster: &dyn Forecaster,
) -> Result<Vec<TimeSeriesPoint>, PipelineError> {
    let Some(last) = last_observed else {
        return Ok(Vec::new());
    };
    if config.horizon_days == 0 || history.is_empty() {
        return Ok(Vec::new());
    }
    let future: Vec<NaiveDateTime> = days_after(last, config.horizon_days);
    let request = ForecastRequest {
        history: history.to_vec(),
        future,
    };
    match fit_and_predict(forecaster, request, seasonality, Granularity::Daily.forecast_floor()) {
        Ok(points) => Ok(points),
        Err(err @ PipelineError::InsufficientData { .. }) => {
            log::warn!("horizon forecast skipped ({err})");
            Ok(Vec::new())
        }
        Err(err) => Err(err),
    }
}

pub fn source_name(source: PeriodSource) -> &'static str {
    match source {
        PeriodSource::Historical => "historical",
        PeriodSource::Forecast => "forecast",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::days_in_month;
    use crate::domain::{CurveKey, SeasonalityChoice};
    use crate::forecast::SeasonalForecaster;
    use chrono::Duration;

    fn daily_table(start: NaiveDate, values: &[f64], with_aht: bool) -> RawTable {
        let mut headers = vec!["Data".to_string(), "Quantidade de Ligações".to_string()];
        if with_aht {
            headers.push("TMA".to_string());
        }
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut row = vec![(start + Duration::days(i as i64)).to_string(), v.to_string()];
                if with_aht {
                    row.push("300".to_string());
                }
                row
            })
            .collect();
        RawTable::new("daily.csv", headers, rows)
    }

    fn intrahour_table(start: NaiveDate, days: i64) -> RawTable {
        let headers = ["Intervalo", "Dia", "Volume", "TMA"].map(String::from).to_vec();
        let mut rows = Vec::new();
        for d in 0..days {
            let date = start + Duration::days(d);
            for (slot, volume) in [(8, 10.0), (9, 30.0), (10, 40.0), (11, 20.0)] {
                rows.push(vec![
                    format!("{slot:02}:00"),
                    date.to_string(),
                    volume.to_string(),
                    "200".to_string(),
                ]);
            }
        }
        RawTable::new("intrahour.csv", headers, rows)
    }

    fn jan1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn constant_volume_end_to_end() {
        // 2024-01-01 .. 2024-03-30
        let table = daily_table(jan1(), &[100.0; 90], false);
        let config = RunConfig {
            collapse_weekdays: BTreeSet::new(),
            horizon_days: 30,
            ..RunConfig::default()
        };
        let run = run_daily_table(&table, &config, &SeasonalForecaster::default()).unwrap();

        assert_eq!(run.filter.kept, 90);
        assert_eq!(run.filter.removed, 0);
        assert!(run.skipped.is_empty());

        assert!(run.horizon.iter().all(|p| (p.value - 100.0).abs() < 1e-3));
        assert_eq!(run.horizon.len(), 30);

        let april = &run.periods[0];
        assert_eq!(april.month, YearMonth::new(2024, 4).unwrap());
        assert_eq!(april.source, PeriodSource::Forecast);
        assert!((april.curve.total_percentage() - 100.0).abs() < 1e-6);

        let share = 100.0 / days_in_month(april.month) as f64;
        for entry in april.curve.entries.values().filter(|e| e.value > 0.0) {
            assert!((entry.percentage - share).abs() < 1e-3);
        }
        assert_eq!(april.comparison.rows.len(), 35);
    }

    #[test]
    fn constant_volume_with_default_sunday_collapse() {
        // 2024-01-01 .. 2024-03-31 (Sunday)
        let table = daily_table(jan1(), &[100.0; 91], false);
        let config = RunConfig {
            horizon_days: 30,
            ..RunConfig::default()
        };
        let run = run_daily_table(&table, &config, &SeasonalForecaster::default()).unwrap();

        assert!(run.filter.collapsed_groups > 0);
        assert_eq!(run.filter.kept + run.filter.removed, 91);
        assert!(run.skipped.is_empty());

        assert_eq!(run.horizon.len(), 30);
        assert_eq!(run.horizon[0].date(), NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert!(run.horizon.iter().all(|p| (p.value - 100.0).abs() < 1e-3));

        let april = &run.periods[0];
        assert_eq!(april.month, YearMonth::new(2024, 4).unwrap());
        assert!((april.curve.total_percentage() - 100.0).abs() < 1e-6);
        let weekday = run.weekday.unwrap();
        assert!((weekday.total_percentage() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn horizon_starts_after_a_collapsed_last_sunday() {
        // Ends Sunday 2024-03-24; its (4th Sunday) group collapses onto 2024-01-28.
        let table = daily_table(jan1(), &[100.0; 84], false);
        let config = RunConfig {
            horizon_days: 7,
            ..RunConfig::default()
        };
        let run = run_daily_table(&table, &config, &SeasonalForecaster::default()).unwrap();

        let days: Vec<NaiveDate> = run.horizon.iter().map(TimeSeriesPoint::date).collect();
        let expected: Vec<NaiveDate> = (25..=31).map(|d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap()).collect();
        assert_eq!(days, expected);
    }

    #[test]
    fn horizon_starts_after_a_removed_last_spike() {
        // 2023-10-01 .. 2024-03-28 (Thursday); the last day is a spike in its group.
        let start = NaiveDate::from_ymd_opt(2023, 10, 1).unwrap();
        let mut values = vec![100.0; 180];
        values[179] = 10_000.0;
        let table = daily_table(start, &values, false);
        let config = RunConfig {
            horizon_days: 7,
            ..RunConfig::default()
        };
        let run = run_daily_table(&table, &config, &SeasonalForecaster::default()).unwrap();

        assert!(run.filter.removed > 0);
        assert_eq!(run.horizon.len(), 7);
        assert_eq!(run.horizon[0].date(), NaiveDate::from_ymd_opt(2024, 3, 29).unwrap());
        assert!(run.horizon.iter().all(|p| (p.value - 100.0).abs() < 1e-3));
    }

    #[test]
    fn missing_tma_is_a_schema_error() {
        let table = daily_table(jan1(), &[100.0; 30], false);
        let config = RunConfig {
            metric: MetricKind::Aht,
            ..RunConfig::default()
        };
        let err = run_daily_table(&table, &config, &SeasonalForecaster::default()).unwrap_err();
        match err {
            PipelineError::Schema { missing, .. } => assert_eq!(missing, vec!["TMA".to_string()]),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn covered_month_uses_history() {
        let values: Vec<f64> = (0..60).map(|i| 50.0 + (i % 7) as f64 * 10.0).collect();
        let table = daily_table(jan1(), &values, true);
        let config = RunConfig {
            metric: MetricKind::Aht,
            projection_months: vec![YearMonth::new(2024, 1).unwrap(), YearMonth::new(2024, 3).unwrap()],
            horizon_days: 0,
            ..RunConfig::default()
        };
        let run = run_daily_table(&table, &config, &SeasonalForecaster::default()).unwrap();

        assert_eq!(run.periods.len(), 2);
        assert_eq!(run.periods[0].source, PeriodSource::Historical);
        assert_eq!(run.periods[0].series.len(), 31);
        assert_eq!(run.periods[1].source, PeriodSource::Forecast);
        assert!(run.weekday.is_none());
        assert!(run.monthly.is_empty());
    }

    #[test]
    fn single_observation_skips_forecast_months() {
        let table = daily_table(jan1(), &[100.0], false);
        let config = RunConfig {
            projection_months: vec![YearMonth::new(2024, 2).unwrap()],
            ..RunConfig::default()
        };
        let run = run_daily_table(&table, &config, &SeasonalForecaster::default()).unwrap();
        assert!(run.periods.is_empty());
        assert_eq!(run.skipped.len(), 1);
        assert_eq!(run.skipped[0].month, YearMonth::new(2024, 2).unwrap());
        assert!(run.horizon.is_empty());
    }

    #[test]
    fn day_filter_limits_curve_keys() {
        let table = daily_table(jan1(), &[100.0; 90], false);
        let config = RunConfig {
            enabled_weekdays: [DayOfWeek::Monday, DayOfWeek::Friday].into_iter().collect(),
            horizon_days: 14,
            ..RunConfig::default()
        };
        let run = run_daily_table(&table, &config, &SeasonalForecaster::default()).unwrap();
        assert_eq!(run.baseline.len(), 10);
        let weekday = run.weekday.unwrap();
        assert_eq!(weekday.len(), 2);
        assert!((weekday.percentage(&CurveKey::Weekday(DayOfWeek::Monday)) - 50.0).abs() < 1e-3);
    }

    #[test]
    fn intrahour_forecast_reconciles_to_daily_targets() {
        // Two weeks of May 2024, forecast for June.
        let table = intrahour_table(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 14);
        let config = IntrahourConfig {
            input: Default::default(),
            daily_input: None,
            metric: MetricKind::Volume,
            month: YearMonth::new(2024, 6).unwrap(),
            enabled_weekdays: DayOfWeek::all_set(),
            seasonality: SeasonalityChoice::Auto,
            outliers: Default::default(),
            holidays: Vec::new(),
            export_dir: None,
        };
        let run = run_intrahour_tables(&table, None, &config, &SeasonalForecaster::default()).unwrap();

        assert_eq!(run.source, PeriodSource::Forecast);
        assert_eq!(run.target_source, DailyTargetSource::IntrahourTotals);
        assert_eq!(run.slots.len(), 4);
        assert_eq!(run.reconciled.len(), 4 * 30);
        for (day, target) in &run.daily_targets {
            assert!((run.day_totals[day] - target).abs() < 1e-6);
        }
        assert!((run.curve.total_percentage() - 100.0).abs() < 1e-6);
        let ten = CurveKey::Slot(NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert!((run.curve.percentage(&ten) - 40.0).abs() < 1.0);
    }

    #[test]
    fn intrahour_uses_configured_seasonality() {
        let table = intrahour_table(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 14);
        let config = IntrahourConfig {
            input: Default::default(),
            daily_input: None,
            metric: MetricKind::Volume,
            month: YearMonth::new(2024, 6).unwrap(),
            enabled_weekdays: DayOfWeek::all_set(),
            seasonality: SeasonalityChoice::Fixed(Seasonality {
                daily: false,
                weekly: true,
                yearly: false,
            }),
            outliers: Default::default(),
            holidays: Vec::new(),
            export_dir: None,
        };
        let run = run_intrahour_tables(&table, None, &config, &SeasonalForecaster::default()).unwrap();

        // Without the daily component the slot shape is not modelled.
        let ten = CurveKey::Slot(NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        let share = run.curve.percentage(&ten);
        assert!(share > 20.0 && share < 30.0, "share {share}");
        for (day, target) in &run.daily_targets {
            assert!((run.day_totals[day] - target).abs() < 1e-6);
        }
    }

    #[test]
    fn intrahour_observed_month_uses_history_and_daily_table_when_given() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let table = intrahour_table(start, 30);
        let mut config = IntrahourConfig {
            input: Default::default(),
            daily_input: None,
            metric: MetricKind::Volume,
            month: YearMonth::new(2024, 6).unwrap(),
            enabled_weekdays: DayOfWeek::all_set(),
            seasonality: SeasonalityChoice::Auto,
            outliers: Default::default(),
            holidays: Vec::new(),
            export_dir: None,
        };
        let run = run_intrahour_tables(&table, None, &config, &SeasonalForecaster::default()).unwrap();
        assert_eq!(run.source, PeriodSource::Historical);
        assert!(run.day_totals.values().all(|v| (v - 100.0).abs() < 1e-9));

        config.month = YearMonth::new(2024, 7).unwrap();
        let daily = daily_table(start, &[400.0; 30], false);
        let run = run_intrahour_tables(&table, Some(&daily), &config, &SeasonalForecaster::default()).unwrap();
        assert_eq!(run.target_source, DailyTargetSource::DailyTable);
        assert!(run.day_totals.values().all(|v| (v - 400.0).abs() < 1e-3));
    }
}
