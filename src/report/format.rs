//! Terminal tables for daily and intrahour runs.
//!
//! All formatting lives here so the pipeline code stays presentation-free and
//! output changes are localized.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::app::pipeline::{DailyRun, DailyTargetSource, IntrahourRun, SkippedPeriod, source_name};
use crate::curve::Comparison;
use crate::domain::{Curve, CurveFile, RunConfig, Seasonality, YearMonth};

const LABEL_WIDTH: usize = 22;

/// Header block for a daily run: input, cleaning and forecasting settings.
pub fn format_run_summary(run: &DailyRun, config: &RunConfig) -> String {
    let mut out = String::new();

    out.push_str("=== curves - Call-Center Occurrence Curves ===\n");
    out.push_str(&format!("Input: {}\n", config.input.display()));
    out.push_str(&format!("Metric: {}\n", run.metric.display_name()));
    out.push_str(&format!(
        "Rows: {} | kept={} removed={} collapsed_groups={}\n",
        run.rows_read, run.filter.kept, run.filter.removed, run.filter.collapsed_groups
    ));
    let days: Vec<&str> = config.enabled_weekdays.iter().map(|d| d.display_name()).collect();
    out.push_str(&format!("Days: {}\n", days.join(", ")));
    out.push_str(&format!("Seasonality: {}\n", fmt_seasonality(&run.seasonality)));
    if !config.holidays.is_empty() {
        out.push_str(&format!("Holidays: {}\n", config.holidays.len()));
    }
    out
}

/// `label | value | %` table.
pub fn format_curve(title: &str, curve: &Curve) -> String {
    let mut out = String::new();
    out.push_str(&format!("{title}\n"));
    out.push_str(&row3("label", "value", "%"));
    out.push_str(&rule(3));
    for (key, entry) in &curve.entries {
        out.push_str(&row3(
            &truncate(&key.to_string(), LABEL_WIDTH),
            &format!("{:.2}", entry.value),
            &format!("{:.2}", entry.percentage),
        ));
    }
    out.push_str(&row3("total", "", &format!("{:.2}", curve.total_percentage())));
    out
}

/// Aligned percentages with the difference in percentage points.
pub fn format_comparison(title: &str, label_a: &str, label_b: &str, comparison: &Comparison) -> String {
    let mut out = String::new();
    out.push_str(&format!("{title}\n"));
    out.push_str(
        format!(
            "{:<LABEL_WIDTH$} {:>12} {:>12} {:>10}\n",
            "label",
            truncate(label_a, 12),
            truncate(label_b, 12),
            "delta"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&rule(4));
    for row in &comparison.rows {
        out.push_str(
            format!(
                "{:<LABEL_WIDTH$} {:>12.2} {:>12.2} {:>+10.2}\n",
                truncate(&row.key.to_string(), LABEL_WIDTH),
                row.value_a,
                row.value_b,
                row.delta()
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

pub fn format_skipped(skipped: &[SkippedPeriod]) -> String {
    let mut out = String::new();
    if skipped.is_empty() {
        return out;
    }
    out.push_str("Skipped periods:\n");
    for s in skipped {
        out.push_str(&format!("  {} {}\n", s.month, s.reason));
    }
    out
}

pub fn format_monthly(totals: &[(YearMonth, f64)]) -> String {
    let mut out = String::new();
    out.push_str("Forecast by month:\n");
    for (month, value) in totals {
        out.push_str(&format!("  {month} {value:>14.2}\n"));
    }
    out
}

/// Everything printed for a daily run, in order.
pub fn format_daily_run(run: &DailyRun, config: &RunConfig) -> String {
    let mut out = format_run_summary(run, config);
    out.push('\n');
    out.push_str(&format_curve("Baseline (history):", &run.baseline));

    for period in &run.periods {
        out.push('\n');
        let title = format!("{} ({}):", period.month, source_name(period.source));
        out.push_str(&format_curve(&title, &period.curve));
        out.push('\n');
        out.push_str(&format_comparison(
            &format!("Baseline vs {}:", period.month),
            "baseline",
            &period.month.to_string(),
            &period.comparison,
        ));
    }

    let skipped = format_skipped(&run.skipped);
    if !skipped.is_empty() {
        out.push('\n');
        out.push_str(&skipped);
    }

    if let Some(weekday) = &run.weekday {
        out.push('\n');
        out.push_str(&format_curve(
            &format!("Weekday share, next {} days:", run.horizon.len()),
            weekday,
        ));
    }
    if !run.monthly.is_empty() {
        out.push('\n');
        out.push_str(&format_monthly(&run.monthly));
    }
    out
}

/// Everything printed for an intrahour run.
pub fn format_intrahour_run(run: &IntrahourRun) -> String {
    let mut out = String::new();
    out.push_str("=== curves - Intrahour Curve ===\n");
    out.push_str(&format!(
        "Metric: {} | Month: {} ({}) | Targets: {}\n",
        run.metric.display_name(),
        run.month,
        source_name(run.source),
        target_source_name(run.target_source)
    ));
    out.push_str(&format!(
        "Rows: {} | kept={} removed={} | slots={}\n\n",
        run.rows_read,
        run.filter.kept,
        run.filter.removed,
        run.slots.len()
    ));
    out.push_str(&format_curve("Slot curve:", &run.curve));
    out.push('\n');
    out.push_str(&format_day_totals(&run.day_totals, &run.daily_targets));
    out
}

/// Reconciled per-day totals next to the targets they were scaled to.
pub fn format_day_totals(totals: &BTreeMap<NaiveDate, f64>, targets: &BTreeMap<NaiveDate, f64>) -> String {
    let mut out = String::new();
    out.push_str("Per-day totals:\n");
    out.push_str(&row3("date", "reconciled", "target"));
    out.push_str(&rule(3));
    for (day, total) in totals {
        let target = targets.get(day).copied().unwrap_or(0.0);
        out.push_str(&row3(&day.to_string(), &format!("{total:.2}"), &format!("{target:.2}")));
    }
    out
}

/// Render a saved curve file.
pub fn format_curve_file(file: &CurveFile) -> String {
    let mut out = String::new();
    out.push_str(&format!("Curve ({}): {}", file.tool, file.metric.display_name()));
    if let Some(period) = file.period {
        out.push_str(&format!(" {period}"));
    }
    if let Some(source) = file.source {
        out.push_str(&format!(" ({})", source_name(source)));
    }
    out.push('\n');
    out.push_str(&row3("label", "value", "%"));
    out.push_str(&rule(3));
    for e in &file.entries {
        out.push_str(&row3(
            &truncate(&e.label, LABEL_WIDTH),
            &format!("{:.2}", e.value),
            &format!("{:.2}", e.percentage),
        ));
    }
    out
}

fn target_source_name(source: DailyTargetSource) -> &'static str {
    match source {
        DailyTargetSource::DailyTable => "daily table forecast",
        DailyTargetSource::IntrahourTotals => "intrahour totals forecast",
        DailyTargetSource::History => "observed",
    }
}

fn fmt_seasonality(s: &Seasonality) -> String {
    let parts: Vec<&str> = [(s.yearly, "yearly"), (s.weekly, "weekly"), (s.daily, "daily")]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}

fn row3(a: &str, b: &str, c: &str) -> String {
    let mut line = format!("{a:<LABEL_WIDTH$} {b:>14} {c:>10}").trim_end().to_string();
    line.push('\n');
    line
}

fn rule(columns: usize) -> String {
    let mut line = format!("{:-<LABEL_WIDTH$}", "");
    let widths = [14, 10, 10];
    for w in widths.iter().take(columns.saturating_sub(1)) {
        line.push(' ');
        line.push_str(&"-".repeat(*w));
    }
    line.push('\n');
    line
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{build_weekday_curve, compare};
    use crate::domain::{DayOfWeek, MetricKind, TimeSeriesPoint};
    use crate::io::curve_file;
    use chrono::Duration;

    fn week_curve() -> Curve {
        let start = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let points: Vec<TimeSeriesPoint> = (0..7)
            .map(|i| TimeSeriesPoint::daily(start + Duration::days(i), 10.0 * (i + 1) as f64))
            .collect();
        build_weekday_curve(&points, MetricKind::Volume, &DayOfWeek::all_set())
    }

    #[test]
    fn curve_table_lists_every_entry_and_total() {
        let text = format_curve("Weekdays:", &week_curve());
        assert!(text.starts_with("Weekdays:\n"));
        assert!(text.contains("Segunda-feira"));
        assert!(text.contains("Domingo"));
        assert!(text.lines().last().unwrap().ends_with("100.00"));
        // title + header + rule + 7 entries + total
        assert_eq!(text.lines().count(), 11);
    }

    #[test]
    fn comparison_shows_signed_delta() {
        let a = week_curve();
        let mut b = a.clone();
        for e in b.entries.values_mut() {
            e.percentage = 100.0 / 7.0;
        }
        let text = format_comparison("cmp", "a", "b", &compare(&a, &b));
        assert!(text.contains('+'));
        assert!(text.contains('-'));
    }

    #[test]
    fn curve_file_render_includes_period() {
        let file = curve_file(&week_curve(), Some(YearMonth::new(2024, 6).unwrap()), None);
        let text = format_curve_file(&file);
        assert!(text.starts_with("Curve (curves): Volume 2024-06\n"));
    }

    #[test]
    fn truncate_marks_cut_labels() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
