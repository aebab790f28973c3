//! Export curves and tables to CSV, one file per sheet.
//!
//! Files are plain comma-separated text meant for spreadsheets or downstream
//! scripts. Numbers are written with full precision so the exported values are
//! exactly the curve's values.

use std::fs::{self, File};
use std::path::Path;

use crate::curve::Comparison;
use crate::domain::{Curve, MetricKind, TimeSeriesPoint, YearMonth};
use crate::error::PipelineError;

/// File names used inside an export directory.
pub struct ExportNames;

impl ExportNames {
    pub fn baseline(metric: MetricKind) -> String {
        format!("baseline_{}.csv", metric.slug())
    }

    pub fn period(month: YearMonth, metric: MetricKind) -> String {
        format!("{month}_{}.csv", metric.slug())
    }

    pub fn comparison(month: YearMonth, metric: MetricKind) -> String {
        format!("compare_{month}_{}.csv", metric.slug())
    }

    pub fn weekday(metric: MetricKind) -> String {
        format!("weekday_{}.csv", metric.slug())
    }

    pub fn monthly(metric: MetricKind) -> String {
        format!("monthly_{}.csv", metric.slug())
    }

    pub fn intrahour(month: YearMonth, metric: MetricKind) -> String {
        format!("intrahour_{month}_{}.csv", metric.slug())
    }

    pub fn intrahour_series(month: YearMonth, metric: MetricKind) -> String {
        format!("intrahour_series_{month}_{}.csv", metric.slug())
    }
}

/// Create `dir` (and parents) if needed.
pub fn ensure_export_dir(dir: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(dir)
        .map_err(|e| PipelineError::Io(format!("Failed to create export directory '{}': {e}", dir.display())))
}

/// `label,value,percentage` per curve entry, in curve order.
pub fn write_curve_csv(path: &Path, curve: &Curve) -> Result<(), PipelineError> {
    let mut sheet = Sheet::create(path)?;
    sheet.record(["label", "value", "percentage"])?;
    for (key, entry) in &curve.entries {
        sheet.record([key.to_string(), entry.value.to_string(), entry.percentage.to_string()])?;
    }
    sheet.finish()
}

/// `label,<a>,<b>` per comparison row.
pub fn write_comparison_csv(
    path: &Path,
    comparison: &Comparison,
    label_a: &str,
    label_b: &str,
) -> Result<(), PipelineError> {
    let mut sheet = Sheet::create(path)?;
    sheet.record(["label", label_a, label_b])?;
    for row in &comparison.rows {
        sheet.record([row.key.to_string(), row.value_a.to_string(), row.value_b.to_string()])?;
    }
    sheet.finish()
}

/// `month,value` per month.
pub fn write_monthly_csv(path: &Path, totals: &[(YearMonth, f64)]) -> Result<(), PipelineError> {
    let mut sheet = Sheet::create(path)?;
    sheet.record(["month", "value"])?;
    for (month, value) in totals {
        sheet.record([month.to_string(), value.to_string()])?;
    }
    sheet.finish()
}

/// `timestamp,value` per point.
pub fn write_series_csv(path: &Path, points: &[TimeSeriesPoint]) -> Result<(), PipelineError> {
    let mut sheet = Sheet::create(path)?;
    sheet.record(["timestamp", "value"])?;
    for p in points {
        sheet.record([p.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(), p.value.to_string()])?;
    }
    sheet.finish()
}

/// One CSV file being written; errors name the file.
struct Sheet<'a> {
    path: &'a Path,
    writer: csv::Writer<File>,
}

impl<'a> Sheet<'a> {
    fn create(path: &'a Path) -> Result<Self, PipelineError> {
        let writer = csv::Writer::from_path(path)
            .map_err(|e| PipelineError::Io(format!("Failed to create export CSV '{}': {e}", path.display())))?;
        Ok(Self { path, writer })
    }

    fn record<I, T>(&mut self, fields: I) -> Result<(), PipelineError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer
            .write_record(fields)
            .map_err(|e| PipelineError::Io(format!("Failed to write '{}': {e}", self.path.display())))
    }

    fn finish(mut self) -> Result<(), PipelineError> {
        self.writer
            .flush()
            .map_err(|e| PipelineError::Io(format!("Failed to flush '{}': {e}", self.path.display())))
    }
}
