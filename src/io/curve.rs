//! Read/write curve JSON files.
//!
//! A curve file is the portable form of one curve: metric, aggregation, the
//! period it describes (if any) and its entries in curve order. The schema is
//! `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::{Curve, CurveFile, CurveFileEntry, PeriodSource, YearMonth};
use crate::error::PipelineError;

pub const TOOL_NAME: &str = "curves";

/// Snapshot `curve` into its file form.
pub fn curve_file(curve: &Curve, period: Option<YearMonth>, source: Option<PeriodSource>) -> CurveFile {
    CurveFile {
        tool: TOOL_NAME.to_string(),
        metric: curve.metric,
        aggregation: curve.aggregation,
        period,
        source,
        entries: curve
            .entries
            .iter()
            .map(|(key, entry)| CurveFileEntry {
                key: *key,
                label: key.to_string(),
                value: entry.value,
                percentage: entry.percentage,
            })
            .collect(),
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), PipelineError> {
    let file = File::create(path)
        .map_err(|e| PipelineError::Io(format!("Failed to create curve JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, curve)
        .map_err(|e| PipelineError::Io(format!("Failed to write curve JSON: {e}")))?;
    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, PipelineError> {
    let file = File::open(path)
        .map_err(|e| PipelineError::Io(format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| PipelineError::UnexpectedValue(format!("Invalid curve JSON: {e}")))
}
