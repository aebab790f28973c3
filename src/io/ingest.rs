//! Table ingest and series preparation.
//!
//! This module is responsible for turning an uploaded call-center table into a
//! clean, time-sorted `(timestamp, value)` series for one metric.
//!
//! Design goals:
//! - **Strict schema** for required columns (`Schema` error, exit code 2)
//! - **Lenient values**: non-numeric or missing cells become 0, negatives clamp to 0
//! - **Strict timestamps**: an unparseable date aborts the table with the cell named
//! - **No mutation**: the `RawTable` is only read

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::{MetricKind, TimeSeriesPoint};
use crate::error::PipelineError;

pub const COL_DATE: &str = "Data";
pub const COL_VOLUME_ALIASES: [&str; 2] = ["Quantidade de Ligações", "Chamadas Recebidas"];
pub const COL_AHT: &str = "TMA";
pub const COL_INTERVAL: &str = "Intervalo";
pub const COL_DAY: &str = "Dia";
pub const COL_INTERVAL_VOLUME: &str = "Volume";

/// Which upload a table is, and therefore which columns it must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// One row per day: `Data`, volume, optional `TMA`.
    Daily,
    /// One row per interval: `Intervalo`, `Dia`, `Volume`, `TMA`.
    Intrahour,
}

impl TableKind {
    pub fn name(self) -> &'static str {
        match self {
            TableKind::Daily => "daily",
            TableKind::Intrahour => "intrahour",
        }
    }
}

/// An uploaded table: header names plus string cells, as read.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers = headers.iter().map(|h| normalize_header_name(h)).collect();
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Index of a column, matched case-insensitively after trimming.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.headers.iter().position(|h| h.to_lowercase() == wanted)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }
}

/// Trimmed, non-empty cell content.
fn cell(row: &[String], idx: usize) -> Option<&str> {
    row.get(idx).map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Read a CSV file into a `RawTable`.
///
/// Spreadsheet exports from pt-BR locales commonly use `;` as the delimiter, so
/// the delimiter is picked from the header line.
pub fn read_csv_table(path: &Path) -> Result<RawTable, PipelineError> {
    let mut file = File::open(path)
        .map_err(|e| PipelineError::Io(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let delimiter = detect_delimiter(&mut file)
        .map_err(|e| PipelineError::Io(format!("Failed to read CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::UnexpectedValue(format!("Failed to read CSV headers: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header and CSV lines are 1-based.
        let line = idx + 2;
        let record = result
            .map_err(|e| PipelineError::UnexpectedValue(format!("CSV parse error at line {line}: {e}")))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    log::info!("read {} rows from '{}'", rows.len(), path.display());
    Ok(RawTable::new(name, headers, rows))
}

fn detect_delimiter<R: Read + Seek>(reader: &mut R) -> std::io::Result<u8> {
    let mut first_line = String::new();
    BufReader::new(&mut *reader).read_line(&mut first_line)?;
    reader.rewind()?;
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    Ok(if semicolons > commas { b';' } else { b',' })
}

/// Build a canonical series from two named columns.
///
/// - missing columns → `Schema`
/// - unparseable timestamp → `UnexpectedValue`
/// - non-numeric or missing value → 0; negatives → 0
/// - output sorted ascending by timestamp
pub fn prepare(
    table: &RawTable,
    timestamp_column: &str,
    value_column: &str,
) -> Result<Vec<TimeSeriesPoint>, PipelineError> {
    let ts_idx = table.column_index(timestamp_column);
    let value_idx = table.column_index(value_column);
    let (ts_idx, value_idx) = match (ts_idx, value_idx) {
        (Some(t), Some(v)) => (t, v),
        _ => {
            let missing: Vec<&str> = [(timestamp_column, ts_idx), (value_column, value_idx)]
                .into_iter()
                .filter(|(_, idx)| idx.is_none())
                .map(|(name, _)| name)
                .collect();
            return Err(PipelineError::schema(&table.name, &missing));
        }
    };

    let mut points = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        let raw_ts = cell(row, ts_idx).ok_or_else(|| {
            PipelineError::UnexpectedValue(format!(
                "row {}: missing `{timestamp_column}` value",
                i + 1
            ))
        })?;
        let timestamp = parse_timestamp(raw_ts)
            .map_err(|e| PipelineError::UnexpectedValue(format!("row {}: {e}", i + 1)))?;
        let value = coerce_value(cell(row, value_idx));
        points.push(TimeSeriesPoint::new(timestamp, value));
    }

    points.sort_by_key(|p| p.timestamp);
    Ok(points)
}

/// Resolve the declared column contract for `kind`/`metric` and prepare the series.
pub fn prepare_metric(
    table: &RawTable,
    kind: TableKind,
    metric: MetricKind,
) -> Result<Vec<TimeSeriesPoint>, PipelineError> {
    match kind {
        TableKind::Daily => {
            let value_col = match metric {
                MetricKind::Volume => resolve_volume_column(table)?,
                MetricKind::Aht => COL_AHT,
            };
            ensure_columns(table, &[COL_DATE, value_col])?;
            prepare(table, COL_DATE, value_col)
        }
        TableKind::Intrahour => {
            ensure_columns(table, &[COL_INTERVAL, COL_DAY, COL_INTERVAL_VOLUME, COL_AHT])?;
            let value_col = match metric {
                MetricKind::Volume => COL_INTERVAL_VOLUME,
                MetricKind::Aht => COL_AHT,
            };
            let combined = with_interval_timestamps(table)?;
            prepare(&combined, COL_INTERVAL, value_col)
        }
    }
}

fn resolve_volume_column(table: &RawTable) -> Result<&'static str, PipelineError> {
    COL_VOLUME_ALIASES
        .iter()
        .copied()
        .find(|c| table.has_column(c))
        .ok_or_else(|| PipelineError::schema(&table.name, &[COL_VOLUME_ALIASES[0]]))
}

fn ensure_columns(table: &RawTable, required: &[&str]) -> Result<(), PipelineError> {
    let missing: Vec<&str> = required.iter().copied().filter(|c| !table.has_column(c)).collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::schema(&table.name, &missing))
    }
}

/// Copy of the intrahour table where `Intervalo` holds a full timestamp.
///
/// `Intervalo` may already be a timestamp; when it is only a time of day it is
/// combined with `Dia`.
fn with_interval_timestamps(table: &RawTable) -> Result<RawTable, PipelineError> {
    let interval_idx = table
        .column_index(COL_INTERVAL)
        .ok_or_else(|| PipelineError::schema(&table.name, &[COL_INTERVAL]))?;
    let day_idx = table
        .column_index(COL_DAY)
        .ok_or_else(|| PipelineError::schema(&table.name, &[COL_DAY]))?;

    let mut rows = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        let interval = cell(row, interval_idx).unwrap_or("");
        let combined = if parse_timestamp(interval).is_ok() {
            interval.to_string()
        } else {
            let day = cell(row, day_idx).ok_or_else(|| {
                PipelineError::UnexpectedValue(format!("row {}: missing `{COL_DAY}` value", i + 1))
            })?;
            let date = parse_date(day).map_err(|e| PipelineError::UnexpectedValue(format!("row {}: {e}", i + 1)))?;
            let time = parse_time(interval).map_err(|e| PipelineError::UnexpectedValue(format!("row {}: {e}", i + 1)))?;
            date.and_time(time).format("%Y-%m-%d %H:%M:%S").to_string()
        };
        let mut out = row.clone();
        if let Some(cell) = out.get_mut(interval_idx) {
            *cell = combined;
        }
        rows.push(out);
    }

    Ok(RawTable {
        name: table.name.clone(),
        headers: table.headers.clone(),
        rows,
    })
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

/// Parse a date with an optional time of day.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    let s = s.trim();
    if let Some((date_part, time_part)) = s.split_once([' ', 'T']) {
        let date = parse_date(date_part)?;
        let time = parse_time(time_part)?;
        return Ok(date.and_time(time));
    }
    Ok(parse_date(s)?.and_time(NaiveTime::MIN))
}

pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // ISO dates are preferred, but call-center exports are usually `DD/MM/YYYY`.
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s.trim(), fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD."
    ))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    const FMTS: [&str; 2] = ["%H:%M:%S", "%H:%M"];
    for fmt in FMTS {
        if let Ok(t) = NaiveTime::parse_from_str(s.trim(), fmt) {
            return Ok(t);
        }
    }
    Err(format!("Invalid time '{s}'. Expected HH:MM or HH:MM:SS."))
}

/// Numeric coercion: missing/non-numeric → 0, negative → 0.
///
/// Precedence: dotted thousands ("1.234", "12.345.678") are read as integers
/// first, then a plain float, then the pt-BR form with a decimal comma.
fn coerce_value(s: Option<&str>) -> f64 {
    let Some(s) = s.map(str::trim) else { return 0.0 };
    let parsed = if is_dotted_thousands(s) {
        s.replace('.', "").parse::<f64>().ok()
    } else {
        s.parse::<f64>().ok().or_else(|| {
            // "1.234,5" → "1234.5"; "12,5" → "12.5"
            let normalized = s.replace('.', "").replace(',', ".");
            normalized.parse::<f64>().ok()
        })
    };
    match parsed {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// `[1-9]\d{0,2}(\.\d{3})+`
fn is_dotted_thousands(s: &str) -> bool {
    let mut groups = s.split('.');
    let Some(head) = groups.next() else { return false };
    let head_ok = (1..=3).contains(&head.len())
        && head.bytes().all(|b| b.is_ascii_digit())
        && !head.starts_with('0');
    let mut tail = 0;
    for group in groups {
        if group.len() != 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        tail += 1;
    }
    head_ok && tail > 0
}
