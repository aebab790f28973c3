//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - calendar keys (`DayOfWeek`, `OccurrenceLabel`, `YearMonth`)
//! - series points (`TimeSeriesPoint`, `LabeledPoint`)
//! - curve outputs (`Curve`, `CurveKey`, `CurveEntry`, `CurveFile`)
//! - run configuration (`RunConfig`, `IntrahourConfig`, `Seasonality`, `OutlierPolicy`)

pub mod types;

pub use types::*;
