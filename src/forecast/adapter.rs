//! Forecast adapter: prepares the forecaster's input and post-processes its output.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use crate::domain::{Seasonality, TimeSeriesPoint};
use crate::error::PipelineError;

/// Minimum number of distinct historical timestamps a fit needs.
pub const MIN_DISTINCT_TIMESTAMPS: usize = 2;

/// History to learn from and the timestamps to predict. Built per metric per
/// period and consumed by a single `fit_and_predict` call.
#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub history: Vec<TimeSeriesPoint>,
    pub future: Vec<NaiveDateTime>,
}

/// A forecasting model treated as a black box.
pub trait Forecaster {
    /// Fit on `request.history` and return one prediction per `request.future`
    /// timestamp, in the same order.
    fn fit_predict(&self, request: &ForecastRequest, seasonality: &Seasonality) -> Result<Vec<f64>, PipelineError>;
}

/// Fit the forecaster and return floored predictions as points.
///
/// Fails with `InsufficientData` when the history has fewer than two distinct
/// timestamps. Any prediction `<= 0` (or non-finite) becomes `floor`.
pub fn fit_and_predict(
    forecaster: &dyn Forecaster,
    request: ForecastRequest,
    seasonality: &Seasonality,
    floor: f64,
) -> Result<Vec<TimeSeriesPoint>, PipelineError> {
    let distinct: BTreeSet<NaiveDateTime> = request.history.iter().map(|p| p.timestamp).collect();
    if distinct.len() < MIN_DISTINCT_TIMESTAMPS {
        return Err(PipelineError::InsufficientData {
            needed: MIN_DISTINCT_TIMESTAMPS,
            got: distinct.len(),
        });
    }
    if request.future.is_empty() {
        return Ok(Vec::new());
    }

    let predictions = forecaster.fit_predict(&request, seasonality)?;
    if predictions.len() != request.future.len() {
        return Err(PipelineError::UnexpectedValue(format!(
            "forecaster returned {} predictions for {} timestamps",
            predictions.len(),
            request.future.len()
        )));
    }

    let mut floored = 0usize;
    let out: Vec<TimeSeriesPoint> = request
        .future
        .iter()
        .zip(predictions)
        .map(|(&ts, y)| {
            let value = if y.is_finite() && y > 0.0 {
                y
            } else {
                floored += 1;
                floor
            };
            TimeSeriesPoint::new(ts, value)
        })
        .collect();

    log::debug!(
        "forecast: history={} future={} floored={}",
        request.history.len(),
        out.len(),
        floored
    );
    Ok(out)
}
