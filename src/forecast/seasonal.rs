//! Seasonal least-squares forecaster.
//!
//! A linear trend plus Fourier seasonalities (and an optional holiday
//! indicator), fitted in one shot with SVD least squares. Deterministic given the
//! same inputs.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use nalgebra::{DMatrix, DVector};

use crate::domain::{Seasonality, TimeSeriesPoint};
use crate::error::PipelineError;
use crate::forecast::adapter::{ForecastRequest, Forecaster};
use crate::math::solve_least_squares;
use crate::models::{DAILY, FittedModel, ModelLayout, WEEKLY, YEARLY, fill_design_row, holiday_indicator};

/// The built-in `Forecaster`.
#[derive(Debug, Clone, Default)]
pub struct SeasonalForecaster {
    pub holidays: BTreeSet<NaiveDate>,
}

impl SeasonalForecaster {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Fit the model on `history`.
    pub fn fit(&self, history: &[TimeSeriesPoint], seasonality: &Seasonality) -> Result<FittedModel, PipelineError> {
        let layout = self.layout_for(history, seasonality)?;
        let width = layout.width();
        let n = history.len();

        let mut x = DMatrix::<f64>::zeros(n, width);
        let mut y = DVector::<f64>::zeros(n);
        let mut row = Vec::with_capacity(width);
        for (i, p) in history.iter().enumerate() {
            fill_design_row(&layout, p.timestamp, &mut row);
            for (j, v) in row.iter().enumerate() {
                x[(i, j)] = *v;
            }
            y[i] = p.value;
        }

        let beta = solve_least_squares(&x, &y)
            .ok_or_else(|| PipelineError::UnexpectedValue("seasonal model fit is ill-conditioned".to_string()))?;

        Ok(FittedModel {
            layout,
            coefficients: beta.iter().copied().collect(),
        })
    }

    fn layout_for(&self, history: &[TimeSeriesPoint], seasonality: &Seasonality) -> Result<ModelLayout, PipelineError> {
        let (first, last) = match (history.first(), history.last()) {
            (Some(a), Some(b)) => (a.timestamp, b.timestamp),
            _ => return Err(PipelineError::InsufficientData { needed: 2, got: 0 }),
        };
        let span_days = (last - first).num_seconds() as f64 / 86_400.0;

        let mut components = Vec::new();
        if seasonality.yearly {
            components.push(YEARLY);
        }
        if seasonality.weekly {
            components.push(WEEKLY);
        }
        if seasonality.daily {
            // Midnight-only history cannot identify an intraday cycle; its
            // columns would be constant and only alias the intercept.
            if history.iter().any(|p| p.timestamp.time() != NaiveTime::MIN) {
                components.push(DAILY);
            } else {
                log::debug!("daily seasonality dropped: history has no sub-daily timestamps");
            }
        }

        let holidays = if self.holidays.is_empty() {
            None
        } else if history.iter().any(|p| holiday_indicator(&self.holidays, p.date()) > 0.0) {
            Some(self.holidays.clone())
        } else {
            log::debug!("holiday regressor dropped: no holiday falls inside the history");
            None
        };

        let names: Vec<&str> = components.iter().map(|c| c.name).collect();
        log::debug!("seasonal layout: components=[{}] holidays={}", names.join(", "), holidays.is_some());

        Ok(ModelLayout {
            origin: first,
            span_days,
            components,
            holidays,
        })
    }
}

impl Forecaster for SeasonalForecaster {
    fn fit_predict(&self, request: &ForecastRequest, seasonality: &Seasonality) -> Result<Vec<f64>, PipelineError> {
        let model = self.fit(&request.history, seasonality)?;
        Ok(request.future.iter().map(|&ts| model.predict(ts)).collect())
    }
}
