//! Seasonal additive model.
//!
//! The model is kept as small, pure functions over a `ModelLayout` so the
//! forecaster can stay a thin fit/predict wrapper.

pub mod model;

pub use model::*;
