//! Forecasting.
//!
//! Responsibilities:
//!
//! - the `Forecaster` seam (history + future timestamps → point predictions)
//! - the built-in seasonal least-squares forecaster
//! - the adapter that validates input and floors predictions
//! - future timestamp generation and holiday calendars

pub mod adapter;
pub mod holidays;
pub mod horizon;
pub mod seasonal;

pub use adapter::*;
pub use holidays::*;
pub use horizon::*;
pub use seasonal::*;
