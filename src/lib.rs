//! `call-curves` library crate.
//!
//! The binary (`curves`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - each stage (labeling, cleaning, forecasting, curves) can be used on its own

pub mod app;
pub mod calendar;
pub mod clean;
pub mod cli;
pub mod curve;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
