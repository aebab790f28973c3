//! Historical series cleaning.

pub mod outliers;

pub use outliers::*;
