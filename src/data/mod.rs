//! Demo data.

pub mod sample;

pub use sample::*;
