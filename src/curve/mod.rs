//! Curve derivation.
//!
//! - percentage curves per occurrence label, weekday or time-of-day slot (`builder`)
//! - intrahour-to-daily reconciliation (`reconcile`)
//! - side-by-side alignment of two curves (`compare`)

pub mod builder;
pub mod compare;
pub mod reconcile;

pub use builder::*;
pub use compare::*;
pub use reconcile::*;
