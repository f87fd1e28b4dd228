//! Domain layer
//!
//! Pure business rules, independent of storage and services.

pub mod rounding;

pub use rounding::{RoundingMethod, RoundingPolicy};
