//! Application service layer
//!
//! Orchestrates domain operations over the record store and provides the
//! public API for the core functionality: recompute triggers, raw/rounded
//! reads, and the billing hook.

pub mod errors;
pub mod services;
pub mod validators;

pub use errors::ApplicationError;
