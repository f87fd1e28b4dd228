//! Chronobill Core Library
//!
//! This crate provides the core functionality for Chronobill, including:
//! - Rounding policy (per-project granularity, method, and invoicing factor)
//! - Timesheet entries with a derived, manually overridable rounded quantity
//! - Application services (recompute triggers, raw/rounded reads, aggregation)
//! - Billing hook that attaches entries to sale order lines using rounded hours
//! - Storage (SQLite via sqlx, versioned migrations)

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod records;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::application::services::{AmountView, BillingService, TimesheetService, UpdateOrigin};
    pub use crate::config::Config;
    pub use crate::domain::rounding::{RoundingMethod, RoundingPolicy};
    pub use crate::error::{Error, Result};
    pub use crate::storage::Database;
}
