//! Storage layer - SQLite record store
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//!
//! The record store is the transaction boundary for all consistency; the
//! services above it take no locks of their own.

pub mod database;
pub mod migrations;

pub use database::{Database, DatabaseConfig};
pub use migrations::MigrationStatus;
