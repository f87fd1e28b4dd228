//! Error types for Chronobill

use thiserror::Error;

/// Result type alias using Chronobill's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Chronobill error types with helpful messages
#[derive(Error, Debug)]
pub enum Error {
    #[error("Project '{0}' not found. Run `chronobill project list` to see all projects.")]
    ProjectNotFound(String),

    #[error("Product '{0}' not found. Run `chronobill product list` to see all products.")]
    ProductNotFound(String),

    #[error("Timesheet entry '{0}' not found.")]
    EntryNotFound(String),

    #[error("Sale order line '{0}' not found.")]
    OrderLineNotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
