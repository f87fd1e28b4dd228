//! Product records
//!
//! Minimal catalog entity. The expensable flag drives both the recompute
//! skip conditions and read-time substitution of rounded hours.

use crate::Result;
use crate::storage::Database;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

/// A billable catalog item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier
    pub id: String,
    /// Product name
    pub name: String,
    /// Whether this item is payable via expense reimbursement
    pub can_be_expensed: bool,
    /// When the product was created
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Create a new product
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            can_be_expensed: false,
            created_at: Utc::now(),
        }
    }

    /// Mark the product as expensable
    pub fn expensable(mut self) -> Self {
        self.can_be_expensed = true;
        self
    }
}

fn from_row(row: &SqliteRow) -> Result<Product> {
    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        can_be_expensed: row.try_get("can_be_expensed")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Product repository for database operations
pub struct ProductRepository<'a> {
    db: &'a Database,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new product in the database
    pub async fn create(&self, product: &Product) -> Result<()> {
        sqlx::query(
            "INSERT INTO products (id, name, can_be_expensed, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.can_be_expensed)
        .bind(product.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Get a product by ID
    pub async fn get(&self, id: &str) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(from_row).transpose()
    }

    /// List all products
    pub async fn list(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query("SELECT * FROM products ORDER BY name")
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(from_row).collect()
    }
}
