//! Sale order line records
//!
//! Minimal collaborator entity: the line a timesheet entry is billed
//! against. Delivered quantity is maintained by the billing service from
//! the rounded hours of attached entries.

use crate::Result;
use crate::storage::Database;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

/// A sale order line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleOrderLine {
    /// Unique line identifier
    pub id: String,
    /// Human-readable order reference (e.g. "SO0042")
    pub order_ref: String,
    /// Project the order covers
    pub project_id: String,
    /// Ordered product, if the line is product-specific
    pub product_id: Option<String>,
    /// Ordered quantity in hours
    pub qty_ordered: f64,
    /// Delivered quantity in hours, derived from rounded timesheet hours
    pub qty_delivered: f64,
    /// When the line was created
    pub created_at: DateTime<Utc>,
    /// When the line was last updated
    pub updated_at: DateTime<Utc>,
}

impl SaleOrderLine {
    /// Create a new order line for a project
    pub fn new(order_ref: impl Into<String>, project_id: impl Into<String>, qty_ordered: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            order_ref: order_ref.into(),
            project_id: project_id.into(),
            product_id: None,
            qty_ordered,
            qty_delivered: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Restrict the line to a product
    pub fn with_product(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }
}

fn from_row(row: &SqliteRow) -> Result<SaleOrderLine> {
    Ok(SaleOrderLine {
        id: row.try_get("id")?,
        order_ref: row.try_get("order_ref")?,
        project_id: row.try_get("project_id")?,
        product_id: row.try_get("product_id")?,
        qty_ordered: row.try_get("qty_ordered")?,
        qty_delivered: row.try_get("qty_delivered")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Sale order line repository for database operations
pub struct OrderLineRepository<'a> {
    db: &'a Database,
}

impl<'a> OrderLineRepository<'a> {
    /// Create a new order line repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new order line in the database
    pub async fn create(&self, line: &SaleOrderLine) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_order_lines
                (id, order_ref, project_id, product_id, qty_ordered, qty_delivered, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&line.id)
        .bind(&line.order_ref)
        .bind(&line.project_id)
        .bind(&line.product_id)
        .bind(line.qty_ordered)
        .bind(line.qty_delivered)
        .bind(line.created_at)
        .bind(line.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Get an order line by ID
    pub async fn get(&self, id: &str) -> Result<Option<SaleOrderLine>> {
        let row = sqlx::query("SELECT * FROM sale_order_lines WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(from_row).transpose()
    }

    /// List all order lines
    pub async fn list(&self) -> Result<Vec<SaleOrderLine>> {
        let rows = sqlx::query("SELECT * FROM sale_order_lines ORDER BY order_ref")
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(from_row).collect()
    }

    /// Find the line an entry of the given project and product charges against.
    ///
    /// A product-specific line wins over a project-wide one.
    pub async fn find_for_project(
        &self,
        project_id: &str,
        product_id: Option<&str>,
    ) -> Result<Option<SaleOrderLine>> {
        if let Some(product_id) = product_id {
            let row = sqlx::query(
                "SELECT * FROM sale_order_lines WHERE project_id = ? AND product_id = ? LIMIT 1",
            )
            .bind(project_id)
            .bind(product_id)
            .fetch_optional(self.db.pool())
            .await?;
            if let Some(row) = row {
                return Ok(Some(from_row(&row)?));
            }
        }
        let row = sqlx::query(
            "SELECT * FROM sale_order_lines WHERE project_id = ? AND product_id IS NULL LIMIT 1",
        )
        .bind(project_id)
        .fetch_optional(self.db.pool())
        .await?;
        row.as_ref().map(from_row).transpose()
    }

    /// Store a recomputed delivered quantity
    pub async fn set_delivered(&self, id: &str, qty_delivered: f64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE sale_order_lines SET qty_delivered = ?, updated_at = ? WHERE id = ?",
        )
        .bind(qty_delivered)
        .bind(Utc::now())
        .bind(id)
        .execute(self.db.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(crate::Error::OrderLineNotFound(id.to_string()));
        }
        Ok(())
    }
}
