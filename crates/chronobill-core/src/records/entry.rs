//! Timesheet entry records
//!
//! Entries carry the reported amount in hours and a derived rounded amount.
//! The rounded amount is maintained by the timesheet service; this module
//! only provides storage operations, including the joined fetch and the
//! grouped aggregation the service builds its raw/rounded reads on.

use crate::Result;
use crate::storage::Database;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

/// A timesheet entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntry {
    /// Unique entry identifier
    pub id: String,
    /// Work description
    pub name: String,
    /// Day the work was reported on
    pub date: NaiveDate,
    /// Owning project, if any
    pub project_id: Option<String>,
    /// Product the work maps to, if any
    pub product_id: Option<String>,
    /// Sale order line the entry is billed against, if assigned
    pub order_line_id: Option<String>,
    /// Reported amount in hours
    pub amount: f64,
    /// Derived rounded amount in hours, manually overridable
    pub amount_rounded: f64,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
    /// When the entry was last updated
    pub updated_at: DateTime<Utc>,
}

impl TimeEntry {
    /// Create a new entry dated today
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            date: now.date_naive(),
            project_id: None,
            product_id: None,
            order_line_id: None,
            amount,
            amount_rounded: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach the entry to a project
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Attach the entry to a product
    pub fn with_product(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    /// Set the reported date
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    /// Supply a manual rounded amount
    pub fn with_rounded(mut self, amount_rounded: f64) -> Self {
        self.amount_rounded = amount_rounded;
        self
    }
}

/// Field changes for an update; unset fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct TimeEntryUpdate {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub amount_rounded: Option<f64>,
}

/// Row filter for fetch and aggregate operations
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub project_id: Option<String>,
    pub order_line_id: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl EntryFilter {
    /// Filter on a project
    pub fn project(id: impl Into<String>) -> Self {
        Self {
            project_id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Filter on a sale order line
    pub fn order_line(id: impl Into<String>) -> Self {
        Self {
            order_line_id: Some(id.into()),
            ..Default::default()
        }
    }
}

/// Grouping key for aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Project,
    Product,
    Date,
}

impl GroupBy {
    fn column(self) -> &'static str {
        match self {
            GroupBy::Project => "e.project_id",
            GroupBy::Product => "e.product_id",
            GroupBy::Date => "e.date",
        }
    }
}

/// An entry joined with the expensable flag of its product
#[derive(Debug, Clone)]
pub struct FetchedEntry {
    pub entry: TimeEntry,
    /// `can_be_expensed` of the referenced product, None when no product
    pub product_expensable: Option<bool>,
}

/// One group of an aggregation
#[derive(Debug, Clone)]
pub struct AggregateRow {
    pub group_key: Option<String>,
    pub entry_count: i64,
    pub total_amount: f64,
    pub total_rounded: f64,
}

fn from_row(row: &SqliteRow) -> Result<TimeEntry> {
    Ok(TimeEntry {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        date: row.try_get("date")?,
        project_id: row.try_get("project_id")?,
        product_id: row.try_get("product_id")?,
        order_line_id: row.try_get("order_line_id")?,
        amount: row.try_get("amount")?,
        amount_rounded: row.try_get("amount_rounded")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn where_clause(filter: &EntryFilter) -> String {
    let mut clauses = Vec::new();
    if filter.project_id.is_some() {
        clauses.push("e.project_id = ?");
    }
    if filter.order_line_id.is_some() {
        clauses.push("e.order_line_id = ?");
    }
    if filter.date_from.is_some() {
        clauses.push("e.date >= ?");
    }
    if filter.date_to.is_some() {
        clauses.push("e.date <= ?");
    }
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

fn bind_filter<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    filter: &'q EntryFilter,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    if let Some(project_id) = &filter.project_id {
        query = query.bind(project_id);
    }
    if let Some(order_line_id) = &filter.order_line_id {
        query = query.bind(order_line_id);
    }
    if let Some(date_from) = &filter.date_from {
        query = query.bind(date_from);
    }
    if let Some(date_to) = &filter.date_to {
        query = query.bind(date_to);
    }
    query
}

/// Timesheet entry repository for database operations
pub struct EntryRepository<'a> {
    db: &'a Database,
}

impl<'a> EntryRepository<'a> {
    /// Create a new entry repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new entry in the database
    pub async fn create(&self, entry: &TimeEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO timesheet_entries
                (id, name, date, project_id, product_id, order_line_id, amount, amount_rounded, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.name)
        .bind(entry.date)
        .bind(&entry.project_id)
        .bind(&entry.product_id)
        .bind(&entry.order_line_id)
        .bind(entry.amount)
        .bind(entry.amount_rounded)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Get an entry by ID
    pub async fn get(&self, id: &str) -> Result<Option<TimeEntry>> {
        let row = sqlx::query("SELECT * FROM timesheet_entries WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(from_row).transpose()
    }

    /// Apply an update to a set of entries, returning them as stored afterwards
    pub async fn update(&self, ids: &[String], update: &TimeEntryUpdate) -> Result<Vec<TimeEntry>> {
        let mut updated = Vec::with_capacity(ids.len());
        for id in ids {
            let mut entry = self
                .get(id)
                .await?
                .ok_or_else(|| crate::Error::EntryNotFound(id.clone()))?;
            if let Some(name) = &update.name {
                entry.name = name.clone();
            }
            if let Some(date) = update.date {
                entry.date = date;
            }
            if let Some(amount) = update.amount {
                entry.amount = amount;
            }
            if let Some(amount_rounded) = update.amount_rounded {
                entry.amount_rounded = amount_rounded;
            }
            entry.updated_at = Utc::now();
            sqlx::query(
                r#"
                UPDATE timesheet_entries
                SET name = ?, date = ?, amount = ?, amount_rounded = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&entry.name)
            .bind(entry.date)
            .bind(entry.amount)
            .bind(entry.amount_rounded)
            .bind(entry.updated_at)
            .bind(&entry.id)
            .execute(self.db.pool())
            .await?;
            updated.push(entry);
        }
        Ok(updated)
    }

    /// Store a recomputed rounded amount
    pub async fn set_rounded(&self, id: &str, amount_rounded: f64) -> Result<()> {
        sqlx::query(
            "UPDATE timesheet_entries SET amount_rounded = ?, updated_at = ? WHERE id = ?",
        )
        .bind(amount_rounded)
        .bind(Utc::now())
        .bind(id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Attach or detach the billed sale order line
    pub async fn set_order_line(&self, id: &str, order_line_id: Option<&str>) -> Result<()> {
        sqlx::query(
            "UPDATE timesheet_entries SET order_line_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(order_line_id)
        .bind(Utc::now())
        .bind(id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Fetch entries with the expensable flag of their product joined in
    pub async fn fetch(&self, filter: &EntryFilter) -> Result<Vec<FetchedEntry>> {
        let sql = format!(
            r#"
            SELECT e.*, p.can_be_expensed AS product_expensable
            FROM timesheet_entries e
            LEFT JOIN products p ON p.id = e.product_id
            {}
            ORDER BY e.date, e.created_at
            "#,
            where_clause(filter)
        );
        let rows = bind_filter(sqlx::query(&sql), filter)
            .fetch_all(self.db.pool())
            .await?;
        rows.iter()
            .map(|row| {
                Ok(FetchedEntry {
                    entry: from_row(row)?,
                    product_expensable: row.try_get("product_expensable")?,
                })
            })
            .collect()
    }

    /// Aggregate reported and rounded totals per group
    pub async fn aggregate(&self, filter: &EntryFilter, group_by: GroupBy) -> Result<Vec<AggregateRow>> {
        let sql = format!(
            r#"
            SELECT {column} AS group_key,
                   COUNT(*) AS entry_count,
                   SUM(e.amount) AS total_amount,
                   SUM(e.amount_rounded) AS total_rounded
            FROM timesheet_entries e
            {where_clause}
            GROUP BY {column}
            ORDER BY {column}
            "#,
            column = group_by.column(),
            where_clause = where_clause(filter)
        );
        let rows = bind_filter(sqlx::query(&sql), filter)
            .fetch_all(self.db.pool())
            .await?;
        rows.iter()
            .map(|row| {
                Ok(AggregateRow {
                    group_key: row.try_get("group_key")?,
                    entry_count: row.try_get("entry_count")?,
                    total_amount: row.try_get("total_amount")?,
                    total_rounded: row.try_get("total_rounded")?,
                })
            })
            .collect()
    }
}
