//! Project records
//!
//! Projects own the rounding policy applied to their timesheet entries.

use crate::Result;
use crate::domain::rounding::{RoundingMethod, RoundingPolicy};
use crate::storage::Database;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

/// A project with its timesheet rounding policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique project identifier
    pub id: String,
    /// Project name
    pub name: String,
    /// Rounding policy applied to this project's entries
    pub policy: RoundingPolicy,
    /// When the project was created
    pub created_at: DateTime<Utc>,
    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project with the default rounding policy
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            policy: RoundingPolicy::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the rounding policy
    pub fn with_policy(mut self, policy: RoundingPolicy) -> Self {
        self.policy = policy;
        self
    }
}

fn from_row(row: &SqliteRow) -> Result<Project> {
    let method: String = row.try_get("rounding_method")?;
    Ok(Project {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        policy: RoundingPolicy {
            granularity: row.try_get("rounding_granularity")?,
            method: RoundingMethod::parse(&method).unwrap_or_default(),
            invoicing_factor: row.try_get("invoicing_factor")?,
        },
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Project repository for database operations
pub struct ProjectRepository<'a> {
    db: &'a Database,
}

impl<'a> ProjectRepository<'a> {
    /// Create a new project repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new project in the database
    pub async fn create(&self, project: &Project) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO projects (id, name, rounding_granularity, rounding_method, invoicing_factor, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&project.id)
        .bind(&project.name)
        .bind(project.policy.granularity)
        .bind(project.policy.method.as_str())
        .bind(project.policy.invoicing_factor)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Get a project by ID
    pub async fn get(&self, id: &str) -> Result<Option<Project>> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(from_row).transpose()
    }

    /// List all projects, newest first
    pub async fn list(&self) -> Result<Vec<Project>> {
        let rows = sqlx::query("SELECT * FROM projects ORDER BY created_at DESC")
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(from_row).collect()
    }

    /// Replace the rounding policy of a project
    pub async fn set_policy(&self, id: &str, policy: &RoundingPolicy) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET rounding_granularity = ?, rounding_method = ?, invoicing_factor = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(policy.granularity)
        .bind(policy.method.as_str())
        .bind(policy.invoicing_factor)
        .bind(Utc::now())
        .bind(id)
        .execute(self.db.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(crate::Error::ProjectNotFound(id.to_string()));
        }
        Ok(())
    }
}
