//! Billing service
//!
//! Links timesheet entries to the sale order line they are charged against
//! and maintains delivered quantities. Quantities are always evaluated over
//! rounded hours, so downstream invoicing sees rounded quantities
//! consistently.

use std::collections::BTreeSet;

use crate::records::entry::{EntryFilter, EntryRepository};
use crate::records::order::OrderLineRepository;
use crate::storage::Database;
use crate::{Error, Result};

/// Service for sale order line assignment and delivered quantities
pub struct BillingService<'a> {
    db: &'a Database,
}

impl<'a> BillingService<'a> {
    /// Create a new billing service
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Re-evaluate which sale order line each entry charges against.
    ///
    /// Entries without a project are detached. Delivered quantities of every
    /// line touched by a move are recomputed afterwards.
    pub async fn assign_order_lines(&self, entry_ids: &[String]) -> Result<()> {
        let entries = EntryRepository::new(self.db);
        let lines = OrderLineRepository::new(self.db);
        let mut affected = BTreeSet::new();

        for id in entry_ids {
            let entry = entries
                .get(id)
                .await?
                .ok_or_else(|| Error::EntryNotFound(id.clone()))?;

            let target_id = match &entry.project_id {
                Some(project_id) => lines
                    .find_for_project(project_id, entry.product_id.as_deref())
                    .await?
                    .map(|line| line.id),
                None => None,
            };

            if entry.order_line_id != target_id {
                tracing::info!(
                    entry = %id,
                    from = entry.order_line_id.as_deref().unwrap_or("-"),
                    to = target_id.as_deref().unwrap_or("-"),
                    "reassigning sale order line"
                );
                entries.set_order_line(id, target_id.as_deref()).await?;
                if let Some(old) = entry.order_line_id {
                    affected.insert(old);
                }
            }
            if let Some(target) = target_id {
                affected.insert(target);
            }
        }

        let affected: Vec<String> = affected.into_iter().collect();
        self.recompute_delivered(&affected).await
    }

    /// Delivered quantity of a line: the sum of stored rounded amounts over
    /// its entries. Unlike row-level reads, no per-entry substitution rule
    /// applies here; every attached entry contributes its rounded value.
    pub async fn delivered_quantity(&self, line_id: &str) -> Result<f64> {
        let rows = EntryRepository::new(self.db)
            .fetch(&EntryFilter::order_line(line_id))
            .await?;
        Ok(rows.iter().map(|row| row.entry.amount_rounded).sum())
    }

    /// Recompute and store delivered quantities for the given lines
    pub async fn recompute_delivered(&self, line_ids: &[String]) -> Result<()> {
        let lines = OrderLineRepository::new(self.db);
        for id in line_ids {
            let qty = self.delivered_quantity(id).await?;
            lines.set_delivered(id, qty).await?;
            tracing::info!(line = %id, qty_delivered = qty, "recomputed delivered quantity");
        }
        Ok(())
    }
}
