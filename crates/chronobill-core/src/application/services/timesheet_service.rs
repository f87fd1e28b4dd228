//! Timesheet service
//!
//! Owns the lifecycle of the derived rounded amount: forced recompute on
//! create, conditional recompute on update, and the read operations that
//! present raw or rounded hours on request.

use crate::application::services::{AmountView, BillingService, presented_hours};
use crate::records::entry::{
    EntryFilter, EntryRepository, GroupBy, TimeEntry, TimeEntryUpdate,
};
use crate::records::product::ProductRepository;
use crate::records::project::ProjectRepository;
use crate::storage::Database;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// Where an update originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateOrigin {
    /// Regular edit; an existing manual rounded value is preserved
    #[default]
    Standard,
    /// Bulk/grid edit; recompute even over a manual rounded value
    GridAdjust,
}

/// A fetched entry with its presented hours
#[derive(Debug, Clone, Serialize)]
pub struct TimeEntryRow {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    pub project_id: Option<String>,
    pub product_id: Option<String>,
    /// Hours under the requested view: the rounded amount where the entry
    /// qualifies, the reported amount otherwise
    pub hours: f64,
    /// Reported amount, always carried alongside the presented value
    pub amount: f64,
    /// Derived rounded amount, always carried alongside the presented value
    pub amount_rounded: f64,
}

/// One group of a timesheet aggregation
#[derive(Debug, Clone, Serialize)]
pub struct TimesheetAggregate {
    /// Group key (project id, product id, or date depending on grouping)
    pub group_key: Option<String>,
    pub entry_count: i64,
    /// Total under the requested view
    pub hours: f64,
    /// Sum of reported amounts
    pub total_amount: f64,
    /// Sum of rounded amounts
    pub total_rounded: f64,
}

/// Service for timesheet entry operations
pub struct TimesheetService<'a> {
    db: &'a Database,
}

impl<'a> TimesheetService<'a> {
    /// Create a new timesheet service
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create an entry and compute its rounded amount.
    ///
    /// The recompute is forced unless the caller supplied a non-zero rounded
    /// amount in the entry itself, which is kept as a manual value.
    pub async fn create_entry(&self, entry: TimeEntry) -> Result<TimeEntry> {
        let manual = entry.amount_rounded != 0.0;
        EntryRepository::new(self.db).create(&entry).await?;

        if !manual {
            self.recompute_rounded(std::slice::from_ref(&entry.id), true).await?;
        }
        BillingService::new(self.db)
            .assign_order_lines(std::slice::from_ref(&entry.id))
            .await?;

        self.get_entry(&entry.id).await
    }

    /// Update entries and maintain their rounded amounts.
    ///
    /// When the payload does not set the rounded amount itself, every
    /// affected entry is recomputed; a `GridAdjust` origin forces the
    /// recompute over existing manual values. Afterwards the billing
    /// attachment is re-evaluated under rounded quantities. A manual
    /// rounded value keeps its line assignment but still flows into the
    /// line's delivered quantity.
    pub async fn update_entries(
        &self,
        ids: &[String],
        update: TimeEntryUpdate,
        origin: UpdateOrigin,
    ) -> Result<Vec<TimeEntry>> {
        let manual = update.amount_rounded.is_some();
        EntryRepository::new(self.db).update(ids, &update).await?;

        let billing = BillingService::new(self.db);
        if !manual {
            let force = origin == UpdateOrigin::GridAdjust;
            self.recompute_rounded(ids, force).await?;
            billing.assign_order_lines(ids).await?;
        }

        let entries = EntryRepository::new(self.db);
        let mut result = Vec::with_capacity(ids.len());
        for id in ids {
            result.push(
                entries
                    .get(id)
                    .await?
                    .ok_or_else(|| Error::EntryNotFound(id.clone()))?,
            );
        }

        if manual {
            let lines: Vec<String> = result
                .iter()
                .filter_map(|entry| entry.order_line_id.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            billing.recompute_delivered(&lines).await?;
        }
        Ok(result)
    }

    /// Force a recompute after the reported amount changed.
    ///
    /// Edit-form counterpart of the create-time recompute: manual rounded
    /// values are overwritten.
    pub async fn refresh_rounded(&self, ids: &[String]) -> Result<()> {
        self.recompute_rounded(ids, true).await?;
        BillingService::new(self.db).assign_order_lines(ids).await
    }

    /// Get an entry by ID
    pub async fn get_entry(&self, id: &str) -> Result<TimeEntry> {
        EntryRepository::new(self.db)
            .get(id)
            .await?
            .ok_or_else(|| Error::EntryNotFound(id.to_string()))
    }

    /// Fetch entries, presenting hours under the requested view.
    ///
    /// Rows always carry the reported amount, the rounded amount, and the
    /// project and product references next to the presented value.
    pub async fn fetch_entries(
        &self,
        filter: &EntryFilter,
        view: AmountView,
    ) -> Result<Vec<TimeEntryRow>> {
        let rows = EntryRepository::new(self.db).fetch(filter).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let hours = presented_hours(&row, view);
                TimeEntryRow {
                    id: row.entry.id,
                    name: row.entry.name,
                    date: row.entry.date,
                    project_id: row.entry.project_id,
                    product_id: row.entry.product_id,
                    hours,
                    amount: row.entry.amount,
                    amount_rounded: row.entry.amount_rounded,
                }
            })
            .collect())
    }

    /// Aggregate entries per group, presenting totals under the requested view
    pub async fn aggregate_entries(
        &self,
        filter: &EntryFilter,
        group_by: GroupBy,
        view: AmountView,
    ) -> Result<Vec<TimesheetAggregate>> {
        let rows = EntryRepository::new(self.db).aggregate(filter, group_by).await?;
        Ok(rows
            .into_iter()
            .map(|row| TimesheetAggregate {
                group_key: row.group_key,
                entry_count: row.entry_count,
                hours: match view {
                    AmountView::Raw => row.total_amount,
                    AmountView::Rounded => row.total_rounded,
                },
                total_amount: row.total_amount,
                total_rounded: row.total_rounded,
            })
            .collect())
    }

    /// Recompute rounded amounts from the owning project's policy.
    ///
    /// Skip order, first match wins:
    /// 1. entry has no project
    /// 2. entry has a product that is not expensable
    /// 3. a non-zero rounded value exists and the recompute is not forced
    async fn recompute_rounded(&self, ids: &[String], force: bool) -> Result<()> {
        let entries = EntryRepository::new(self.db);
        let projects = ProjectRepository::new(self.db);
        let products = ProductRepository::new(self.db);

        for id in ids {
            let entry = entries
                .get(id)
                .await?
                .ok_or_else(|| Error::EntryNotFound(id.clone()))?;

            let Some(project_id) = &entry.project_id else {
                tracing::debug!(entry = %id, "skipping recompute: entry has no project");
                continue;
            };
            if let Some(product_id) = &entry.product_id {
                let product = products
                    .get(product_id)
                    .await?
                    .ok_or_else(|| Error::ProductNotFound(product_id.clone()))?;
                if !product.can_be_expensed {
                    tracing::debug!(entry = %id, product = %product_id, "skipping recompute: product not expensable");
                    continue;
                }
            }
            if entry.amount_rounded != 0.0 && !force {
                tracing::debug!(entry = %id, "skipping recompute: manual rounded value present");
                continue;
            }

            let project = projects
                .get(project_id)
                .await?
                .ok_or_else(|| Error::ProjectNotFound(project_id.clone()))?;
            let rounded = project.policy.apply(entry.amount);
            tracing::debug!(entry = %id, amount = entry.amount, rounded, "recomputed rounded amount");
            entries.set_rounded(id, rounded).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rounding::{RoundingMethod, RoundingPolicy};
    use crate::records::product::{Product, ProductRepository};
    use crate::records::project::{Project, ProjectRepository};

    async fn setup() -> (Database, Project) {
        let db = Database::in_memory().await.expect("in-memory database");
        let project = Project::new("Test project").with_policy(RoundingPolicy {
            granularity: 0.25,
            method: RoundingMethod::Up,
            invoicing_factor: 200.0,
        });
        ProjectRepository::new(&db)
            .create(&project)
            .await
            .expect("create project");
        (db, project)
    }

    #[tokio::test]
    async fn test_create_computes_rounded() {
        let (db, project) = setup().await;
        let service = TimesheetService::new(&db);

        let entry = service
            .create_entry(TimeEntry::new("work", 1.0).with_project(&project.id))
            .await
            .expect("create entry");
        assert_eq!(entry.amount_rounded, 2.0);
    }

    #[tokio::test]
    async fn test_create_keeps_manual_rounded() {
        let (db, project) = setup().await;
        let service = TimesheetService::new(&db);

        let entry = service
            .create_entry(
                TimeEntry::new("work", 1.0)
                    .with_project(&project.id)
                    .with_rounded(4.0),
            )
            .await
            .expect("create entry");
        assert_eq!(entry.amount_rounded, 4.0);
    }

    #[tokio::test]
    async fn test_create_without_project_leaves_zero() {
        let (db, _project) = setup().await;
        let service = TimesheetService::new(&db);

        let entry = service
            .create_entry(TimeEntry::new("untracked", 1.0))
            .await
            .expect("create entry");
        assert_eq!(entry.amount_rounded, 0.0);
    }

    #[tokio::test]
    async fn test_manual_override_persists_until_refresh() {
        let (db, project) = setup().await;
        let service = TimesheetService::new(&db);

        let entry = service
            .create_entry(TimeEntry::new("work", 2.0).with_project(&project.id))
            .await
            .expect("create entry");
        assert_eq!(entry.amount_rounded, 4.0);

        // manual override sticks
        let ids = vec![entry.id.clone()];
        let updated = service
            .update_entries(
                &ids,
                TimeEntryUpdate {
                    amount_rounded: Some(5.0),
                    ..Default::default()
                },
                UpdateOrigin::Standard,
            )
            .await
            .expect("update");
        assert_eq!(updated[0].amount_rounded, 5.0);

        // changing the reported amount alone does not clobber the override
        let updated = service
            .update_entries(
                &ids,
                TimeEntryUpdate {
                    amount: Some(5.0),
                    ..Default::default()
                },
                UpdateOrigin::Standard,
            )
            .await
            .expect("update");
        assert_eq!(updated[0].amount_rounded, 5.0);

        // an explicit refresh recomputes from the new amount
        service.refresh_rounded(&ids).await.expect("refresh");
        let entry = service.get_entry(&ids[0]).await.expect("get");
        assert_eq!(entry.amount_rounded, 10.0);
    }

    #[tokio::test]
    async fn test_grid_adjust_forces_recompute() {
        let (db, project) = setup().await;
        let service = TimesheetService::new(&db);

        let entry = service
            .create_entry(
                TimeEntry::new("work", 1.0)
                    .with_project(&project.id)
                    .with_rounded(4.0),
            )
            .await
            .expect("create entry");

        let ids = vec![entry.id.clone()];
        let updated = service
            .update_entries(
                &ids,
                TimeEntryUpdate {
                    amount: Some(3.0),
                    ..Default::default()
                },
                UpdateOrigin::GridAdjust,
            )
            .await
            .expect("update");
        assert_eq!(updated[0].amount_rounded, 6.0);
    }

    #[tokio::test]
    async fn test_recompute_skips_non_expensable_product() {
        let (db, project) = setup().await;
        let products = ProductRepository::new(&db);
        let billable = Product::new("Consulting");
        products.create(&billable).await.expect("create product");

        let service = TimesheetService::new(&db);
        let entry = service
            .create_entry(
                TimeEntry::new("work", 1.0)
                    .with_project(&project.id)
                    .with_product(&billable.id),
            )
            .await
            .expect("create entry");
        assert_eq!(entry.amount_rounded, 0.0);
    }

    #[tokio::test]
    async fn test_recompute_runs_for_expensable_product() {
        let (db, project) = setup().await;
        let products = ProductRepository::new(&db);
        let expense = Product::new("Travel").expensable();
        products.create(&expense).await.expect("create product");

        let service = TimesheetService::new(&db);
        let entry = service
            .create_entry(
                TimeEntry::new("drive", 1.0)
                    .with_project(&project.id)
                    .with_product(&expense.id),
            )
            .await
            .expect("create entry");
        assert_eq!(entry.amount_rounded, 2.0);
    }

    #[tokio::test]
    async fn test_fetch_substitution_rules() {
        let (db, project) = setup().await;
        let products = ProductRepository::new(&db);
        let expense = Product::new("Travel").expensable();
        products.create(&expense).await.expect("create product");

        let service = TimesheetService::new(&db);
        let plain = service
            .create_entry(TimeEntry::new("plain", 1.0).with_project(&project.id))
            .await
            .expect("create");
        let no_project = service
            .create_entry(TimeEntry::new("no project", 1.0))
            .await
            .expect("create");
        let expensed = service
            .create_entry(
                TimeEntry::new("expensed", 1.0)
                    .with_project(&project.id)
                    .with_product(&expense.id),
            )
            .await
            .expect("create");

        let hours_for = |rows: &[TimeEntryRow], id: &str| {
            rows.iter().find(|r| r.id == id).expect("row").hours
        };

        let raw = service
            .fetch_entries(&EntryFilter::default(), AmountView::Raw)
            .await
            .expect("fetch raw");
        assert_eq!(hours_for(&raw, &plain.id), 1.0);
        assert_eq!(hours_for(&raw, &no_project.id), 1.0);
        assert_eq!(hours_for(&raw, &expensed.id), 1.0);

        let rounded = service
            .fetch_entries(&EntryFilter::default(), AmountView::Rounded)
            .await
            .expect("fetch rounded");
        // project, no product: rounded hours presented
        assert_eq!(hours_for(&rounded, &plain.id), 2.0);
        // no project: reported hours, even under the rounded view
        assert_eq!(hours_for(&rounded, &no_project.id), 1.0);
        // expensable product: reported hours, even under the rounded view
        assert_eq!(hours_for(&rounded, &expensed.id), 1.0);

        // raw and rounded amounts are always carried in the row
        let row = rounded.iter().find(|r| r.id == plain.id).expect("row");
        assert_eq!(row.amount, 1.0);
        assert_eq!(row.amount_rounded, 2.0);
    }

    #[tokio::test]
    async fn test_aggregate_raw_vs_rounded() {
        let (db, project) = setup().await;
        let service = TimesheetService::new(&db);

        service
            .create_entry(TimeEntry::new("a", 1.0).with_project(&project.id))
            .await
            .expect("create");
        service
            .create_entry(TimeEntry::new("b", 0.9).with_project(&project.id))
            .await
            .expect("create");

        let filter = EntryFilter::project(&project.id);
        let raw = service
            .aggregate_entries(&filter, GroupBy::Project, AmountView::Raw)
            .await
            .expect("aggregate raw");
        assert_eq!(raw.len(), 1);
        assert!((raw[0].hours - 1.9).abs() < 1e-9);

        let rounded = service
            .aggregate_entries(&filter, GroupBy::Project, AmountView::Rounded)
            .await
            .expect("aggregate rounded");
        assert_eq!(rounded[0].hours, 4.0);
        assert_eq!(rounded[0].entry_count, 2);
        // both sums are always carried in the group
        assert!((rounded[0].total_amount - 1.9).abs() < 1e-9);
        assert_eq!(rounded[0].total_rounded, 4.0);
    }
}
