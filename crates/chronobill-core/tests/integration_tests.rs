//! Chronobill Core Integration Tests
//!
//! End-to-end flow over the public API: policy setup, entry lifecycle,
//! raw/rounded reads, and delivered quantities on sale order lines.

use chronobill_core::application::services::{AmountView, TimesheetService, UpdateOrigin};
use chronobill_core::domain::rounding::{RoundingMethod, RoundingPolicy};
use chronobill_core::records::{
    EntryFilter, GroupBy, OrderLineRepository, Product, ProductRepository, Project,
    ProjectRepository, SaleOrderLine, TimeEntry, TimeEntryUpdate,
};
use chronobill_core::storage::Database;

struct Fixture {
    db: Database,
    project: Project,
    expense: Product,
    line: SaleOrderLine,
}

async fn fixture() -> Fixture {
    let db = Database::in_memory().await.expect("in-memory database");

    let project = Project::new("Customer portal").with_policy(RoundingPolicy {
        granularity: 0.25,
        method: RoundingMethod::Up,
        invoicing_factor: 200.0,
    });
    ProjectRepository::new(&db)
        .create(&project)
        .await
        .expect("create project");

    let expense = Product::new("Travel time").expensable();
    ProductRepository::new(&db)
        .create(&expense)
        .await
        .expect("create product");

    let line = SaleOrderLine::new("SO0001", &project.id, 3.0);
    OrderLineRepository::new(&db)
        .create(&line)
        .await
        .expect("create order line");

    Fixture {
        db,
        project,
        expense,
        line,
    }
}

#[tokio::test]
async fn test_full_timesheet_flow() {
    let f = fixture().await;
    let timesheets = TimesheetService::new(&f.db);

    // reported 1h, policy 0.25/up/200% -> 2h rounded, attached to the line
    let entry = timesheets
        .create_entry(TimeEntry::new("API work", 1.0).with_project(&f.project.id))
        .await
        .expect("create entry");
    assert_eq!(entry.amount_rounded, 2.0);
    assert_eq!(entry.order_line_id.as_deref(), Some(f.line.id.as_str()));

    let delivered = OrderLineRepository::new(&f.db)
        .get(&f.line.id)
        .await
        .expect("get line")
        .expect("line exists")
        .qty_delivered;
    assert_eq!(delivered, 2.0);

    // manual override flows through to the delivered quantity
    timesheets
        .update_entries(
            &[entry.id.clone()],
            TimeEntryUpdate {
                amount_rounded: Some(4.0),
                ..Default::default()
            },
            UpdateOrigin::Standard,
        )
        .await
        .expect("manual override");
    let delivered = OrderLineRepository::new(&f.db)
        .get(&f.line.id)
        .await
        .expect("get line")
        .expect("line exists")
        .qty_delivered;
    assert_eq!(delivered, 4.0);

    // forced refresh recomputes from the reported amount again
    timesheets
        .refresh_rounded(&[entry.id.clone()])
        .await
        .expect("refresh");
    let entry = timesheets.get_entry(&entry.id).await.expect("get entry");
    assert_eq!(entry.amount_rounded, 2.0);
}

#[tokio::test]
async fn test_reads_present_raw_or_rounded() {
    let f = fixture().await;
    let timesheets = TimesheetService::new(&f.db);

    timesheets
        .create_entry(TimeEntry::new("billable", 1.0).with_project(&f.project.id))
        .await
        .expect("create billable entry");
    timesheets
        .create_entry(
            TimeEntry::new("expensed travel", 1.0)
                .with_project(&f.project.id)
                .with_product(&f.expense.id),
        )
        .await
        .expect("create expensed entry");

    let filter = EntryFilter::project(&f.project.id);

    let raw: f64 = timesheets
        .fetch_entries(&filter, AmountView::Raw)
        .await
        .expect("fetch raw")
        .iter()
        .map(|row| row.hours)
        .sum();
    assert_eq!(raw, 2.0);

    // only the billable entry substitutes; the expensed one stays raw
    let rounded: f64 = timesheets
        .fetch_entries(&filter, AmountView::Rounded)
        .await
        .expect("fetch rounded")
        .iter()
        .map(|row| row.hours)
        .sum();
    assert_eq!(rounded, 3.0);

    // group aggregation swaps the presented total wholesale
    let groups = timesheets
        .aggregate_entries(&filter, GroupBy::Project, AmountView::Rounded)
        .await
        .expect("aggregate");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].hours, 4.0);
    assert_eq!(groups[0].total_amount, 2.0);
}

#[tokio::test]
async fn test_policy_change_applies_to_later_recomputes() {
    let f = fixture().await;
    let timesheets = TimesheetService::new(&f.db);

    let entry = timesheets
        .create_entry(TimeEntry::new("work", 1.0).with_project(&f.project.id))
        .await
        .expect("create entry");
    assert_eq!(entry.amount_rounded, 2.0);

    ProjectRepository::new(&f.db)
        .set_policy(
            &f.project.id,
            &RoundingPolicy {
                granularity: 0.25,
                method: RoundingMethod::Up,
                invoicing_factor: 400.0,
            },
        )
        .await
        .expect("set policy");

    // existing value untouched until an explicit refresh
    let unchanged = timesheets.get_entry(&entry.id).await.expect("get entry");
    assert_eq!(unchanged.amount_rounded, 2.0);

    timesheets
        .refresh_rounded(&[entry.id.clone()])
        .await
        .expect("refresh");
    let refreshed = timesheets.get_entry(&entry.id).await.expect("get entry");
    assert_eq!(refreshed.amount_rounded, 4.0);
}
