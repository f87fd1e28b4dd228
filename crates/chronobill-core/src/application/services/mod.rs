//! Application services
//!
//! - `timesheet_service`: entry lifecycle, recompute triggers, raw/rounded
//!   reads and aggregation
//! - `billing_service`: sale order line assignment and delivered quantities,
//!   always evaluated over rounded hours

pub mod billing_service;
pub mod timesheet_service;

pub use billing_service::BillingService;
pub use timesheet_service::{
    TimeEntryRow, TimesheetAggregate, TimesheetService, UpdateOrigin,
};

use crate::records::entry::FetchedEntry;

/// Which quantity a read-style operation presents.
///
/// Replaces the stringly-typed context flag of record frameworks with an
/// explicit caller choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmountView {
    /// Present the reported amount as entered
    #[default]
    Raw,
    /// Present the rounded amount where the entry qualifies
    Rounded,
}

/// The hours a fetched entry presents under a view.
///
/// Rounded substitution applies only when the entry belongs to a project and
/// its product, if any, is not expensable; otherwise the reported amount is
/// presented unchanged.
pub(crate) fn presented_hours(row: &FetchedEntry, view: AmountView) -> f64 {
    match view {
        AmountView::Raw => row.entry.amount,
        AmountView::Rounded => {
            let expensable = row.product_expensable.unwrap_or(false);
            if row.entry.project_id.is_some() && !expensable {
                row.entry.amount_rounded
            } else {
                row.entry.amount
            }
        }
    }
}
