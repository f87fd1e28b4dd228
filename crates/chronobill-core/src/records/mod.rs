//! Record entities and repositories
//!
//! CRUD operations over the SQLite record store, one module per entity:
//!
//! - `project`: projects carrying the rounding policy
//! - `product`: catalog items with the expensable flag
//! - `entry`: timesheet entries with reported and rounded hours
//! - `order`: sale order lines entries are billed against

pub mod entry;
pub mod order;
pub mod product;
pub mod project;

pub use entry::{
    AggregateRow, EntryFilter, EntryRepository, FetchedEntry, GroupBy, TimeEntry, TimeEntryUpdate,
};
pub use order::{OrderLineRepository, SaleOrderLine};
pub use product::{Product, ProductRepository};
pub use project::{Project, ProjectRepository};
