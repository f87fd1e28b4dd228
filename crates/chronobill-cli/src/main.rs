//! Chronobill CLI - per-project timesheet rounding for delivery and invoicing

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use chronobill_core::application::services::{
    AmountView, BillingService, TimesheetService, UpdateOrigin,
};
use chronobill_core::application::validators::PolicyValidator;
use chronobill_core::config::Config;
use chronobill_core::domain::rounding::{RoundingMethod, RoundingPolicy};
use chronobill_core::records::{
    EntryFilter, GroupBy, OrderLineRepository, Product, ProductRepository, Project,
    ProjectRepository, SaleOrderLine, TimeEntry, TimeEntryUpdate,
};
use chronobill_core::storage::{Database, DatabaseConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chronobill")]
#[command(author, version, about = "Per-project timesheet rounding for delivery and invoicing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage projects and their rounding policies
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },

    /// Manage timesheet entries
    Entry {
        #[command(subcommand)]
        action: EntryAction,
    },

    /// Aggregate reported or rounded hours per group
    Report {
        /// Restrict to a project
        #[arg(short, long)]
        project: Option<String>,
        /// Grouping key
        #[arg(long, default_value = "project")]
        group_by: GroupKey,
        /// Present rounded hours instead of reported hours
        #[arg(long)]
        rounded: bool,
    },

    /// Manage sale order lines
    OrderLine {
        #[command(subcommand)]
        action: OrderLineAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum ProjectAction {
    /// Create a new project with the default rounding policy
    Add {
        name: String,
        #[arg(long)]
        granularity: Option<f64>,
        /// Rounding method: nearest or up
        #[arg(long)]
        method: Option<String>,
        /// Invoicing factor in percent, 0 to 500
        #[arg(long)]
        factor: Option<f64>,
    },
    /// List all projects
    List,
    /// Show project details
    Show { id: String },
    /// Replace the rounding policy of a project
    SetPolicy {
        id: String,
        #[arg(long)]
        granularity: Option<f64>,
        /// Rounding method: nearest or up
        #[arg(long)]
        method: Option<String>,
        /// Invoicing factor in percent, 0 to 500
        #[arg(long)]
        factor: Option<f64>,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Create a new product
    Add {
        name: String,
        /// Mark the product as payable via expense reimbursement
        #[arg(long)]
        expensable: bool,
    },
    /// List all products
    List,
}

#[derive(Subcommand)]
enum EntryAction {
    /// Report worked hours
    Add {
        /// Work description
        name: String,
        /// Reported amount in hours
        amount: f64,
        #[arg(short, long)]
        project: Option<String>,
        #[arg(long)]
        product: Option<String>,
        /// Manual rounded amount, kept instead of the computed one
        #[arg(long)]
        rounded: Option<f64>,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Update an entry
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
        /// Manual rounded amount
        #[arg(long)]
        rounded: Option<f64>,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Treat as a bulk/grid edit: recompute over manual rounded values
        #[arg(long)]
        grid_adjust: bool,
    },
    /// Recompute rounded amounts from the current reported amounts
    Refresh { ids: Vec<String> },
    /// List entries
    List {
        /// Restrict to a project
        #[arg(short, long)]
        project: Option<String>,
        /// Present rounded hours instead of reported hours
        #[arg(long)]
        rounded: bool,
    },
}

#[derive(Subcommand)]
enum OrderLineAction {
    /// Create a sale order line for a project
    Add {
        /// Order reference (e.g. "SO0042")
        order_ref: String,
        /// Project the line covers
        project: String,
        /// Ordered quantity in hours
        qty: f64,
        /// Restrict the line to a product
        #[arg(long)]
        product: Option<String>,
    },
    /// List all order lines
    List,
    /// Show an order line with its delivered quantity
    Show { id: String },
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum GroupKey {
    #[default]
    Project,
    Product,
    Date,
}

impl From<GroupKey> for GroupBy {
    fn from(key: GroupKey) -> Self {
        match key {
            GroupKey::Project => GroupBy::Project,
            GroupKey::Product => GroupBy::Product,
            GroupKey::Date => GroupBy::Date,
        }
    }
}

fn parse_method(s: &str) -> Result<RoundingMethod> {
    RoundingMethod::parse(s)
        .ok_or_else(|| anyhow!("Unknown rounding method '{}' (expected 'nearest' or 'up')", s))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date '{}' (expected YYYY-MM-DD)", s))
}

fn view(rounded: bool) -> AmountView {
    if rounded { AmountView::Rounded } else { AmountView::Raw }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn open_database() -> Result<Database> {
    let config = Config::load()?;
    let path = config.database_path();
    tracing::debug!(path = %path.display(), "opening database");
    Database::new(DatabaseConfig::with_path(path)).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let db = open_database().await?;

    match cli.command {
        Commands::Project { action } => run_project(&db, action, cli.format).await,
        Commands::Product { action } => run_product(&db, action, cli.format).await,
        Commands::Entry { action } => run_entry(&db, action, cli.format).await,
        Commands::Report {
            project,
            group_by,
            rounded,
        } => run_report(&db, project, group_by, rounded, cli.format).await,
        Commands::OrderLine { action } => run_order_line(&db, action, cli.format).await,
        Commands::Doctor => run_doctor(&db).await,
    }
}

async fn run_project(db: &Database, action: ProjectAction, format: OutputFormat) -> Result<()> {
    let repo = ProjectRepository::new(db);
    match action {
        ProjectAction::Add {
            name,
            granularity,
            method,
            factor,
        } => {
            let defaults = Config::load()?.default_policy();
            let policy = RoundingPolicy {
                granularity: granularity.unwrap_or(defaults.granularity),
                method: method.as_deref().map(parse_method).transpose()?.unwrap_or(defaults.method),
                invoicing_factor: factor.unwrap_or(defaults.invoicing_factor),
            };
            PolicyValidator::validate(&policy).map_err(anyhow::Error::new)?;

            let project = Project::new(name).with_policy(policy);
            repo.create(&project).await?;
            match format {
                OutputFormat::Json => print_json(&project)?,
                OutputFormat::Text => println!("Created project {} ({})", project.name, project.id),
            }
            Ok(())
        }
        ProjectAction::List => {
            let projects = repo.list().await?;
            match format {
                OutputFormat::Json => print_json(&projects)?,
                OutputFormat::Text => {
                    for p in projects {
                        println!(
                            "{}  {}  granularity={} method={} factor={}%",
                            p.id,
                            p.name,
                            p.policy.granularity,
                            p.policy.method.as_str(),
                            p.policy.invoicing_factor
                        );
                    }
                }
            }
            Ok(())
        }
        ProjectAction::Show { id } => {
            let project = repo
                .get(&id)
                .await?
                .ok_or_else(|| anyhow!("Project '{}' not found", id))?;
            match format {
                OutputFormat::Json => print_json(&project)?,
                OutputFormat::Text => {
                    println!("{}  {}", project.id, project.name);
                    println!("  granularity:      {}", project.policy.granularity);
                    println!("  method:           {}", project.policy.method.as_str());
                    println!("  invoicing factor: {}%", project.policy.invoicing_factor);
                }
            }
            Ok(())
        }
        ProjectAction::SetPolicy {
            id,
            granularity,
            method,
            factor,
        } => {
            let current = repo
                .get(&id)
                .await?
                .ok_or_else(|| anyhow!("Project '{}' not found", id))?;
            let policy = RoundingPolicy {
                granularity: granularity.unwrap_or(current.policy.granularity),
                method: method
                    .as_deref()
                    .map(parse_method)
                    .transpose()?
                    .unwrap_or(current.policy.method),
                invoicing_factor: factor.unwrap_or(current.policy.invoicing_factor),
            };
            PolicyValidator::validate(&policy).map_err(anyhow::Error::new)?;

            repo.set_policy(&id, &policy).await?;
            println!("Policy updated for project {}", id);
            Ok(())
        }
    }
}

async fn run_product(db: &Database, action: ProductAction, format: OutputFormat) -> Result<()> {
    let repo = ProductRepository::new(db);
    match action {
        ProductAction::Add { name, expensable } => {
            let mut product = Product::new(name);
            if expensable {
                product = product.expensable();
            }
            repo.create(&product).await?;
            match format {
                OutputFormat::Json => print_json(&product)?,
                OutputFormat::Text => println!("Created product {} ({})", product.name, product.id),
            }
            Ok(())
        }
        ProductAction::List => {
            let products = repo.list().await?;
            match format {
                OutputFormat::Json => print_json(&products)?,
                OutputFormat::Text => {
                    for p in products {
                        let kind = if p.can_be_expensed { "expensable" } else { "billable" };
                        println!("{}  {}  {}", p.id, p.name, kind);
                    }
                }
            }
            Ok(())
        }
    }
}

async fn run_entry(db: &Database, action: EntryAction, format: OutputFormat) -> Result<()> {
    let service = TimesheetService::new(db);
    match action {
        EntryAction::Add {
            name,
            amount,
            project,
            product,
            rounded,
            date,
        } => {
            let mut entry = TimeEntry::new(name, amount);
            if let Some(project) = project {
                entry = entry.with_project(project);
            }
            if let Some(product) = product {
                entry = entry.with_product(product);
            }
            if let Some(rounded) = rounded {
                entry = entry.with_rounded(rounded);
            }
            if let Some(date) = date {
                entry = entry.with_date(parse_date(&date)?);
            }

            let entry = service.create_entry(entry).await?;
            match format {
                OutputFormat::Json => print_json(&entry)?,
                OutputFormat::Text => println!(
                    "Created entry {}: {}h reported, {}h rounded",
                    entry.id, entry.amount, entry.amount_rounded
                ),
            }
            Ok(())
        }
        EntryAction::Update {
            id,
            name,
            amount,
            rounded,
            date,
            grid_adjust,
        } => {
            let update = TimeEntryUpdate {
                name,
                date: date.as_deref().map(parse_date).transpose()?,
                amount,
                amount_rounded: rounded,
            };
            let origin = if grid_adjust {
                UpdateOrigin::GridAdjust
            } else {
                UpdateOrigin::Standard
            };
            let updated = service.update_entries(&[id], update, origin).await?;
            let entry = &updated[0];
            match format {
                OutputFormat::Json => print_json(entry)?,
                OutputFormat::Text => println!(
                    "Updated entry {}: {}h reported, {}h rounded",
                    entry.id, entry.amount, entry.amount_rounded
                ),
            }
            Ok(())
        }
        EntryAction::Refresh { ids } => {
            service.refresh_rounded(&ids).await?;
            println!("Refreshed {} entries", ids.len());
            Ok(())
        }
        EntryAction::List { project, rounded } => {
            let filter = match project {
                Some(project) => EntryFilter::project(project),
                None => EntryFilter::default(),
            };
            let rows = service.fetch_entries(&filter, view(rounded)).await?;
            match format {
                OutputFormat::Json => print_json(&rows)?,
                OutputFormat::Text => {
                    for row in rows {
                        println!(
                            "{}  {}  {}  {}h",
                            row.id, row.date, row.name, row.hours
                        );
                    }
                }
            }
            Ok(())
        }
    }
}

async fn run_report(
    db: &Database,
    project: Option<String>,
    group_by: GroupKey,
    rounded: bool,
    format: OutputFormat,
) -> Result<()> {
    let filter = match project {
        Some(project) => EntryFilter::project(project),
        None => EntryFilter::default(),
    };
    let groups = TimesheetService::new(db)
        .aggregate_entries(&filter, group_by.into(), view(rounded))
        .await?;
    match format {
        OutputFormat::Json => print_json(&groups)?,
        OutputFormat::Text => {
            for group in groups {
                println!(
                    "{}  {} entries  {}h",
                    group.group_key.as_deref().unwrap_or("-"),
                    group.entry_count,
                    group.hours
                );
            }
        }
    }
    Ok(())
}

async fn run_order_line(db: &Database, action: OrderLineAction, format: OutputFormat) -> Result<()> {
    let repo = OrderLineRepository::new(db);
    match action {
        OrderLineAction::Add {
            order_ref,
            project,
            qty,
            product,
        } => {
            let mut line = SaleOrderLine::new(order_ref, project, qty);
            if let Some(product) = product {
                line = line.with_product(product);
            }
            repo.create(&line).await?;
            match format {
                OutputFormat::Json => print_json(&line)?,
                OutputFormat::Text => println!("Created order line {} ({})", line.order_ref, line.id),
            }
            Ok(())
        }
        OrderLineAction::List => {
            let lines = repo.list().await?;
            match format {
                OutputFormat::Json => print_json(&lines)?,
                OutputFormat::Text => {
                    for line in lines {
                        println!(
                            "{}  {}  ordered={}h delivered={}h",
                            line.id, line.order_ref, line.qty_ordered, line.qty_delivered
                        );
                    }
                }
            }
            Ok(())
        }
        OrderLineAction::Show { id } => {
            let line = repo
                .get(&id)
                .await?
                .ok_or_else(|| anyhow!("Order line '{}' not found", id))?;
            let delivered = BillingService::new(db).delivered_quantity(&id).await?;
            match format {
                OutputFormat::Json => print_json(&line)?,
                OutputFormat::Text => {
                    println!("{}  {}", line.id, line.order_ref);
                    println!("  ordered:   {}h", line.qty_ordered);
                    println!("  delivered: {}h (rounded hours: {}h)", line.qty_delivered, delivered);
                }
            }
            Ok(())
        }
    }
}

async fn run_doctor(db: &Database) -> Result<()> {
    db.health_check().await?;
    let status = db.migration_status().await?;
    println!("Database: ok ({})", db.path().display());
    println!(
        "Schema version: {}/{}{}",
        status.current_version,
        status.target_version,
        if status.needs_migration { " (migration needed)" } else { "" }
    );
    Ok(())
}
