//! # `moda` Command Line
//!
//! ## Usage
//! ```bash
//! moda dashboard | summary | overdue | diagnostics
//! moda products [QUERY] [--limit N]
//! moda product add --name NAME --price 89,90 [--sku SKU] [--stock N] ...
//! moda product edit|show|rm ID
//! moda customers
//! moda customer add NAME [--phone P] [--email E]
//! moda customer edit|rm ID
//! moda sales [CUSTOMER]
//! moda sale show|rm ID
//! moda sell CUSTOMER SKU[:QTY]... [-n INSTALLMENTS] [--discount D] [--quote]
//! moda pay SALE INSTALLMENT AMOUNT
//! moda pay-full SALE INSTALLMENT
//! moda pay-clear SALE INSTALLMENT
//! moda import FILE [--yes]        # preview; --yes applies it
//! moda backup [DIR]
//! moda restore FILE [--yes]
//! moda reset DELETAR [--yes]
//! ```
//!
//! Destructive subcommands only act with `--yes`; without it they report
//! what they would do and stop. Results are printed as JSON on stdout,
//! logs go to stderr.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use moda_core::Money;
use serde::Serialize;
use tracing::info;

use crate::commands::{
    backup, cart, customer, dashboard, import, product, sale, settlement,
};
use crate::error::{ApiError, ApiResult};
use crate::navigation::{Confirmation, Outcome, ViewState};
use crate::state::AppConfig;
use crate::AppState;

/// ModaGestão back-office.
#[derive(Debug, Parser)]
#[command(name = "moda", version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of moda.toml in the user config directory
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// One operator action.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Receivables summary, overdue list and record counts
    Dashboard,
    /// Revenue, amount paid and amount receivable
    Summary,
    /// Installments past their due date with money still open
    Overdue,
    /// Store health, migrations and record counts
    Diagnostics,
    /// List or search the catalog
    Products {
        query: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Add, edit, show or delete one product
    #[command(subcommand)]
    Product(ProductCommand),
    /// List customers
    Customers,
    /// Add, edit or delete one customer
    #[command(subcommand)]
    Customer(CustomerCommand),
    /// List sales, newest first, optionally filtered by customer name
    Sales { customer: Option<String> },
    /// Show or delete one sale
    #[command(subcommand)]
    Sale(SaleCommand),
    /// Sell items to a customer on installments
    Sell(SellArgs),
    /// Set the amount paid on an installment (replaces the previous amount)
    Pay {
        sale_id: String,
        installment_id: String,
        #[arg(value_parser = parse_amount, allow_negative_numbers = true)]
        amount: Money,
    },
    /// Mark an installment as paid in full
    PayFull {
        sale_id: String,
        installment_id: String,
    },
    /// Reset the amount paid on an installment to zero
    PayClear {
        sale_id: String,
        installment_id: String,
    },
    /// Preview a catalog file; --yes applies it
    Import {
        file: PathBuf,
        #[command(flatten)]
        confirm: Confirm,
    },
    /// Write a backup file
    Backup { dir: Option<PathBuf> },
    /// Replace all data with a backup
    Restore {
        file: PathBuf,
        #[command(flatten)]
        confirm: Confirm,
    },
    /// Delete all data; type DELETAR to confirm
    Reset {
        word: String,
        #[command(flatten)]
        confirm: Confirm,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ProductCommand {
    /// Add a product; a blank SKU is generated from category, color and size
    Add(ProductFields),
    /// Change the given fields of a product
    Edit {
        id: String,
        #[command(flatten)]
        fields: ProductFields,
    },
    Show { id: String },
    Rm {
        id: String,
        #[command(flatten)]
        confirm: Confirm,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct ProductFields {
    #[arg(long)]
    pub sku: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub size: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long, value_parser = parse_amount)]
    pub price: Option<Money>,
    #[arg(long, value_parser = parse_amount)]
    pub cost: Option<Money>,
    #[arg(long)]
    pub stock: Option<i64>,
}

impl ProductFields {
    /// Overwrites the fields that were given on the command line.
    fn apply(self, mut input: product::ProductInput) -> product::ProductInput {
        if let Some(sku) = self.sku {
            input.sku = sku;
        }
        if let Some(name) = self.name {
            input.name = name;
        }
        if let Some(category) = self.category {
            input.category = category;
        }
        if let Some(size) = self.size {
            input.size = size;
        }
        if let Some(color) = self.color {
            input.color = color;
        }
        if let Some(price) = self.price {
            input.price = price;
        }
        if let Some(cost) = self.cost {
            input.cost = cost;
        }
        if let Some(stock) = self.stock {
            input.stock = stock;
        }
        input
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum CustomerCommand {
    Add {
        name: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Change the given fields of a customer
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Rm {
        id: String,
        #[command(flatten)]
        confirm: Confirm,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum SaleCommand {
    Show {
        id: String,
    },
    /// Delete a sale; sold units are not returned to stock
    Rm {
        id: String,
        #[command(flatten)]
        confirm: Confirm,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct SellArgs {
    /// Customer id or name
    pub customer: String,
    /// Items as SKU or SKU:QTY; a repeated SKU sets the quantity, 0 drops it
    #[arg(required = true, value_parser = parse_item)]
    pub items: Vec<SaleLine>,
    #[arg(short = 'n', long, default_value_t = 1)]
    pub installments: u32,
    #[arg(short, long, value_parser = parse_amount)]
    pub discount: Option<Money>,
    /// Print the cart and totals without selling
    #[arg(long)]
    pub quote: bool,
}

/// One `SKU:QTY` argument of `sell`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLine {
    pub sku: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Args)]
pub struct Confirm {
    /// Carry out the change instead of only reporting it
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl Confirm {
    fn confirmation(self) -> Confirmation {
        Confirmation::from_bool(self.yes)
    }
}

/// Parses `89.90`, `89,90` or `-5` into money.
fn parse_amount(raw: &str) -> Result<Money, String> {
    Money::parse_decimal(&raw.replace(',', ".")).map_err(|e| e.to_string())
}

fn parse_item(raw: &str) -> Result<SaleLine, String> {
    let (sku, quantity) = match raw.rsplit_once(':') {
        Some((sku, qty)) => {
            let quantity = qty
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|q| *q >= 0)
                .ok_or_else(|| format!("'{qty}' is not a quantity"))?;
            (sku, quantity)
        }
        None => (raw, 1),
    };

    let sku = sku.trim();
    if sku.is_empty() {
        return Err(format!("'{raw}' has no SKU"));
    }
    Ok(SaleLine {
        sku: sku.to_string(),
        quantity,
    })
}

// =============================================================================
// Execution
// =============================================================================

/// Loads config, opens the store and runs one command.
pub async fn run(cli: Cli) -> ApiResult<()> {
    let explicit = cli.config.clone();
    let config = tokio::task::spawn_blocking(move || AppConfig::load(explicit.as_deref()))
        .await
        .map_err(|e| ApiError::internal(format!("Config loader stopped: {}", e)))??;
    let app = AppState::bootstrap(config).await?;
    execute(&app, cli.command).await
}

/// Runs a parsed command against an initialized application.
pub async fn execute(app: &AppState, command: Command) -> ApiResult<()> {
    info!(?command, "Running command");
    let db = &app.db;

    match command {
        Command::Dashboard => print_json(&dashboard::dashboard(db, dashboard::today()).await?)?,
        Command::Summary => {
            print_json(&dashboard::ledger_summary(db, dashboard::today()).await?)?
        }
        Command::Overdue => print_json(&dashboard::overdue(db, dashboard::today()).await?)?,
        Command::Diagnostics => print_json(&dashboard::diagnostics(db).await?)?,
        Command::Products { query, limit } => {
            let products = match query {
                Some(q) => product::search_products(db, &q, limit).await?,
                None => product::list_products(db).await?,
            };
            print_json(&products)?;
        }
        Command::Product(action) => run_product(app, action).await?,
        Command::Customers => print_json(&customer::list_customers(db).await?)?,
        Command::Customer(action) => run_customer(app, action).await?,
        Command::Sales { customer } => {
            print_json(&sale::list_sales(db, customer.as_deref()).await?)?
        }
        Command::Sale(SaleCommand::Show { id }) => print_json(&sale::get_sale(db, &id).await?)?,
        Command::Sale(SaleCommand::Rm { id, confirm }) => report_deleted(
            sale::delete_sale(db, &id, confirm.confirmation()).await?,
            "Sale",
            &id,
        ),
        Command::Sell(args) => sell(app, args).await?,
        Command::Pay {
            sale_id,
            installment_id,
            amount,
        } => print_json(&settlement::record_payment(db, &sale_id, &installment_id, amount).await?)?,
        Command::PayFull {
            sale_id,
            installment_id,
        } => print_json(&settlement::mark_paid_in_full(db, &sale_id, &installment_id).await?)?,
        Command::PayClear {
            sale_id,
            installment_id,
        } => print_json(&settlement::clear_payment(db, &sale_id, &installment_id).await?)?,
        Command::Import { file, confirm } => {
            let text = read_file(&file).await?;
            let preview = import::preview_import(db, &text).await?;
            println!("{}", preview.summary());
            for err in &preview.plan.errors {
                println!("  line {}: {}", err.row, err.reason);
            }

            match import::apply_import(
                db,
                &preview.plan,
                app.config.import_options(),
                confirm.confirmation(),
                |p| eprintln!("{}/{}", p.processed, p.total),
            )
            .await?
            {
                Outcome::Done(report) => {
                    println!("{}", report.summary());
                    print_json(&report.failed)?;
                }
                Outcome::Cancelled => println!("Nothing written; run again with --yes to apply"),
            }
        }
        Command::Backup { dir } => {
            let dir = dir.unwrap_or_else(|| app.config.backup_directory());
            let path = backup::write_backup(db, &dir, Utc::now()).await?;
            println!("{}", path.display());
        }
        Command::Restore { file, confirm } => {
            let text = read_file(&file).await?;
            match backup::restore_backup(db, &text, confirm.confirmation()).await? {
                Outcome::Done(report) => print_json(&report)?,
                Outcome::Cancelled => {
                    println!("Backup is valid; run again with --yes to replace all data")
                }
            }
        }
        Command::Reset { word, confirm } => {
            match backup::reset_workspace(db, &app.cart, &word, confirm.confirmation()).await? {
                Outcome::Done(()) => println!("All data deleted"),
                Outcome::Cancelled => println!("Nothing deleted; run again with --yes"),
            }
        }
    }

    Ok(())
}

async fn run_product(app: &AppState, action: ProductCommand) -> ApiResult<()> {
    let db = &app.db;
    app.nav.navigate(ViewState::Inventory);

    match action {
        ProductCommand::Add(fields) => {
            let input = fields.apply(product::ProductInput::default());
            print_json(&product::save_product(db, input).await?)?;
        }
        ProductCommand::Edit { id, fields } => {
            let current = product::get_product(db, &id).await?;
            let input = fields.apply(product::ProductInput {
                id: Some(current.id),
                sku: current.sku,
                name: current.name,
                category: current.category,
                size: current.size,
                color: current.color,
                price: current.price,
                cost: current.cost,
                stock: current.stock,
            });
            print_json(&product::save_product(db, input).await?)?;
        }
        ProductCommand::Show { id } => print_json(&product::get_product(db, &id).await?)?,
        ProductCommand::Rm { id, confirm } => report_deleted(
            product::delete_product(db, &id, confirm.confirmation()).await?,
            "Product",
            &id,
        ),
    }
    Ok(())
}

async fn run_customer(app: &AppState, action: CustomerCommand) -> ApiResult<()> {
    let db = &app.db;
    app.nav.navigate(ViewState::Customers);

    match action {
        CustomerCommand::Add { name, phone, email } => {
            let input = customer::CustomerInput {
                id: None,
                name,
                phone,
                email,
            };
            print_json(&customer::save_customer(db, input).await?)?;
        }
        CustomerCommand::Edit {
            id,
            name,
            phone,
            email,
        } => {
            let current = customer::get_customer(db, &id).await?;
            let input = customer::CustomerInput {
                id: Some(current.id),
                name: name.unwrap_or(current.name),
                phone: phone.unwrap_or(current.phone),
                email: email.or(current.email),
            };
            print_json(&customer::save_customer(db, input).await?)?;
        }
        CustomerCommand::Rm { id, confirm } => report_deleted(
            customer::delete_customer(db, &id, confirm.confirmation()).await?,
            "Customer",
            &id,
        ),
    }
    Ok(())
}

/// Fills the session cart from `SKU:QTY` arguments and checks out.
async fn sell(app: &AppState, args: SellArgs) -> ApiResult<()> {
    let db = &app.db;
    app.nav.navigate(ViewState::NewSale);

    let buyer = customer::find_customer(db, &args.customer).await?;

    for line in &args.items {
        let item = db
            .inner()
            .products()
            .get_by_sku(&line.sku)
            .await?
            .ok_or_else(|| ApiError::not_found("Product", &line.sku))?;
        let in_cart = app.cart.with_cart(|c| c.line(&item.id).is_some());

        match (in_cart, line.quantity) {
            (true, 0) => {
                cart::remove_from_cart(&app.cart, &item.id)?;
            }
            (false, 0) => {}
            (true, quantity) => {
                cart::update_cart_item(db, &app.cart, &item.id, quantity).await?;
            }
            (false, quantity) => {
                cart::add_to_cart(db, &app.cart, &item.id, Some(quantity)).await?;
            }
        }
    }

    if let Some(discount) = args.discount {
        cart::set_discount(&app.cart, discount)?;
    }

    if args.quote {
        return print_json(&cart::get_cart(&app.cart));
    }

    let request = sale::CheckoutRequest {
        customer_id: Some(buyer.id),
        installment_count: args.installments,
    };
    print_json(&sale::checkout(db, &app.cart, &app.nav, request).await?)
}

fn report_deleted(outcome: Outcome<()>, what: &str, id: &str) {
    match outcome {
        Outcome::Done(()) => println!("{what} {id} deleted"),
        Outcome::Cancelled => println!("Nothing deleted; run again with --yes"),
    }
}

async fn read_file(path: &Path) -> ApiResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ApiError::validation(format!("Cannot read {}: {}", path.display(), e)))
}

fn print_json<T: Serialize>(value: &T) -> ApiResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::internal(format!("Could not format output: {}", e)))?;
    println!("{text}");
    Ok(())
}
