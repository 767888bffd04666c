//! # Seed Data Generator
//!
//! Populates the database with a demo apparel store for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default), a few customers and sales
//! cargo run -p moda-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p moda-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p moda-db --bin seed -- --db ./data/moda.db
//! ```
//!
//! ## Generated Data
//! - Products across categories × colors × sizes, SKU `BS-{CAT}-{COR}-{NN}-{size}`
//! - Price R$39.90 - R$199.90, cost 40-60% of price, stock 0 - 12
//! - Customers with phone numbers
//! - A handful of installment sales, some partially settled

use chrono::{Duration, Utc};
use moda_core::cart::CartLine;
use moda_core::import::generate_sku;
use moda_core::sale::create_sale;
use moda_core::{Customer, Money, Product};
use moda_db::{Database, DbConfig};
use std::env;
use uuid::Uuid;

/// Category names with their base price in cents.
const CATEGORIES: &[(&str, i64)] = &[
    ("Camisa", 7_990),
    ("Camiseta", 3_990),
    ("Calça", 12_990),
    ("Bermuda", 6_990),
    ("Vestido", 14_990),
    ("Saia", 8_990),
    ("Jaqueta", 19_990),
    ("Regata", 3_990),
];

const COLORS: &[&str] = &["Azul", "Preto", "Branco", "Vermelho", "Verde", "Rosa"];

const SIZES: &[&str] = &["PP", "P", "M", "G", "GG"];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Ana Souza", "11 98888-1001"),
    ("Bruno Lima", "11 97777-2002"),
    ("Carla Mendes", "21 96666-3003"),
    ("Daniela Rocha", "31 95555-4004"),
    ("Eduardo Alves", "41 94444-5005"),
    ("Fernanda Costa", "51 93333-6006"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./moda_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("ModaGestão Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./moda_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 ModaGestão Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.workspace().counts().await?;
    if !existing.is_empty() {
        println!(
            "⚠ Database already has {} products, {} customers, {} sales",
            existing.products, existing.customers, existing.sales
        );
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Products
    println!();
    println!("Generating products...");
    let start = std::time::Instant::now();
    let mut products = Vec::with_capacity(count);

    'outer: for (category, base_price) in CATEGORIES {
        for color in COLORS {
            for size in SIZES {
                if products.len() >= count {
                    break 'outer;
                }
                let product = generate_product(category, *base_price, color, size, products.len() + 1);
                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.sku, e);
                    continue;
                }
                products.push(product);
            }
        }
    }
    println!("✓ Generated {} products in {:?}", products.len(), start.elapsed());

    // Customers
    let mut customers = Vec::with_capacity(CUSTOMERS.len());
    for (name, phone) in CUSTOMERS {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            email: None,
        };
        db.customers().insert(&customer).await?;
        customers.push(customer);
    }
    println!("✓ Generated {} customers", customers.len());

    // Sales: spread over the last months so some installments are overdue
    let in_stock: Vec<&Product> = products.iter().filter(|p| p.stock > 0).collect();
    let mut sales = 0;
    for (n, customer) in customers.iter().enumerate() {
        let Some(product) = in_stock.get(n * 3) else {
            break;
        };
        let lines = [CartLine::from_product(product, 1)];
        let when = Utc::now() - Duration::days(30 * (n as i64 + 1));
        let installments = (n as u32 % 4) + 1;

        let sale = create_sale(Some(customer), &lines, Money::zero(), installments, when)?;
        db.sales().checkout(&sale).await?;

        // first installment settled for every other customer
        if n % 2 == 0 {
            if let Some(first) = sale.installments.first() {
                db.sales().mark_paid_in_full(&sale.id, &first.id).await?;
            }
        }
        sales += 1;
    }
    println!("✓ Generated {} sales", sales);

    println!();
    let counts = db.workspace().counts().await?;
    println!(
        "Store: {} products, {} customers, {} sales",
        counts.products, counts.customers, counts.sales
    );
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic pseudo-random data.
fn generate_product(category: &str, base_price: i64, color: &str, size: &str, seq: usize) -> Product {
    // larger sizes cost a little more
    let size_addon = match size {
        "G" => 500,
        "GG" => 1_000,
        _ => 0,
    };
    let price_cents = base_price + size_addon;

    let cost_pct = 40 + (seq * 7 % 21) as i64;
    let cost_cents = price_cents * cost_pct / 100;

    Product {
        id: Uuid::new_v4().to_string(),
        sku: generate_sku(category, color, size, seq),
        name: format!("{} {} {}", category, color, size),
        category: category.to_string(),
        size: size.to_string(),
        color: color.to_string(),
        price: Money::from_cents(price_cents),
        cost: Money::from_cents(cost_cents),
        stock: (seq * 5 % 13) as i64,
    }
}
