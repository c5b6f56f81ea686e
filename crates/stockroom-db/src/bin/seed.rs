//! # Seed Data Generator
//!
//! Populates a development database with a catalog, some order history and
//! the reports for it.
//!
//! ## Usage
//! ```bash
//! # Seed ./stockroom_dev.db with 14 days of history (default)
//! cargo run -p stockroom-db --bin seed
//!
//! # Longer history, different file
//! cargo run -p stockroom-db --bin seed -- --days 60 --db ./data/stockroom.db
//! ```
//!
//! Everything goes through the catalog and fulfillment services, so stock,
//! expenses and order prices follow the same rules as in production.

use chrono::{Duration, Utc};
use std::env;
use stockroom_core::{NewProduct, OrderRequest, PriceType};
use stockroom_db::{Database, DbConfig, ServiceError};

/// (category, [(product, arrival, sales, kaspi)])
const CATALOG: &[(&str, &[(&str, i64, i64, i64)])] = &[
    (
        "Coffee",
        &[
            ("Arabica Beans 1kg", 6_500, 9_900, 10_490),
            ("Robusta Beans 1kg", 4_800, 7_500, 7_990),
            ("Ground Espresso 250g", 1_900, 2_900, 3_150),
        ],
    ),
    (
        "Tea",
        &[
            ("Green Tea 100g", 900, 1_500, 1_650),
            ("Black Tea 250g", 1_200, 1_900, 2_050),
        ],
    ),
    (
        "Accessories",
        &[
            ("French Press 600ml", 5_200, 8_900, 9_400),
            ("Hand Grinder", 7_800, 12_900, 13_500),
        ],
    ),
];

const INITIAL_STOCK: i64 = 200;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut days: i64 = 14;
    let mut db_path = String::from("./stockroom_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-n" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(14);
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
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --days <N>     Days of order history (default: 14)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockroom Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("History:  {} days", days);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Catalog
    let catalog = db.catalog();
    let mut products = Vec::new();
    for (category_name, items) in CATALOG {
        let category = catalog.create_category(category_name).await?;
        for (name, arrival, sales, kaspi) in items.iter() {
            let product = catalog
                .create_product(NewProduct {
                    name: name.to_string(),
                    category_id: category.id.clone(),
                    arrival_price: *arrival,
                    sales_price: *sales,
                    kaspi_price: *kaspi,
                    quantity: INITIAL_STOCK,
                })
                .await?;
            products.push(product);
        }
    }
    println!("✓ Created {} products", products.len());

    // Order history: a few orders a day, most finished on the day they were placed
    let fulfillment = db.fulfillment();
    let now = Utc::now();
    let mut placed = 0;
    let mut finished = 0;

    for day in (0..days).rev() {
        let finished_at = now - Duration::days(day);
        for (n, product) in products.iter().enumerate() {
            let seed = (day as usize) * 31 + n * 7;
            if seed % 3 == 0 {
                continue;
            }

            let request = OrderRequest {
                product_id: product.id.clone(),
                quantity: 1 + (seed % 4) as i64,
                deadline: (finished_at + Duration::days(3)).date_naive(),
                price_type: if seed % 2 == 0 {
                    PriceType::Sales
                } else {
                    PriceType::Kaspi
                },
            };

            let order = match fulfillment.create_order(&request).await {
                Ok(order) => order,
                Err(ServiceError::Rejected(rejection)) => {
                    eprintln!("  skipped order: {}", rejection);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            placed += 1;

            if day > 0 || seed % 5 != 0 {
                fulfillment.mark_finished_at(&order.id, finished_at).await?;
                finished += 1;
            }
        }
    }
    println!("✓ Placed {} orders, finished {}", placed, finished);

    // Stocking expenses were recorded at creation time; fold them into today
    let today = db.calendar().date_of(now);
    let from = db.calendar().date_of(now - Duration::days(days));
    let reports = db.aggregator().rebuild_range(from, today).await?;
    println!("✓ Rebuilt {} reports", reports.len());

    if let Some(report) = reports.last() {
        println!();
        println!(
            "Today ({}): selling {}, benefit {}, expenses {}",
            report.date, report.selling, report.benefit, report.expenses
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
