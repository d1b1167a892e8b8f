//! # Seed Data Generator
//!
//! Populates a database with development data: a company profile, a
//! variant catalog, a few customers, and opening stock entries.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p kasira-db --bin seed
//!
//! # Specify database path
//! cargo run -p kasira-db --bin seed -- --db ./data/kasira.db
//! ```

use std::env;

use tracing::info;
use tracing_subscriber::EnvFilter;

use kasira_core::Money;
use kasira_db::coordinator::stock_entry::{CreateStockEntryInput, StockEntryLineInput};
use kasira_db::repository::variant::NewVariant;
use kasira_db::{Database, DbConfig};

/// Catalog seeded per product line: (sku, name, cost cents, price cents).
const CATALOG: &[(&str, &str, i64, i64)] = &[
    ("TSHIRT-RED-S", "Basic Tee Red S", 4500, 9900),
    ("TSHIRT-RED-M", "Basic Tee Red M", 4500, 9900),
    ("TSHIRT-RED-L", "Basic Tee Red L", 4500, 9900),
    ("TSHIRT-BLK-M", "Basic Tee Black M", 4500, 9900),
    ("TSHIRT-BLK-L", "Basic Tee Black L", 4500, 9900),
    ("HOODIE-GRY-M", "Zip Hoodie Grey M", 12000, 24900),
    ("HOODIE-GRY-L", "Zip Hoodie Grey L", 12000, 24900),
    ("HOODIE-BLK-L", "Zip Hoodie Black L", 12500, 25900),
    ("CAP-NVY-OS", "Snapback Cap Navy", 3000, 7900),
    ("TOTE-CRM-OS", "Canvas Tote Cream", 2500, 5900),
];

/// Customers seeded for sale testing: (name, phone).
const CUSTOMERS: &[(&str, &str)] = &[
    ("Budi Santoso", "0812-1000-2000"),
    ("Siti Aminah", "0857-3000-4000"),
    ("Rina Wulandari", "0813-5000-6000"),
];

/// Opening quantity received per variant.
const OPENING_QUANTITY: i64 = 25;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./kasira.db".to_string());

    info!(db = %db_path, "Seeding database");

    let db = match Database::new(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = seed(&db).await {
        eprintln!("Seeding failed: {e}");
        std::process::exit(1);
    }

    info!("Seeding complete");
}

/// Parses `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
}

async fn seed(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    db.company()
        .save(
            "Toko Kasira",
            Some("Jl. Merdeka No. 1, Bandung"),
            Some("022-555-0101"),
            "INV",
            "SE",
        )
        .await?;
    info!("Company profile saved");

    for (name, phone) in CUSTOMERS {
        db.customers().create(name, Some(phone), None).await?;
    }
    info!(count = CUSTOMERS.len(), "Customers created");

    let mut lines = Vec::with_capacity(CATALOG.len());
    for (sku, name, cost_cents, price_cents) in CATALOG {
        // Variants open at zero; the opening stock arrives through a real
        // stock entry so the ledger and the entry history agree.
        let variant = db
            .variants()
            .insert(NewVariant {
                sku: (*sku).to_string(),
                name: (*name).to_string(),
                cost_price_cents: *cost_cents,
                selling_price_cents: *price_cents,
                current_stock: 0,
                min_stock_level: 5,
            })
            .await?;

        lines.push(StockEntryLineInput {
            variant_id: variant.id,
            quantity: OPENING_QUANTITY,
            cost_price: Money::from_cents(*cost_cents),
        });
    }
    info!(count = CATALOG.len(), "Variants created");

    let entry = db
        .stock_entry_coordinator()
        .create_stock_entry(
            "seed",
            CreateStockEntryInput {
                notes: Some("Opening stock".to_string()),
                items: lines,
            },
        )
        .await?;
    info!(entry_number = %entry.entry.entry_number, "Opening stock recorded");

    Ok(())
}
