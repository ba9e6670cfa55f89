//! # Seed Data Generator
//!
//! Populates a database with sample products (and optionally sales) for
//! development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p kasir-db --bin seed
//!
//! # Custom amount, plus 25 checkouts against them
//! cargo run -p kasir-db --bin seed -- --count 1000 --sales 25
//!
//! # Specify database path
//! cargo run -p kasir-db --bin seed -- --db ./data/kasir.db
//! ```
//!
//! Each product gets a barcode `899{index:010}`, a price between 1.000 and
//! 50.000 and a stock between 0 and 100.

use std::env;

use kasir_core::{CartLine, CheckoutRequest, Money};
use kasir_db::{Database, DbConfig, NewProduct};

/// Product families for realistic test data
const PRODUCTS: &[&str] = &[
    "Indomie Goreng",
    "Indomie Soto",
    "Teh Botol",
    "Aqua",
    "Le Minerale",
    "Kopi Kapal Api",
    "Gula Pasir",
    "Beras Pandan Wangi",
    "Minyak Goreng",
    "Telur Ayam",
    "Susu UHT",
    "Roti Tawar",
    "Sabun Mandi",
    "Pasta Gigi",
    "Sampo Sachet",
    "Kecap Manis",
    "Saus Sambal",
    "Kerupuk Udang",
    "Biskuit Kelapa",
    "Wafer Cokelat",
];

/// Size variants with their price addon
const SIZES: &[(&str, i64)] = &[
    ("Kecil", 0),
    ("Sedang", 1_500),
    ("Besar", 3_000),
    ("250ml", 0),
    ("600ml", 1_000),
    ("1L", 4_000),
    ("1kg", 8_000),
    ("5kg", 45_000),
    ("Isi 6", 12_000),
    ("Isi 12", 22_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut sales: usize = 0;
    let mut db_path = String::from("./kasir_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse().unwrap_or(0);
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
                println!("Kasir Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -s, --sales <N>    Number of checkouts to run afterwards (default: 0)");
                println!("  -d, --db <PATH>    Database file path (default: ./kasir_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Kasir Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
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

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut ids = Vec::with_capacity(count);

    'outer: for (product_idx, name) in PRODUCTS.iter().enumerate() {
        for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
            if ids.len() >= count {
                break 'outer;
            }

            let product = generate_product(name, size, *addon, product_idx * SIZES.len() + size_idx);

            match db.products().insert(&product).await {
                Ok(created) => {
                    ids.push(created.id);
                    if ids.len() % 100 == 0 {
                        println!("  Generated {} products...", ids.len());
                    }
                }
                Err(e) => eprintln!("Failed to insert {}: {}", product.name, e),
            }
        }
    }

    println!();
    println!("✓ Generated {} products in {:?}", ids.len(), start.elapsed());

    if sales > 0 && !ids.is_empty() {
        println!();
        println!("Running {} checkouts...", sales);

        let mut committed = 0;
        for n in 0..sales {
            let request = sample_checkout(&db, &ids, n).await?;
            match db.sales().checkout(&request).await {
                Ok(_) => committed += 1,
                Err(e) => eprintln!("Checkout {} failed: {}", n, e),
            }
        }

        println!("✓ Committed {} sales", committed);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic data.
fn generate_product(name: &str, size: &str, price_addon: i64, seed: usize) -> NewProduct {
    // EAN-13 shaped, checksum not valid
    let barcode = format!("899{:010}", seed);

    let base_price = 1_000 + ((seed * 1_700) % 8_000) as i64;
    let price = Money::new(base_price + price_addon);

    let stock = (seed % 101) as i64;

    NewProduct::new(format!("{} {}", name, size), price, stock).with_barcode(barcode)
}

/// Builds a one to three line cart priced off the current product rows.
async fn sample_checkout(
    db: &Database,
    ids: &[String],
    n: usize,
) -> Result<CheckoutRequest, Box<dyn std::error::Error>> {
    let lines = 1 + n % 3;
    let mut items = Vec::with_capacity(lines);
    let mut subtotal = Money::zero();

    for offset in 0..lines {
        let id = &ids[(n * 7 + offset * 13) % ids.len()];
        let qty = 1 + ((n + offset) % 4) as i64;

        if let Some(product) = db.products().get_by_id(id).await? {
            subtotal += product.price.checked_mul_qty(qty).unwrap_or_default();
        }
        items.push(CartLine { id: id.clone(), qty });
    }

    // Round payment up to the next 5.000 note
    let paid = Money::new((subtotal.amount() / 5_000 + 1) * 5_000);

    Ok(CheckoutRequest {
        items,
        subtotal,
        total: subtotal,
        paid,
        change: paid - subtotal,
    })
}
