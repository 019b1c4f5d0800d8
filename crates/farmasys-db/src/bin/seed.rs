//! # Seed Data Loader
//!
//! Prepares a database for development: applies migrations, loads the demo
//! pharmacy inventory and creates the first admin account.
//!
//! ## Usage
//! ```bash
//! # Default database in the current directory
//! cargo run -p farmasys-db --bin seed
//!
//! # Specify database path and admin credentials
//! cargo run -p farmasys-db --bin seed -- --db ./data/farmasys.db --admin-user admin --admin-password s3creto
//! ```
//!
//! Existing products or users are left alone, so running it twice is harmless.

use std::env;

use farmasys_db::seed::seed_demo_inventory;
use farmasys_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./farmasys_dev.db");
    let mut admin_user = String::from("admin");
    let mut admin_password = String::from("123");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-user" | "-u" => {
                if i + 1 < args.len() {
                    admin_user = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-password" | "-p" => {
                if i + 1 < args.len() {
                    admin_password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("FarmaSys Seed Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>                Database file path (default: ./farmasys_dev.db)");
                println!("  -u, --admin-user <NAME>        Bootstrap admin username (default: admin)");
                println!("  -p, --admin-password <PASS>    Bootstrap admin password (default: 123)");
                println!("  -h, --help                     Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    println!("🌱 FarmaSys Seed Data Loader");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let inserted = seed_demo_inventory(&db).await?;
    if inserted == 0 {
        let existing = db.products().count().await?;
        println!("⚠ Database already has {} products, inventory left as is", existing);
    } else {
        println!("✓ Loaded {} demo products", inserted);
    }

    if db.users().ensure_bootstrap_admin(&admin_user, &admin_password).await? {
        println!("✓ Created admin account '{}'", admin_user);
    } else {
        println!("⚠ Users already exist, no admin created");
    }

    let low = db.products().count_low_stock(farmasys_core::DEFAULT_LOW_STOCK_THRESHOLD).await?;
    println!();
    println!("  Units on hand: {}", db.products().total_units().await?);
    println!("  Low stock:     {}", low);

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
