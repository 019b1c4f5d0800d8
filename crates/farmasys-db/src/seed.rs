//! # Demo Inventory
//!
//! The five products a fresh counter starts with, used by the `seed` binary
//! and by the server when demo seeding is switched on.

use chrono::NaiveDate;
use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;
use farmasys_core::{Money, NewProduct};

/// id, sku, name, stock, price (cents), expiry (y, m, d), category
const DEMO: &[(&str, &str, &str, i64, i64, (i32, u32, u32), &str)] = &[
    ("1", "750100010001", "Paracetamol 500mg", 120, 550, (2026, 1, 15), "Analgésico"),
    ("2", "750100010002", "Amoxicilina 250mg", 42, 875, (2025, 9, 10), "Antibiótico"),
    ("3", "750100010003", "Omeprazol 20mg", 12, 720, (2025, 12, 1), "Antiácido"),
    ("4", "750100010004", "Loratadina 10mg", 0, 680, (2027, 2, 1), "Antialérgico"),
    ("5", "750100010005", "Ibuprofeno 400mg", 50, 450, (2026, 5, 20), "Analgésico"),
];

pub fn demo_products() -> Vec<NewProduct> {
    DEMO.iter()
        .map(|&(id, sku, name, stock, cents, (y, m, d), category)| NewProduct {
            id: Some(id.to_string()),
            sku: sku.to_string(),
            name: name.to_string(),
            stock,
            price: Money::from_cents(cents),
            expiry: NaiveDate::from_ymd_opt(y, m, d),
            category: category.to_string(),
        })
        .collect()
}

/// Loads the demo products into an empty inventory.
///
/// Returns how many were inserted; 0 when products already exist.
pub async fn seed_demo_inventory(db: &Database) -> DbResult<usize> {
    let existing = db.products().count().await?;
    if existing > 0 {
        info!(existing, "Inventory not empty, skipping demo seed");
        return Ok(0);
    }

    let products = demo_products();
    for product in &products {
        db.products().create(product).await?;
    }

    info!(count = products.len(), "Demo inventory seeded");
    Ok(products.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;

    #[tokio::test]
    async fn test_seed_only_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert_eq!(seed_demo_inventory(&db).await.unwrap(), 5);
        assert_eq!(seed_demo_inventory(&db).await.unwrap(), 0);

        let ibuprofeno = db.products().get("5").await.unwrap();
        assert_eq!(ibuprofeno.stock, 50);
        assert_eq!(ibuprofeno.price_cents, 450);
        assert_eq!(db.products().count_low_stock(10).await.unwrap(), 1);
    }
}
