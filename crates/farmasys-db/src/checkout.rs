//! # Checkout Transaction
//!
//! The SQLite side of a sale.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database::checkout(request, cashier)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  checkout_lock.lock()      ← one checkout at a time                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │   ├── load products        (fetch_many)                                 │
//! │   ├── aggregate / validate / price   (farmasys_core::run_checkout)      │
//! │   ├── decrement stock      (guarded UPDATE per line)                    │
//! │   └── insert receipt + lines                                            │
//! │       │                                                                 │
//! │       ├── Ok  → COMMIT                                                  │
//! │       └── Err → ROLLBACK   (stock and receipts untouched)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, Transaction};
use tracing::{info, warn};

use crate::pool::Database;
use crate::repository::product::{decrement_stock, fetch_many};
use crate::repository::receipt::insert_rows;
use farmasys_core::{run_checkout, CheckoutError, CheckoutOutcome, CheckoutRequest, CheckoutStore, Product, ReceiptDetail};

/// [`CheckoutStore`] over one open SQLite transaction.
pub struct SqliteCheckoutStore {
    tx: Transaction<'static, Sqlite>,
}

impl SqliteCheckoutStore {
    pub fn new(tx: Transaction<'static, Sqlite>) -> Self {
        SqliteCheckoutStore { tx }
    }

    pub fn into_inner(self) -> Transaction<'static, Sqlite> {
        self.tx
    }
}

impl CheckoutStore for SqliteCheckoutStore {
    async fn load_products(&mut self, ids: &[String]) -> Result<Vec<Product>, CheckoutError> {
        fetch_many(&mut self.tx, ids)
            .await
            .map_err(|e| CheckoutError::TransactionFailed(e.to_string()))
    }

    async fn commit(&mut self, receipt: &ReceiptDetail) -> Result<(), CheckoutError> {
        for line in &receipt.lines {
            decrement_stock(&mut self.tx, &line.product_id, line.qty)
                .await
                .map_err(|e| e.into_checkout_error(|_| line.name.clone()))?;
        }

        insert_rows(&mut self.tx, receipt)
            .await
            .map_err(|e| CheckoutError::TransactionFailed(e.to_string()))
    }
}

impl Database {
    /// Runs a checkout as a single atomic transaction.
    ///
    /// ## Returns
    /// * `Ok(CheckoutOutcome)` - committed; stock decremented, receipt stored
    /// * `Err(CheckoutError)` - nothing was written
    pub async fn checkout(
        &self,
        request: &CheckoutRequest,
        cashier: &str,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let _guard = self.checkout_lock.lock().await;

        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CheckoutError::TransactionFailed(e.to_string()))?;
        let mut store = SqliteCheckoutStore::new(tx);

        match run_checkout(&mut store, request, cashier, Utc::now()).await {
            Ok(outcome) => {
                store
                    .into_inner()
                    .commit()
                    .await
                    .map_err(|e| CheckoutError::TransactionFailed(e.to_string()))?;

                info!(
                    receipt_id = %outcome.receipt_id(),
                    cashier = %cashier,
                    lines = outcome.receipt.lines.len(),
                    total_cents = outcome.total().cents(),
                    "Checkout committed"
                );
                Ok(outcome)
            }
            Err(err) => {
                if let Err(rollback) = store.into_inner().rollback().await {
                    warn!(error = %rollback, "Checkout rollback failed");
                }
                Err(err)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;
    use chrono::NaiveDate;
    use farmasys_core::checkout::CartLineInput;
    use farmasys_core::{Money, NewProduct, PaymentMethod};

    fn product(id: &str, sku: &str, name: &str, stock: i64, cents: i64) -> NewProduct {
        NewProduct {
            id: Some(id.to_string()),
            sku: sku.to_string(),
            name: name.to_string(),
            stock,
            price: Money::from_cents(cents),
            expiry: NaiveDate::from_ymd_opt(2026, 5, 20),
            category: "Analgésico".to_string(),
        }
    }

    async fn stocked(config: DbConfig) -> Database {
        let db = Database::new(config).await.unwrap();
        db.products()
            .create(&product("1", "750100010001", "Paracetamol 500mg", 120, 550))
            .await
            .unwrap();
        db.products()
            .create(&product("5", "750100010005", "Ibuprofeno 400mg", 50, 450))
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_reference_sale() {
        let db = stocked(DbConfig::in_memory()).await;
        let mut request = CheckoutRequest::new(vec![CartLineInput::new("5", 3)]);
        request.customer = Some("Ana".to_string());
        request.payment_method = Some("tarjeta".to_string());

        let outcome = db.checkout(&request, "caja1").await.unwrap();

        assert_eq!(outcome.subtotal(), Money::from_cents(1350));
        assert_eq!(outcome.iva(), Money::from_cents(216));
        assert_eq!(outcome.total(), Money::from_cents(1566));
        assert_eq!(db.products().get("5").await.unwrap().stock, 47);

        let stored = db.receipts().get(outcome.receipt_id()).await.unwrap();
        assert_eq!(stored, outcome.receipt);
        assert_eq!(stored.receipt.payment_method, PaymentMethod::Card);
        assert_eq!(stored.receipt.cashier, "caja1");
        assert_eq!(stored.receipt.customer.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn test_duplicate_lines_aggregate() {
        let db = stocked(DbConfig::in_memory()).await;
        let request = CheckoutRequest::new(vec![
            CartLineInput::new("5", 2),
            CartLineInput::new("1", 1),
            CartLineInput::new("5", 3),
        ]);

        let outcome = db.checkout(&request, "caja1").await.unwrap();

        assert_eq!(outcome.receipt.lines.len(), 2);
        assert_eq!(outcome.receipt.lines[0].product_id, "5");
        assert_eq!(outcome.receipt.lines[0].qty, 5);
        assert_eq!(db.products().get("5").await.unwrap().stock, 45);
        assert_eq!(db.products().get("1").await.unwrap().stock, 119);
    }

    #[tokio::test]
    async fn test_failure_leaves_everything_untouched() {
        let db = stocked(DbConfig::in_memory()).await;

        let request = CheckoutRequest::new(vec![
            CartLineInput::new("1", 2),
            CartLineInput::new("5", 51),
        ]);
        let err = db.checkout(&request, "caja1").await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InsufficientStock { available: 50, requested: 51, .. }
        ));

        let request = CheckoutRequest::new(vec![CartLineInput::new("ghost", 1)]);
        let err = db.checkout(&request, "caja1").await.unwrap_err();
        assert_eq!(err, CheckoutError::ProductNotFound("ghost".to_string()));

        let err = db.checkout(&CheckoutRequest::default(), "caja1").await.unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart);

        assert_eq!(db.products().get("1").await.unwrap().stock, 120);
        assert_eq!(db.products().get("5").await.unwrap().stock, 50);
        assert_eq!(db.receipts().count().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_checkouts_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("farmasys.db")).max_connections(4);
        let db = stocked(config).await;

        let spawn = |db: Database| {
            tokio::spawn(async move {
                let request = CheckoutRequest::new(vec![CartLineInput::new("5", 30)]);
                db.checkout(&request, "caja1").await
            })
        };
        let a = spawn(db.clone());
        let b = spawn(db.clone());
        let results = [a.await.unwrap(), b.await.unwrap()];

        let ok = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(CheckoutError::InsufficientStock { available: 20, .. }))));
        assert_eq!(db.products().get("5").await.unwrap().stock, 20);
        assert_eq!(db.receipts().count().await.unwrap(), 1);
    }
}
