//! # Product Repository
//!
//! The inventory store: product CRUD plus the stock primitives used by the
//! checkout transaction.
//!
//! ## Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products                                                        │
//! │     SET stock = stock - :qty                                            │
//! │   WHERE id = :id AND stock >= :qty     ← guard, never goes negative     │
//! │       │                                                                 │
//! │       ├── 1 row  → done                                                 │
//! │       └── 0 rows → re-read stock: missing → NotFound                    │
//! │                                   short   → InsufficientStock           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! [`decrement_stock`] takes a connection, not the pool, so it can only run
//! inside a transaction the caller controls.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use farmasys_core::{NewProduct, Product, ProductPatch, ValidationError};

const SELECT_PRODUCT: &str = r#"
    SELECT id, sku, name, stock, price_cents, expiry, category, created_at, updated_at
    FROM products
"#;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// All products, by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("{SELECT_PRODUCT} ORDER BY name COLLATE NOCASE, id");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its id, `None` when absent.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("{SELECT_PRODUCT} WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its id or fails with `NotFound`.
    pub async fn get(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("{SELECT_PRODUCT} WHERE sku = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Creates a product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - the stored row
    /// * `Err(DbError::Validation)` - a field broke a rule
    /// * `Err(DbError::UniqueViolation)` - sku or id already used
    pub async fn create(&self, new: &NewProduct) -> DbResult<Product> {
        new.validate()?;

        let sku = new.sku.trim();
        if self.get_by_sku(sku).await?.is_some() {
            return Err(DbError::duplicate("sku", sku));
        }

        let now = Utc::now();
        let product = Product {
            id: new
                .id
                .as_deref()
                .map(str::trim)
                .map(str::to_string)
                .unwrap_or_else(generate_product_id),
            sku: sku.to_string(),
            name: new.name.trim().to_string(),
            stock: new.stock,
            price_cents: new.price.cents(),
            expiry: new.expiry,
            category: new.category.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, stock, price_cents, expiry, category, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.stock)
        .bind(product.price_cents)
        .bind(product.expiry)
        .bind(&product.category)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| with_value(e.into(), &product.id, &product.sku))?;

        info!(id = %product.id, sku = %product.sku, "Product created");
        Ok(product)
    }

    /// Applies a partial update and returns the stored result.
    ///
    /// Only the columns the patch names are written, in one statement, so a
    /// checkout committing meanwhile keeps its stock decrement.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - unknown id
    /// * `Err(DbError::UniqueViolation)` - new sku belongs to another product
    pub async fn update(&self, id: &str, patch: &ProductPatch) -> DbResult<Product> {
        patch.validate()?;

        if patch.is_empty() {
            return self.get(id).await;
        }

        let sku = patch.sku.as_deref().map(str::trim);
        if let Some(sku) = sku {
            if let Some(other) = self.get_by_sku(sku).await? {
                if other.id != id {
                    return Err(DbError::duplicate("sku", sku));
                }
            }
        }

        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = COALESCE(?2, sku),
                name = COALESCE(?3, name),
                stock = COALESCE(?4, stock),
                price_cents = COALESCE(?5, price_cents),
                expiry = CASE WHEN ?6 THEN ?7 ELSE expiry END,
                category = COALESCE(?8, category),
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(sku)
        .bind(patch.name.as_deref().map(str::trim))
        .bind(patch.stock)
        .bind(patch.price.map(|p| p.cents()))
        .bind(patch.expiry.is_some())
        .bind(patch.expiry.flatten())
        .bind(patch.category.as_deref().map(str::trim))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| with_value(e.into(), id, sku.unwrap_or_default()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product updated");
        self.get(id).await
    }

    /// Hard delete. Returns how many rows went away (0 or 1).
    ///
    /// Receipt lines keep their snapshot of the product.
    pub async fn delete(&self, id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            info!(id = %id, "Product deleted");
        }
        Ok(deleted)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Units on hand across all products.
    pub async fn total_units(&self) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(stock), 0) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    /// Products with `stock <= threshold`.
    pub async fn count_low_stock(&self, threshold: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE stock <= ?1")
            .bind(threshold)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Transaction Primitives
// =============================================================================

/// Reads every listed product in one query. Unknown ids are left out.
pub async fn fetch_many(conn: &mut SqliteConnection, ids: &[String]) -> DbResult<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = QueryBuilder::<Sqlite>::new(SELECT_PRODUCT);
    query.push(" WHERE id IN (");
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(")");

    let products = query
        .build_query_as::<Product>()
        .fetch_all(&mut *conn)
        .await?;

    debug!(requested = ids.len(), found = products.len(), "Loaded products");
    Ok(products)
}

/// Removes `qty` units from a product, refusing to go below zero.
pub async fn decrement_stock(conn: &mut SqliteConnection, id: &str, qty: i64) -> DbResult<()> {
    if qty <= 0 {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 1,
            max: i64::MAX,
        }
        .into());
    }

    let result = sqlx::query(
        "UPDATE products SET stock = stock - ?1, updated_at = ?2 WHERE id = ?3 AND stock >= ?1",
    )
    .bind(qty)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        debug!(id = %id, qty, "Stock decremented");
        return Ok(());
    }

    let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match available {
        None => Err(DbError::not_found("Product", id)),
        Some(available) => Err(DbError::InsufficientStock {
            product_id: id.to_string(),
            available,
            requested: qty,
        }),
    }
}

/// New product ids are UUID v4.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

/// Fills in which value collided when SQLite reports a UNIQUE failure.
fn with_value(err: DbError, id: &str, sku: &str) -> DbError {
    match err {
        DbError::UniqueViolation { field, .. } if field == "sku" => DbError::duplicate(field, sku),
        DbError::UniqueViolation { field, .. } if field == "id" => DbError::duplicate(field, id),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::NaiveDate;
    use farmasys_core::checkout::CartLineInput;
    use farmasys_core::{CheckoutRequest, Money};

    fn amoxicilina() -> NewProduct {
        NewProduct {
            id: None,
            sku: "750100010002".to_string(),
            name: "Amoxicilina 250mg".to_string(),
            stock: 42,
            price: Money::from_cents(875),
            expiry: NaiveDate::from_ymd_opt(2025, 9, 10),
            category: "Antibiótico".to_string(),
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = db().await;
        let created = db.products().create(&amoxicilina()).await.unwrap();

        assert!(Uuid::parse_str(&created.id).is_ok());
        let fetched = db.products().get(&created.id).await.unwrap();
        assert_eq!(fetched.sku, "750100010002");
        assert_eq!(fetched.price_cents, 875);
        assert_eq!(fetched.expiry, NaiveDate::from_ymd_opt(2025, 9, 10));
        assert_eq!(fetched.category, "Antibiótico");
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_conflict() {
        let db = db().await;
        db.products().create(&amoxicilina()).await.unwrap();

        let mut again = amoxicilina();
        again.name = "Otra".to_string();
        let err = db.products().create(&again).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::UniqueViolation { ref field, ref value } if field == "sku" && value == "750100010002"
        ));
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_product_rejected() {
        let db = db().await;
        let mut bad = amoxicilina();
        bad.price = Money::from_cents(-1);

        let err = db.products().create(&bad).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let db = db().await;
        let created = db.products().create(&amoxicilina()).await.unwrap();

        let patch = ProductPatch {
            stock: Some(40),
            expiry: Some(None),
            ..Default::default()
        };
        let updated = db.products().update(&created.id, &patch).await.unwrap();

        assert_eq!(updated.stock, 40);
        assert_eq!(updated.expiry, None);
        assert_eq!(updated.name, "Amoxicilina 250mg");
        assert_eq!(db.products().get(&created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_unknown_and_conflicting() {
        let db = db().await;
        let a = db.products().create(&amoxicilina()).await.unwrap();
        let mut other = amoxicilina();
        other.sku = "750100010003".to_string();
        db.products().create(&other).await.unwrap();

        let err = db
            .products()
            .update("nope", &ProductPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let steal = ProductPatch {
            sku: Some("750100010003".to_string()),
            ..Default::default()
        };
        let err = db.products().update(&a.id, &steal).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Keeping its own sku is fine
        let same = ProductPatch {
            sku: Some(a.sku.clone()),
            name: Some("Amoxicilina 500mg".to_string()),
            ..Default::default()
        };
        assert!(db.products().update(&a.id, &same).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_only_touches_patched_columns() {
        let db = db().await;
        let created = db.products().create(&amoxicilina()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        decrement_stock(&mut conn, &created.id, 2).await.unwrap();
        drop(conn);

        let rename = ProductPatch {
            name: Some("  Amoxicilina 500mg ".to_string()),
            ..Default::default()
        };
        let updated = db.products().update(&created.id, &rename).await.unwrap();

        assert_eq!(updated.name, "Amoxicilina 500mg");
        assert_eq!(updated.stock, 40);
        assert_eq!(updated.price_cents, 875);
        assert_eq!(updated.expiry, NaiveDate::from_ymd_opt(2025, 9, 10));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rename_during_checkout_keeps_decrement() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("farmasys.db")).max_connections(4);
        let db = Database::new(config).await.unwrap();
        let mut stocked = amoxicilina();
        stocked.id = Some("5".to_string());
        stocked.stock = 10_000;
        db.products().create(&stocked).await.unwrap();

        for round in 0..100 {
            let sale = {
                let db = db.clone();
                tokio::spawn(async move {
                    let request = CheckoutRequest::new(vec![CartLineInput::new("5", 1)]);
                    db.checkout(&request, "caja1").await
                })
            };
            let rename = {
                let db = db.clone();
                tokio::spawn(async move {
                    let patch = ProductPatch {
                        name: Some(format!("Amoxicilina lote {round}")),
                        ..Default::default()
                    };
                    db.products().update("5", &patch).await
                })
            };

            // A sale may lose the race and roll back; it must never be undone.
            let _ = sale.await.unwrap();
            rename.await.unwrap().unwrap();

            let sold = db.receipts().count().await.unwrap();
            let stock = db.products().get("5").await.unwrap().stock;
            assert_eq!(stock, 10_000 - sold, "round {round}");
        }
    }

    #[tokio::test]
    async fn test_delete_returns_count() {
        let db = db().await;
        let created = db.products().create(&amoxicilina()).await.unwrap();

        assert_eq!(db.products().delete(&created.id).await.unwrap(), 1);
        assert_eq!(db.products().delete(&created.id).await.unwrap(), 0);
        assert!(db.products().get_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_decrement_stock_guard() {
        let db = db().await;
        let created = db.products().create(&amoxicilina()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        decrement_stock(&mut conn, &created.id, 40).await.unwrap();
        let err = decrement_stock(&mut conn, &created.id, 3).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::InsufficientStock { available: 2, requested: 3, .. }
        ));
        let err = decrement_stock(&mut conn, "missing", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert!(decrement_stock(&mut conn, &created.id, 0).await.is_err());
        drop(conn);

        assert_eq!(db.products().get(&created.id).await.unwrap().stock, 2);
    }

    #[tokio::test]
    async fn test_fetch_many_skips_unknown_ids() {
        let db = db().await;
        let created = db.products().create(&amoxicilina()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let found = fetch_many(&mut conn, &[created.id.clone(), "ghost".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(fetch_many(&mut conn, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stock_aggregates() {
        let db = db().await;
        db.products().create(&amoxicilina()).await.unwrap();
        let mut low = amoxicilina();
        low.sku = "750100010003".to_string();
        low.stock = 10;
        db.products().create(&low).await.unwrap();

        assert_eq!(db.products().total_units().await.unwrap(), 52);
        assert_eq!(db.products().count_low_stock(10).await.unwrap(), 1);
    }
}
