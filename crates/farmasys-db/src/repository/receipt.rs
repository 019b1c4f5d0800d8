//! # Receipt Repository
//!
//! Receipts are written once, by the checkout transaction, and never change.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  receipts (header)            receipt_lines (snapshot per product)      │
//! │  ├── id                  ◄──  receipt_id                                │
//! │  ├── created_at               position   (cart order)                   │
//! │  ├── customer                 product_id, sku, name                     │
//! │  ├── payment_method           qty, unit_price_cents                     │
//! │  ├── cashier                  line_subtotal_cents                       │
//! │  └── subtotal / iva / total                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use farmasys_core::report::TopProduct;
use farmasys_core::{Money, Receipt, ReceiptDetail, ReceiptLine};

const SELECT_RECEIPT: &str = r#"
    SELECT id, created_at, customer, payment_method, cashier,
           subtotal_cents, iva_cents, total_cents
    FROM receipts
"#;

const SELECT_LINES: &str = r#"
    SELECT receipt_id, position, product_id, sku, name, qty,
           unit_price_cents, line_subtotal_cents
    FROM receipt_lines
"#;

/// Repository for receipt database operations.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    pool: SqlitePool,
}

impl ReceiptRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReceiptRepository { pool }
    }

    /// Stores a receipt with its lines in its own transaction.
    ///
    /// Checkouts don't use this: they write through [`insert_rows`] inside
    /// the transaction that also moves stock.
    pub async fn insert(&self, detail: &ReceiptDetail) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        insert_rows(&mut tx, detail).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    /// Fetches a receipt and its lines.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no receipt with this id
    pub async fn get(&self, id: &str) -> DbResult<ReceiptDetail> {
        let sql = format!("{SELECT_RECEIPT} WHERE id = ?1");
        let receipt = sqlx::query_as::<_, Receipt>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Receipt", id))?;

        let sql = format!("{SELECT_LINES} WHERE receipt_id = ?1 ORDER BY position");
        let lines = sqlx::query_as::<_, ReceiptLine>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ReceiptDetail { receipt, lines })
    }

    /// Most recent receipts first, each with its lines.
    ///
    /// `limit: None` returns every receipt after the first `offset`. Headers
    /// and lines are read in one transaction so they come from the same
    /// snapshot even while sales are committing.
    pub async fn list(&self, limit: Option<u32>, offset: u32) -> DbResult<Vec<ReceiptDetail>> {
        // SQLite reads a negative LIMIT as "no limit"
        let limit = limit.map(i64::from).unwrap_or(-1);
        let offset = i64::from(offset);

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "{SELECT_RECEIPT} ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
        );
        let receipts = sqlx::query_as::<_, Receipt>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;

        if receipts.is_empty() {
            tx.commit().await?;
            return Ok(Vec::new());
        }

        // One pass over the lines of the page instead of a query per receipt
        let sql = format!(
            "{SELECT_LINES} WHERE receipt_id IN (
                SELECT id FROM receipts ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2
            ) ORDER BY receipt_id, position"
        );
        let lines = sqlx::query_as::<_, ReceiptLine>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        let mut grouped: HashMap<String, Vec<ReceiptLine>> = HashMap::new();
        for line in lines {
            grouped.entry(line.receipt_id.clone()).or_default().push(line);
        }

        let details: Vec<ReceiptDetail> = receipts
            .into_iter()
            .map(|receipt| {
                let lines = grouped.remove(&receipt.id).unwrap_or_default();
                ReceiptDetail { receipt, lines }
            })
            .collect();

        debug!(count = details.len(), offset, "Listed receipts");
        Ok(details)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM receipts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// `(created_at, total)` of every receipt at or after `since`.
    pub async fn totals_since(&self, since: DateTime<Utc>) -> DbResult<Vec<(DateTime<Utc>, Money)>> {
        let rows: Vec<(DateTime<Utc>, i64)> = sqlx::query_as(
            "SELECT created_at, total_cents FROM receipts WHERE created_at >= ?1 ORDER BY created_at",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(at, cents)| (at, Money::from_cents(cents)))
            .collect())
    }

    /// Best sellers by units across all receipts, ties by name.
    pub async fn top_products(&self, limit: u32) -> DbResult<Vec<TopProduct>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT name, SUM(qty) AS quantity
            FROM receipt_lines
            GROUP BY name
            ORDER BY quantity DESC, name ASC
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, quantity)| TopProduct { name, quantity })
            .collect())
    }
}

/// Writes the header and every line on an existing connection.
pub(crate) async fn insert_rows(conn: &mut SqliteConnection, detail: &ReceiptDetail) -> DbResult<()> {
    let r = &detail.receipt;

    sqlx::query(
        r#"
        INSERT INTO receipts (
            id, created_at, customer, payment_method, cashier,
            subtotal_cents, iva_cents, total_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&r.id)
    .bind(r.created_at)
    .bind(&r.customer)
    .bind(r.payment_method)
    .bind(&r.cashier)
    .bind(r.subtotal_cents)
    .bind(r.iva_cents)
    .bind(r.total_cents)
    .execute(&mut *conn)
    .await?;

    for line in &detail.lines {
        sqlx::query(
            r#"
            INSERT INTO receipt_lines (
                receipt_id, position, product_id, sku, name, qty,
                unit_price_cents, line_subtotal_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&r.id)
        .bind(line.position)
        .bind(&line.product_id)
        .bind(&line.sku)
        .bind(&line.name)
        .bind(line.qty)
        .bind(line.unit_price_cents)
        .bind(line.line_subtotal_cents)
        .execute(&mut *conn)
        .await?;
    }

    debug!(id = %r.id, lines = detail.lines.len(), "Receipt rows written");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
