//! # Report Repository
//!
//! Read-only aggregates for the dashboard and the weekly report, composed
//! from the product and receipt stores. Days are UTC calendar days.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::product::ProductRepository;
use super::receipt::ReceiptRepository;
use crate::error::DbResult;
use farmasys_core::money::Money;
use farmasys_core::report::{daily_series, DashboardSummary, WeeklyReport};

#[derive(Debug, Clone)]
pub struct ReportRepository {
    products: ProductRepository,
    receipts: ReceiptRepository,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository {
            products: ProductRepository::new(pool.clone()),
            receipts: ReceiptRepository::new(pool),
        }
    }

    /// Headline numbers as of `now`.
    ///
    /// `low_stock` counts products with `stock <= threshold`.
    pub async fn dashboard(&self, threshold: i64, now: DateTime<Utc>) -> DbResult<DashboardSummary> {
        let today = now.date_naive();

        let today_sales: Money = self
            .receipts
            .totals_since(start_of_day(today))
            .await?
            .into_iter()
            .filter(|(at, _)| at.date_naive() == today)
            .map(|(_, total)| total)
            .sum();

        Ok(DashboardSummary {
            total_items: self.products.total_units().await?,
            low_stock: self.products.count_low_stock(threshold).await?,
            today_sales,
            receipts_count: self.receipts.count().await?,
        })
    }

    /// Daily totals for the `days` days ending at `today`, plus the
    /// `top_limit` best sellers by units.
    pub async fn weekly(&self, today: NaiveDate, days: u32, top_limit: u32) -> DbResult<WeeklyReport> {
        let first_day = today - Duration::days(i64::from(days.saturating_sub(1)));

        let totals: Vec<(NaiveDate, Money)> = self
            .receipts
            .totals_since(start_of_day(first_day))
            .await?
            .into_iter()
            .map(|(at, total)| (at.date_naive(), total))
            .collect();

        let top_products = self.receipts.top_products(top_limit).await?;

        debug!(receipts = totals.len(), top = top_products.len(), "Weekly report computed");

        Ok(WeeklyReport {
            days: daily_series(&totals, today, days),
            top_products,
        })
    }
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::TimeZone;
    use farmasys_core::{PaymentMethod, Receipt, ReceiptDetail, ReceiptLine};

    fn sale(id: &str, at: DateTime<Utc>, lines: &[(&str, i64, i64)]) -> ReceiptDetail {
        let lines: Vec<ReceiptLine> = lines
            .iter()
            .enumerate()
            .map(|(i, (name, qty, price))| ReceiptLine {
                receipt_id: id.to_string(),
                position: i as i64,
                product_id: format!("p-{name}"),
                sku: format!("sku-{i}"),
                name: name.to_string(),
                qty: *qty,
                unit_price_cents: *price,
                line_subtotal_cents: qty * price,
            })
            .collect();
        let subtotal: i64 = lines.iter().map(|l| l.line_subtotal_cents).sum();
        ReceiptDetail {
            receipt: Receipt {
                id: id.to_string(),
                created_at: at,
                customer: None,
                payment_method: PaymentMethod::Cash,
                cashier: "caja1".to_string(),
                subtotal_cents: subtotal,
                iva_cents: 0,
                total_cents: subtotal,
            },
            lines,
        }
    }

    #[tokio::test]
    async fn test_dashboard_counts_today_only() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 15, 0, 0).unwrap();

        db.receipts()
            .insert(&sale("today", now - Duration::hours(2), &[("A", 1, 1000)]))
            .await
            .unwrap();
        db.receipts()
            .insert(&sale("yesterday", now - Duration::days(1), &[("A", 1, 500)]))
            .await
            .unwrap();

        let summary = db.reports().dashboard(10, now).await.unwrap();
        assert_eq!(summary.today_sales, Money::from_cents(1000));
        assert_eq!(summary.receipts_count, 2);
        assert_eq!(summary.total_items, 0);
        assert_eq!(summary.low_stock, 0);
    }

    #[tokio::test]
    async fn test_weekly_series_and_top_products() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let noon = |d: NaiveDate| d.and_hms_opt(12, 0, 0).unwrap().and_utc();

        db.receipts()
            .insert(&sale("1", noon(today), &[("Ibuprofeno", 3, 450), ("Paracetamol", 1, 550)]))
            .await
            .unwrap();
        db.receipts()
            .insert(&sale("2", noon(today - Duration::days(2)), &[("Paracetamol", 2, 550)]))
            .await
            .unwrap();
        db.receipts()
            .insert(&sale("3", noon(today - Duration::days(30)), &[("Omeprazol", 1, 720)]))
            .await
            .unwrap();

        let report = db.reports().weekly(today, 7, 2).await.unwrap();

        let cents: Vec<i64> = report.days.iter().map(|d| d.total.cents()).collect();
        assert_eq!(cents, [0, 0, 0, 0, 1100, 0, 1900]);
        assert_eq!(report.days[6].date, today);

        // Ties broken by name: both have 3 units
        let top: Vec<(&str, i64)> = report
            .top_products
            .iter()
            .map(|t| (t.name.as_str(), t.quantity))
            .collect();
        assert_eq!(top, [("Ibuprofeno", 3), ("Paracetamol", 3)]);
    }
}
