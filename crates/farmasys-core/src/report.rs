//! # Reports
//!
//! Shapes for the dashboard and the weekly sales report. The database layer
//! runs the aggregate queries; this module turns their rows into the series
//! the counter UI draws.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use ts_rs::TS;

use crate::money::{self, Money};

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    /// Units on hand across every product.
    pub total_items: i64,
    /// Products at or below the low-stock threshold.
    pub low_stock: i64,
    /// Sum of today's receipt totals (UTC day).
    #[serde(with = "money::decimal")]
    #[ts(as = "f64")]
    pub today_sales: Money,
    pub receipts_count: i64,
}

/// Sales for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct DailyTotal {
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[serde(with = "money::decimal")]
    #[ts(as = "f64")]
    pub total: Money,
}

/// A best seller by units sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct TopProduct {
    pub name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct WeeklyReport {
    /// Oldest day first, today last.
    pub days: Vec<DailyTotal>,
    pub top_products: Vec<TopProduct>,
}

/// Builds a gap-free series of `days` days ending at `today`.
///
/// `totals` may be in any order and may contain several entries per day or
/// days outside the window; days without sales come out as zero.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use farmasys_core::money::Money;
/// use farmasys_core::report::daily_series;
///
/// let today = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
/// let yesterday = today.pred_opt().unwrap();
/// let series = daily_series(&[(yesterday, Money::from_cents(1566))], today, 3);
///
/// let cents: Vec<i64> = series.iter().map(|d| d.total.cents()).collect();
/// assert_eq!(cents, [0, 1566, 0]);
/// ```
pub fn daily_series(totals: &[(NaiveDate, Money)], today: NaiveDate, days: u32) -> Vec<DailyTotal> {
    (0..i64::from(days))
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let total = totals
                .iter()
                .filter(|(d, _)| *d == date)
                .map(|(_, amount)| *amount)
                .sum();
            DailyTotal { date, total }
        })
        .collect()
}
