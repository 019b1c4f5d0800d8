//! # Domain Types
//!
//! Core domain types for the FarmaSys point of sale.
//!
//! ## Entity Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Domain Model                                      │
//! │                                                                         │
//! │  ┌─────────────────┐            ┌─────────────────┐                     │
//! │  │    Product      │  snapshot  │   ReceiptLine   │                     │
//! │  │  ─────────────  │ ─────────► │  ─────────────  │                     │
//! │  │  id, sku        │  at sale   │  product_id     │                     │
//! │  │  name           │            │  sku, name      │                     │
//! │  │  stock ≥ 0      │            │  qty > 0        │                     │
//! │  │  price_cents    │            │  unit_price     │                     │
//! │  │  expiry?        │            │  line_subtotal  │                     │
//! │  └─────────────────┘            └────────┬────────┘                     │
//! │                                          │ N                            │
//! │                                          │                              │
//! │                                          │ 1                            │
//! │                                 ┌────────▼────────┐                     │
//! │                                 │    Receipt      │                     │
//! │                                 │  ─────────────  │                     │
//! │                                 │  subtotal       │                     │
//! │                                 │  iva (16%)      │                     │
//! │                                 │  total          │                     │
//! │                                 │  payment_method │                     │
//! │                                 └─────────────────┘                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Receipt lines copy the product's sku, name and price at the moment of
//! sale, so a receipt never changes when the product is edited or deleted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::auth::Role;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so IVA at 16% is 1600 bps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// The rate as a percentage (display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Product
// =============================================================================

/// A medicine or article on the pharmacy shelf.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier. Demo data uses "1".."5", new products get a UUID v4.
    pub id: String,

    /// Stock keeping unit, usually the barcode. Unique.
    pub sku: String,

    pub name: String,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Expiry date of the current lot, if tracked.
    #[ts(as = "Option<String>")]
    pub expiry: Option<NaiveDate>,

    /// Free-form category ("Analgésico", "Antibiótico", ...). May be empty.
    pub category: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// True when the product should show up in the low-stock count.
    #[inline]
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.stock <= threshold
    }
}

/// Fields for creating a product. Run [`NewProduct::validate`] before storing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    /// Explicit id, used by the demo seed. `None` assigns a UUID v4.
    pub id: Option<String>,
    pub sku: String,
    pub name: String,
    pub stock: i64,
    pub price: Money,
    pub expiry: Option<NaiveDate>,
    pub category: String,
}

/// Partial update: `None` leaves the stored value as it is.
///
/// `expiry: Some(None)` clears the date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub stock: Option<i64>,
    pub price: Option<Money>,
    pub expiry: Option<Option<NaiveDate>>,
    pub category: Option<String>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self == &ProductPatch::default()
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash at the counter. Used when the client sends nothing.
    #[default]
    Cash,
    /// Credit or debit card on the external terminal.
    Card,
    /// Bank transfer.
    Transfer,
}

impl PaymentMethod {
    /// Maps what the counter UI sends to a payment method.
    ///
    /// Matching is case-insensitive and knows the Spanish labels. Anything
    /// unrecognised is treated as a card payment.
    pub fn from_input(input: Option<&str>) -> Self {
        let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
            return PaymentMethod::Cash;
        };
        match raw.to_lowercase().as_str() {
            "cash" | "efectivo" => PaymentMethod::Cash,
            "transfer" | "transferencia" => PaymentMethod::Transfer,
            _ => PaymentMethod::Card,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
        }
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// Header of a completed sale. Immutable once written.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    /// UUID v4.
    pub id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub customer: Option<String>,
    pub payment_method: PaymentMethod,
    /// Username of whoever rang up the sale.
    pub cashier: String,
    pub subtotal_cents: i64,
    pub iva_cents: i64,
    pub total_cents: i64,
}

impl Receipt {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn iva(&self) -> Money {
        Money::from_cents(self.iva_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// One product on a receipt, frozen at the time of sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptLine {
    pub receipt_id: String,
    /// Zero-based order within the receipt (first appearance in the cart).
    pub position: i64,
    pub product_id: String,
    /// SKU at time of sale (frozen).
    pub sku: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    pub qty: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// `unit_price_cents × qty`.
    pub line_subtotal_cents: i64,
}

impl ReceiptLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_subtotal(&self) -> Money {
        Money::from_cents(self.line_subtotal_cents)
    }
}

/// A receipt with its lines, as returned by a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptDetail {
    #[serde(flatten)]
    pub receipt: Receipt,
    pub lines: Vec<ReceiptLine>,
}

// =============================================================================
// User
// =============================================================================

/// A staff account allowed to use the counter.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
