//! # Checkout
//!
//! Turns a submitted cart into a receipt, or refuses it without touching
//! anything.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CheckoutRequest { items: [{id, qty, name?, price?}], customer?, ... }  │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  aggregate_cart ─── 1. drop entries without id ──► EmptyCart            │
//! │        │            2. qty must be a positive integer ► InvalidQuantity │
//! │        │            3. sum qty per id, first-appearance order           │
//! │        ▼                                                                │
//! │  store.load_products ─ 4. one read for every id ──► ProductNotFound     │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  price_cart ─────── 5. qty ≤ stock (that same read) ► InsufficientStock │
//! │        │            6. line = stored price × qty                        │
//! │        │            7. subtotal, IVA 16%, total                         │
//! │        ▼                                                                │
//! │  store.commit ───── 8. decrement + receipt + lines ► TransactionFailed  │
//! │        │               all or nothing                                   │
//! │        ▼                                                                │
//! │  CheckoutOutcome    9. receipt id and totals                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices sent by the client are never charged. When one differs from the
//! stored price it is reported in [`CheckoutOutcome::price_overrides`] so the
//! caller can log it.

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::CheckoutError;
use crate::money::Money;
use crate::types::{PaymentMethod, Product, Receipt, ReceiptDetail, ReceiptLine};
use crate::IVA_RATE;

// =============================================================================
// Request
// =============================================================================

/// Quantity as the client sent it.
///
/// Counter UIs send numbers, but form fields often arrive as strings, so every
/// JSON shape is accepted here and judged by [`QuantityInput::units`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
    Integer(i64),
    Decimal(f64),
    Text(String),
    Other(Value),
}

impl QuantityInput {
    /// The quantity as whole units, if it is a positive integer.
    ///
    /// `3`, `3.0` and `"3"` are accepted; `0`, `-1`, `2.5`, `"2.5"` and
    /// `"tres"` are not.
    pub fn units(&self) -> Option<i64> {
        let units = match self {
            QuantityInput::Integer(n) => *n,
            QuantityInput::Decimal(f) => {
                // i64::MAX as f64 rounds up to 2^63, which does not fit
                if !f.is_finite() || f.fract() != 0.0 || *f >= i64::MAX as f64 {
                    return None;
                }
                *f as i64
            }
            QuantityInput::Text(s) => s.trim().parse::<i64>().ok()?,
            QuantityInput::Other(_) => return None,
        };
        (units > 0).then_some(units)
    }

    fn describe(&self) -> String {
        match self {
            QuantityInput::Integer(n) => n.to_string(),
            QuantityInput::Decimal(f) => f.to_string(),
            QuantityInput::Text(s) => format!("\"{s}\""),
            QuantityInput::Other(v) => v.to_string(),
        }
    }
}

/// One entry of the submitted cart.
///
/// `name` and `price` are what the counter showed the customer. Neither is
/// used for pricing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CartLineInput {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default, alias = "quantity")]
    pub qty: Option<QuantityInput>,
}

impl CartLineInput {
    /// Convenience constructor for a line with only id and quantity.
    pub fn new(id: impl Into<String>, qty: i64) -> Self {
        Self {
            id: Some(Value::String(id.into())),
            qty: Some(QuantityInput::Integer(qty)),
            ..Default::default()
        }
    }

    /// The referenced product id, if the entry carries a usable one.
    pub fn product_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The price the client displayed, when it parses as an amount.
    pub fn submitted_price(&self) -> Option<Money> {
        match self.price.as_ref()? {
            Value::Number(n) => Money::parse_decimal(&n.to_string()).ok(),
            Value::String(s) => Money::parse_decimal(s).ok(),
            _ => None,
        }
    }
}

/// Body of `POST /checkout`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CartLineInput>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl CheckoutRequest {
    pub fn new(items: Vec<CartLineInput>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    /// Customer name, `None` when blank.
    pub fn customer_name(&self) -> Option<String> {
        self.customer
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    }
}

// =============================================================================
// Plan
// =============================================================================

/// A cart line after aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: String,
    pub qty: i64,
    /// First price the client sent for this product, if any.
    pub submitted_price: Option<Money>,
}

/// A client price that was replaced by the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceOverride {
    pub product_id: String,
    pub submitted: Money,
    pub charged: Money,
}

/// A priced line ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub qty: i64,
    pub unit_price: Money,
    pub line_subtotal: Money,
}

/// Everything needed to commit a sale, computed before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub lines: Vec<PlannedLine>,
    pub subtotal: Money,
    pub iva: Money,
    pub total: Money,
    pub price_overrides: Vec<PriceOverride>,
}

impl CheckoutPlan {
    /// Builds the receipt rows for this plan.
    pub fn to_receipt(
        &self,
        receipt_id: String,
        created_at: DateTime<Utc>,
        customer: Option<String>,
        payment_method: PaymentMethod,
        cashier: &str,
    ) -> ReceiptDetail {
        let lines = self
            .lines
            .iter()
            .enumerate()
            .map(|(position, line)| ReceiptLine {
                receipt_id: receipt_id.clone(),
                position: position as i64,
                product_id: line.product_id.clone(),
                sku: line.sku.clone(),
                name: line.name.clone(),
                qty: line.qty,
                unit_price_cents: line.unit_price.cents(),
                line_subtotal_cents: line.line_subtotal.cents(),
            })
            .collect();

        ReceiptDetail {
            receipt: Receipt {
                id: receipt_id,
                created_at,
                customer,
                payment_method,
                cashier: cashier.to_string(),
                subtotal_cents: self.subtotal.cents(),
                iva_cents: self.iva.cents(),
                total_cents: self.total.cents(),
            },
            lines,
        }
    }
}

/// Result of a committed checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOutcome {
    pub receipt: ReceiptDetail,
    pub price_overrides: Vec<PriceOverride>,
}

impl CheckoutOutcome {
    pub fn receipt_id(&self) -> &str {
        &self.receipt.receipt.id
    }

    pub fn subtotal(&self) -> Money {
        self.receipt.receipt.subtotal()
    }

    pub fn iva(&self) -> Money {
        self.receipt.receipt.iva()
    }

    pub fn total(&self) -> Money {
        self.receipt.receipt.total()
    }
}

// =============================================================================
// Steps 1-3: Aggregate
// =============================================================================

/// Drops id-less entries, validates quantities and sums them per product.
///
/// ## Example
/// ```rust
/// use farmasys_core::checkout::{aggregate_cart, CartLineInput};
///
/// let lines = aggregate_cart(&[
///     CartLineInput::new("5", 2),
///     CartLineInput::new("1", 1),
///     CartLineInput::new("5", 3),
/// ])
/// .unwrap();
///
/// assert_eq!(lines.len(), 2);
/// assert_eq!((lines[0].product_id.as_str(), lines[0].qty), ("5", 5));
/// assert_eq!((lines[1].product_id.as_str(), lines[1].qty), ("1", 1));
/// ```
pub fn aggregate_cart(items: &[CartLineInput]) -> Result<Vec<CartLine>, CheckoutError> {
    let mut lines: Vec<CartLine> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let Some(product_id) = item.product_id() else {
            continue;
        };

        let qty = item
            .qty
            .as_ref()
            .and_then(QuantityInput::units)
            .ok_or_else(|| CheckoutError::InvalidQuantity {
                product_id: product_id.clone(),
                value: item
                    .qty
                    .as_ref()
                    .map(QuantityInput::describe)
                    .unwrap_or_else(|| "missing".to_string()),
            })?;

        match index.get(&product_id) {
            Some(&i) => {
                let line = &mut lines[i];
                line.qty = line.qty.checked_add(qty).ok_or_else(|| {
                    CheckoutError::InvalidQuantity {
                        product_id: product_id.clone(),
                        value: "total quantity too large".to_string(),
                    }
                })?;
            }
            None => {
                index.insert(product_id.clone(), lines.len());
                lines.push(CartLine {
                    product_id,
                    qty,
                    submitted_price: item.submitted_price(),
                });
            }
        }
    }

    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    Ok(lines)
}

// =============================================================================
// Steps 4-7: Validate and Price
// =============================================================================

/// Checks the aggregated cart against one snapshot of the products and
/// prices it with the stored prices.
///
/// Every id is checked for existence before any stock is compared, so an
/// unknown product is reported even when another line is short.
pub fn price_cart(
    lines: &[CartLine],
    products: &HashMap<String, Product>,
) -> Result<CheckoutPlan, CheckoutError> {
    if let Some(missing) = lines.iter().find(|l| !products.contains_key(&l.product_id)) {
        return Err(CheckoutError::ProductNotFound(missing.product_id.clone()));
    }

    let mut planned = Vec::with_capacity(lines.len());
    let mut price_overrides = Vec::new();
    let mut subtotal = Money::zero();

    for line in lines {
        let Some(product) = products.get(&line.product_id) else {
            return Err(CheckoutError::ProductNotFound(line.product_id.clone()));
        };

        if line.qty > product.stock {
            return Err(CheckoutError::InsufficientStock {
                product_id: product.id.clone(),
                name: product.name.clone(),
                available: product.stock,
                requested: line.qty,
            });
        }

        let unit_price = product.price();
        let too_large = || CheckoutError::InvalidQuantity {
            product_id: product.id.clone(),
            value: format!("{} (amount too large)", line.qty),
        };
        let line_subtotal = unit_price
            .checked_multiply_quantity(line.qty)
            .ok_or_else(too_large)?;
        subtotal = subtotal.checked_add(line_subtotal).ok_or_else(too_large)?;

        if let Some(submitted) = line.submitted_price.filter(|p| *p != unit_price) {
            price_overrides.push(PriceOverride {
                product_id: product.id.clone(),
                submitted,
                charged: unit_price,
            });
        }

        planned.push(PlannedLine {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            qty: line.qty,
            unit_price,
            line_subtotal,
        });
    }

    let iva = subtotal.calculate_tax(IVA_RATE);
    let Some(total) = subtotal.checked_add(iva) else {
        let line = planned
            .iter()
            .max_by_key(|l| l.line_subtotal)
            .ok_or(CheckoutError::EmptyCart)?;
        return Err(CheckoutError::InvalidQuantity {
            product_id: line.product_id.clone(),
            value: format!("{} (amount too large)", line.qty),
        });
    };

    Ok(CheckoutPlan {
        lines: planned,
        subtotal,
        iva,
        total,
        price_overrides,
    })
}

// =============================================================================
// Store Seam
// =============================================================================

/// Storage the checkout runs against.
///
/// One value of this type is one unit of work: the production implementation
/// wraps a single database transaction, so everything read by
/// `load_products` and written by `commit` happens atomically.
pub trait CheckoutStore {
    /// Reads the given products in one pass. Unknown ids are left out.
    fn load_products(
        &mut self,
        ids: &[String],
    ) -> impl Future<Output = Result<Vec<Product>, CheckoutError>> + Send;

    /// Decrements stock for every line and writes the receipt with its lines.
    ///
    /// Must be all or nothing; failures surface as
    /// [`CheckoutError::TransactionFailed`] or
    /// [`CheckoutError::InsufficientStock`].
    fn commit(
        &mut self,
        receipt: &ReceiptDetail,
    ) -> impl Future<Output = Result<(), CheckoutError>> + Send;
}

// =============================================================================
// Steps 1-9
// =============================================================================

/// Runs a full checkout against `store`.
///
/// `cashier` is the authenticated user, `now` the receipt timestamp.
pub async fn run_checkout<S: CheckoutStore>(
    store: &mut S,
    request: &CheckoutRequest,
    cashier: &str,
    now: DateTime<Utc>,
) -> Result<CheckoutOutcome, CheckoutError> {
    let lines = aggregate_cart(&request.items)?;

    let ids: Vec<String> = lines.iter().map(|l| l.product_id.clone()).collect();
    let products: HashMap<String, Product> = store
        .load_products(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

    let plan = price_cart(&lines, &products)?;

    let receipt = plan.to_receipt(
        uuid::Uuid::new_v4().to_string(),
        now,
        request.customer_name(),
        PaymentMethod::from_input(request.payment_method.as_deref()),
        cashier,
    );

    store.commit(&receipt).await?;

    Ok(CheckoutOutcome {
        receipt,
        price_overrides: plan.price_overrides,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
