//! # farmasys-core: Pure Business Logic for FarmaSys
//!
//! The pharmacy point of sale keeps every decision that does not need a disk
//! or a socket in this crate.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        FarmaSys Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Counter UI (browser, external)                    │   │
//! │  │    Inventory ──► Sales cart ──► Receipt ──► Reports             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP + JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 farmasys-server (axum routes)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ farmasys-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │  │  types  │ │  money  │ │ checkout │ │  auth   │ │ report  │  │   │
//! │  │  │ Product │ │  Money  │ │ 9 steps  │ │  Role   │ │ weekly  │  │   │
//! │  │  │ Receipt │ │   IVA   │ │  Store   │ │  Caps   │ │  series │  │   │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └─────────┘ └─────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │ CheckoutStore trait                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  farmasys-db (SQLite via sqlx)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Products, receipts, payment methods
//! - [`money`] - Integer-cent money and the decimal JSON codec
//! - [`checkout`] - Cart parsing, pricing and the store-driven checkout run
//! - [`auth`] - Roles, capabilities and the request principal
//! - [`report`] - Dashboard and weekly report shapes
//! - [`validation`] - Field rules for product input
//! - [`error`] - Checkout, validation and access errors
//!
//! ## Example Usage
//!
//! ```rust
//! use farmasys_core::money::Money;
//! use farmasys_core::IVA_RATE;
//!
//! let subtotal = Money::from_cents(1350); // 13.50
//! let iva = subtotal.calculate_tax(IVA_RATE);
//!
//! assert_eq!(iva.cents(), 216);
//! assert_eq!((subtotal + iva).cents(), 1566);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod checkout;
pub mod error;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use auth::{Capability, Principal, Role};
pub use checkout::{run_checkout, CheckoutOutcome, CheckoutPlan, CheckoutRequest, CheckoutStore};
pub use error::{AccessDenied, CheckoutError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// IVA charged on every sale (16%).
pub const IVA_RATE: TaxRate = TaxRate::from_bps(1600);

/// Products at or below this many units count as low stock on the dashboard.
///
/// The server can override it through `store.low_stock_threshold`.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Number of days covered by the weekly report, today included.
pub const REPORT_WINDOW_DAYS: u32 = 7;

/// How many best sellers the weekly report lists.
pub const TOP_PRODUCTS_LIMIT: u32 = 5;
