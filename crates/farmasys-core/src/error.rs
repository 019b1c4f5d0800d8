//! # Error Types
//!
//! Domain error types for farmasys-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  farmasys-core (this file)                                              │
//! │  ├── CheckoutError    - Why a sale was refused or rolled back           │
//! │  ├── ValidationError  - Product/user field rules                        │
//! │  └── AccessDenied     - Role lacks a capability                         │
//! │                                                                         │
//! │  farmasys-db                                                            │
//! │  └── DbError          - Storage failures, NotFound, Conflict            │
//! │                                                                         │
//! │  farmasys-server                                                        │
//! │  └── ApiError         - Status code + JSON envelope                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::auth::{Capability, Role};

// =============================================================================
// Checkout Error
// =============================================================================

/// Reasons a checkout does not produce a receipt.
///
/// Every variant except [`CheckoutError::TransactionFailed`] is raised before
/// any write happens, so inventory is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// No cart entry carried a usable product id.
    #[error("Cart is empty")]
    EmptyCart,

    /// A quantity was not a positive integer.
    ///
    /// ## When This Occurs
    /// - `qty` is zero, negative, fractional, non-numeric or missing
    /// - the summed quantity for one product overflows
    #[error("Invalid quantity for product {product_id}: {value}")]
    InvalidQuantity { product_id: String, value: String },

    /// A cart entry references a product that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The aggregated quantity exceeds the stock read for this checkout.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart: [{id: P, qty: 2}, {id: P, qty: 3}]
    ///      │
    ///      ▼
    /// Aggregate: P × 5
    ///      │
    ///      ▼
    /// Stock read: P = 4
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Omeprazol 20mg", available: 4, requested: 5 }
    /// ```
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// The atomic write failed and was rolled back.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

impl CheckoutError {
    /// True when the cart itself was at fault (client error).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CheckoutError::TransactionFailed(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (bad date, bad decimal, bad characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Access Denied
// =============================================================================

/// The principal's role does not grant the capability the operation needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{username} ({role}) is not allowed to {capability}")]
pub struct AccessDenied {
    pub username: String,
    pub role: Role,
    pub capability: Capability,
}

// =============================================================================
// Unit Tests
// =============================================================================
