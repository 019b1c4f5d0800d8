//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite error (sqlx::Error)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← NotFound / UniqueViolation / ...               │
//! │       │                                                                 │
//! │       ├──► CheckoutError (inside a checkout transaction)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (farmasys-server) ← status code + JSON envelope               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use farmasys_core::{CheckoutError, ValidationError};
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Unknown product or receipt id
    /// - Product deleted between two requests
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (the `Conflict` case).
    ///
    /// ## When This Occurs
    /// - Creating or renaming a product to an sku already in use
    /// - Creating a user with a taken username
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A guarded stock decrement found fewer units than requested.
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Input rejected before reaching SQL.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - File can't be created or opened
    /// - Permissions, disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Runtime SQL error, including CHECK constraint failures.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use past the acquire timeout).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Converts an error raised inside a checkout transaction.
    ///
    /// Shortfalls keep their meaning; everything else means the write did
    /// not happen and becomes `TransactionFailed`.
    pub fn into_checkout_error(self, product_name: impl FnOnce(&str) -> String) -> CheckoutError {
        match self {
            DbError::InsufficientStock {
                product_id,
                available,
                requested,
            } => CheckoutError::InsufficientStock {
                name: product_name(&product_id),
                product_id,
                available,
                requested,
            },
            DbError::NotFound { id, .. } => CheckoutError::ProductNotFound(id),
            other => CheckoutError::TransactionFailed(other.to_string()),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → message decides: UNIQUE / FOREIGN KEY / other
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: products.sku"
                if let Some(column) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    let field = column.rsplit('.').next().unwrap_or(column).to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortfall_keeps_meaning_in_checkout() {
        let err = DbError::InsufficientStock {
            product_id: "5".to_string(),
            available: 2,
            requested: 3,
        }
        .into_checkout_error(|_| "Ibuprofeno 400mg".to_string());

        assert_eq!(
            err,
            CheckoutError::InsufficientStock {
                product_id: "5".to_string(),
                name: "Ibuprofeno 400mg".to_string(),
                available: 2,
                requested: 3,
            }
        );
    }

    #[test]
    fn test_other_errors_become_transaction_failed() {
        let err = DbError::PoolExhausted.into_checkout_error(|id| id.to_string());
        assert!(matches!(err, CheckoutError::TransactionFailed(_)));
    }
}
