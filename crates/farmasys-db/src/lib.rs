//! # farmasys-db: Database Layer for FarmaSys
//!
//! SQLite storage for the pharmacy counter, through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        FarmaSys Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (POST /checkout)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  farmasys-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │   │   │
//! │  │   │               │    │ ProductRepo   │    │ 001_initial  │   │   │
//! │  │   │ SqlitePool    │◄───│ ReceiptRepo   │    │ 002_users    │   │   │
//! │  │   │ checkout_lock │    │ UserRepo      │    │              │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  │          ▲                                                      │   │
//! │  │          └── checkout.rs: CheckoutStore over one transaction    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (farmasys.db, WAL)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Products, receipts, users, reports
//! - [`checkout`] - The atomic checkout transaction
//! - [`seed`] - Demo inventory
//!
//! ## Usage
//!
//! ```rust,ignore
//! use farmasys_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("farmasys.db")).await?;
//!
//! let products = db.products().list().await?;
//! let outcome = db.checkout(&request, "caja1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::SqliteCheckoutStore;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::product::ProductRepository;
pub use repository::receipt::ReceiptRepository;
pub use repository::report::ReportRepository;
pub use repository::user::UserRepository;
