//! # Repository Module
//!
//! Database repository implementations for FarmaSys.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │                                                                 │
//! │       │  state.db.products().list()                                     │
//! │       ▼                                                                 │
//! │  ProductRepository / ReceiptRepository / UserRepository / Reports      │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories own a pool clone and run one statement per call. Work that
//! must be atomic across tables (the checkout) goes through the free
//! functions that take a connection, see [`product::decrement_stock`].
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Inventory CRUD and stock aggregates
//! - [`receipt::ReceiptRepository`] - Immutable sale records
//! - [`report::ReportRepository`] - Dashboard and weekly report
//! - [`user::UserRepository`] - Staff accounts and password checks

pub mod product;
pub mod receipt;
pub mod report;
pub mod user;
