//! # kasir-db: Store and Sale Engine for Kasir
//!
//! SQLite storage (via sqlx) and the sale transaction engine built on it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Kasir Data Flow                                │
//! │                                                                         │
//! │  Register channel (sales:checkout)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kasir-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ SaleRepo      │    │  (embedded)  │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 0001_init    │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │           │                    │                               │   │
//! │  │           └──── UnitOfWork ◄───┘  (transaction.rs)             │   │
//! │  │                 lock_product / lock_sale / commit              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`transaction`] - The unit of work and its locking reads
//! - [`repository`] - Product store and the sale operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasir_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/kasir.db")).await?;
//!
//! let sale_id = db.sales().checkout(&request).await?;
//! db.sales().delete(&sale_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod transaction;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ErrorKind};
pub use pool::{Database, DbConfig};
pub use transaction::UnitOfWork;

// Repository re-exports for convenience
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::sale::SaleRepository;
