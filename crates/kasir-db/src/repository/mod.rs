//! # Repository Module
//!
//! Database repository implementations for Kasir.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Register command                                                       │
//! │       │                                                                 │
//! │       │  db.sales().checkout(&request)                                 │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── checkout / delete   ── one UnitOfWork each                        │
//! │  ├── update              ── single statement                          │
//! │  └── list / get_by_id    ── plain reads                                │
//! │       │                                                                 │
//! │       │  lock_product / write_stock                                    │
//! │       ▼                                                                 │
//! │  ProductRepository + SQLite                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and stock writes
//! - [`SaleRepository`](sale::SaleRepository) - The sale transaction engine

pub mod product;
pub mod sale;
