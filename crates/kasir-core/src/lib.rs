//! # kasir-core: Pure Domain Logic for Kasir
//!
//! This crate holds the domain of the sale transaction engine as plain types
//! and pure functions. It never touches the database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Kasir Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Presentation layer                           │   │
//! │  │   Cart UI ──► Checkout panel ──► Sales history ──► Edit sale    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process request channel             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 apps/register (Dispatcher)                      │   │
//! │  │    sales:checkout, sales:delete, sales:update, sales:list       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kasir-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐                 │   │
//! │  │   │   types   │  │   money   │  │ validation │                 │   │
//! │  │   │  Product  │  │   Money   │  │ cart,patch │                 │   │
//! │  │   │ Sale,Item │  │           │  │  product   │                 │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasir-db (Database Layer)                    │   │
//! │  │        SQLite, UnitOfWork, checkout / delete / update           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleItem, requests)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Request validation
//!
//! ## Example Usage
//!
//! ```rust
//! use kasir_core::{CartLine, CheckoutRequest, Money};
//! use kasir_core::validation::validate_checkout;
//!
//! let request = CheckoutRequest {
//!     items: vec![CartLine { id: "p-1".to_string(), qty: 3 }],
//!     subtotal: Money::new(15_000),
//!     total: Money::new(15_000),
//!     paid: Money::new(20_000),
//!     change: Money::new(5_000),
//! };
//!
//! assert!(validate_checkout(&request).is_ok());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;
