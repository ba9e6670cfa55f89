//! # Error Types
//!
//! Domain-specific error types for kasir-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasir-core errors (this file)                                         │
//! │  ├── CoreError        - Missing product / sale, wrapped validation     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kasir-db errors (separate crate)                                      │
//! │  └── DbError          - Store failures, wraps CoreError                │
//! │                                                                         │
//! │  register app errors                                                   │
//! │  └── ApiError         - What the presentation layer sees (serialized)  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → UI            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors raised by the sale transaction engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cart line references a product that does not exist.
    ///
    /// ## When This Occurs
    /// - Pre-flight check before the unit opens
    /// - The locked read inside the unit (product deleted in between)
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The sale to delete or correct does not exist.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Validation error (wraps ValidationError, message passes through).
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any transaction is opened, so the store is never touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Checkout was submitted with no cart lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Arithmetic on a money amount left the representable range.
    #[error("{field} is out of range")]
    Overflow { field: String },
}
