//! # API Error Type
//!
//! Unified error type for everything answered over the register channel.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Kasir                                  │
//! │                                                                         │
//! │  Presentation layer          Rust Backend                               │
//! │  ──────────────────          ────────────                               │
//! │                                                                         │
//! │  invoke('sales:checkout', cart)                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  commands::sale::checkout → Result<SaleId, ApiError>             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  DbError::kind()                                                 │  │
//! │  │    Validation ─────────────► VALIDATION_ERROR  (message kept)    │  │
//! │  │    NotFound   ─────────────► NOT_FOUND         (message kept)    │  │
//! │  │    Integrity  ── error! ───► INTEGRITY_ERROR   (generic message) │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { "code": "NOT_FOUND", "message": "Product not found: p-9" }           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use kasir_core::CoreError;
use kasir_db::{DbError, ErrorKind};

use crate::state::ConfigError;

/// API error returned over the register channel.
///
/// ## Serialization
/// ```json
/// {
///   "code": "VALIDATION_ERROR",
///   "message": "Cart is empty"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad input; nothing was written
    ValidationError,

    /// Referenced product or sale does not exist
    NotFound,

    /// Store failure: lock timeout, constraint, I/O. The unit rolled back.
    IntegrityError,

    /// Channel or serialization failure outside the store
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err.kind() {
            ErrorKind::Validation => ApiError::validation(err.to_string()),
            ErrorKind::NotFound => ApiError::new(ErrorCode::NotFound, err.to_string()),
            ErrorKind::Integrity => {
                // Log the actual error but return a generic message
                tracing::error!(error = %err, "Sale operation failed in the store");
                let message = match err {
                    DbError::Busy(_) | DbError::PoolExhausted => {
                        "Database is busy, please retry"
                    }
                    DbError::CheckViolation { .. }
                    | DbError::ForeignKeyViolation { .. }
                    | DbError::UniqueViolation { .. } => "Database constraint violated",
                    _ => "Database operation failed",
                };
                ApiError::new(ErrorCode::IntegrityError, message)
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::from(DbError::from(err))
    }
}

/// Malformed payloads are a caller mistake.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::validation(format!("Invalid payload: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Errors that stop the register from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database unavailable: {0}")]
    Database(#[from] DbError),
}
