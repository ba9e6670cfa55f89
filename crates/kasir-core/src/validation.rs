//! # Validation Module
//!
//! Input validation for engine requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request channel                                              │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (no I/O, runs before any transaction)            │
//! │  ├── Cart is non-empty                                                 │
//! │  ├── Every qty is positive                                             │
//! │  └── Patch carries a sale id                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (qty > 0)                               │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{CheckoutRequest, SalePatch};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_PRODUCT_NAME_LEN: usize = 200;

/// Validates a cart line quantity.
///
/// ## Example
/// ```rust
/// use kasir_core::validation::validate_quantity;
///
/// assert!(validate_quantity("qty", 3).is_ok());
/// assert!(validate_quantity("qty", 0).is_err());
/// ```
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a checkout request before any store access.
///
/// ## Rules
/// - At least one cart line
/// - Every line has a product id and a positive qty
///
/// The money fields are not checked against the lines; they are stored as
/// the register computed them.
pub fn validate_checkout(request: &CheckoutRequest) -> ValidationResult<()> {
    if request.items.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    for (index, line) in request.items.iter().enumerate() {
        if line.id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: format!("items[{index}].id"),
            });
        }
        validate_quantity(&format!("items[{index}].qty"), line.qty)?;
    }

    Ok(())
}

/// Validates a sale correction patch.
pub fn validate_patch(patch: &SalePatch) -> ValidationResult<()> {
    if patch.id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a non-negative amount (price or stock).
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::CartLine;

    fn request(items: Vec<CartLine>) -> CheckoutRequest {
        CheckoutRequest {
            items,
            subtotal: Money::new(15_000),
            total: Money::new(15_000),
            paid: Money::new(20_000),
            change: Money::new(5_000),
        }
    }

    fn line(id: &str, qty: i64) -> CartLine {
        CartLine {
            id: id.to_string(),
            qty,
        }
    }

    #[test]
    fn test_empty_cart_rejected() {
        assert_eq!(
            validate_checkout(&request(vec![])),
            Err(ValidationError::EmptyCart)
        );
    }

    #[test]
    fn test_non_positive_qty_rejected() {
        let err = validate_checkout(&request(vec![line("p-1", 2), line("p-2", 0)])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MustBePositive {
                field: "items[1].qty".to_string()
            }
        );

        assert!(validate_checkout(&request(vec![line("p-1", -4)])).is_err());
    }

    #[test]
    fn test_blank_product_id_rejected() {
        let err = validate_checkout(&request(vec![line("  ", 1)])).unwrap_err();
        assert!(matches!(err, ValidationError::Required { .. }));
    }

    #[test]
    fn test_valid_cart_accepted() {
        assert!(validate_checkout(&request(vec![line("p-1", 3), line("p-2", 1)])).is_ok());
    }

    #[test]
    fn test_mismatched_totals_are_not_a_validation_concern() {
        let mut req = request(vec![line("p-1", 3)]);
        req.total = Money::new(1);
        assert!(validate_checkout(&req).is_ok());
    }

    #[test]
    fn test_patch_requires_id() {
        let patch = SalePatch {
            id: String::new(),
            datetime: None,
            total: Some(Money::new(1_000)),
        };
        assert!(matches!(
            validate_patch(&patch),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_product_fields() {
        assert!(validate_product_name("Indomie Goreng").is_ok());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"x".repeat(201)).is_err());
        assert!(validate_non_negative("price", 0).is_ok());
        assert!(validate_non_negative("stock", -1).is_err());
    }
}
