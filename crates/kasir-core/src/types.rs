//! # Domain Types
//!
//! Core domain types used throughout Kasir.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  sale_id (FK)   │       │
//! │  │  barcode        │   │  datetime       │   │  product_id?    │       │
//! │  │  price, stock   │   │  subtotal/total │   │  price snapshot │       │
//! │  └─────────────────┘   │  paid/change    │   │  name snapshot  │       │
//! │           ▲            └─────────────────┘   └─────────────────┘       │
//! │           │ referenced, not owned        owns ▲                        │
//! │           └───────────────────────────────────┘                        │
//! │                                                                         │
//! │  Requests: CheckoutRequest { items: [CartLine] }, SalePatch             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;

/// Generates a new entity ID (UUID v4).
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Formats a timestamp the way `datetime` columns persist it.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use kasir_core::to_iso8601;
///
/// let at = Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap();
/// assert_eq!(to_iso8601(&at), "2026-10-14T09:30:00.000Z");
/// ```
pub fn to_iso8601(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// Owned by product CRUD; the sale engine only reads it and moves `stock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,

    /// Barcode (EAN-13, UPC-A, etc.), unique when present.
    pub barcode: Option<String>,

    pub name: String,

    /// Current selling price.
    pub price: Money,

    /// Units on hand, never negative.
    pub stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Stock left after selling `qty` units, floored at zero.
    ///
    /// Overselling is not rejected: the register may sell stock that was never
    /// counted in, and the floor keeps `stock >= 0` true.
    ///
    /// ## Example
    /// ```text
    /// stock 10, sell 3  → 7
    /// stock 2,  sell 5  → 0   (clamped)
    /// ```
    #[inline]
    pub fn stock_after_sale(&self, qty: i64) -> i64 {
        self.stock.saturating_sub(qty).max(0)
    }

    /// Whether selling `qty` units would drive stock below zero.
    #[inline]
    pub fn would_oversell(&self, qty: i64) -> bool {
        qty > self.stock
    }

    /// Stock after a deleted sale hands `qty` units back.
    #[inline]
    pub fn stock_after_restore(&self, qty: i64) -> i64 {
        self.stock.saturating_add(qty)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Sale identifier returned by checkout.
pub type SaleId = String;

/// A sale header.
///
/// The money fields are the register's own figures, stored as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: SaleId,
    /// When the sale happened; correctable after the fact.
    #[ts(as = "String")]
    pub datetime: DateTime<Utc>,
    pub subtotal: Money,
    pub total: Money,
    pub paid: Money,
    pub change: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: SaleId,
    /// Null once the product has been deleted.
    pub product_id: Option<String>,
    /// Quantity sold, always positive.
    pub qty: i64,
    /// Unit price at time of sale (frozen).
    pub price: Money,
    /// `qty × price` at time of sale (frozen).
    pub total: Money,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Builds a line item by copying price and name off `product`.
    ///
    /// ## Snapshot Pattern
    /// The returned item never looks at the product again. Later renames or
    /// price changes leave historical sales untouched.
    ///
    /// ## Errors
    /// `ValidationError::Overflow` when `qty × price` does not fit in money.
    pub fn snapshot(
        sale_id: &str,
        product: &Product,
        qty: i64,
        created_at: DateTime<Utc>,
    ) -> Result<SaleItem, ValidationError> {
        let total = product
            .price
            .checked_mul_qty(qty)
            .ok_or_else(|| ValidationError::Overflow {
                field: format!("total for product {}", product.id),
            })?;

        Ok(SaleItem {
            id: new_id(),
            sale_id: sale_id.to_string(),
            product_id: Some(product.id.clone()),
            qty,
            price: product.price,
            total,
            product_name: product.name.clone(),
            created_at,
        })
    }
}

/// A sale with its line items, as listed for history views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

impl SaleWithItems {
    /// Sum of the frozen line totals, `None` if it leaves the `i64` range.
    pub fn items_total(&self) -> Option<Money> {
        self.items
            .iter()
            .try_fold(Money::zero(), |sum, item| sum.checked_add(item.total))
    }
}

// =============================================================================
// Requests
// =============================================================================

/// One cart entry as submitted by the register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    /// Product ID.
    pub id: String,
    pub qty: i64,
}

/// Checkout payload.
///
/// Prices are never taken from here: each line is priced off the locked
/// product row. The money fields are stored as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutRequest {
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub subtotal: Money,
    #[serde(default)]
    pub total: Money,
    #[serde(default)]
    pub paid: Money,
    #[serde(default)]
    pub change: Money,
}

/// Manual correction of a sale header.
///
/// Absent fields keep their stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalePatch {
    pub id: SaleId,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total: Option<Money>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, price: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            barcode: Some("8991234567890".to_string()),
            name: "Teh Botol 350ml".to_string(),
            price: Money::new(price),
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_stock_after_sale_decrements() {
        assert_eq!(product(10, 5_000).stock_after_sale(3), 7);
        assert_eq!(product(3, 5_000).stock_after_sale(3), 0);
    }

    #[test]
    fn test_stock_after_sale_clamps_at_zero() {
        let p = product(2, 5_000);
        assert!(p.would_oversell(5));
        assert_eq!(p.stock_after_sale(5), 0);
    }

    #[test]
    fn test_stock_after_restore() {
        assert_eq!(product(7, 5_000).stock_after_restore(3), 10);
    }

    #[test]
    fn test_snapshot_copies_price_and_name() {
        let mut p = product(10, 5_000);
        let item = SaleItem::snapshot("s-1", &p, 3, Utc::now()).unwrap();

        p.price = Money::new(9_000);
        p.name = "Renamed".to_string();

        assert_eq!(item.sale_id, "s-1");
        assert_eq!(item.product_id.as_deref(), Some("p-1"));
        assert_eq!(item.price, Money::new(5_000));
        assert_eq!(item.total, Money::new(15_000));
        assert_eq!(item.product_name, "Teh Botol 350ml");
    }

    #[test]
    fn test_snapshot_rejects_overflowing_total() {
        let p = product(10, i64::MAX);
        let err = SaleItem::snapshot("s-1", &p, 2, Utc::now()).unwrap_err();
        assert!(matches!(err, ValidationError::Overflow { .. }));
    }

    #[test]
    fn test_checkout_request_from_camel_case_json() {
        let json = r#"{
            "items": [{ "id": "p-1", "qty": 3 }],
            "subtotal": 15000,
            "total": 15000,
            "paid": 20000,
            "change": 5000
        }"#;
        let request: CheckoutRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].qty, 3);
        assert_eq!(request.change, Money::new(5_000));
    }

    #[test]
    fn test_checkout_request_money_defaults_to_zero() {
        let request: CheckoutRequest =
            serde_json::from_str(r#"{ "items": [{ "id": "p-1", "qty": 1 }] }"#).unwrap();
        assert!(request.subtotal.is_zero());
        assert!(request.paid.is_zero());
    }

    #[test]
    fn test_sale_patch_optional_fields() {
        let patch: SalePatch = serde_json::from_str(r#"{ "id": "s-1", "total": 12000 }"#).unwrap();
        assert_eq!(patch.total, Some(Money::new(12_000)));
        assert!(patch.datetime.is_none());
    }

    #[test]
    fn test_sale_with_items_flattens_header() {
        let now = Utc::now();
        let sale = Sale {
            id: "s-1".to_string(),
            datetime: now,
            subtotal: Money::new(15_000),
            total: Money::new(15_000),
            paid: Money::new(20_000),
            change: Money::new(5_000),
            created_at: now,
            updated_at: now,
        };
        let item = SaleItem::snapshot("s-1", &product(10, 5_000), 3, now).unwrap();
        let listed = SaleWithItems {
            sale,
            items: vec![item],
        };

        assert_eq!(listed.items_total(), Some(Money::new(15_000)));

        let mut huge = listed.clone();
        huge.items[0].total = Money::new(i64::MAX);
        huge.items.push(huge.items[0].clone());
        assert_eq!(huge.items_total(), None);

        let value = serde_json::to_value(&listed).unwrap();
        assert_eq!(value["id"], "s-1");
        assert_eq!(value["items"][0]["productName"], "Teh Botol 350ml");
    }
}
