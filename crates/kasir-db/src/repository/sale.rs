//! # Sale Repository
//!
//! The sale transaction engine: checkout, deletion, correction and listing.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CHECKOUT  (one unit)                                               │
//! │     └── validate cart, pre-flight product ids      (no unit yet)       │
//! │     └── INSERT sale header                          (takes write lock) │
//! │     └── per line: lock_product → snapshot → INSERT item → stock -= qty │
//! │     └── COMMIT → sale id                                               │
//! │                                                                         │
//! │  2. (OPTIONAL) CORRECT                                                 │
//! │     └── update() → datetime / total patched, items and stock untouched │
//! │                                                                         │
//! │  3. (OPTIONAL) DELETE  (one unit)                                      │
//! │     └── lock_sale → read items                                         │
//! │     └── per item: lock_product → stock += qty (skip if product gone)   │
//! │     └── DELETE sale, items cascade → COMMIT                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error inside a unit drops it, and dropping rolls back: a failed
//! checkout leaves no header, no items and no stock change behind.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::DbResult;
use crate::repository::product::{write_stock, ProductRepository};
use crate::transaction::UnitOfWork;
use kasir_core::validation::{validate_checkout, validate_patch};
use kasir_core::{
    new_id, to_iso8601, CheckoutRequest, CoreError, Money, Sale, SaleId, SaleItem, SalePatch,
    SaleWithItems,
};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Records a sale and takes its quantities out of stock.
    ///
    /// ## Returns
    /// * `Ok(SaleId)` - The committed sale
    /// * `Err(DbError::Core(Validation))` - Empty cart, qty ≤ 0, line total overflow
    /// * `Err(DbError::Core(ProductNotFound))` - A cart line names no product
    /// * `Err(DbError::Busy)` - Another unit held the lock past `busy_timeout`
    ///
    /// Line prices come from the locked product rows. The header's money
    /// fields are stored exactly as the register sent them.
    pub async fn checkout(&self, request: &CheckoutRequest) -> DbResult<SaleId> {
        validate_checkout(request)?;

        // Fast rejection only; the unit re-checks every product under lock.
        let products = ProductRepository::new(self.pool.clone());
        for line in &request.items {
            if !products.exists(&line.id).await? {
                return Err(CoreError::ProductNotFound(line.id.clone()).into());
            }
        }

        self.record_sale(request).await
    }

    /// Runs the checkout unit on a validated request.
    ///
    /// Products are looked up again under lock, so one removed after the
    /// pre-flight still fails the whole unit.
    async fn record_sale(&self, request: &CheckoutRequest) -> DbResult<SaleId> {
        let now = Utc::now();
        let sale_id = new_id();

        debug!(sale_id = %sale_id, lines = request.items.len(), "Starting checkout");

        let mut unit = UnitOfWork::begin(&self.pool).await?;
        insert_sale_header(unit.conn(), &sale_id, request, &to_iso8601(&now)).await?;

        let mut items_total = Some(Money::zero());

        for line in &request.items {
            let product = unit
                .lock_product(&line.id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.id.clone()))?;

            let item = SaleItem::snapshot(&sale_id, &product, line.qty, now)?;
            insert_sale_item(unit.conn(), &item).await?;

            if product.would_oversell(line.qty) {
                warn!(
                    product_id = %product.id,
                    stock = product.stock,
                    qty = line.qty,
                    "Sold more than on hand, clamping stock at zero"
                );
            }
            write_stock(unit.conn(), &product.id, product.stock_after_sale(line.qty)).await?;

            items_total = items_total.and_then(|sum| sum.checked_add(item.total));
        }

        if items_total != Some(request.subtotal) {
            warn!(
                sale_id = %sale_id,
                subtotal = %request.subtotal,
                items_total = ?items_total.map(|sum| sum.amount()),
                "Submitted subtotal differs from line totals"
            );
        }

        unit.commit().await?;

        info!(sale_id = %sale_id, total = %request.total, "Sale committed");
        Ok(sale_id)
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Deletes a sale and hands its quantities back to stock.
    ///
    /// Items whose product no longer exists are skipped; the sale is still
    /// deleted.
    pub async fn delete(&self, sale_id: &str) -> DbResult<bool> {
        debug!(sale_id = %sale_id, "Deleting sale");

        let mut unit = UnitOfWork::begin(&self.pool).await?;

        let sale = unit
            .lock_sale(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        let items = fetch_items(unit.conn(), &sale.id).await?;

        for item in &items {
            let Some(product_id) = item.product_id.as_deref() else {
                debug!(item_id = %item.id, "Item has no product, nothing to restore");
                continue;
            };

            match unit.lock_product(product_id).await? {
                Some(product) => {
                    write_stock(unit.conn(), product_id, product.stock_after_restore(item.qty))
                        .await?;
                }
                None => {
                    warn!(
                        sale_id = %sale.id,
                        product_id = %product_id,
                        qty = item.qty,
                        "Product missing, stock not restored"
                    );
                }
            }
        }

        sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(&sale.id)
            .execute(unit.conn())
            .await?;

        unit.commit().await?;

        info!(sale_id = %sale.id, items = items.len(), "Sale deleted");
        Ok(true)
    }

    // =========================================================================
    // Correction
    // =========================================================================

    /// Patches a sale header's `datetime` and/or `total`.
    ///
    /// Items, stock and the other money fields are left alone, and the new
    /// total is not checked against the items.
    pub async fn update(&self, patch: &SalePatch) -> DbResult<bool> {
        validate_patch(patch)?;

        debug!(
            sale_id = %patch.id,
            datetime = patch.datetime.is_some(),
            total = patch.total.is_some(),
            "Correcting sale"
        );

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                datetime = COALESCE(?2, datetime),
                total = COALESCE(?3, total),
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&patch.id)
        .bind(patch.datetime.as_ref().map(to_iso8601))
        .bind(patch.total)
        .bind(to_iso8601(&Utc::now()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::SaleNotFound(patch.id.clone()).into());
        }

        Ok(true)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lists every sale with its items, newest first.
    pub async fn list(&self) -> DbResult<Vec<SaleWithItems>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, datetime, subtotal, total, paid, change, created_at, updated_at
            FROM sales
            ORDER BY datetime DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, qty, price, total, product_name, created_at
            FROM sale_items
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_sale: HashMap<SaleId, Vec<SaleItem>> = HashMap::new();
        for item in items {
            by_sale.entry(item.sale_id.clone()).or_default().push(item);
        }

        let listed = sales
            .into_iter()
            .map(|sale| {
                let items = by_sale.remove(&sale.id).unwrap_or_default();
                SaleWithItems { sale, items }
            })
            .collect();

        Ok(listed)
    }

    /// Gets one sale with its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleWithItems>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, datetime, subtotal, total, paid, change, created_at, updated_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(sale) = sale else {
            return Ok(None);
        };

        let items = fetch_items(&self.pool, &sale.id).await?;
        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Gets the items of a sale in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        fetch_items(&self.pool, sale_id).await
    }

    /// Counts sales (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Statements shared by units and plain reads
// =============================================================================

async fn insert_sale_header<'e, E>(
    executor: E,
    sale_id: &str,
    request: &CheckoutRequest,
    now: &str,
) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO sales (id, datetime, subtotal, total, paid, change, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?2, ?2)
        "#,
    )
    .bind(sale_id)
    .bind(now)
    .bind(request.subtotal)
    .bind(request.total)
    .bind(request.paid)
    .bind(request.change)
    .execute(executor)
    .await?;

    Ok(())
}

async fn insert_sale_item<'e, E>(executor: E, item: &SaleItem) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(
        sale_id = %item.sale_id,
        product_id = ?item.product_id,
        qty = item.qty,
        price = %item.price,
        "Inserting sale item"
    );

    sqlx::query(
        r#"
        INSERT INTO sale_items (id, sale_id, product_id, qty, price, total, product_name, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(item.product_id.as_deref())
    .bind(item.qty)
    .bind(item.price)
    .bind(item.total)
    .bind(&item.product_name)
    .bind(to_iso8601(&item.created_at))
    .execute(executor)
    .await?;

    Ok(())
}

async fn fetch_items<'e, E>(executor: E, sale_id: &str) -> DbResult<Vec<SaleItem>>
where
    E: SqliteExecutor<'e>,
{
    let items = sqlx::query_as::<_, SaleItem>(
        r#"
        SELECT id, sale_id, product_id, qty, price, total, product_name, created_at
        FROM sale_items
        WHERE sale_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(sale_id)
    .fetch_all(executor)
    .await?;

    Ok(items)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DbError, ErrorKind};
    use crate::repository::product::NewProduct;
    use crate::{Database, DbConfig};
    use chrono::{Duration as ChronoDuration, TimeZone};
    use kasir_core::{CartLine, Product, ValidationError};
    use std::time::Duration;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn product(db: &Database, name: &str, price: i64, stock: i64) -> Product {
        db.products()
            .insert(&NewProduct::new(name, Money::new(price), stock))
            .await
            .unwrap()
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    fn cart(lines: &[(&str, i64)], subtotal: i64) -> CheckoutRequest {
        CheckoutRequest {
            items: lines
                .iter()
                .map(|(id, qty)| CartLine {
                    id: id.to_string(),
                    qty: *qty,
                })
                .collect(),
            subtotal: Money::new(subtotal),
            total: Money::new(subtotal),
            paid: Money::new(subtotal),
            change: Money::zero(),
        }
    }

    #[tokio::test]
    async fn test_checkout_then_delete_worked_example() {
        let db = db().await;
        let p = product(&db, "Teh Botol 350ml", 5_000, 10).await;

        let mut request = cart(&[(p.id.as_str(), 3)], 15_000);
        request.paid = Money::new(20_000);
        request.change = Money::new(5_000);

        let sale_id = db.sales().checkout(&request).await.unwrap();
        assert_eq!(stock_of(&db, &p.id).await, 7);

        let sale = db.sales().get_by_id(&sale_id).await.unwrap().unwrap();
        assert_eq!(sale.sale.subtotal, Money::new(15_000));
        assert_eq!(sale.sale.paid, Money::new(20_000));
        assert_eq!(sale.sale.change, Money::new(5_000));
        assert_eq!(sale.items.len(), 1);

        let item = &sale.items[0];
        assert_eq!(item.product_id.as_deref(), Some(p.id.as_str()));
        assert_eq!(item.qty, 3);
        assert_eq!(item.price, Money::new(5_000));
        assert_eq!(item.total, Money::new(15_000));
        assert_eq!(item.product_name, "Teh Botol 350ml");

        assert!(db.sales().delete(&sale_id).await.unwrap());
        assert_eq!(stock_of(&db, &p.id).await, 10);
        assert!(db.sales().get_by_id(&sale_id).await.unwrap().is_none());
        assert!(db.sales().get_items(&sale_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_multiple_lines_in_cart_order() {
        let db = db().await;
        let a = product(&db, "Beras 5kg", 70_000, 5).await;
        let b = product(&db, "Minyak Goreng 1L", 18_000, 8).await;

        let sale_id = db
            .sales()
            .checkout(&cart(&[(a.id.as_str(), 1), (b.id.as_str(), 2), (a.id.as_str(), 1)], 106_000))
            .await
            .unwrap();

        assert_eq!(stock_of(&db, &a.id).await, 3);
        assert_eq!(stock_of(&db, &b.id).await, 6);

        let items = db.sales().get_items(&sale_id).await.unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.product_name.as_str()).collect();
        assert_eq!(names, vec!["Beras 5kg", "Minyak Goreng 1L", "Beras 5kg"]);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected_without_writes() {
        let db = db().await;

        let err = db.sales().checkout(&cart(&[], 0)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Validation(ValidationError::EmptyCart))
        ));
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_non_positive_qty_rejected() {
        let db = db().await;
        let p = product(&db, "Sabun", 4_000, 10).await;

        let err = db.sales().checkout(&cart(&[(p.id.as_str(), 0)], 0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(stock_of(&db, &p.id).await, 10);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_product_leaves_no_trace() {
        let db = db().await;
        let p = product(&db, "Kopi Sachet", 1_500, 20).await;

        let err = db
            .sales()
            .checkout(&cart(&[(p.id.as_str(), 2), ("no-such-product", 1)], 3_000))
            .await
            .unwrap_err();

        match err {
            DbError::Core(CoreError::ProductNotFound(id)) => assert_eq!(id, "no-such-product"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stock_of(&db, &p.id).await, 20);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_product_removed_after_preflight_rolls_back_unit() {
        let db = db().await;
        let kept = product(&db, "Gula Pasir 1kg", 16_000, 10).await;
        let gone = product(&db, "Tepung Terigu 1kg", 12_000, 10).await;

        let request = cart(&[(kept.id.as_str(), 2), (gone.id.as_str(), 1)], 44_000);
        validate_checkout(&request).unwrap();
        assert!(db.products().exists(&gone.id).await.unwrap());

        // Removed between the pre-flight and the unit.
        db.products().delete(&gone.id).await.unwrap();

        let err = db.sales().record_sale(&request).await.unwrap_err();
        match err {
            DbError::Core(CoreError::ProductNotFound(id)) => assert_eq!(id, gone.id),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stock_of(&db, &kept.id).await, 10);
        assert_eq!(db.sales().count().await.unwrap(), 0);
        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_failure_mid_unit_rolls_back_earlier_lines() {
        let db = db().await;
        let cheap = product(&db, "Permen", 500, 10).await;
        let pricey = product(&db, "Emas Batangan", i64::MAX / 2, 10).await;

        // The second line overflows after the first already moved stock.
        let err = db
            .sales()
            .checkout(&cart(&[(cheap.id.as_str(), 4), (pricey.id.as_str(), 3)], 0))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(stock_of(&db, &cheap.id).await, 10);
        assert_eq!(stock_of(&db, &pricey.id).await, 10);
        assert_eq!(db.sales().count().await.unwrap(), 0);
        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_oversell_clamps_stock_at_zero() {
        let db = db().await;
        let p = product(&db, "Telur", 2_000, 2).await;

        let sale_id = db.sales().checkout(&cart(&[(p.id.as_str(), 5)], 10_000)).await.unwrap();
        assert_eq!(stock_of(&db, &p.id).await, 0);

        // Restoration adds the full qty back, not what was actually on hand.
        db.sales().delete(&sale_id).await.unwrap();
        assert_eq!(stock_of(&db, &p.id).await, 5);
    }

    #[tokio::test]
    async fn test_totals_stored_as_submitted() {
        let db = db().await;
        let p = product(&db, "Gula 1kg", 15_000, 4).await;

        let mut request = cart(&[(p.id.as_str(), 1)], 99);
        request.total = Money::new(42);
        let sale_id = db.sales().checkout(&request).await.unwrap();

        let sale = db.sales().get_by_id(&sale_id).await.unwrap().unwrap();
        assert_eq!(sale.sale.subtotal, Money::new(99));
        assert_eq!(sale.sale.total, Money::new(42));
        assert_eq!(sale.items_total(), Some(Money::new(15_000)));
    }

    #[tokio::test]
    async fn test_snapshot_survives_product_changes() {
        let db = db().await;
        let mut p = product(&db, "Aqua 600ml", 3_500, 30).await;
        let sale_id = db.sales().checkout(&cart(&[(p.id.as_str(), 2)], 7_000)).await.unwrap();

        p.name = "Aqua 600ml (baru)".to_string();
        p.price = Money::new(4_000);
        db.products().update(&p).await.unwrap();

        let items = db.sales().get_items(&sale_id).await.unwrap();
        assert_eq!(items[0].product_name, "Aqua 600ml");
        assert_eq!(items[0].price, Money::new(3_500));
        assert_eq!(items[0].total, Money::new(7_000));
    }

    #[tokio::test]
    async fn test_delete_unknown_sale_is_not_found() {
        let db = db().await;
        let p = product(&db, "Sabun", 4_000, 10).await;
        db.sales().checkout(&cart(&[(p.id.as_str(), 1)], 4_000)).await.unwrap();

        let err = db.sales().delete("missing").await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::SaleNotFound(_))));
        assert_eq!(stock_of(&db, &p.id).await, 9);
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_after_product_removed() {
        let db = db().await;
        let gone = product(&db, "Roti Tawar", 12_000, 5).await;
        let kept = product(&db, "Susu UHT", 6_000, 5).await;

        let sale_id = db
            .sales()
            .checkout(&cart(&[(gone.id.as_str(), 1), (kept.id.as_str(), 2)], 24_000))
            .await
            .unwrap();

        db.products().delete(&gone.id).await.unwrap();
        let items = db.sales().get_items(&sale_id).await.unwrap();
        assert!(items[0].product_id.is_none());
        assert_eq!(items[0].product_name, "Roti Tawar");

        assert!(db.sales().delete(&sale_id).await.unwrap());
        assert_eq!(stock_of(&db, &kept.id).await, 5);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_patches_only_given_fields() {
        let db = db().await;
        let p = product(&db, "Indomie Goreng", 3_000, 40).await;
        let sale_id = db.sales().checkout(&cart(&[(p.id.as_str(), 2)], 6_000)).await.unwrap();
        let before = db.sales().get_by_id(&sale_id).await.unwrap().unwrap();

        let patch = SalePatch {
            id: sale_id.clone(),
            datetime: None,
            total: Some(Money::new(5_500)),
        };
        assert!(db.sales().update(&patch).await.unwrap());

        let after = db.sales().get_by_id(&sale_id).await.unwrap().unwrap();
        assert_eq!(after.sale.total, Money::new(5_500));
        assert_eq!(after.sale.datetime, before.sale.datetime);
        assert_eq!(after.sale.subtotal, before.sale.subtotal);
        assert_eq!(after.items, before.items);
        assert_eq!(stock_of(&db, &p.id).await, 38);

        let when = Utc.with_ymd_and_hms(2026, 1, 2, 8, 15, 0).unwrap();
        let patch = SalePatch {
            id: sale_id.clone(),
            datetime: Some(when),
            total: None,
        };
        db.sales().update(&patch).await.unwrap();

        let after = db.sales().get_by_id(&sale_id).await.unwrap().unwrap();
        assert_eq!(after.sale.datetime, when);
        assert_eq!(after.sale.total, Money::new(5_500));
    }

    #[tokio::test]
    async fn test_update_empty_patch_and_unknown_sale() {
        let db = db().await;
        let p = product(&db, "Sabun", 4_000, 10).await;
        let sale_id = db.sales().checkout(&cart(&[(p.id.as_str(), 1)], 4_000)).await.unwrap();

        let empty = SalePatch {
            id: sale_id,
            datetime: None,
            total: None,
        };
        assert!(db.sales().update(&empty).await.unwrap());

        let missing = SalePatch {
            id: "missing".to_string(),
            datetime: None,
            total: Some(Money::new(1)),
        };
        let err = db.sales().update(&missing).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let blank = SalePatch {
            id: " ".to_string(),
            datetime: None,
            total: None,
        };
        assert_eq!(db.sales().update(&blank).await.unwrap_err().kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_items() {
        let db = db().await;
        let p = product(&db, "Kopi Sachet", 1_500, 50).await;

        let older = db.sales().checkout(&cart(&[(p.id.as_str(), 1)], 1_500)).await.unwrap();
        let newer = db.sales().checkout(&cart(&[(p.id.as_str(), 2), (p.id.as_str(), 3)], 7_500)).await.unwrap();

        db.sales()
            .update(&SalePatch {
                id: older.clone(),
                datetime: Some(Utc::now() - ChronoDuration::days(1)),
                total: None,
            })
            .await
            .unwrap();

        let listed = db.sales().list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].sale.id, newer);
        assert_eq!(listed[0].items.len(), 2);
        assert_eq!(listed[0].items[1].qty, 3);
        assert_eq!(listed[1].sale.id, older);
        assert_eq!(listed[1].items.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_never_lose_a_decrement() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("concurrent.db"))
            .max_connections(4)
            .busy_timeout(Duration::from_secs(10));
        let db = Database::new(config).await.unwrap();
        let p = product(&db, "Teh Botol 350ml", 5_000, 100).await;

        let quantities = [3_i64, 4, 1, 7, 2, 5, 6, 2];
        let handles: Vec<_> = quantities
            .iter()
            .map(|&qty| {
                let db = db.clone();
                let request = cart(&[(p.id.as_str(), qty)], qty * 5_000);
                tokio::spawn(async move { db.sales().checkout(&request).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let sold: i64 = quantities.iter().sum();
        assert_eq!(stock_of(&db, &p.id).await, 100 - sold);
        assert_eq!(db.sales().count().await.unwrap(), quantities.len() as i64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkout_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("mixed.db"))
            .max_connections(4)
            .busy_timeout(Duration::from_secs(10));
        let db = Database::new(config).await.unwrap();
        let p = product(&db, "Susu UHT", 6_000, 20).await;

        let first = db.sales().checkout(&cart(&[(p.id.as_str(), 5)], 30_000)).await.unwrap();

        let deleter = {
            let db = db.clone();
            tokio::spawn(async move { db.sales().delete(&first).await })
        };
        let buyer = {
            let db = db.clone();
            let request = cart(&[(p.id.as_str(), 3)], 18_000);
            tokio::spawn(async move { db.sales().checkout(&request).await })
        };

        deleter.await.unwrap().unwrap();
        buyer.await.unwrap().unwrap();

        assert_eq!(stock_of(&db, &p.id).await, 17);
    }
}
