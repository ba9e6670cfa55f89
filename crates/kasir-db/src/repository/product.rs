//! # Product Repository
//!
//! The product side of the store contract.
//!
//! Product CRUD belongs to the back-office screens; the sale engine only
//! needs products to exist, to be locked, and to have their stock moved. This
//! module carries the plain CRUD needed to seed and inspect that state, plus
//! [`write_stock`], the one product write performed inside a unit.
//!
//! ## Key Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Outside a unit (pool)          Inside a unit (unit.conn())             │
//! │  ─────────────────────          ───────────────────────────             │
//! │  insert / update / delete       unit.lock_product(id)   (locked read)   │
//! │  get_by_id / get_by_barcode     write_stock(conn, id, n)                │
//! │  exists  ← checkout pre-flight                                           │
//! │  list / count                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use kasir_core::validation::{validate_non_negative, validate_product_name};
use kasir_core::{new_id, to_iso8601, Money, Product};

/// Fields for a product that is about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub barcode: Option<String>,
    pub name: String,
    pub price: Money,
    pub stock: i64,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Money, stock: i64) -> Self {
        NewProduct {
            barcode: None,
            name: name.into(),
            price,
            stock,
        }
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored row, with generated id and timestamps
    /// * `Err(DbError::Core(Validation))` - Empty name, negative price/stock
    /// * `Err(DbError::UniqueViolation)` - Barcode already exists
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        validate_product_name(&product.name)?;
        validate_non_negative("price", product.price.amount())?;
        validate_non_negative("stock", product.stock)?;

        let id = new_id();
        let now = to_iso8601(&Utc::now());
        let barcode = product
            .barcode
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty());

        debug!(id = %id, name = %product.name, "Inserting product");

        let inserted = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, barcode, name, price, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING id, barcode, name, price, stock, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(barcode)
        .bind(product.name.trim())
        .bind(product.price)
        .bind(product.stock)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, barcode, name, price, stock, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its barcode (scanner lookup).
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, barcode, name, price, stock, created_at, updated_at
            FROM products
            WHERE barcode = ?1
            "#,
        )
        .bind(barcode.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Checks whether a product id exists.
    ///
    /// Only a hint: the row can disappear before a unit locks it.
    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Lists all products ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, barcode, name, price, stock, created_at, updated_at
            FROM products
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates barcode, name, price and stock of an existing product.
    ///
    /// Sale items already recorded keep their snapshots.
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        validate_product_name(&product.name)?;
        validate_non_negative("price", product.price.amount())?;
        validate_non_negative("stock", product.stock)?;

        debug!(id = %product.id, "Updating product");

        let updated = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                barcode = ?2,
                name = ?3,
                price = ?4,
                stock = ?5,
                updated_at = ?6
            WHERE id = ?1
            RETURNING id, barcode, name, price, stock, created_at, updated_at
            "#,
        )
        .bind(&product.id)
        .bind(product.barcode.as_deref())
        .bind(product.name.trim())
        .bind(product.price)
        .bind(product.stock)
        .bind(to_iso8601(&Utc::now()))
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| DbError::not_found("Product", &product.id))
    }

    /// Hard-deletes a product.
    ///
    /// Historical sale items referencing it get a null `product_id` and keep
    /// their snapshots.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Sets a product's stock to an absolute value.
///
/// Called inside a unit after [`UnitOfWork::lock_product`](crate::UnitOfWork::lock_product),
/// so the value written was computed from the locked row.
pub(crate) async fn write_stock<'e, E>(executor: E, id: &str, stock: i64) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(id = %id, stock = stock, "Writing stock");

    let result = sqlx::query("UPDATE products SET stock = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(stock)
        .bind(to_iso8601(&Utc::now()))
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
