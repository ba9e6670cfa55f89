//! # Unit of Work
//!
//! The transaction coordinator: one atomic unit of reads and writes.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       UnitOfWork Lifecycle                              │
//! │                                                                         │
//! │  db.begin_unit()          BEGIN on a pooled connection                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  first statement is a write or a lock read                             │
//! │       │   → takes the SQLite write lock, waits up to busy_timeout      │
//! │       ▼                                                                 │
//! │  lock_product(id) / lock_sale(id)                                      │
//! │       │   → UPDATE … SET col = col WHERE id = ? RETURNING …            │
//! │       │     returns the latest committed row, already locked           │
//! │       ▼                                                                 │
//! │  writes through unit.conn()                                            │
//! │       │                                                                 │
//! │       ├── ? on any error ──► UnitOfWork dropped ──► ROLLBACK           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  unit.commit()            COMMIT, lock released                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking on SQLite
//! SQLite has no `SELECT … FOR UPDATE`. A no-op `UPDATE … RETURNING` is the
//! locking read: it acquires the write lock and yields the row in a single
//! statement. Because a unit's first statement always writes, the unit never
//! reads from a snapshot older than the last committed writer. The write lock
//! covers the whole database, so units touching disjoint products serialize
//! as well.
//!
//! Dropping a unit without calling [`UnitOfWork::commit`] rolls it back, so
//! every early return and every `?` leaves the store untouched.

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::debug;

use crate::error::DbResult;
use kasir_core::{Product, Sale};

/// An open atomic unit.
#[derive(Debug)]
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    /// Begins a unit on a connection taken from `pool`.
    pub async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool.begin().await?;
        debug!("Unit of work opened");
        Ok(UnitOfWork { tx })
    }

    /// Connection for statements that run inside the unit.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut *self.tx
    }

    /// Reads a product under the write lock.
    ///
    /// Blocks while another unit holds the lock, then returns the row as that
    /// unit committed it. `None` when the product does not exist.
    pub async fn lock_product(&mut self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET stock = stock
            WHERE id = ?1
            RETURNING id, barcode, name, price, stock, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        debug!(product_id = %id, found = product.is_some(), "Locked product row");
        Ok(product)
    }

    /// Reads a sale header under the write lock.
    pub async fn lock_sale(&mut self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales
            SET updated_at = updated_at
            WHERE id = ?1
            RETURNING id, datetime, subtotal, total, paid, change, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        debug!(sale_id = %id, found = sale.is_some(), "Locked sale row");
        Ok(sale)
    }

    /// Commits every write made in the unit and releases the lock.
    pub async fn commit(self) -> DbResult<()> {
        self.tx.commit().await?;
        debug!("Unit of work committed");
        Ok(())
    }

    /// Rolls the unit back explicitly.
    ///
    /// Dropping the unit does the same; this variant reports rollback errors.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx.rollback().await?;
        debug!("Unit of work rolled back");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
