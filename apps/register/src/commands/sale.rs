//! # Sale Commands

use tracing::debug;

use crate::error::ApiError;
use kasir_core::{CheckoutRequest, SaleId, SalePatch, SaleWithItems};
use kasir_db::Database;

pub async fn checkout(db: &Database, request: CheckoutRequest) -> Result<SaleId, ApiError> {
    debug!(lines = request.items.len(), "checkout command");

    let sale_id = db.sales().checkout(&request).await?;
    Ok(sale_id)
}

pub async fn delete_sale(db: &Database, sale_id: String) -> Result<bool, ApiError> {
    debug!(sale_id = %sale_id, "delete_sale command");

    let deleted = db.sales().delete(&sale_id).await?;
    Ok(deleted)
}

pub async fn update_sale(db: &Database, patch: SalePatch) -> Result<bool, ApiError> {
    debug!(sale_id = %patch.id, "update_sale command");

    let updated = db.sales().update(&patch).await?;
    Ok(updated)
}

pub async fn list_sales(db: &Database) -> Result<Vec<SaleWithItems>, ApiError> {
    debug!("list_sales command");

    let sales = db.sales().list().await?;
    Ok(sales)
}
