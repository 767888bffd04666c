//! # Settlement Commands
//!
//! Payments recorded against one installment of a sale.
//!
//! The amount typed by the operator replaces the installment's amount
//! paid; it is not added to it. Each write is checked against the sale's
//! version, and a write that lost the race is re-applied once on the fresh
//! copy before the conflict is reported.

use std::future::Future;

use moda_core::{Money, Sale};
use moda_db::{DbError, DbResult};
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::state::DbState;

/// Sets the amount paid on one installment.
pub async fn record_payment(
    db: &DbState,
    sale_id: &str,
    installment_id: &str,
    amount: Money,
) -> ApiResult<Sale> {
    let sales = db.inner().sales();
    let sale = retry_on_conflict(|| sales.record_payment(sale_id, installment_id, amount)).await?;

    info!(sale_id = %sale_id, installment_id = %installment_id, amount = %amount, "Payment recorded");
    Ok(sale)
}

/// Marks one installment as fully paid.
pub async fn mark_paid_in_full(
    db: &DbState,
    sale_id: &str,
    installment_id: &str,
) -> ApiResult<Sale> {
    let sales = db.inner().sales();
    let sale = retry_on_conflict(|| sales.mark_paid_in_full(sale_id, installment_id)).await?;

    info!(sale_id = %sale_id, installment_id = %installment_id, "Installment paid in full");
    Ok(sale)
}

/// Resets one installment to nothing paid.
pub async fn clear_payment(db: &DbState, sale_id: &str, installment_id: &str) -> ApiResult<Sale> {
    let sales = db.inner().sales();
    let sale = retry_on_conflict(|| sales.clear_payment(sale_id, installment_id)).await?;

    info!(sale_id = %sale_id, installment_id = %installment_id, "Payment cleared");
    Ok(sale)
}

/// Runs `op`, and once more if it failed with a version conflict.
async fn retry_on_conflict<F, Fut>(mut op: F) -> DbResult<Sale>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DbResult<Sale>>,
{
    match op().await {
        Err(DbError::VersionConflict { id, expected }) => {
            warn!(sale_id = %id, expected, "Sale changed concurrently, retrying");
            op().await
        }
        other => other,
    }
}
