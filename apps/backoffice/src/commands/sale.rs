//! # Sale Commands
//!
//! Checkout and the sales list.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout                                             │
//! │                                                                         │
//! │  cart snapshot + customer + installment count                           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  create_sale()          moda-core: totals, schedule, frozen lines       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  sales().checkout()     one transaction:                                │
//! │                           stock -= qty WHERE stock >= qty (per product) │
//! │                           INSERT sale                                   │
//! │        │                                                                │
//! │        ├── Err ──► cart untouched, operator sees the reason             │
//! │        ▼                                                                │
//! │  clear cart, navigate to Sales                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use moda_core::ledger::filter_sales_by_customer;
use moda_core::sale::create_sale;
use moda_core::Sale;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::navigation::{Confirmation, Outcome};
use crate::state::{CartState, DbState, NavState};

/// What the operator picks on the checkout form besides the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub customer_id: Option<String>,
    pub installment_count: u32,
}

/// Turns the cart into a sale dated now.
pub async fn checkout(
    db: &DbState,
    cart: &CartState,
    nav: &NavState,
    request: CheckoutRequest,
) -> ApiResult<Sale> {
    checkout_at(db, cart, nav, request, Utc::now()).await
}

/// Turns the cart into a sale dated `now`.
///
/// ## Errors
/// - `VALIDATION_ERROR`: no customer, empty cart, installments outside 1..=24
/// - `NOT_FOUND`: the customer or a product no longer exists
/// - `INSUFFICIENT_STOCK`: a product ran out since it was added; nothing
///   is written and the cart is kept
pub async fn checkout_at(
    db: &DbState,
    cart: &CartState,
    nav: &NavState,
    request: CheckoutRequest,
    now: DateTime<Utc>,
) -> ApiResult<Sale> {
    let snapshot = cart.snapshot();
    debug!(
        lines = snapshot.lines.len(),
        installments = request.installment_count,
        "checkout command"
    );

    let customer = match request.customer_id.as_deref() {
        Some(id) => Some(
            db.inner()
                .customers()
                .get_by_id(id)
                .await?
                .ok_or_else(|| ApiError::not_found("Customer", id))?,
        ),
        None => None,
    };

    let sale = create_sale(
        customer.as_ref(),
        &snapshot.lines,
        snapshot.discount,
        request.installment_count,
        now,
    )?;

    db.inner().sales().checkout(&sale).await?;

    cart.with_cart_mut(|c| c.clear());
    nav.with_nav(|n| n.checkout_completed());

    info!(
        sale_id = %sale.id,
        customer = %sale.customer_name,
        total = %sale.total,
        installments = sale.installments.len(),
        "Sale completed"
    );
    Ok(sale)
}

/// Sales newest first, optionally filtered by customer name.
pub async fn list_sales(db: &DbState, customer_query: Option<&str>) -> ApiResult<Vec<Sale>> {
    let sales = db.inner().sales().list().await?;
    match customer_query {
        Some(query) => Ok(filter_sales_by_customer(&sales, query)
            .into_iter()
            .cloned()
            .collect()),
        None => Ok(sales),
    }
}

pub async fn get_sale(db: &DbState, id: &str) -> ApiResult<Sale> {
    db.inner()
        .sales()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", id))
}

/// Deletes a sale after confirmation. Sold units are not returned to stock.
pub async fn delete_sale(
    db: &DbState,
    id: &str,
    confirmation: Confirmation,
) -> ApiResult<Outcome<()>> {
    if !confirmation.is_confirmed() {
        return Ok(Outcome::Cancelled);
    }

    db.inner().sales().delete(id).await?;
    info!(sale_id = %id, "Sale deleted");
    Ok(Outcome::Done(()))
}
