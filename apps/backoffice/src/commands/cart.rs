//! # Cart Commands
//!
//! Cart manipulation on the new-sale screen.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────────┐     ┌──────────┐    │
//! │  │  Empty   │────►│ In Cart  │────►│ Customer and │────►│ Checkout │    │
//! │  │  Cart    │     │          │     │ installments │     │  (sale)  │    │
//! │  └──────────┘     └──────────┘     └──────────────┘     └──────────┘    │
//! │                        │                                      │         │
//! │                   add_to_cart                          cart cleared     │
//! │                   update_cart_item                                      │
//! │                   remove_from_cart                                      │
//! │                   set_discount                                          │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_cart ─────────────────────► (back to empty)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is checked against the catalog when a line is added or changed,
//! and again atomically at checkout.

use moda_core::cart::{Cart, CartLine, CartTotals};
use moda_core::Money;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::{CartState, DbState};

/// Cart response including lines and totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            lines: cart.lines.clone(),
            totals: CartTotals::from(cart),
        }
    }
}

pub fn get_cart(cart: &CartState) -> CartResponse {
    cart.with_cart(|c| CartResponse::from(c))
}

/// Adds a product to the cart.
///
/// ## Behavior
/// - Already in cart: quantity increases
/// - Not in cart: added with the current price frozen on the line
/// - Refused when the line would exceed the product's stock
pub async fn add_to_cart(
    db: &DbState,
    cart: &CartState,
    product_id: &str,
    quantity: Option<i64>,
) -> ApiResult<CartResponse> {
    let quantity = quantity.unwrap_or(1);
    debug!(product_id = %product_id, quantity, "add_to_cart command");

    let product = db
        .inner()
        .products()
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", product_id))?;

    cart.with_cart_mut(|c| -> ApiResult<CartResponse> {
        c.add(&product, quantity)?;
        Ok(CartResponse::from(&*c))
    })
}

/// Sets a line quantity; 0 removes the line.
pub async fn update_cart_item(
    db: &DbState,
    cart: &CartState,
    product_id: &str,
    quantity: i64,
) -> ApiResult<CartResponse> {
    debug!(product_id = %product_id, quantity, "update_cart_item command");

    let available = match db.inner().products().get_by_id(product_id).await? {
        Some(product) => product.stock,
        None if quantity <= 0 => 0,
        None => return Err(ApiError::not_found("Product", product_id)),
    };

    cart.with_cart_mut(|c| -> ApiResult<CartResponse> {
        c.update_quantity(product_id, quantity, available)?;
        Ok(CartResponse::from(&*c))
    })
}

pub fn remove_from_cart(cart: &CartState, product_id: &str) -> ApiResult<CartResponse> {
    debug!(product_id = %product_id, "remove_from_cart command");
    cart.with_cart_mut(|c| -> ApiResult<CartResponse> {
        c.remove(product_id)?;
        Ok(CartResponse::from(&*c))
    })
}

/// Sets the sale-level discount amount.
pub fn set_discount(cart: &CartState, discount: Money) -> ApiResult<CartResponse> {
    debug!(discount = %discount, "set_discount command");
    cart.with_cart_mut(|c| -> ApiResult<CartResponse> {
        c.set_discount(discount)?;
        Ok(CartResponse::from(&*c))
    })
}

pub fn clear_cart(cart: &CartState) -> CartResponse {
    debug!("clear_cart command");
    cart.with_cart_mut(|c| {
        c.clear();
        CartResponse::from(&*c)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use moda_core::Product;

    async fn setup() -> (DbState, CartState, Product) {
        let db = DbState::in_memory().await.unwrap();
        let product = Product {
            id: "p1".to_string(),
            sku: "BS-CA-AZ-01-m".to_string(),
            name: "Camisa Azul".to_string(),
            category: "Camisa".to_string(),
            size: "M".to_string(),
            color: "Azul".to_string(),
            price: Money::from_major(150),
            cost: Money::from_major(60),
            stock: 2,
        };
        db.inner().products().insert(&product).await.unwrap();
        (db, CartState::new(), product)
    }

    #[tokio::test]
    async fn test_add_and_totals() {
        let (db, cart, product) = setup().await;

        add_to_cart(&db, &cart, &product.id, None).await.unwrap();
        let response = add_to_cart(&db, &cart, &product.id, Some(1)).await.unwrap();

        assert_eq!(response.lines.len(), 1);
        assert_eq!(response.totals.total_quantity, 2);
        assert_eq!(response.totals.total, Money::from_major(300));

        let response = set_discount(&cart, Money::from_major(20)).unwrap();
        assert_eq!(response.totals.total, Money::from_major(280));
    }

    #[tokio::test]
    async fn test_add_beyond_stock() {
        let (db, cart, product) = setup().await;
        let err = add_to_cart(&db, &cart, &product.id, Some(3)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(get_cart(&cart).lines.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let (db, cart, product) = setup().await;
        add_to_cart(&db, &cart, &product.id, Some(1)).await.unwrap();

        let response = update_cart_item(&db, &cart, &product.id, 2).await.unwrap();
        assert_eq!(response.totals.total_quantity, 2);

        let err = update_cart_item(&db, &cart, &product.id, 5).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let response = update_cart_item(&db, &cart, &product.id, 0).await.unwrap();
        assert!(response.lines.is_empty());

        let err = remove_from_cart(&cart, &product.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
    }

    #[tokio::test]
    async fn test_missing_product_and_clear() {
        let (db, cart, product) = setup().await;
        let err = add_to_cart(&db, &cart, "nope", None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        add_to_cart(&db, &cart, &product.id, None).await.unwrap();
        set_discount(&cart, Money::from_major(5)).unwrap();
        let response = clear_cart(&cart);
        assert!(response.lines.is_empty());
        assert!(response.totals.discount.is_zero());
    }

    #[tokio::test]
    async fn test_get_cart_reflects_lines() {
        let (db, cart, product) = setup().await;
        assert_eq!(get_cart(&cart), CartResponse::from(&Cart::new()));

        add_to_cart(&db, &cart, &product.id, Some(2)).await.unwrap();
        let response = get_cart(&cart);
        assert_eq!(response.lines.len(), 1);
        assert_eq!(response.lines[0].quantity, 2);
        assert_eq!(response.totals.total, Money::from_major(300));
    }

    #[test]
    fn test_negative_discount() {
        let cart = CartState::new();
        let err = set_discount(&cart, Money::from_cents(-1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
