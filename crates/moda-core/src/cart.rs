//! # Cart
//!
//! The checkout cart: snapshot lines taken from the catalog before a sale
//! is created.
//!
//! ## Invariants
//! - Lines are unique by `product_id` (adding the same product again
//!   increases the quantity)
//! - A line's quantity never exceeds the product's stock at the moment it
//!   was added or changed
//! - Setting a quantity to 0 removes the line
//!
//! ## Price Freezing
//! `unit_price` is captured when the product enters the cart. Later catalog
//! edits do not reach lines already in the cart nor sales already made.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::validate_non_negative;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
}

impl CartLine {
    /// Snapshots a product into a cart line.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
        }
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// The checkout cart with its discount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub discount: Money,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` units of `product`, merging with an existing line.
    ///
    /// ## Errors
    /// - `InsufficientStock` when the line would exceed the product's stock
    ///   (an out-of-stock product is refused outright)
    /// - `QuantityTooLarge` / `CartTooLarge` for the hard caps
    pub fn add(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        crate::validation::validate_quantity(quantity)?;

        let current = self
            .line(&product.id)
            .map(|line| line.quantity)
            .unwrap_or(0);
        let requested = current + quantity;

        if requested > product.stock {
            return Err(CoreError::InsufficientStock {
                sku: product.sku.clone(),
                available: product.stock,
                requested,
            });
        }
        if requested > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity = requested;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.lines.push(CartLine::from_product(product, quantity));
        Ok(())
    }

    /// Sets the quantity of a line; 0 removes it.
    ///
    /// `available` is the product's current stock.
    pub fn update_quantity(
        &mut self,
        product_id: &str,
        quantity: i64,
        available: i64,
    ) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove(product_id);
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::NotInCart(product_id.to_string()))?;

        if quantity > available {
            return Err(CoreError::InsufficientStock {
                sku: line.sku.clone(),
                available,
                requested: quantity,
            });
        }
        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        line.quantity = quantity;
        Ok(())
    }

    /// Removes a line by product id.
    pub fn remove(&mut self, product_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        if self.lines.len() == before {
            return Err(CoreError::NotInCart(product_id.to_string()));
        }
        Ok(())
    }

    /// Sets the discount amount; negative values are refused.
    pub fn set_discount(&mut self, discount: Money) -> CoreResult<()> {
        validate_non_negative("discount", discount)?;
        self.discount = discount;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.discount = Money::zero();
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Σ unit price × quantity.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// `max(0, subtotal - discount)`.
    pub fn total(&self) -> Money {
        (self.subtotal() - self.discount).clamp_non_negative()
    }
}

/// Cart totals summary for command responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.lines.len(),
            total_quantity: cart.total_quantity(),
            subtotal: cart.subtotal(),
            discount: cart.discount,
            total: cart.total(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
