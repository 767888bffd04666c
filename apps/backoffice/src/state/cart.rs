//! # Cart State
//!
//! Holds the cart of the sale being built on the "new sale" screen.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Operator Action          Command                 Cart State Change     │
//! │  ───────────────          ───────                 ─────────────────     │
//! │                                                                         │
//! │  Pick Product ───────────► add_to_cart() ───────► line added / merged   │
//! │  Change Quantity ────────► update_cart_item() ──► line.quantity = n     │
//! │  Click Remove ───────────► remove_from_cart() ──► line removed          │
//! │  Type Discount ──────────► set_discount() ──────► discount = d          │
//! │  Finish Sale ────────────► checkout() ──────────► cleared on success    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A panic while the lock is held leaves the cart as it was at that point;
//! the poison flag is ignored instead of taking the whole back-office down.

use std::sync::{Arc, Mutex, PoisonError};

use moda_core::cart::Cart;

#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    /// Creates a new empty cart state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a function with read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = cart_state.with_cart(|cart| CartTotals::from(cart));
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// cart_state.with_cart_mut(|cart| cart.add(&product, 1))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut cart)
    }

    /// Copy of the current cart.
    pub fn snapshot(&self) -> Cart {
        self.with_cart(Cart::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moda_core::{Money, Product};

    fn product(id: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{id}"),
            name: format!("Peça {id}"),
            category: "Camisa".to_string(),
            size: "M".to_string(),
            color: "Azul".to_string(),
            price: Money::from_major(50),
            cost: Money::zero(),
            stock,
        }
    }

    #[test]
    fn test_shared_between_clones() {
        let state = CartState::new();
        let other = state.clone();

        state.with_cart_mut(|c| c.add(&product("p1", 3), 2)).unwrap();
        assert_eq!(other.with_cart(|c| c.total_quantity()), 2);
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let state = CartState::new();
        state.with_cart_mut(|c| c.add(&product("p1", 3), 1)).unwrap();

        let poisoner = state.clone();
        let _ = std::thread::spawn(move || {
            poisoner.with_cart_mut(|_| panic!("boom"));
        })
        .join();

        assert_eq!(state.snapshot().lines.len(), 1);
    }
}
