//! # Navigation State
//!
//! Shared [`Navigator`] behind a mutex, like the cart.

use std::sync::{Arc, Mutex, PoisonError};

use crate::navigation::{Navigator, ViewState};

#[derive(Debug, Clone, Default)]
pub struct NavState {
    nav: Arc<Mutex<Navigator>>,
}

impl NavState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nav<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Navigator) -> R,
    {
        let mut nav = self.nav.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut nav)
    }

    pub fn current(&self) -> ViewState {
        self.with_nav(|nav| nav.current())
    }

    pub fn navigate(&self, to: ViewState) {
        self.with_nav(|nav| nav.navigate(to));
    }
}
