//! # Navigation and Confirmation
//!
//! Screen state of the back-office and the confirmation gate for
//! destructive actions.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Dashboard ◄──► Inventory ◄──► Customers ◄──► Sales ◄──► Settings       │
//! │                                                 │  ▲                    │
//! │                                      new sale   ▼  │ checkout done      │
//! │                                               NewSale                   │
//! │                                     (menu highlights "Sales")           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

/// The screens of the back-office.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewState {
    #[default]
    Dashboard,
    Inventory,
    Customers,
    Sales,
    NewSale,
    Settings,
}

impl ViewState {
    /// Entry highlighted in the side menu while this view is shown.
    pub fn menu_entry(self) -> ViewState {
        match self {
            ViewState::NewSale => ViewState::Sales,
            other => other,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewState::Dashboard => "Dashboard",
            ViewState::Inventory => "Estoque",
            ViewState::Customers => "Clientes",
            ViewState::Sales => "Vendas",
            ViewState::NewSale => "Nova Venda",
            ViewState::Settings => "Configurações",
        }
    }
}

/// Tracks the current view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigator {
    current: ViewState,
    previous: Option<ViewState>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ViewState {
        self.current
    }

    pub fn highlighted(&self) -> ViewState {
        self.current.menu_entry()
    }

    pub fn navigate(&mut self, to: ViewState) {
        if to != self.current {
            self.previous = Some(self.current);
            self.current = to;
        }
    }

    /// Goes back one step; stays put when there is no history.
    pub fn back(&mut self) -> ViewState {
        if let Some(prev) = self.previous.take() {
            self.current = prev;
        }
        self.current
    }

    /// A finished sale returns the operator to the sales list.
    pub fn checkout_completed(&mut self) {
        self.navigate(ViewState::Sales);
    }
}

// =============================================================================
// Confirmation Gate
// =============================================================================

/// The operator's answer to "are you sure?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl Confirmation {
    pub fn from_bool(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }

    pub fn is_confirmed(self) -> bool {
        self == Confirmation::Confirmed
    }
}

/// Result of a gated command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "camelCase")]
pub enum Outcome<T> {
    Done(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }
}
