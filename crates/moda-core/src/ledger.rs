//! # Ledger Query
//!
//! Dashboard metrics and receivable views computed from the full sale
//! collection. Everything here is a pure scan; callers re-run it on every
//! snapshot the store delivers.
//!
//! ## Summary Definition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total_revenue    = Σ sale.total                                        │
//! │  total_paid       = Σ installment.amount_paid                           │
//! │  total_receivable = Σ max(0, installment.value - amount_paid)           │
//! │  overdue_count    = #installments with remaining > 0.10                 │
//! │                                   and due_date < today                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Customer, Product, Sale};

/// Aggregate figures for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub total_revenue: Money,
    pub total_paid: Money,
    pub total_receivable: Money,
    pub overdue_count: usize,
}

/// Computes the dashboard summary over every sale.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use moda_core::ledger::compute_summary;
///
/// let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let summary = compute_summary(&[], today);
/// assert_eq!(summary.overdue_count, 0);
/// assert!(summary.total_revenue.is_zero());
/// ```
pub fn compute_summary(sales: &[Sale], today: NaiveDate) -> LedgerSummary {
    let mut summary = LedgerSummary::default();

    for sale in sales {
        summary.total_revenue += sale.total;

        for inst in &sale.installments {
            summary.total_paid += inst.amount_paid;
            summary.total_receivable += inst.remaining();
            if inst.is_overdue(today) {
                summary.overdue_count += 1;
            }
        }
    }

    summary
}

/// One late installment, flattened for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueEntry {
    pub sale_id: String,
    pub installment_id: String,
    pub customer_name: String,
    pub number: u32,
    pub due_date: NaiveDate,
    pub remaining: Money,
}

/// Lists overdue installments, oldest due date first.
pub fn overdue_installments(sales: &[Sale], today: NaiveDate) -> Vec<OverdueEntry> {
    let mut entries: Vec<OverdueEntry> = sales
        .iter()
        .flat_map(|sale| {
            sale.installments
                .iter()
                .filter(move |inst| inst.is_overdue(today))
                .map(move |inst| OverdueEntry {
                    sale_id: sale.id.clone(),
                    installment_id: inst.id.clone(),
                    customer_name: sale.customer_name.clone(),
                    number: inst.number,
                    due_date: inst.due_date,
                    remaining: inst.remaining(),
                })
        })
        .collect();

    entries.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| a.customer_name.cmp(&b.customer_name))
    });
    entries
}

/// Sales whose customer name contains `query`, ignoring case.
///
/// An empty query returns every sale. Input order is kept.
pub fn filter_sales_by_customer<'a>(sales: &'a [Sale], query: &str) -> Vec<&'a Sale> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return sales.iter().collect();
    }
    sales
        .iter()
        .filter(|s| s.customer_name.to_lowercase().contains(&needle))
        .collect()
}

/// True when nothing has been registered yet (onboarding state).
pub fn is_empty_workspace(products: &[Product], customers: &[Customer], sales: &[Sale]) -> bool {
    products.is_empty() && customers.is_empty() && sales.is_empty()
}

// =============================================================================
// Unit Tests
// =============================================================================
