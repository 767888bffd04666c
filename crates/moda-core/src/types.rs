//! # Domain Types
//!
//! Core domain types used throughout ModaGestão.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │   Installment   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │◄──│  items[] (snap) │   │  number (1..)   │       │
//! │  │  price, cost    │   │  total          │──►│  due_date       │       │
//! │  │  stock          │   │  installments[] │   │  value          │       │
//! │  └─────────────────┘   └────────┬────────┘   │  amount_paid    │       │
//! │                                 │            │  is_paid() calc │       │
//! │  ┌─────────────────┐            │            └─────────────────┘       │
//! │  │    Customer     │◄───────────┘                                      │
//! │  │  id, name       │  customer_id + customer_name snapshot             │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every product has:
//! - `id`: UUID v4 - immutable storage key
//! - `sku`: business key, used to match catalog imports
//!
//! ## Stored vs Derived
//! An installment's paid flag is derived from `amount_paid` and `value`.
//! The stored document shape (`InstallmentRecord`) still carries `paid` for
//! older readers; it is written from the computed value and never trusted
//! on read.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::{is_settled, Money, OVERDUE_TOLERANCE, SETTLEMENT_TOLERANCE};

/// Generates a fresh storage id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Product
// =============================================================================

/// A garment in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Storage identifier (UUID v4), never changes once assigned.
    pub id: String,

    /// Business key; catalog imports match on this.
    pub sku: String,

    pub name: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub size: String,

    #[serde(default)]
    pub color: String,

    /// Sale unit price.
    pub price: Money,

    /// Acquisition cost.
    #[serde(default)]
    pub cost: Money,

    /// Units on hand.
    #[serde(default)]
    pub stock: i64,
}

impl Product {
    /// Checks if at least one unit is on hand.
    #[inline]
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Checks if `quantity` units can be sold without going negative.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.stock >= quantity
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer buying on installments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// =============================================================================
// Installment Status
// =============================================================================

/// Settlement state of one installment, derived from its amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    /// Nothing recorded.
    Unpaid,
    /// Something recorded, but not enough to settle.
    Partial,
    /// Settled within tolerance.
    Paid,
}

// =============================================================================
// Installment
// =============================================================================

/// One scheduled obligation of a sale.
///
/// ## Lifecycle
/// ```text
/// generate() ──► Unpaid ──record_payment(x)──► Partial ──record_payment(v)──► Paid
///                  ▲                                                            │
///                  └──────────────────── record_payment(0) ─────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "InstallmentRecord", try_from = "InstallmentRecord")]
pub struct Installment {
    pub id: String,

    /// 1-based position in the sale's schedule.
    pub number: u32,

    pub due_date: NaiveDate,

    /// Scheduled amount, fixed at creation.
    pub value: Money,

    /// Running total recorded against this installment.
    pub amount_paid: Money,
}

impl Installment {
    /// Whether the recorded amount settles the installment.
    #[inline]
    pub fn is_paid(&self) -> bool {
        is_settled(self.amount_paid, self.value)
    }

    /// Amount still open, never negative.
    #[inline]
    pub fn remaining(&self) -> Money {
        (self.value - self.amount_paid).clamp_non_negative()
    }

    pub fn status(&self) -> InstallmentStatus {
        if self.is_paid() {
            InstallmentStatus::Paid
        } else if self.amount_paid.is_positive() {
            InstallmentStatus::Partial
        } else {
            InstallmentStatus::Unpaid
        }
    }

    /// Overdue when more than the overdue tolerance is open past the due date.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use moda_core::{Installment, Money};
    ///
    /// let due = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    /// let today = NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();
    /// let inst = Installment {
    ///     id: "i1".into(),
    ///     number: 1,
    ///     due_date: due,
    ///     value: Money::from_cents(10_000),
    ///     amount_paid: Money::from_cents(9_995),
    /// };
    /// assert!(!inst.is_overdue(today));
    /// ```
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.remaining() > OVERDUE_TOLERANCE && self.due_date < today
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A line of a finished sale, frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    /// Unit price at sale time.
    pub price: Money,
}

impl SaleItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }
}

/// The sale aggregate: items, totals and the installment schedule.
///
/// Only `installments[*].amount_paid` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SaleRecord")]
pub struct Sale {
    pub id: String,
    pub customer_id: String,
    /// Snapshot of the customer name at sale time.
    pub customer_name: String,
    pub date: DateTime<Utc>,
    /// Amount due: `max(0, subtotal - discount)`.
    pub total: Money,
    pub discount: Money,
    pub items: Vec<SaleItem>,
    pub installments: Vec<Installment>,
}

impl Sale {
    /// Sum of item line totals, before discount.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(SaleItem::line_total).sum()
    }

    /// Sum of amounts recorded across all installments.
    pub fn amount_paid(&self) -> Money {
        self.installments.iter().map(|i| i.amount_paid).sum()
    }

    /// Amount still open on the whole sale, never negative.
    pub fn remaining(&self) -> Money {
        (self.total - self.amount_paid()).clamp_non_negative()
    }

    /// Whether the recorded amounts cover the total within tolerance.
    pub fn is_fully_paid(&self) -> bool {
        self.amount_paid() >= self.total - SETTLEMENT_TOLERANCE
    }

    /// Looks up an installment by id.
    pub fn installment(&self, installment_id: &str) -> Option<&Installment> {
        self.installments.iter().find(|i| i.id == installment_id)
    }

    /// Sum of scheduled installment values.
    pub fn scheduled_total(&self) -> Money {
        self.installments.iter().map(|i| i.value).sum()
    }
}

// =============================================================================
// Stored Document Shapes
// =============================================================================

/// Installment as stored in documents and backup files.
///
/// `amount_paid` may be absent in documents written before partial payments
/// existed; `paid` is kept for older readers and may be absent too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentRecord {
    pub id: String,
    pub number: u32,
    /// `YYYY-MM-DD`, or a full ISO timestamp in older documents.
    pub due_date: String,
    pub value: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_paid: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid: Option<bool>,
}

impl InstallmentRecord {
    /// Amount paid after the legacy rule: missing means `paid ? value : 0`.
    pub fn effective_amount_paid(&self) -> Money {
        match self.amount_paid {
            Some(amount) => amount,
            None if self.paid == Some(true) => self.value,
            None => Money::zero(),
        }
    }
}

impl From<Installment> for InstallmentRecord {
    fn from(inst: Installment) -> Self {
        let paid = inst.is_paid();
        InstallmentRecord {
            id: inst.id,
            number: inst.number,
            due_date: inst.due_date.format("%Y-%m-%d").to_string(),
            value: inst.value,
            amount_paid: Some(inst.amount_paid),
            paid: Some(paid),
        }
    }
}

impl TryFrom<InstallmentRecord> for Installment {
    type Error = ValidationError;

    fn try_from(record: InstallmentRecord) -> Result<Self, Self::Error> {
        let due_date = parse_due_date(&record.due_date)?;
        let amount_paid = record.effective_amount_paid();
        Ok(Installment {
            id: record.id,
            number: record.number,
            due_date,
            value: record.value,
            amount_paid,
        })
    }
}

/// Parses `YYYY-MM-DD`, ignoring any time part after the date.
pub fn parse_due_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let date_part = raw.trim().get(..10).unwrap_or(raw.trim());
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| ValidationError::InvalidFormat {
        field: "dueDate".to_string(),
        reason: format!("'{raw}': {e}"),
    })
}

/// Sale as stored in documents and backup files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub date: DateTime<Utc>,
    pub total: Money,
    #[serde(default)]
    pub discount: Money,
    pub items: Vec<SaleItem>,
    pub installments: Vec<InstallmentRecord>,
}

impl From<&Sale> for SaleRecord {
    fn from(sale: &Sale) -> Self {
        SaleRecord {
            id: sale.id.clone(),
            customer_id: sale.customer_id.clone(),
            customer_name: sale.customer_name.clone(),
            date: sale.date,
            total: sale.total,
            discount: sale.discount,
            items: sale.items.clone(),
            installments: sale
                .installments
                .iter()
                .cloned()
                .map(InstallmentRecord::from)
                .collect(),
        }
    }
}

impl TryFrom<SaleRecord> for Sale {
    type Error = ValidationError;

    fn try_from(record: SaleRecord) -> Result<Self, Self::Error> {
        let installments = record
            .installments
            .into_iter()
            .map(Installment::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Sale {
            id: record.id,
            customer_id: record.customer_id,
            customer_name: record.customer_name,
            date: record.date,
            total: record.total,
            discount: record.discount,
            items: record.items,
            installments,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
