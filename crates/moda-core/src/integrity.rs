//! # Integrity Audit
//!
//! Checks stored sale documents against the ledger rules when they are
//! loaded, and turns them into clean [`Sale`] values.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleRecord (stored)                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  audit_record()                                                         │
//! │       ├── paid flag differs from recomputed value   → StalePaidFlag     │
//! │       ├── amountPaid missing (legacy document)      → MissingAmountPaid │
//! │       ├── amountPaid negative                       → NegativeAmountPaid│
//! │       ├── no installments                           → EmptySchedule     │
//! │       └── Σ values vs total beyond 1 cent each      → ScheduleMismatch  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  load_sale() → Sale with paid recomputed and amounts clamped            │
//! │                                                                         │
//! │  Issues are reported to the caller; none of them is fatal.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::{is_settled, Money};
use crate::types::{Product, Sale, SaleRecord};

/// One inconsistency found in a stored sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    StalePaidFlag {
        installment_id: String,
        stored: bool,
        computed: bool,
    },
    MissingAmountPaid {
        installment_id: String,
    },
    NegativeAmountPaid {
        installment_id: String,
        amount: Money,
    },
    EmptySchedule,
    ScheduleMismatch {
        scheduled: Money,
        total: Money,
    },
    /// Oversold product from an older store; stock is loaded as 0.
    NegativeStock {
        sku: String,
        stock: i64,
    },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::StalePaidFlag {
                installment_id,
                stored,
                computed,
            } => write!(
                f,
                "installment {installment_id}: stored paid={stored}, recomputed paid={computed}"
            ),
            IntegrityIssue::MissingAmountPaid { installment_id } => {
                write!(f, "installment {installment_id}: amountPaid missing")
            }
            IntegrityIssue::NegativeAmountPaid {
                installment_id,
                amount,
            } => write!(f, "installment {installment_id}: negative amountPaid {amount}"),
            IntegrityIssue::EmptySchedule => write!(f, "sale has no installments"),
            IntegrityIssue::ScheduleMismatch { scheduled, total } => {
                write!(f, "installments sum to {scheduled} but total is {total}")
            }
            IntegrityIssue::NegativeStock { sku, stock } => {
                write!(f, "product {sku}: negative stock {stock} loaded as 0")
            }
        }
    }
}

/// A loaded sale together with what the audit found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditedSale {
    pub sale: Sale,
    pub issues: Vec<IntegrityIssue>,
}

impl AuditedSale {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Lists every inconsistency in a stored sale.
pub fn audit_record(record: &SaleRecord) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();

    for inst in &record.installments {
        if inst.amount_paid.is_none() {
            issues.push(IntegrityIssue::MissingAmountPaid {
                installment_id: inst.id.clone(),
            });
        }

        let amount = inst.effective_amount_paid();
        if amount.is_negative() {
            issues.push(IntegrityIssue::NegativeAmountPaid {
                installment_id: inst.id.clone(),
                amount,
            });
        }

        // Only a flag that was actually stored can be stale.
        if let Some(stored) = inst.paid {
            let computed = is_settled(amount.clamp_non_negative(), inst.value);
            if stored != computed {
                issues.push(IntegrityIssue::StalePaidFlag {
                    installment_id: inst.id.clone(),
                    stored,
                    computed,
                });
            }
        }
    }

    if record.installments.is_empty() {
        issues.push(IntegrityIssue::EmptySchedule);
    } else {
        let scheduled: Money = record.installments.iter().map(|i| i.value).sum();
        let slack = Money::from_cents(record.installments.len() as i64);
        if (scheduled - record.total).cents().abs() > slack.cents() {
            issues.push(IntegrityIssue::ScheduleMismatch {
                scheduled,
                total: record.total,
            });
        }
    }

    issues
}

/// Clamps an oversold product's stock to 0, reporting what was there.
pub fn load_product(mut product: Product) -> (Product, Option<IntegrityIssue>) {
    if product.stock >= 0 {
        return (product, None);
    }
    let issue = IntegrityIssue::NegativeStock {
        sku: product.sku.clone(),
        stock: product.stock,
    };
    product.stock = 0;
    (product, Some(issue))
}

/// Audits a stored sale and converts it.
///
/// The paid flag is always recomputed and negative amounts are clamped, so
/// the returned sale is consistent whatever the issues were.
///
/// ## Errors
/// Only unreadable due dates fail the load.
pub fn load_sale(record: SaleRecord) -> Result<AuditedSale, ValidationError> {
    let issues = audit_record(&record);
    let mut sale = Sale::try_from(record)?;
    for inst in &mut sale.installments {
        inst.amount_paid = inst.amount_paid.clamp_non_negative();
    }
    Ok(AuditedSale { sale, issues })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InstallmentRecord;
    use chrono::{TimeZone, Utc};

    fn record(installments: Vec<InstallmentRecord>, total: i64) -> SaleRecord {
        SaleRecord {
            id: "s1".to_string(),
            customer_id: "c1".to_string(),
            customer_name: "Ana".to_string(),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            total: Money::from_cents(total),
            discount: Money::zero(),
            items: Vec::new(),
            installments,
        }
    }

    fn inst(id: &str, value: i64, paid_amount: Option<i64>, paid: bool) -> InstallmentRecord {
        InstallmentRecord {
            id: id.to_string(),
            number: 1,
            due_date: "2024-02-01".to_string(),
            value: Money::from_cents(value),
            amount_paid: paid_amount.map(Money::from_cents),
            paid: Some(paid),
        }
    }

    #[test]
    fn test_clean_record() {
        let rec = record(
            vec![inst("a", 5_000, Some(5_000), true), inst("b", 5_000, Some(0), false)],
            10_000,
        );
        assert!(audit_record(&rec).is_empty());
        assert!(load_sale(rec).unwrap().is_clean());
    }

    #[test]
    fn test_stale_paid_flag_is_reported_and_corrected() {
        let rec = record(vec![inst("a", 10_000, Some(4_000), true)], 10_000);
        let audited = load_sale(rec).unwrap();

        assert_eq!(
            audited.issues,
            vec![IntegrityIssue::StalePaidFlag {
                installment_id: "a".to_string(),
                stored: true,
                computed: false,
            }]
        );
        assert!(!audited.sale.installments[0].is_paid());
    }

    #[test]
    fn test_legacy_missing_amount_paid() {
        let rec = record(
            vec![inst("a", 5_000, None, true), inst("b", 5_000, None, false)],
            10_000,
        );
        let audited = load_sale(rec).unwrap();

        assert_eq!(audited.issues.len(), 2);
        assert!(audited
            .issues
            .iter()
            .all(|i| matches!(i, IntegrityIssue::MissingAmountPaid { .. })));
        assert_eq!(audited.sale.installments[0].amount_paid.cents(), 5_000);
        assert_eq!(audited.sale.installments[1].amount_paid.cents(), 0);
    }

    #[test]
    fn test_absent_paid_flag_is_not_stale() {
        let mut settled = inst("a", 5_000, Some(5_000), false);
        settled.paid = None;
        let mut open = inst("b", 5_000, Some(1_000), false);
        open.paid = None;

        let rec = record(vec![settled, open], 10_000);
        assert!(audit_record(&rec).is_empty());

        let audited = load_sale(rec).unwrap();
        assert!(audited.sale.installments[0].is_paid());
        assert!(!audited.sale.installments[1].is_paid());
    }

    #[test]
    fn test_absent_paid_and_amount_counts_as_unpaid() {
        let mut bare = inst("a", 5_000, None, false);
        bare.paid = None;
        let audited = load_sale(record(vec![bare], 5_000)).unwrap();

        assert_eq!(
            audited.issues,
            vec![IntegrityIssue::MissingAmountPaid {
                installment_id: "a".to_string()
            }]
        );
        assert_eq!(audited.sale.installments[0].amount_paid, Money::zero());
    }

    #[test]
    fn test_negative_amount_clamped() {
        let rec = record(vec![inst("a", 5_000, Some(-100), false)], 5_000);
        let audited = load_sale(rec).unwrap();
        assert!(matches!(
            audited.issues[0],
            IntegrityIssue::NegativeAmountPaid { .. }
        ));
        assert_eq!(audited.sale.installments[0].amount_paid, Money::zero());
    }

    #[test]
    fn test_schedule_mismatch() {
        // three float-era installments of 33.33 against 100.00 is within slack
        let rec = record(
            vec![
                inst("a", 3_333, Some(0), false),
                inst("b", 3_333, Some(0), false),
                inst("c", 3_333, Some(0), false),
            ],
            10_000,
        );
        assert!(audit_record(&rec).is_empty());

        let rec = record(vec![inst("a", 9_000, Some(0), false)], 10_000);
        assert!(matches!(
            audit_record(&rec)[0],
            IntegrityIssue::ScheduleMismatch { .. }
        ));

        let rec = record(vec![], 10_000);
        assert_eq!(audit_record(&rec), vec![IntegrityIssue::EmptySchedule]);
    }

    #[test]
    fn test_negative_stock_loaded_as_zero() {
        let oversold = Product {
            id: "p1".to_string(),
            sku: "BS-SA-PR-01-p".to_string(),
            name: "Saia".to_string(),
            category: "Saia".to_string(),
            size: "P".to_string(),
            color: "Preta".to_string(),
            price: Money::from_major(80),
            cost: Money::zero(),
            stock: -2,
        };

        let (fixed, issue) = load_product(oversold.clone());
        assert_eq!(fixed.stock, 0);
        assert_eq!(
            issue,
            Some(IntegrityIssue::NegativeStock {
                sku: "BS-SA-PR-01-p".to_string(),
                stock: -2,
            })
        );

        let (kept, issue) = load_product(Product { stock: 3, ..oversold });
        assert_eq!(kept.stock, 3);
        assert!(issue.is_none());
    }

    #[test]
    fn test_unreadable_due_date_fails() {
        let mut bad = inst("a", 5_000, Some(0), false);
        bad.due_date = "soon".to_string();
        assert!(load_sale(record(vec![bad], 5_000)).is_err());
    }
}
