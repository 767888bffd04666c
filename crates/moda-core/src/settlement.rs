//! # Settlement Engine
//!
//! Records payments against a single installment of a sale.
//!
//! ## Absolute Overwrite
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The payment field is pre-filled with what was already paid, so the     │
//! │  operator edits a running total, not a delta:                           │
//! │                                                                         │
//! │   amount_paid = 40      operator types 100    amount_paid = 100         │
//! │   (not 40 + 100)                                                        │
//! │                                                                         │
//! │  Negative entries clamp to 0. Paid status is recomputed, never stored. │
//! │  Recording the same amount twice yields the same installment.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Installment, Sale};

/// Sets `amount_paid` of one installment in place and returns it.
///
/// Every other field of the sale is left untouched.
pub fn apply_payment<'a>(
    sale: &'a mut Sale,
    installment_id: &str,
    amount: Money,
) -> CoreResult<&'a Installment> {
    let sale_id = sale.id.clone();
    let installment = sale
        .installments
        .iter_mut()
        .find(|i| i.id == installment_id)
        .ok_or_else(|| CoreError::InstallmentNotFound {
            sale_id,
            installment_id: installment_id.to_string(),
        })?;

    installment.amount_paid = amount.clamp_non_negative();
    Ok(installment)
}

/// Returns a copy of `sale` with `amount` recorded on one installment.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use moda_core::money::Money;
/// use moda_core::sale::create_sale;
/// use moda_core::settlement::record_payment;
/// use moda_core::cart::CartLine;
/// use moda_core::Customer;
///
/// let ana = Customer { id: "c1".into(), name: "Ana".into(), phone: String::new(), email: None };
/// let lines = vec![CartLine {
///     product_id: "p1".into(),
///     sku: "BS-CA-RE-01-m".into(),
///     name: "Camisa".into(),
///     unit_price: Money::from_major(150),
///     quantity: 2,
/// }];
/// let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
/// let sale = create_sale(Some(&ana), &lines, Money::zero(), 3, now).unwrap();
///
/// let first = sale.installments[0].id.clone();
/// let paid = record_payment(&sale, &first, Money::from_major(100)).unwrap();
/// assert!(paid.installments[0].is_paid());
/// ```
pub fn record_payment(sale: &Sale, installment_id: &str, amount: Money) -> CoreResult<Sale> {
    let mut updated = sale.clone();
    apply_payment(&mut updated, installment_id, amount)?;
    Ok(updated)
}

/// Records the full scheduled value on one installment.
pub fn mark_paid_in_full(sale: &Sale, installment_id: &str) -> CoreResult<Sale> {
    let value = sale
        .installment(installment_id)
        .map(|i| i.value)
        .ok_or_else(|| CoreError::InstallmentNotFound {
            sale_id: sale.id.clone(),
            installment_id: installment_id.to_string(),
        })?;
    record_payment(sale, installment_id, value)
}

/// Resets the recorded amount of one installment to zero.
pub fn clear_payment(sale: &Sale, installment_id: &str) -> CoreResult<Sale> {
    record_payment(sale, installment_id, Money::zero())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installment::generate;
    use crate::types::InstallmentStatus;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn sale_of(total_major: i64, count: u32) -> Sale {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Sale {
            id: "s1".to_string(),
            customer_id: "c1".to_string(),
            customer_name: "Ana".to_string(),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            total: Money::from_major(total_major),
            discount: Money::zero(),
            items: Vec::new(),
            installments: generate(Money::from_major(total_major), count, start).unwrap(),
        }
    }

    #[test]
    fn test_partial_then_full() {
        let sale = sale_of(300, 3);
        let id = sale.installments[1].id.clone();

        let partial = record_payment(&sale, &id, Money::from_major(40)).unwrap();
        let inst = partial.installment(&id).unwrap();
        assert_eq!(inst.status(), InstallmentStatus::Partial);
        assert_eq!(inst.remaining(), Money::from_major(60));

        let full = record_payment(&partial, &id, Money::from_major(100)).unwrap();
        assert!(full.installment(&id).unwrap().is_paid());
    }

    #[test]
    fn test_only_target_installment_changes() {
        let sale = sale_of(300, 3);
        let id = sale.installments[0].id.clone();

        let updated = record_payment(&sale, &id, Money::from_major(100)).unwrap();

        assert_eq!(updated.total, sale.total);
        assert_eq!(updated.items, sale.items);
        assert_eq!(updated.installments[1], sale.installments[1]);
        assert_eq!(updated.installments[2], sale.installments[2]);
        assert_ne!(updated.installments[0], sale.installments[0]);
    }

    #[test]
    fn test_overwrite_not_increment() {
        let sale = sale_of(300, 3);
        let id = sale.installments[0].id.clone();

        let once = record_payment(&sale, &id, Money::from_major(40)).unwrap();
        let twice = record_payment(&once, &id, Money::from_major(40)).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.installments[0].amount_paid, Money::from_major(40));
    }

    #[test]
    fn test_negative_amount_clamps_to_zero() {
        let sale = sale_of(300, 3);
        let id = sale.installments[0].id.clone();

        let updated = record_payment(&sale, &id, Money::from_cents(-500)).unwrap();
        assert_eq!(updated.installments[0].amount_paid, Money::zero());
        assert_eq!(
            updated.installments[0].status(),
            InstallmentStatus::Unpaid
        );
    }

    #[test]
    fn test_tolerance_settles_near_full_payment() {
        let sale = sale_of(100, 3);
        let last = sale.installments[2].id.clone(); // 33.34

        let updated = record_payment(&sale, &last, Money::from_cents(3330)).unwrap();
        assert!(updated.installment(&last).unwrap().is_paid());

        let updated = record_payment(&sale, &last, Money::from_cents(3328)).unwrap();
        assert!(!updated.installment(&last).unwrap().is_paid());
    }

    #[test]
    fn test_unknown_installment() {
        let sale = sale_of(300, 3);
        let err = record_payment(&sale, "missing", Money::from_major(10)).unwrap_err();
        assert!(matches!(err, CoreError::InstallmentNotFound { .. }));

        assert!(mark_paid_in_full(&sale, "missing").is_err());
    }

    #[test]
    fn test_quick_actions() {
        let sale = sale_of(300, 3);
        let id = sale.installments[2].id.clone();

        let full = mark_paid_in_full(&sale, &id).unwrap();
        assert_eq!(full.installments[2].amount_paid, Money::from_major(100));

        let cleared = clear_payment(&full, &id).unwrap();
        assert_eq!(cleared.installments[2].amount_paid, Money::zero());
        assert!(!cleared.installments[2].is_paid());
    }

    #[test]
    fn test_paid_flag_tracks_amount_after_any_sequence() {
        let sale = sale_of(100, 3);
        let ids: Vec<String> = sale.installments.iter().map(|i| i.id.clone()).collect();
        let amounts = [3333, 0, 9000, 3329, 3330, -10, 3334];

        let mut current = sale;
        for (n, cents) in amounts.iter().enumerate() {
            let id = &ids[n % ids.len()];
            current = record_payment(&current, id, Money::from_cents(*cents)).unwrap();
            for inst in &current.installments {
                let record = crate::types::InstallmentRecord::from(inst.clone());
                assert_eq!(
                    record.paid,
                    Some(crate::money::is_settled(inst.amount_paid, inst.value))
                );
            }
        }
    }
}
