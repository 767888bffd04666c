//! # Sale Aggregate
//!
//! Builds a new sale from the cart at checkout.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  customer + cart lines + discount + installment count + now             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  create_sale() ← THIS MODULE (pure)                                    │
//! │       ├── validate preconditions                                       │
//! │       ├── subtotal = Σ price × qty                                     │
//! │       ├── total = max(0, subtotal - discount)                          │
//! │       ├── items[] = frozen snapshots                                   │
//! │       └── installments = generate(total, count, today)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  moda-db: one transaction                                              │
//! │       ├── stock -= qty  WHERE stock >= qty   (per line)               │
//! │       └── INSERT sale document                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::cart::CartLine;
use crate::error::{CoreResult, ValidationError};
use crate::installment::generate;
use crate::money::Money;
use crate::types::{new_id, Customer, Sale, SaleItem};
use crate::validation::{validate_installment_count, validate_non_negative, validate_quantity};

/// Creates a sale aggregate.
///
/// ## Errors
/// `ValidationError` when no customer is selected, the cart is empty,
/// the installment count is outside `1..=24`, the discount is negative,
/// or a line has a non-positive quantity.
pub fn create_sale(
    customer: Option<&Customer>,
    lines: &[CartLine],
    discount: Money,
    installment_count: u32,
    now: DateTime<Utc>,
) -> CoreResult<Sale> {
    let customer = customer.ok_or_else(|| ValidationError::Required {
        field: "customer".to_string(),
    })?;

    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }

    validate_installment_count(installment_count)?;
    validate_non_negative("discount", discount)?;
    for line in lines {
        validate_quantity(line.quantity)?;
        validate_non_negative("price", line.unit_price)?;
    }

    let items: Vec<SaleItem> = lines
        .iter()
        .map(|line| SaleItem {
            product_id: line.product_id.clone(),
            product_name: line.name.clone(),
            quantity: line.quantity,
            price: line.unit_price,
        })
        .collect();

    let subtotal: Money = items.iter().map(SaleItem::line_total).sum();
    let total = (subtotal - discount).clamp_non_negative();
    let installments = generate(total, installment_count, now.date_naive())?;

    Ok(Sale {
        id: new_id(),
        customer_id: customer.id.clone(),
        customer_name: customer.name.clone(),
        date: now,
        total,
        discount,
        items,
        installments,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use chrono::{NaiveDate, TimeZone};

    fn ana() -> Customer {
        Customer {
            id: "c1".to_string(),
            name: "Ana".to_string(),
            phone: "11 98888-7777".to_string(),
            email: None,
        }
    }

    fn line(price_major: i64, qty: i64) -> CartLine {
        CartLine {
            product_id: "p1".to_string(),
            sku: "BS-CA-RE-01-m".to_string(),
            name: "Camisa Rede".to_string(),
            unit_price: Money::from_major(price_major),
            quantity: qty,
        }
    }

    fn jan_first() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_create_sale_lifecycle_shape() {
        let sale = create_sale(Some(&ana()), &[line(150, 2)], Money::zero(), 3, jan_first())
            .unwrap();

        assert_eq!(sale.total, Money::from_major(300));
        assert_eq!(sale.customer_name, "Ana");
        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].price, Money::from_major(150));
        assert_eq!(sale.installments.len(), 3);
        assert!(sale
            .installments
            .iter()
            .all(|i| i.value == Money::from_major(100)));
        assert_eq!(
            sale.installments[2].due_date,
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
        );
        assert_eq!(sale.scheduled_total(), sale.total);
    }

    #[test]
    fn test_discount_applied_and_clamped() {
        let sale =
            create_sale(Some(&ana()), &[line(150, 2)], Money::from_major(50), 2, jan_first())
                .unwrap();
        assert_eq!(sale.total, Money::from_major(250));
        assert_eq!(sale.subtotal(), Money::from_major(300));

        let sale =
            create_sale(Some(&ana()), &[line(150, 2)], Money::from_major(900), 2, jan_first())
                .unwrap();
        assert_eq!(sale.total, Money::zero());
    }

    #[test]
    fn test_missing_customer_is_validation_error() {
        let err = create_sale(None, &[line(150, 1)], Money::zero(), 1, jan_first()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Required { ref field }) if field == "customer"
        ));
    }

    #[test]
    fn test_empty_cart_is_validation_error() {
        let err = create_sale(Some(&ana()), &[], Money::zero(), 1, jan_first()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let c = ana();
        assert!(create_sale(Some(&c), &[line(150, 1)], Money::zero(), 0, jan_first()).is_err());
        assert!(create_sale(Some(&c), &[line(150, 1)], Money::zero(), 25, jan_first()).is_err());
        assert!(
            create_sale(Some(&c), &[line(150, 1)], Money::from_cents(-1), 1, jan_first()).is_err()
        );
        assert!(create_sale(Some(&c), &[line(150, 0)], Money::zero(), 1, jan_first()).is_err());
    }
}
