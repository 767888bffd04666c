//! # Installment Generator
//!
//! Splits a sale total into a monthly schedule.
//!
//! ## Schedule Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  generate(total = 100.00, count = 3, start = 2024-01-31)                │
//! │                                                                         │
//! │   #1  due 2024-02-29   33.33   ← start + 1 month (clamped to month end) │
//! │   #2  due 2024-03-31   33.33   ← start + 2 months                       │
//! │   #3  due 2024-04-30   33.34   ← start + 3 months, takes remainder      │
//! │                                                                         │
//! │  • First due date is one month after the sale, never the sale date     │
//! │  • Σ values == total exactly                                            │
//! │  • Every installment starts with amount_paid = 0                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Month arithmetic uses `NaiveDate::checked_add_months`, which clamps to
//! the last day of shorter months instead of rolling into the next one.

use chrono::{Months, NaiveDate};

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{new_id, Installment};
use crate::validation::{validate_installment_count, validate_non_negative};

/// Due date of installment `number` (1-based) for a sale made on `start`.
pub fn due_date(start: NaiveDate, number: u32) -> CoreResult<NaiveDate> {
    start
        .checked_add_months(Months::new(number))
        .ok_or_else(|| {
            ValidationError::InvalidFormat {
                field: "dueDate".to_string(),
                reason: format!("{start} + {number} months is out of range"),
            }
            .into()
        })
}

/// Generates `count` installments for `total`, starting one month after `start`.
///
/// ## Errors
/// - `count` outside `1..=MAX_INSTALLMENTS`
/// - negative `total`
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use moda_core::installment::generate;
/// use moda_core::money::Money;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let schedule = generate(Money::from_major(300), 3, start).unwrap();
///
/// assert_eq!(schedule.len(), 3);
/// assert_eq!(schedule[0].due_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
/// assert!(schedule.iter().all(|i| i.value == Money::from_major(100)));
/// ```
pub fn generate(total: Money, count: u32, start: NaiveDate) -> CoreResult<Vec<Installment>> {
    validate_installment_count(count)?;
    validate_non_negative("total", total)?;

    total
        .split_even(count)
        .into_iter()
        .zip(1..=count)
        .map(|(value, number)| -> CoreResult<Installment> {
            Ok(Installment {
                id: new_id(),
                number,
                due_date: due_date(start, number)?,
                value,
                amount_paid: Money::zero(),
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_generate_even_split() {
        let schedule = generate(Money::from_major(300), 3, date(2024, 1, 1)).unwrap();

        let dues: Vec<NaiveDate> = schedule.iter().map(|i| i.due_date).collect();
        assert_eq!(
            dues,
            vec![date(2024, 2, 1), date(2024, 3, 1), date(2024, 4, 1)]
        );
        assert!(schedule.iter().all(|i| i.value == Money::from_major(100)));
        assert!(schedule.iter().all(|i| i.amount_paid.is_zero()));
        assert!(schedule.iter().all(|i| !i.is_paid()));
        assert_eq!(
            schedule.iter().map(|i| i.number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_generate_remainder_on_last() {
        let schedule = generate(Money::from_major(100), 3, date(2024, 1, 1)).unwrap();
        assert_eq!(schedule[0].value.cents(), 3333);
        assert_eq!(schedule[1].value.cents(), 3333);
        assert_eq!(schedule[2].value.cents(), 3334);
    }

    #[test]
    fn test_single_installment_is_due_next_month() {
        let schedule = generate(Money::from_major(50), 1, date(2024, 6, 15)).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].due_date, date(2024, 7, 15));
    }

    #[test]
    fn test_month_end_clamps() {
        let schedule = generate(Money::from_major(90), 3, date(2024, 1, 31)).unwrap();
        assert_eq!(schedule[0].due_date, date(2024, 2, 29));
        assert_eq!(schedule[1].due_date, date(2024, 3, 31));
        assert_eq!(schedule[2].due_date, date(2024, 4, 30));
    }

    #[test]
    fn test_ids_are_unique() {
        let schedule = generate(Money::from_major(90), 12, date(2024, 1, 1)).unwrap();
        let mut ids: Vec<&str> = schedule.iter().map(|i| i.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 12);
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(generate(Money::from_major(100), 0, date(2024, 1, 1)).is_err());
        assert!(generate(Money::from_major(100), 25, date(2024, 1, 1)).is_err());
        assert!(generate(Money::from_cents(-1), 2, date(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_zero_total_still_schedules() {
        let schedule = generate(Money::zero(), 2, date(2024, 1, 1)).unwrap();
        assert_eq!(schedule.len(), 2);
        assert!(schedule.iter().all(|i| i.is_paid()));
    }

    proptest! {
        /// Installments always sum exactly to the total and fall k months after start.
        #[test]
        fn prop_installment_sum_equals_total(
            total in 0i64..100_000_000i64,
            count in 1u32..=12u32,
            day_offset in 0i64..3650i64,
        ) {
            let start = date(2020, 1, 1) + chrono::Duration::days(day_offset);
            let schedule = generate(Money::from_cents(total), count, start).unwrap();

            let sum: Money = schedule.iter().map(|i| i.value).sum();
            prop_assert_eq!(sum.cents(), total);
            prop_assert_eq!(schedule.len(), count as usize);

            for inst in &schedule {
                prop_assert_eq!(
                    inst.due_date,
                    start.checked_add_months(Months::new(inst.number)).unwrap()
                );
                prop_assert!(inst.due_date > start);
            }

            // All parts within one cent of each other except the remainder holder
            let first = schedule[0].value.cents();
            for inst in &schedule[..schedule.len() - 1] {
                prop_assert_eq!(inst.value.cents(), first);
            }
            let last = schedule[schedule.len() - 1].value.cents();
            prop_assert!(last >= first && last - first < i64::from(count));
        }
    }
}
