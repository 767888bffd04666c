//! # Money Module
//!
//! Provides the `Money` type and the two tolerances that decide when an
//! installment counts as settled or overdue.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    100.00 / 3 = 33.333... (×3 = 99.99999...)   ❌ drifts               │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    10000 cents / 3 = 3333 cents, remainder 1                            │
//! │    The last installment takes the remainder: 3333 + 3333 + 3334        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tolerances
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SETTLEMENT_TOLERANCE = 0.05   paid when amount_paid >= value - 0.05    │
//! │  OVERDUE_TOLERANCE    = 0.10   overdue when remaining > 0.10 and late   │
//! │                                                                         │
//! │  The two values are different on purpose and must both be kept.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Stored documents and backup files carry money as a decimal number of
//! major units (`150.5`). Serialization converts cents to that number and
//! deserialization rounds back to the nearest cent.
//!
//! ## Usage
//! ```rust
//! use moda_core::money::Money;
//!
//! let price = Money::from_cents(15_000); // R$150.00
//! let line = price * 2i64;
//! assert_eq!(line.cents(), 30_000);
//!
//! let parsed = Money::parse_decimal("1234.56").unwrap();
//! assert_eq!(parsed.cents(), 123_456);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::error::ValidationError;

// =============================================================================
// Tolerances
// =============================================================================

/// An installment is settled once `amount_paid >= value - SETTLEMENT_TOLERANCE`.
pub const SETTLEMENT_TOLERANCE: Money = Money::from_cents(5);

/// An installment is overdue only while more than this amount is still open.
pub const OVERDUE_TOLERANCE: Money = Money::from_cents(10);

/// Returns true when `amount_paid` covers `value` within the settlement tolerance.
///
/// ## Example
/// ```rust
/// use moda_core::money::{is_settled, Money};
///
/// let value = Money::from_cents(10_000);
/// assert!(is_settled(Money::from_cents(9_995), value));
/// assert!(!is_settled(Money::from_cents(9_994), value));
/// ```
#[inline]
pub fn is_settled(amount_paid: Money, value: Money) -> bool {
    amount_paid >= value - SETTLEMENT_TOLERANCE
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate results (e.g. `subtotal - discount`) may
///   go negative before being clamped
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Custom serde**: decimal major units on the wire, cents in memory
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price ──► CartLine.unit_price ──► SaleItem.price (snapshot)   │
/// │                                                                         │
/// │  Sale.total ──► split_even(count) ──► Installment.value                │
/// │                                                                         │
/// │  Payment entry ──► Installment.amount_paid ──► is_settled()            │
/// │                                                                         │
/// │  Every sale, installment and dashboard figure is a Money value         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use moda_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // R$10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    ///
    /// Payment entry and `subtotal - discount` both go through this.
    ///
    /// ## Example
    /// ```rust
    /// use moda_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-550).clamp_non_negative(), Money::zero());
    /// assert_eq!(Money::from_cents(550).clamp_non_negative().cents(), 550);
    /// ```
    #[inline]
    pub const fn clamp_non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Splits the amount into `count` parts that sum back to exactly `self`.
    ///
    /// Every part but the last is `floor(self / count)`; the last part
    /// absorbs the remainder cents. Returns an empty vector for `count == 0`.
    ///
    /// ## Example
    /// ```rust
    /// use moda_core::money::Money;
    ///
    /// let parts = Money::from_cents(10_000).split_even(3);
    /// let cents: Vec<i64> = parts.iter().map(|m| m.cents()).collect();
    /// assert_eq!(cents, vec![3333, 3333, 3334]);
    /// ```
    pub fn split_even(&self, count: u32) -> Vec<Money> {
        if count == 0 {
            return Vec::new();
        }

        let n = i64::from(count);
        let base = self.0.div_euclid(n);
        let remainder = self.0 - base * n;

        let mut parts = vec![Money(base); count as usize];
        if let Some(last) = parts.last_mut() {
            last.0 += remainder;
        }
        parts
    }

    /// Parses a plain decimal string (`"1234.56"`, `"12"`, `"-3.5"`) into cents.
    ///
    /// No floats are involved. Digits beyond the second decimal place are
    /// rounded half-up on the third digit.
    ///
    /// ## Errors
    /// - `ValidationError::InvalidFormat` for empty input, stray characters,
    ///   or more than one decimal point
    /// - `ValidationError::OutOfRange` for a well-formed number that does
    ///   not fit in `i64` cents
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: format!("{reason}: '{input}'"),
        };
        let too_large = || ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: i64::MIN / 100,
            max: i64::MAX / 100,
        };

        let s = input.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("empty amount"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("not a decimal number"));
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| too_large())?
        };

        let frac_bytes = frac.as_bytes();
        let digit = |i: usize| frac_bytes.get(i).map(|b| i64::from(b - b'0')).unwrap_or(0);
        let mut cents_part = digit(0) * 10 + digit(1);
        if digit(2) >= 5 {
            cents_part += 1;
        }

        let cents = whole_value
            .checked_mul(100)
            .and_then(|c| c.checked_add(cents_part))
            .ok_or_else(too_large)?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Converts the value to a floating point number of major units.
    ///
    /// Only used at the serialization boundary.
    #[inline]
    pub fn to_major_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Builds a Money value from a floating point number of major units,
    /// rounding to the nearest cent. Non-finite input becomes zero.
    pub fn from_major_f64(value: f64) -> Money {
        if !value.is_finite() {
            return Money::zero();
        }
        Money((value * 100.0).round() as i64)
    }
}

// =============================================================================
// Serde
// =============================================================================

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.to_major_f64())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() {
            return Err(serde::de::Error::custom("money must be a finite number"));
        }
        Ok(Money::from_major_f64(value))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money as `R$10.99` (debugging and log output only).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}R${}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
