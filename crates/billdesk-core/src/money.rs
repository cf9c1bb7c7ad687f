//! # Money Module
//!
//! Provides the `Money` and `TaxRate` types for handling monetary values.
//!
//! ## Integer Inside, Decimal at the Edge
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  JSON request          billdesk                      JSON response      │
//! │                                                                         │
//! │  "subtotal": 100   ──► Money(10000) ──► SQLite INTEGER                 │
//! │  "subtotal": "99.5"──► Money(9950)                                      │
//! │                                        Money(10000) ──► "100.00"        │
//! │                                                                         │
//! │  "vat_rate": 13    ──► TaxRate(1300 bps) ──────────────► "13.00"        │
//! │                                                                         │
//! │  Arithmetic (totals, tax, discount) only ever sees i64 cents.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use billdesk_core::money::{Money, TaxRate};
//!
//! let subtotal = Money::from_cents(10000); // 100.00
//! let discount = Money::from_cents(1000);  // 10.00
//! let vat = (subtotal - discount).calculate_tax(TaxRate::from_bps(1300));
//! assert_eq!(vat.cents(), 1170);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents / paisa).
///
/// ## Design Decisions
/// - **i64 (signed)**: discounts and corrections can be negative in intermediate math
/// - **Serialized as a decimal string**: `Money(10000)` is `"100.00"` on the wire
/// - **Deserialized from number or string**: rounded half away from zero to 2 dp
///
/// ## Where Money is Used
/// ```text
/// BillItem.price × quantity ──► BillItem.total_price ──► Bill.subtotal
///                                                          │
///                        Bill.discount ◄───────────────────┤
///                        Bill.vat_amount ◄─────────────────┤
///                        Bill.net_amount ◄─────────────────┘
///
/// Sale.amount, Expense.amount, Product.selling_price/cost_price
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use billdesk_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Converts a decimal amount to Money, rounding to 2 decimal places.
    ///
    /// ## Example
    /// ```rust
    /// use billdesk_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let m = Money::from_decimal(Decimal::new(10005, 3)).unwrap(); // 10.005
    /// assert_eq!(m.cents(), 1001);
    /// ```
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        (rounded * Decimal::ONE_HUNDRED).to_i64().map(Money)
    }

    /// Returns the value as a 2-dp decimal.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
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

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax on this amount, rounding half away from zero.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, widened to i128.
    ///
    /// ## Example
    /// ```rust
    /// use billdesk_core::money::{Money, TaxRate};
    ///
    /// let taxable = Money::from_cents(9000);   // 90.00
    /// let rate = TaxRate::from_bps(1300);      // 13%
    /// assert_eq!(taxable.calculate_tax(rate).cents(), 1170); // 11.70
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money::from_cents(apply_bps(self.0, rate.bps() as i64))
    }

    /// Line total `self × qty`, or `None` when it does not fit in i64 cents.
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Returns the amount a percentage discount takes off this value.
    ///
    /// `discount_bps` is in basis points (1000 = 10%).
    pub fn percentage_of(&self, discount_bps: i64) -> Money {
        Money::from_cents(apply_bps(self.0, discount_bps))
    }
}

/// `amount * bps / 10000` rounded half away from zero.
fn apply_bps(amount: i64, bps: i64) -> i64 {
    let product = amount as i128 * bps as i128;
    let rounded = if product >= 0 {
        (product + 5000) / 10000
    } else {
        (product - 5000) / 10000
    };
    rounded as i64
}

// =============================================================================
// Serde / Decimal Conversions
// =============================================================================

impl TryFrom<Decimal> for Money {
    type Error = String;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::from_decimal(value).ok_or_else(|| format!("amount out of range: {value}"))
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.to_decimal()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
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
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1300 bps = 13% VAT. On the wire it is a
/// percentage: `13`, `13.5` or `"13.00"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct TaxRate(u32);

impl TaxRate {
    /// Largest accepted rate (100%).
    pub const MAX_BPS: u32 = 10_000;

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Parses a percentage such as `13.5` into basis points.
    pub fn from_percentage(pct: Decimal) -> Result<Self, ValidationError> {
        let bps = (pct * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(-1);
        if !(0..=Self::MAX_BPS as i64).contains(&bps) {
            return Err(ValidationError::OutOfRange {
                field: "vat_rate".to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(TaxRate(bps as u32))
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a 2-dp percentage.
    #[inline]
    pub fn percentage(&self) -> Decimal {
        Decimal::new(self.0 as i64, 2)
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

impl TryFrom<Decimal> for TaxRate {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        TaxRate::from_percentage(value)
    }
}

impl From<TaxRate> for Decimal {
    fn from(rate: TaxRate) -> Self {
        rate.percentage()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
