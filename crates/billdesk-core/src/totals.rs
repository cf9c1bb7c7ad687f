//! # Bill Totals Check
//!
//! Bills arrive with client-computed totals. By default they are stored as
//! submitted; when total verification is switched on, [`verify_totals`]
//! recomputes them from the line items and rejects any mismatch.
//!
//! ## Calculation Flow
//! ```text
//! items ──► Σ quantity × price ──► subtotal
//!                                     │
//!            discount_type=amount ────┤ discount (as submitted)
//!            discount_type=percentage ┘ (must not exceed subtotal)
//!                                     │
//!                                     ▼
//!                         taxable = subtotal − discount
//!                                     │
//!                                     ▼
//!                         vat_amount = taxable × vat_rate
//!                                     │
//!                                     ▼
//!                         net_amount = taxable + vat_amount
//! ```

use crate::error::{CoreError, ValidationError};
use crate::money::Money;
use crate::types::{NewBill, NewBillItem};

/// Totals derived from a bill's line items and discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub vat_amount: Money,
    pub net_amount: Money,
}

/// `quantity × price` for one line.
///
/// ## Returns
/// * `Err(ValidationError::TooLarge)` - the product overflows i64 cents
pub fn line_total(price: Money, quantity: i64) -> Result<Money, ValidationError> {
    price
        .checked_mul_quantity(quantity)
        .ok_or_else(|| ValidationError::too_large("total_price"))
}

/// Recomputes subtotal, VAT and net amount for a bill.
///
/// The discount is taken as submitted in both discount modes because the
/// stored value is always the amount taken off. Every step is checked, so
/// amounts near the i64 limit fail with `TooLarge` instead of wrapping.
pub fn compute_totals(bill: &NewBill) -> Result<BillTotals, CoreError> {
    let subtotal = bill
        .items
        .iter()
        .try_fold(Money::zero(), |sum, item: &NewBillItem| {
            sum.checked_add(line_total(item.price, item.quantity)?)
                .ok_or_else(|| ValidationError::too_large("subtotal"))
        })?;
    let taxable = subtotal
        .checked_sub(bill.discount)
        .ok_or_else(|| ValidationError::too_large("discount"))?;
    let vat_amount = taxable.calculate_tax(bill.vat_rate);
    let net_amount = taxable
        .checked_add(vat_amount)
        .ok_or_else(|| ValidationError::too_large("net_amount"))?;

    Ok(BillTotals {
        subtotal,
        discount: bill.discount,
        vat_amount,
        net_amount,
    })
}

/// Checks that every submitted total agrees with the line items.
pub fn verify_totals(bill: &NewBill) -> Result<(), CoreError> {
    for item in &bill.items {
        let expected = line_total(item.price, item.quantity)?;
        if item.total_price != expected {
            return Err(mismatch(
                &format!("total_price of {}", item.product_name),
                expected,
                item.total_price,
            ));
        }
    }

    let expected = compute_totals(bill)?;

    if bill.discount > expected.subtotal {
        return Err(mismatch("discount", expected.subtotal, bill.discount));
    }
    if bill.subtotal != expected.subtotal {
        return Err(mismatch("subtotal", expected.subtotal, bill.subtotal));
    }
    if bill.vat_amount != expected.vat_amount {
        return Err(mismatch("vat_amount", expected.vat_amount, bill.vat_amount));
    }
    if bill.net_amount != expected.net_amount {
        return Err(mismatch("net_amount", expected.net_amount, bill.net_amount));
    }

    Ok(())
}

fn mismatch(field: &str, expected: Money, actual: Money) -> CoreError {
    CoreError::TotalsMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
