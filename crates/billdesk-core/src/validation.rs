//! # Validation Module
//!
//! Input validation for Billdesk. Everything here runs before any write.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request structs (apps/api)                                   │
//! │  ├── serde types, unknown fields ignored, malformed JSON is a 400      │
//! │  └── required fields checked, "Missing required field: X"              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── lengths, ranges, non-negative amounts                             │
//! │  └── dates, emails, colours                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (bill_number, email, category name)            │
//! │  └── Foreign key constraints (bill_items → bills, cascade)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use billdesk_core::validation::{parse_date, validate_quantity};
//!
//! validate_quantity(5).unwrap();
//! assert!(parse_date("dateSold", "2024-13-01").is_err());
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NewBill, NewExpense, NewProduct};
use crate::{MAX_BILL_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_BILL_NUMBER_LEN: usize = 50;
const MAX_SEARCH_LEN: usize = 100;
const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// Presence
// =============================================================================

/// Unwraps a required field.
pub fn required<T>(field: &str, value: Option<T>) -> ValidationResult<T> {
    value.ok_or_else(|| ValidationError::required(field))
}

/// Unwraps a required text field, rejecting blank strings.
///
/// Returns the trimmed value.
pub fn required_text(field: &str, value: Option<String>) -> ValidationResult<String> {
    let value = required(field, value)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field, mapping blank to `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a name-like field (customer, product, category, user).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

/// Validates a client-supplied bill number.
pub fn validate_bill_number(bill_number: &str) -> ValidationResult<()> {
    if bill_number.chars().count() > MAX_BILL_NUMBER_LEN {
        return Err(ValidationError::TooLong {
            field: "bill_number".to_string(),
            max: MAX_BILL_NUMBER_LEN,
        });
    }
    Ok(())
}

/// Validates a search query and returns it trimmed.
///
/// Empty queries are allowed and mean "no filter".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();
    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }
    Ok(query.to_string())
}

/// Validates an email address and returns it lower-cased.
///
/// ## Example
/// ```rust
/// use billdesk_core::validation::normalize_email;
///
/// assert_eq!(normalize_email(" Asha@Example.COM ").unwrap(), "asha@example.com");
/// assert!(normalize_email("not-an-email").is_err());
/// ```
pub fn normalize_email(email: &str) -> ValidationResult<String> {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    let pattern = EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    });

    let email = email.trim().to_lowercase();
    if !pattern.is_match(&email) {
        return Err(ValidationError::invalid_format("email", "Invalid email format"));
    }
    Ok(email)
}

/// Validates a new password.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::invalid_format(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

/// Validates a `#RRGGBB` colour.
pub fn validate_hex_color(color: &str) -> ValidationResult<()> {
    let hex = color.strip_prefix('#').unwrap_or("");
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::invalid_format("color", "expected #RRGGBB"));
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Rejects negative amounts. Zero is allowed.
pub fn validate_non_negative_money(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Rejects negative counts (stock levels).
pub fn validate_non_negative_count(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Dates
// =============================================================================

/// Parses a strict `YYYY-MM-DD` date.
pub fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    let value = value.trim();
    if value.len() != 10 {
        return Err(ValidationError::invalid_format(field, "Use YYYY-MM-DD"));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationError::invalid_format(field, "Use YYYY-MM-DD"))
}

/// Parses a bill timestamp.
///
/// Accepts `YYYY-MM-DD HH:MM[:SS]`, the same with a `T` separator, RFC 3339
/// (offset dropped, wall-clock kept) and a bare date (midnight).
pub fn parse_date_time(field: &str, value: &str) -> ValidationResult<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    let value = value.trim();
    let trimmed = value.split('.').next().unwrap_or(value);

    if let Some(dt) = FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(trimmed, f).ok())
    {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_local());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }

    Err(ValidationError::invalid_format(
        field,
        "expected YYYY-MM-DD HH:MM:SS",
    ))
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Validates a bill header and its items.
///
/// Checks lengths, item count, positive quantities and non-negative amounts.
/// Totals are not cross-checked here; see [`crate::totals`].
pub fn validate_new_bill(bill: &NewBill) -> Result<(), crate::CoreError> {
    validate_name("customer_name", &bill.customer_name)?;
    if let Some(number) = &bill.bill_number {
        validate_bill_number(number)?;
    }

    for (field, amount) in [
        ("subtotal", bill.subtotal),
        ("discount", bill.discount),
        ("vat_amount", bill.vat_amount),
        ("net_amount", bill.net_amount),
    ] {
        validate_non_negative_money(field, amount)?;
    }

    if bill.items.len() > MAX_BILL_ITEMS {
        return Err(crate::CoreError::TooManyItems {
            max: MAX_BILL_ITEMS,
        });
    }

    for item in &bill.items {
        validate_name("product_name", &item.product_name)?;
        validate_quantity(item.quantity)?;
        validate_non_negative_money("price", item.price)?;
        validate_non_negative_money("total_price", item.total_price)?;
    }

    Ok(())
}

/// Validates a product before insert or update.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_name("name", &product.name)?;
    validate_name("category", &product.category)?;
    validate_name("unit", &product.unit)?;
    validate_non_negative_money("selling_price", product.selling_price)?;
    validate_non_negative_money("cost_price", product.cost_price)?;
    validate_non_negative_count("stock", product.stock)?;
    validate_non_negative_count("min_stock", product.min_stock)?;
    Ok(())
}

/// Validates an expense before insert or update.
pub fn validate_new_expense(expense: &NewExpense) -> ValidationResult<()> {
    validate_name("description", &expense.description)?;
    validate_name("category", &expense.category)?;
    validate_name("payment_method", &expense.payment_method)?;
    validate_non_negative_money("amount", expense.amount)?;
    if expense.is_recurring && expense.recurring_frequency.is_none() {
        return Err(ValidationError::required("recurring_frequency"));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecurringFrequency;

    #[test]
    fn test_required_text() {
        assert_eq!(
            required_text("customer_name", Some("  Ram ".to_string())).unwrap(),
            "Ram"
        );
        assert_eq!(
            required_text("customer_name", Some("   ".to_string())).unwrap_err(),
            ValidationError::required("customer_name")
        );
        assert!(required_text("customer_name", None).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some(" ".to_string())), None);
        assert_eq!(optional_text(Some(" x ".to_string())), Some("x".to_string()));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_non_negative_money() {
        assert!(validate_non_negative_money("amount", Money::zero()).is_ok());
        let err = validate_non_negative_money("amount", Money::from_cents(-1)).unwrap_err();
        assert_eq!(err.to_string(), "amount must be a non-negative number");
    }

    #[test]
    fn test_hex_color() {
        assert!(validate_hex_color("#6B7280").is_ok());
        assert!(validate_hex_color("6B7280").is_err());
        assert!(validate_hex_color("#GGGGGG").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("date", "2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("date", "2023-02-29").is_err());
        assert!(parse_date("date", "2024-2-9").is_err());
        assert!(parse_date("date", "15/01/2024").is_err());
    }

    #[test]
    fn test_parse_date_time_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();

        assert_eq!(parse_date_time("date_time", "2024-01-15 10:30:00").unwrap(), expected);
        assert_eq!(parse_date_time("date_time", "2024-01-15T10:30:00").unwrap(), expected);
        assert_eq!(parse_date_time("date_time", "2024-01-15T10:30").unwrap(), expected);
        assert_eq!(parse_date_time("date_time", "2024-01-15T10:30:00.000Z").unwrap(), expected);
        assert_eq!(parse_date_time("date_time", "2024-01-15T10:30:00+05:45").unwrap(), expected);
        assert!(parse_date_time("date_time", "yesterday").is_err());
    }

    #[test]
    fn test_email() {
        assert!(normalize_email("a@b.co").is_ok());
        assert!(normalize_email("a@b").is_err());
        assert!(normalize_email("a b@c.de").is_err());
    }

    #[test]
    fn test_expense_recurring_needs_frequency() {
        let mut expense = NewExpense {
            description: "Rent".to_string(),
            category: "Rent".to_string(),
            amount: Money::from_cents(5_000_000),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            payment_method: "bank".to_string(),
            vendor: None,
            notes: None,
            is_recurring: true,
            recurring_frequency: None,
        };
        assert!(validate_new_expense(&expense).is_err());

        expense.recurring_frequency = Some(RecurringFrequency::Monthly);
        assert!(validate_new_expense(&expense).is_ok());
    }
}
