//! # Error Types
//!
//! Domain-specific error types for billdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  billdesk-core errors (this file)                                      │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  billdesk-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  API errors (apps/api)                                                 │
//! │  └── ApiError         - What the client sees ({"error": ...})          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Bill cannot be found by its storage key.
    #[error("Bill not found: {0}")]
    BillNotFound(i64),

    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A submitted total does not match what the line items add up to.
    ///
    /// ## When This Occurs
    /// Only when total verification is switched on:
    /// ```text
    /// items: 2 × 50.00 = 100.00
    /// subtotal submitted: 90.00
    ///      │
    ///      ▼
    /// TotalsMismatch { field: "subtotal", expected: "100.00", actual: "90.00" }
    /// ```
    #[error("{field} mismatch: expected {expected}, got {actual}")]
    TotalsMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// Bill has more lines than allowed.
    #[error("Bill cannot have more than {max} items")]
    TooManyItems { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request input doesn't meet requirements.
/// Every one of them is checked before anything is written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("Missing required field: {field}")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must be a non-negative number")]
    Negative { field: String },

    /// Invalid format (e.g., invalid date, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// An amount, or a total derived from it, does not fit in the money range.
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {}", allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Shorthand for a missing field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn too_large(field: impl Into<String>) -> Self {
        ValidationError::TooLarge {
            field: field.into(),
        }
    }

    /// Shorthand for a malformed field.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::TotalsMismatch {
            field: "subtotal".to_string(),
            expected: "100.00".to_string(),
            actual: "90.00".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "subtotal mismatch: expected 100.00, got 90.00"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("customer_name");
        assert_eq!(err.to_string(), "Missing required field: customer_name");

        let err = ValidationError::NotAllowed {
            field: "role".to_string(),
            allowed: vec!["admin".to_string(), "cashier".to_string()],
        };
        assert_eq!(err.to_string(), "role must be one of: admin, cashier");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("status").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
