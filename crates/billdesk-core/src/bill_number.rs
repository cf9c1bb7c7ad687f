//! # Bill Number Allocation
//!
//! Computes the next free human-facing bill number from the numbers already
//! in storage.
//!
//! ## Algorithm
//! ```text
//! stored: B-1000, B-1002, B1003, B-abc, X-9999        format: ("B-", 1000)
//!    │
//!    ▼  keep numbers starting with the prefix core "B"
//! B-1000, B-1002, B1003, B-abc
//!    │
//!    ▼  ^B-?(\d+)$   (B-abc ignored, not counted)
//! used = {1000, 1002, 1003}
//!    │
//!    ▼  smallest n >= floor not in used
//! n = 1001  ──►  "B-1001"
//! ```
//!
//! Numbers freed by deleted bills are handed out again. The result can never
//! collide with anything in the scanned set; the database layer adds the
//! lock and write transaction that make the scan-then-insert sequence race
//! free.

use regex::Regex;
use std::collections::BTreeSet;

use crate::error::ValidationError;
use crate::{DEFAULT_BILL_PREFIX, DEFAULT_BILL_START_NUMBER, MAX_BILL_START_NUMBER};

// =============================================================================
// Format
// =============================================================================

/// Prefix and floor for generated bill numbers.
#[derive(Debug, Clone)]
pub struct BillNumberFormat {
    prefix: String,
    floor: i64,
    pattern: Regex,
}

impl BillNumberFormat {
    /// Builds a format from a store's configured prefix and start number.
    ///
    /// ## Errors
    /// The prefix must be non-empty once a trailing `-` is removed, and the
    /// floor must lie in `0..=MAX_BILL_START_NUMBER`.
    pub fn new(prefix: impl Into<String>, floor: i64) -> Result<Self, ValidationError> {
        let prefix = prefix.into();
        let core = prefix.trim_end_matches('-');
        if core.is_empty() {
            return Err(ValidationError::required("bill_prefix"));
        }
        if floor < 0 {
            return Err(ValidationError::Negative {
                field: "bill_start_number".to_string(),
            });
        }
        if floor > MAX_BILL_START_NUMBER {
            return Err(ValidationError::OutOfRange {
                field: "bill_start_number".to_string(),
                min: 0,
                max: MAX_BILL_START_NUMBER,
            });
        }

        let pattern = Regex::new(&format!(r"^{}-?(\d+)$", regex::escape(core)))
            .map_err(|e| ValidationError::invalid_format("bill_prefix", e.to_string()))?;

        Ok(BillNumberFormat {
            prefix,
            floor,
            pattern,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn floor(&self) -> i64 {
        self.floor
    }

    /// The prefix without its trailing dash. Stored numbers are pre-filtered
    /// on this before the pattern is applied.
    pub fn scan_prefix(&self) -> &str {
        self.prefix.trim_end_matches('-')
    }

    /// Extracts the numeric part of a stored bill number, if it has this
    /// format (`B-1000` and `B1000` both yield 1000).
    pub fn parse(&self, bill_number: &str) -> Option<i64> {
        self.pattern
            .captures(bill_number)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<i64>().ok())
    }

    /// Renders a number in this format.
    pub fn format(&self, n: i64) -> String {
        format!("{}{}", self.prefix, n)
    }
}

impl Default for BillNumberFormat {
    fn default() -> Self {
        BillNumberFormat::new(DEFAULT_BILL_PREFIX, DEFAULT_BILL_START_NUMBER)
            .expect("default bill number format is valid")
    }
}

impl PartialEq for BillNumberFormat {
    fn eq(&self, other: &Self) -> bool {
        self.prefix == other.prefix && self.floor == other.floor
    }
}

impl Eq for BillNumberFormat {}

// =============================================================================
// Allocation
// =============================================================================

/// Returns the next free bill number given every stored bill number.
///
/// Inputs that do not match the format are ignored. An empty input yields
/// `prefix + floor`.
///
/// ## Example
/// ```rust
/// use billdesk_core::bill_number::{next_bill_number, BillNumberFormat};
///
/// let format = BillNumberFormat::default();
/// assert_eq!(next_bill_number(Vec::<String>::new(), &format), "B-1000");
/// assert_eq!(next_bill_number(["B-1000", "B-1001"], &format), "B-1002");
/// ```
pub fn next_bill_number<I, S>(existing: I, format: &BillNumberFormat) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let used: BTreeSet<i64> = existing
        .into_iter()
        .filter_map(|n| format.parse(n.as_ref()))
        .filter(|n| *n >= format.floor())
        .collect();

    // candidate never exceeds floor + used.len(), far below i64::MAX
    let mut candidate = format.floor();
    for n in &used {
        if *n != candidate {
            break;
        }
        candidate += 1;
    }

    format.format(candidate)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn default_next(existing: &[&str]) -> String {
        next_bill_number(existing.iter().copied(), &BillNumberFormat::default())
    }

    #[test]
    fn test_empty_starts_at_floor() {
        assert_eq!(default_next(&[]), "B-1000");
    }

    #[test]
    fn test_sequential() {
        assert_eq!(default_next(&["B-1000"]), "B-1001");
        assert_eq!(default_next(&["B-1000", "B-1001", "B-1002"]), "B-1003");
    }

    #[test]
    fn test_gap_is_reused() {
        assert_eq!(default_next(&["B-1000", "B-1002"]), "B-1001");
    }

    #[test]
    fn test_floor_gap_is_reused() {
        assert_eq!(default_next(&["B-1001", "B-1002"]), "B-1000");
    }

    #[test]
    fn test_below_floor_is_ignored() {
        assert_eq!(default_next(&["B-5", "B-999"]), "B-1000");
    }

    #[test]
    fn test_malformed_is_ignored() {
        assert_eq!(default_next(&["B-abc"]), "B-1000");
        assert_eq!(default_next(&["B-1000", "B-abc", "B-10x"]), "B-1001");
    }

    #[test]
    fn test_dashless_form_counts() {
        assert_eq!(default_next(&["B1000", "B-1001"]), "B-1002");
    }

    #[test]
    fn test_other_prefixes_and_case_ignored() {
        assert_eq!(default_next(&["X-1000", "b-1000", "BB-1000"]), "B-1000");
    }

    #[test]
    fn test_result_never_collides() {
        let mut stored: Vec<String> = vec![
            "B-1003".to_string(),
            "B-1000".to_string(),
            "B-1007".to_string(),
            "B-oops".to_string(),
        ];
        for _ in 0..20 {
            let next = next_bill_number(&stored, &BillNumberFormat::default());
            assert!(!stored.contains(&next), "{next} already stored");
            stored.push(next);
        }
    }

    #[test]
    fn test_custom_format() {
        let format = BillNumberFormat::new("INV-", 1).unwrap();
        assert_eq!(format.scan_prefix(), "INV");
        assert_eq!(next_bill_number(["INV-1", "INV2"], &format), "INV-3");

        let format = BillNumberFormat::new("S", 500).unwrap();
        assert_eq!(next_bill_number(["S500", "S-501"], &format), "S502");
    }

    #[test]
    fn test_prefix_is_escaped() {
        let format = BillNumberFormat::new("A.", 1).unwrap();
        assert_eq!(format.parse("A.7"), Some(7));
        assert_eq!(format.parse("AX7"), None);
    }

    #[test]
    fn test_invalid_format() {
        assert!(BillNumberFormat::new("-", 1000).is_err());
        assert!(BillNumberFormat::new("B-", -1).is_err());
        assert!(BillNumberFormat::new("B-", MAX_BILL_START_NUMBER).is_ok());
        assert_eq!(
            BillNumberFormat::new("B-", i64::MAX).unwrap_err().to_string(),
            "bill_start_number must be between 0 and 999999999"
        );
    }
}
