//! # Reporting Periods
//!
//! Maps a sales listing period to an inclusive date range.
//!
//! ```text
//! today = 2024-05-15 (Wednesday)
//!
//! daily      2024-05-15 ..= 2024-05-15
//! weekly     2024-05-13 ..= 2024-05-19   (ISO week, Monday–Sunday)
//! monthly    2024-05-01 ..= 2024-05-31
//! quarterly  2024-04-01 ..= 2024-06-30
//! yearly     2024-01-01 ..= 2024-12-31
//! all        unbounded
//! ```

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;

/// Period filter of the sales listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesPeriod {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    #[default]
    All,
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting one that ends before it starts.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ValidationError> {
        if to < from {
            return Err(ValidationError::invalid_format(
                "to",
                "must not be before from",
            ));
        }
        Ok(DateRange { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

impl SalesPeriod {
    /// The date range this period covers relative to `today`, or `None`
    /// for [`SalesPeriod::All`].
    pub fn date_range(&self, today: NaiveDate) -> Option<DateRange> {
        let (from, to) = match self {
            SalesPeriod::All => return None,
            SalesPeriod::Daily => (today, today),
            SalesPeriod::Weekly => {
                let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                (monday, monday + Duration::days(6))
            }
            SalesPeriod::Monthly => month_span(today.year(), today.month(), 1),
            SalesPeriod::Quarterly => {
                let first_month = (today.month0() / 3) * 3 + 1;
                month_span(today.year(), first_month, 3)
            }
            SalesPeriod::Yearly => month_span(today.year(), 1, 12),
        };
        Some(DateRange { from, to })
    }
}

/// First and last day of `months` calendar months starting at `month`.
fn month_span(year: i32, month: u32, months: u32) -> (NaiveDate, NaiveDate) {
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    let end_month0 = month - 1 + months;
    let (next_year, next_month) = (year + (end_month0 / 12) as i32, end_month0 % 12 + 1);
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    (first, last)
}

impl FromStr for SalesPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(SalesPeriod::Daily),
            "weekly" => Ok(SalesPeriod::Weekly),
            "monthly" => Ok(SalesPeriod::Monthly),
            "quarterly" => Ok(SalesPeriod::Quarterly),
            "yearly" => Ok(SalesPeriod::Yearly),
            "all" => Ok(SalesPeriod::All),
            _ => Err(ValidationError::invalid_format("period", "Invalid period parameter")),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn range(period: SalesPeriod, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let r = period.date_range(today).unwrap();
        (r.from, r.to)
    }

    #[test]
    fn test_daily() {
        assert_eq!(range(SalesPeriod::Daily, d(2024, 5, 15)), (d(2024, 5, 15), d(2024, 5, 15)));
    }

    #[test]
    fn test_weekly_is_monday_to_sunday() {
        assert_eq!(range(SalesPeriod::Weekly, d(2024, 5, 15)), (d(2024, 5, 13), d(2024, 5, 19)));
        // Sunday belongs to the week that started the previous Monday
        assert_eq!(range(SalesPeriod::Weekly, d(2024, 5, 19)), (d(2024, 5, 13), d(2024, 5, 19)));
        // Week spanning a year boundary
        assert_eq!(range(SalesPeriod::Weekly, d(2025, 1, 1)), (d(2024, 12, 30), d(2025, 1, 5)));
    }

    #[test]
    fn test_monthly_handles_leap_february() {
        assert_eq!(range(SalesPeriod::Monthly, d(2024, 2, 10)), (d(2024, 2, 1), d(2024, 2, 29)));
        assert_eq!(range(SalesPeriod::Monthly, d(2024, 12, 31)), (d(2024, 12, 1), d(2024, 12, 31)));
    }

    #[test]
    fn test_quarterly() {
        assert_eq!(range(SalesPeriod::Quarterly, d(2024, 5, 15)), (d(2024, 4, 1), d(2024, 6, 30)));
        assert_eq!(range(SalesPeriod::Quarterly, d(2024, 11, 2)), (d(2024, 10, 1), d(2024, 12, 31)));
        assert_eq!(range(SalesPeriod::Quarterly, d(2024, 1, 1)), (d(2024, 1, 1), d(2024, 3, 31)));
    }

    #[test]
    fn test_yearly_and_all() {
        assert_eq!(range(SalesPeriod::Yearly, d(2024, 5, 15)), (d(2024, 1, 1), d(2024, 12, 31)));
        assert!(SalesPeriod::All.date_range(d(2024, 5, 15)).is_none());
    }

    #[test]
    fn test_parse() {
        assert_eq!("weekly".parse::<SalesPeriod>().unwrap(), SalesPeriod::Weekly);
        assert!("hourly".parse::<SalesPeriod>().is_err());
    }

    #[test]
    fn test_date_range_order() {
        assert!(DateRange::new(d(2024, 1, 2), d(2024, 1, 1)).is_err());
        let r = DateRange::new(d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        assert!(r.contains(d(2024, 1, 31)));
        assert!(!r.contains(d(2024, 2, 1)));
    }
}
