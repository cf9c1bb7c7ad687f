//! # Domain Types
//!
//! Core domain types used throughout Billdesk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Bill       │   │    BillItem     │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bill_id (key)  │◄──│  bill_id (FK)   │   │  invoice_number │       │
//! │  │  bill_number    │───┼─────────────────┼──►│  (= bill_number)│       │
//! │  │  totals (Money) │   │  product_name   │   │  amount         │       │
//! │  │  status         │   │  qty × price    │   │  category       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Expense      │   │      User       │       │
//! │  │  id (32 hex)    │   │  category       │   │  role           │       │
//! │  │  category ──────┼──►│  (looked up     │   │  employee_id    │       │
//! │  │                 │   │   for sales)    │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A bill has:
//! - `bill_id`: integer storage key, used for relations and the HTTP API
//! - `bill_number`: human-facing identifier (`B-1000`), unique, denormalized
//!   into every Sale as `invoice_number`

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::{Money, TaxRate};

// =============================================================================
// Enumerations
// =============================================================================

/// Lifecycle status of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(rename_all = "lowercase"))]
pub enum BillStatus {
    Paid,
    Pending,
    Cancelled,
}

impl BillStatus {
    pub const ALL: [BillStatus; 3] = [BillStatus::Paid, BillStatus::Pending, BillStatus::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Paid => "paid",
            BillStatus::Pending => "pending",
            BillStatus::Cancelled => "cancelled",
        }
    }
}

/// How `Bill.discount` is interpreted.
///
/// For `Percentage` the stored discount is the amount already taken off;
/// the percentage itself lives on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(rename_all = "lowercase"))]
pub enum DiscountType {
    #[default]
    Amount,
    Percentage,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Amount => "amount",
            DiscountType::Percentage => "percentage",
        }
    }
}

/// User role. Admins manage users, store settings and categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(rename_all = "lowercase"))]
pub enum Role {
    Admin,
    #[default]
    Cashier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "cashier",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Repeat interval of a recurring expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(rename_all = "lowercase"))]
pub enum RecurringFrequency {
    Monthly,
    Quarterly,
    Yearly,
}

macro_rules! impl_text_enum {
    ($ty:ty, $field:literal, [$($variant:expr),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                [$($variant),+]
                    .into_iter()
                    .find(|v: &$ty| v.as_str() == s)
                    .ok_or_else(|| ValidationError::NotAllowed {
                        field: $field.to_string(),
                        allowed: [$($variant),+].iter().map(|v: &$ty| v.as_str().to_string()).collect(),
                    })
            }
        }
    };
}

impl_text_enum!(BillStatus, "status", [BillStatus::Paid, BillStatus::Pending, BillStatus::Cancelled]);
impl_text_enum!(DiscountType, "discount_type", [DiscountType::Amount, DiscountType::Percentage]);
impl_text_enum!(Role, "role", [Role::Admin, Role::Cashier]);
impl_text_enum!(
    RecurringFrequency,
    "recurring_frequency",
    [RecurringFrequency::Monthly, RecurringFrequency::Quarterly, RecurringFrequency::Yearly]
);

impl RecurringFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringFrequency::Monthly => "monthly",
            RecurringFrequency::Quarterly => "quarterly",
            RecurringFrequency::Yearly => "yearly",
        }
    }
}

// =============================================================================
// Bill
// =============================================================================

/// A stored bill header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Bill {
    /// Storage key.
    pub bill_id: i64,

    /// Human-facing identifier, unique across all bills.
    pub bill_number: String,

    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,

    pub subtotal: Money,
    pub discount: Money,
    pub discount_type: DiscountType,
    pub vat_rate: TaxRate,
    pub vat_amount: Money,
    pub net_amount: Money,

    /// When the sale happened (client clock, no timezone).
    pub date_time: NaiveDateTime,

    pub status: BillStatus,
    pub payment_method: Option<String>,
    pub notes: Option<String>,

    /// Operator who rang up the bill (free text).
    pub cashier_id: Option<String>,

    pub created_at: NaiveDateTime,
}

/// A line item on a bill.
///
/// `product_id` and `product_name` are a snapshot: the item survives the
/// product being deleted or renamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BillItem {
    pub id: i64,
    pub bill_id: i64,
    pub product_id: Option<String>,
    pub product_name: String,
    pub quantity: i64,

    /// Unit price at time of sale.
    pub price: Money,

    /// quantity × price, as submitted.
    pub total_price: Money,
}

/// A bill together with its line items, as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillWithItems {
    #[serde(flatten)]
    pub bill: Bill,
    pub items: Vec<BillItem>,
}

/// Validated input for creating or replacing a bill.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBill {
    /// Requested bill number. `None` (or a taken number on create) means
    /// allocate one.
    pub bill_number: Option<String>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub subtotal: Money,
    pub discount: Money,
    pub discount_type: DiscountType,
    pub vat_rate: TaxRate,
    pub vat_amount: Money,
    pub net_amount: Money,
    pub date_time: NaiveDateTime,
    pub status: BillStatus,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub cashier_id: Option<String>,
    pub items: Vec<NewBillItem>,
}

/// Validated input for one bill line.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBillItem {
    pub product_id: Option<String>,
    pub product_name: String,
    pub quantity: i64,
    pub price: Money,
    pub total_price: Money,
}

// =============================================================================
// Sale
// =============================================================================

/// A per-item sales record used for reporting.
///
/// Written as a side effect of bill writes (one per item) or entered
/// manually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub product_name: String,

    /// Bill number of the originating bill.
    pub invoice_number: String,

    pub date_sold: NaiveDate,
    pub amount: Money,

    /// Product category at time of sale; `None` when the product was unknown.
    pub category: Option<String>,

    /// Operator.
    pub user: Option<String>,

    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub product_name: String,
    pub invoice_number: String,
    pub date_sold: NaiveDate,
    pub amount: Money,
    pub category: Option<String>,
    pub user: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// 32 lowercase hex characters.
    pub id: String,
    pub name: String,
    pub category: String,

    /// Unit of sale ("pcs", "kg", ...).
    pub unit: String,

    pub selling_price: Money,
    pub cost_price: Money,
    pub stock: i64,

    /// Reorder level.
    pub min_stock: i64,

    pub barcode: Option<String>,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
    pub updated_by: Option<String>,
}

impl Product {
    /// True when stock has fallen to or below the reorder level.
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub unit: String,
    pub selling_price: Money,
    pub cost_price: Money,
    pub stock: i64,
    pub min_stock: i64,
    pub barcode: Option<String>,
    pub description: Option<String>,
}

// =============================================================================
// Expense
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: i64,
    pub description: String,
    pub category: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub payment_method: String,
    pub vendor: Option<String>,
    pub notes: Option<String>,
    pub is_recurring: bool,
    pub recurring_frequency: Option<RecurringFrequency>,
    pub created_by: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_by: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub description: String,
    pub category: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub payment_method: String,
    pub vendor: Option<String>,
    pub notes: Option<String>,
    pub is_recurring: bool,
    pub recurring_frequency: Option<RecurringFrequency>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ExpenseCategory {
    pub id: i64,
    pub name: String,
    pub description: String,

    /// Hex colour used by the dashboard, e.g. `#6B7280`.
    pub color: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpenseCategory {
    pub name: String,
    pub description: String,
    pub color: String,
    pub is_active: bool,
}

// =============================================================================
// User
// =============================================================================

/// A staff account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub name: String,

    /// Stored lower-cased.
    pub email: String,

    /// Argon2 PHC string. Never serialized.
    #[serde(skip)]
    pub password_hash: String,

    pub role: Role,

    /// Six digit, zero padded ("000042").
    pub employee_id: String,

    pub store_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: NaiveDateTime,
    pub last_active: Option<NaiveDateTime>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Admin edit of another account. The password is changed separately.
#[derive(Debug, Clone, PartialEq)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
}

// =============================================================================
// Store Settings
// =============================================================================

/// The single row of store-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StoreSettings {
    pub store_name: String,
    pub store_address: Option<String>,
    pub store_phone: Option<String>,
    pub store_email: Option<String>,

    /// Default VAT rate offered to new bills.
    pub tax_rate: TaxRate,
    pub currency: String,
    pub currency_symbol: String,

    /// Bill number prefix, e.g. `B-`.
    pub bill_prefix: String,

    /// Lowest number the allocator hands out.
    pub bill_start_number: i64,

    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub pan_vat_number: Option<String>,
    pub store_logo: Option<String>,
    pub bill_footer_message: Option<String>,
    pub enable_vat: bool,
    pub low_stock_threshold: i64,
    pub allow_negative_stock: bool,
    pub default_user_role: Role,
    pub date_format: String,
    pub timezone: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            store_name: "My Store".to_string(),
            store_address: None,
            store_phone: None,
            store_email: None,
            tax_rate: TaxRate::from_bps(1300),
            currency: "NPR".to_string(),
            currency_symbol: "Rs.".to_string(),
            bill_prefix: crate::DEFAULT_BILL_PREFIX.to_string(),
            bill_start_number: crate::DEFAULT_BILL_START_NUMBER,
            bank_name: None,
            account_number: None,
            account_name: None,
            pan_vat_number: None,
            store_logo: None,
            bill_footer_message: None,
            enable_vat: true,
            low_stock_threshold: 10,
            allow_negative_stock: false,
            default_user_role: Role::Cashier,
            date_format: "YYYY-MM-DD".to_string(),
            timezone: "Asia/Kathmandu".to_string(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("paid".parse::<BillStatus>().unwrap(), BillStatus::Paid);
        assert_eq!("cancelled".parse::<BillStatus>().unwrap(), BillStatus::Cancelled);

        let err = "void".parse::<BillStatus>().unwrap_err();
        assert_eq!(err.to_string(), "status must be one of: paid, pending, cancelled");
    }

    #[test]
    fn test_enum_json_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<DiscountType>("\"percentage\"").unwrap(),
            DiscountType::Percentage
        );
    }

    #[test]
    fn test_user_hash_not_serialized() {
        let user = User {
            id: 1,
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Admin,
            employee_id: "000001".to_string(),
            store_id: None,
            phone: None,
            address: None,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            last_active: None,
            is_active: true,
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_bill_with_items_flattens_header() {
        let created = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let bill = BillWithItems {
            bill: Bill {
                bill_id: 7,
                bill_number: "B-1000".to_string(),
                customer_name: "Walk-in".to_string(),
                customer_phone: None,
                customer_address: None,
                subtotal: Money::from_cents(10000),
                discount: Money::zero(),
                discount_type: DiscountType::Amount,
                vat_rate: TaxRate::zero(),
                vat_amount: Money::zero(),
                net_amount: Money::from_cents(10000),
                date_time: created,
                status: BillStatus::Paid,
                payment_method: None,
                notes: None,
                cashier_id: None,
                created_at: created,
            },
            items: vec![],
        };

        let value = serde_json::to_value(&bill).unwrap();
        assert_eq!(value["bill_id"], 7);
        assert_eq!(value["bill_number"], "B-1000");
        assert_eq!(value["net_amount"], "100.00");
        assert!(value["items"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_low_stock() {
        let mut product = Product {
            id: "0".repeat(32),
            name: "Rice".to_string(),
            category: "Grocery".to_string(),
            unit: "kg".to_string(),
            selling_price: Money::from_cents(12000),
            cost_price: Money::from_cents(10000),
            stock: 5,
            min_stock: 5,
            barcode: None,
            description: None,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            created_by: None,
            updated_at: None,
            updated_by: None,
        };
        assert!(product.is_low_stock());
        product.stock = 6;
        assert!(!product.is_low_stock());
    }
}
