//! # Store Settings Repository
//!
//! The `store_settings` table holds exactly one row (`id = 1`), seeded by the
//! initial migration.

use billdesk_core::bill_number::BillNumberFormat;
use billdesk_core::StoreSettings;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::DbResult;

const SETTINGS_COLUMNS: &str = "store_name, store_address, store_phone, store_email, \
    tax_rate, currency, currency_symbol, bill_prefix, bill_start_number, bank_name, \
    account_number, account_name, pan_vat_number, store_logo, bill_footer_message, \
    enable_vat, low_stock_threshold, allow_negative_stock, default_user_role, \
    date_format, timezone";

/// Repository for the store settings row.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads the settings, falling back to defaults when the row is missing.
    pub async fn get(&self) -> DbResult<StoreSettings> {
        let settings: Option<StoreSettings> = sqlx::query_as(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM store_settings WHERE id = 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings.unwrap_or_default())
    }

    /// Replaces the settings row.
    ///
    /// The bill number format is checked first so a bad prefix never reaches
    /// the allocator.
    pub async fn update(&self, settings: &StoreSettings) -> DbResult<()> {
        BillNumberFormat::new(settings.bill_prefix.clone(), settings.bill_start_number)?;

        sqlx::query(
            r#"
            INSERT INTO store_settings (
                id, store_name, store_address, store_phone, store_email,
                tax_rate, currency, currency_symbol, bill_prefix, bill_start_number,
                bank_name, account_number, account_name, pan_vat_number, store_logo,
                bill_footer_message, enable_vat, low_stock_threshold, allow_negative_stock,
                default_user_role, date_format, timezone, updated_at
            ) VALUES (
                1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                ?15, ?16, ?17, ?18, ?19, ?20, ?21, datetime('now')
            )
            ON CONFLICT (id) DO UPDATE SET
                store_name = excluded.store_name,
                store_address = excluded.store_address,
                store_phone = excluded.store_phone,
                store_email = excluded.store_email,
                tax_rate = excluded.tax_rate,
                currency = excluded.currency,
                currency_symbol = excluded.currency_symbol,
                bill_prefix = excluded.bill_prefix,
                bill_start_number = excluded.bill_start_number,
                bank_name = excluded.bank_name,
                account_number = excluded.account_number,
                account_name = excluded.account_name,
                pan_vat_number = excluded.pan_vat_number,
                store_logo = excluded.store_logo,
                bill_footer_message = excluded.bill_footer_message,
                enable_vat = excluded.enable_vat,
                low_stock_threshold = excluded.low_stock_threshold,
                allow_negative_stock = excluded.allow_negative_stock,
                default_user_role = excluded.default_user_role,
                date_format = excluded.date_format,
                timezone = excluded.timezone,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&settings.store_name)
        .bind(&settings.store_address)
        .bind(&settings.store_phone)
        .bind(&settings.store_email)
        .bind(settings.tax_rate)
        .bind(&settings.currency)
        .bind(&settings.currency_symbol)
        .bind(&settings.bill_prefix)
        .bind(settings.bill_start_number)
        .bind(&settings.bank_name)
        .bind(&settings.account_number)
        .bind(&settings.account_name)
        .bind(&settings.pan_vat_number)
        .bind(&settings.store_logo)
        .bind(&settings.bill_footer_message)
        .bind(settings.enable_vat)
        .bind(settings.low_stock_threshold)
        .bind(settings.allow_negative_stock)
        .bind(settings.default_user_role)
        .bind(&settings.date_format)
        .bind(&settings.timezone)
        .execute(&self.pool)
        .await?;

        info!(
            store_name = %settings.store_name,
            bill_prefix = %settings.bill_prefix,
            "Store settings updated"
        );
        Ok(())
    }
}

/// Reads the bill number format on an open connection or transaction.
///
/// A missing row, or one holding an unusable prefix, yields the default
/// format.
pub(crate) async fn load_bill_number_format(
    conn: &mut SqliteConnection,
) -> DbResult<BillNumberFormat> {
    let row: Option<(String, i64)> =
        sqlx::query_as("SELECT bill_prefix, bill_start_number FROM store_settings WHERE id = 1")
            .fetch_optional(&mut *conn)
            .await?;

    let Some((prefix, floor)) = row else {
        debug!("No store settings row, using default bill number format");
        return Ok(BillNumberFormat::default());
    };

    match BillNumberFormat::new(prefix.clone(), floor) {
        Ok(format) => Ok(format),
        Err(err) => {
            warn!(prefix = %prefix, floor, error = %err, "Invalid bill number format, using default");
            Ok(BillNumberFormat::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;
    use crate::DbError;
    use billdesk_core::{Role, TaxRate};

    #[tokio::test]
    async fn test_defaults_seeded() {
        let db = test_db().await;
        let settings = db.settings().get().await.unwrap();
        assert_eq!(settings, StoreSettings::default());
    }

    #[tokio::test]
    async fn test_update_round_trip() {
        let db = test_db().await;
        let repo = db.settings();

        let mut settings = repo.get().await.unwrap();
        settings.store_name = "Himalayan Mart".to_string();
        settings.tax_rate = TaxRate::from_bps(1500);
        settings.bill_prefix = "HM-".to_string();
        settings.bill_start_number = 1;
        settings.default_user_role = Role::Admin;
        settings.pan_vat_number = Some("601234567".to_string());
        repo.update(&settings).await.unwrap();

        assert_eq!(repo.get().await.unwrap(), settings);
    }

    #[tokio::test]
    async fn test_update_rejects_blank_prefix() {
        let db = test_db().await;
        let repo = db.settings();

        let mut settings = repo.get().await.unwrap();
        settings.bill_prefix = "-".to_string();
        let err = repo.update(&settings).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        assert_eq!(repo.get().await.unwrap().bill_prefix, "B-");
    }

    #[tokio::test]
    async fn test_missing_row_falls_back() {
        let db = test_db().await;
        sqlx::query("DELETE FROM store_settings")
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(db.settings().get().await.unwrap(), StoreSettings::default());

        let mut conn = db.pool().acquire().await.unwrap();
        let format = load_bill_number_format(&mut conn).await.unwrap();
        assert_eq!(format, BillNumberFormat::default());
    }
}
