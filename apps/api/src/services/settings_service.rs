//! Settings endpoint.
//!
//! One URL, many actions. The action comes from the JSON body on POST, or
//! from `?action=` on either method.
//!
//! | Action                  | Admin | Body fields                    |
//! |-------------------------|-------|--------------------------------|
//! | `get_users`             |       |                                |
//! | `add_user`              | yes   | `user`                         |
//! | `edit_user`             | yes   | `user` (with `id`)             |
//! | `delete_user`           | yes   | `id`                           |
//! | `get_store_settings`    |       |                                |
//! | `update_store_settings` | yes   | `settings` (partial)           |
//! | `change_password`       |       | `old_password`, `new_password` |
//! | `get_categories`        |       |                                |
//! | `add_category`          | yes   | `category`                     |
//! | `edit_category`         | yes   | `category` (with `id`)         |
//! | `delete_category`       | yes   | `id`                           |

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use billdesk_core::validation::{
    normalize_email, optional_text, required, required_text, validate_hex_color, validate_name,
    validate_password,
};
use billdesk_core::{
    NewExpenseCategory, NewUser, Role, StoreSettings, TaxRate, UserUpdate, ValidationError,
};
use serde::Deserialize;
use std::str::FromStr;
use tracing::info;

use super::auth_service::parse_role;
use super::{flexible_bool, Message};
use crate::auth::{hash_password, verify_password, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Colour of categories added without one.
const DEFAULT_CATEGORY_COLOR: &str = "#3B82F6";

/// Actions accepted by `/settings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    GetUsers,
    AddUser,
    EditUser,
    DeleteUser,
    GetStoreSettings,
    UpdateStoreSettings,
    ChangePassword,
    GetCategories,
    AddCategory,
    EditCategory,
    DeleteCategory,
}

impl SettingsAction {
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            SettingsAction::AddUser
                | SettingsAction::EditUser
                | SettingsAction::DeleteUser
                | SettingsAction::UpdateStoreSettings
                | SettingsAction::AddCategory
                | SettingsAction::EditCategory
                | SettingsAction::DeleteCategory
        )
    }

    /// Actions that only read.
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            SettingsAction::GetUsers | SettingsAction::GetStoreSettings | SettingsAction::GetCategories
        )
    }
}

impl FromStr for SettingsAction {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "get_users" => SettingsAction::GetUsers,
            "add_user" => SettingsAction::AddUser,
            "edit_user" => SettingsAction::EditUser,
            "delete_user" => SettingsAction::DeleteUser,
            "get_store_settings" => SettingsAction::GetStoreSettings,
            "update_store_settings" => SettingsAction::UpdateStoreSettings,
            "change_password" => SettingsAction::ChangePassword,
            "get_categories" => SettingsAction::GetCategories,
            "add_category" => SettingsAction::AddCategory,
            "edit_category" => SettingsAction::EditCategory,
            "delete_category" => SettingsAction::DeleteCategory,
            _ => return Err(ApiError::bad_request("Invalid action")),
        })
    }
}

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ActionQuery {
    pub action: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsRequest {
    pub action: Option<String>,
    pub id: Option<i64>,
    pub user: Option<UserPayload>,
    pub settings: Option<SettingsPatch>,
    pub category: Option<CategoryPayload>,
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserPayload {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryPayload {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_active: Option<bool>,
}

impl CategoryPayload {
    fn to_new_category(&self) -> ApiResult<NewExpenseCategory> {
        let name = required_text("name", self.name.clone())?;
        validate_name("name", &name)?;
        let color =
            optional_text(self.color.clone()).unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string());
        validate_hex_color(&color)?;

        Ok(NewExpenseCategory {
            name,
            description: optional_text(self.description.clone()).unwrap_or_default(),
            color,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

/// Partial store settings. Absent fields keep their current value; unknown
/// fields such as the row `id` are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsPatch {
    pub store_name: Option<String>,
    pub store_address: Option<String>,
    pub store_phone: Option<String>,
    pub store_email: Option<String>,
    pub tax_rate: Option<TaxRate>,
    pub currency: Option<String>,
    pub currency_symbol: Option<String>,
    pub bill_prefix: Option<String>,
    pub bill_start_number: Option<i64>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub pan_vat_number: Option<String>,
    pub store_logo: Option<String>,
    pub bill_footer_message: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub enable_vat: Option<bool>,
    pub low_stock_threshold: Option<i64>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub allow_negative_stock: Option<bool>,
    pub default_user_role: Option<Role>,
    pub date_format: Option<String>,
    pub timezone: Option<String>,
}

impl SettingsPatch {
    /// Applies the patch over `current`.
    ///
    /// Optional text fields are cleared by sending an empty string.
    pub fn apply(self, mut current: StoreSettings) -> ApiResult<StoreSettings> {
        fn text(target: &mut String, value: Option<String>) {
            if let Some(v) = optional_text(value) {
                *target = v;
            }
        }
        fn nullable(target: &mut Option<String>, value: Option<String>) {
            if let Some(v) = value {
                *target = optional_text(Some(v));
            }
        }

        text(&mut current.store_name, self.store_name);
        nullable(&mut current.store_address, self.store_address);
        nullable(&mut current.store_phone, self.store_phone);
        nullable(&mut current.store_email, self.store_email);
        text(&mut current.currency, self.currency);
        text(&mut current.currency_symbol, self.currency_symbol);
        if let Some(prefix) = self.bill_prefix {
            current.bill_prefix = prefix.trim().to_string();
        }
        nullable(&mut current.bank_name, self.bank_name);
        nullable(&mut current.account_number, self.account_number);
        nullable(&mut current.account_name, self.account_name);
        nullable(&mut current.pan_vat_number, self.pan_vat_number);
        nullable(&mut current.store_logo, self.store_logo);
        nullable(&mut current.bill_footer_message, self.bill_footer_message);
        text(&mut current.date_format, self.date_format);
        text(&mut current.timezone, self.timezone);

        if let Some(rate) = self.tax_rate {
            current.tax_rate = rate;
        }
        if let Some(start) = self.bill_start_number {
            current.bill_start_number = start;
        }
        if let Some(enabled) = self.enable_vat {
            current.enable_vat = enabled;
        }
        if let Some(threshold) = self.low_stock_threshold {
            if threshold < 0 {
                return Err(ApiError::bad_request(
                    "low_stock_threshold must be a non-negative number",
                ));
            }
            current.low_stock_threshold = threshold;
        }
        if let Some(allow) = self.allow_negative_stock {
            current.allow_negative_stock = allow;
        }
        if let Some(role) = self.default_user_role {
            current.default_user_role = role;
        }

        Ok(current)
    }
}

// =============================================================================
// Handlers
// =============================================================================

pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(settings_get).post(settings_post))
}

async fn settings_get(
    State(state): State<AppState>,
    user: CurrentUser,
    query: Result<Query<ActionQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let action: SettingsAction = query.action.as_deref().unwrap_or_default().parse()?;
    if !action.is_read() {
        return Err(ApiError::bad_request("Invalid action"));
    }
    dispatch(&state, &user, action, SettingsRequest::default()).await
}

async fn settings_post(
    State(state): State<AppState>,
    user: CurrentUser,
    query: Result<Query<ActionQuery>, QueryRejection>,
    payload: Result<Json<SettingsRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let Json(request) = payload?;

    let action: SettingsAction = request
        .action
        .as_deref()
        .or(query.action.as_deref())
        .unwrap_or_default()
        .parse()?;
    dispatch(&state, &user, action, request).await
}

async fn dispatch(
    state: &AppState,
    caller: &CurrentUser,
    action: SettingsAction,
    request: SettingsRequest,
) -> ApiResult<Response> {
    if action.requires_admin() && !caller.is_admin() {
        return Err(ApiError::forbidden());
    }

    let db = &state.db;
    let response = match action {
        SettingsAction::GetUsers => Json(db.users().list().await?).into_response(),

        SettingsAction::AddUser => {
            let user = request.user.unwrap_or_default();
            let name = required_text("name", user.name)?;
            let email = required_text("email", user.email)?;
            let password = required("password", user.password)?;
            let role = required_text("role", user.role)?;

            validate_name("name", &name)?;
            validate_password(&password)?;
            let new_user = NewUser {
                name,
                email: normalize_email(&email)?,
                password_hash: hash_password(&password)?,
                role: parse_role(&role)?,
                phone: optional_text(user.phone),
                address: optional_text(user.address),
            };
            db.users().insert(&new_user).await?;
            Json(Message::new("User added")).into_response()
        }

        SettingsAction::EditUser => {
            let user = request.user.unwrap_or_default();
            let id = user
                .id
                .ok_or_else(|| ApiError::bad_request("Missing user id"))?;
            let name = required_text("name", user.name)?;
            let email = required_text("email", user.email)?;
            let role = required_text("role", user.role)?;

            validate_name("name", &name)?;
            let update = UserUpdate {
                name,
                email: normalize_email(&email)?,
                role: parse_role(&role)?,
                phone: optional_text(user.phone),
                address: optional_text(user.address),
                is_active: user.is_active.unwrap_or(true),
            };
            db.users().update(id, &update).await?;
            Json(Message::new("User updated")).into_response()
        }

        SettingsAction::DeleteUser => {
            let id = request
                .id
                .ok_or_else(|| ApiError::bad_request("Missing user id"))?;
            if id == caller.id {
                return Err(ApiError::bad_request("Cannot delete your own account"));
            }
            db.users().delete(id).await?;
            Json(Message::new("User deleted")).into_response()
        }

        SettingsAction::GetStoreSettings => Json(db.settings().get().await?).into_response(),

        SettingsAction::UpdateStoreSettings => {
            let patch = request
                .settings
                .ok_or_else(|| ApiError::from(ValidationError::required("settings")))?;
            let settings = patch.apply(db.settings().get().await?)?;
            db.settings().update(&settings).await?;
            info!(by = %caller.name, "Store settings updated");
            Json(Message::new("Store settings updated")).into_response()
        }

        SettingsAction::ChangePassword => {
            let (Some(old), Some(new)) = (
                request.old_password.filter(|p| !p.is_empty()),
                request.new_password.filter(|p| !p.is_empty()),
            ) else {
                return Err(ApiError::bad_request("Missing password"));
            };

            let user = db
                .users()
                .get(caller.id)
                .await?
                .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
            if !verify_password(&old, &user.password_hash) {
                return Err(ApiError::Forbidden("Incorrect old password".to_string()));
            }
            validate_password(&new)?;

            db.users().set_password(user.id, &hash_password(&new)?).await?;
            Json(Message::new("Password changed")).into_response()
        }

        SettingsAction::GetCategories => {
            Json(db.expenses().list_all_categories().await?).into_response()
        }

        SettingsAction::AddCategory => {
            let category = request.category.unwrap_or_default();
            db.expenses().add_category(&category.to_new_category()?).await?;
            Json(Message::new("Category added")).into_response()
        }

        SettingsAction::EditCategory => {
            let category = request.category.unwrap_or_default();
            let id = category
                .id
                .ok_or_else(|| ApiError::bad_request("Missing category id"))?;
            db.expenses()
                .update_category(id, &category.to_new_category()?)
                .await?;
            Json(Message::new("Category updated")).into_response()
        }

        SettingsAction::DeleteCategory => {
            let id = request
                .id
                .ok_or_else(|| ApiError::bad_request("Missing category id"))?;
            db.expenses().delete_category(id).await?;
            Json(Message::new("Category deleted")).into_response()
        }
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_parsing() {
        assert_eq!(
            "update_store_settings".parse::<SettingsAction>().unwrap(),
            SettingsAction::UpdateStoreSettings
        );
        assert!(SettingsAction::DeleteCategory.requires_admin());
        assert!(!SettingsAction::ChangePassword.requires_admin());
        assert_eq!(
            "set_login_restrictions"
                .parse::<SettingsAction>()
                .unwrap_err()
                .to_string(),
            "Invalid action"
        );
    }

    #[test]
    fn test_patch_keeps_unsent_fields() {
        let patch: SettingsPatch = serde_json::from_value(json!({
            "id": 1,
            "store_name": "Corner Mart",
            "tax_rate": 15,
            "store_phone": "",
            "enable_vat": 0
        }))
        .unwrap();

        let mut current = StoreSettings::default();
        current.store_phone = Some("01-5550000".to_string());
        let updated = patch.apply(current).unwrap();

        assert_eq!(updated.store_name, "Corner Mart");
        assert_eq!(updated.tax_rate.bps(), 1500);
        assert!(updated.store_phone.is_none());
        assert!(!updated.enable_vat);
        assert_eq!(updated.bill_prefix, "B-");
        assert_eq!(updated.currency, "NPR");
    }

    #[test]
    fn test_category_defaults() {
        let payload: CategoryPayload = serde_json::from_value(json!({"name": "Transport"})).unwrap();
        let category = payload.to_new_category().unwrap();
        assert_eq!(category.color, "#3B82F6");
        assert!(category.is_active);
        assert_eq!(category.description, "");
    }
}
