//! Expense endpoints.
//!
//! Listings are rendered in camelCase for the expense screen; request bodies
//! use snake_case like the rest of the API.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use billdesk_core::validation::{
    optional_text, parse_date, required, required_text, validate_hex_color, validate_new_expense,
};
use billdesk_core::{
    Expense, ExpenseCategory, Money, NewExpense, NewExpenseCategory, RecurringFrequency,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{flexible_bool, IdQuery, Message};
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Colour given to categories that were never configured.
pub const DEFAULT_EXPENSE_COLOR: &str = "#6B7280";

/// Expense as rendered by `GET /expenses`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView {
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

impl From<Expense> for ExpenseView {
    fn from(e: Expense) -> Self {
        ExpenseView {
            id: e.id,
            description: e.description,
            category: e.category,
            amount: e.amount,
            date: e.date,
            payment_method: e.payment_method,
            vendor: e.vendor,
            notes: e.notes,
            is_recurring: e.is_recurring,
            recurring_frequency: e.recurring_frequency,
            created_by: e.created_by,
            created_at: e.created_at,
            updated_by: e.updated_by,
            updated_at: e.updated_at,
        }
    }
}

/// A category name in use, shaped like a configured category.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistinctCategory {
    pub id: String,
    pub name: String,
    pub description: &'static str,
    pub color: &'static str,
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpensePayload {
    pub id: Option<i64>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<Money>,
    pub date: Option<String>,
    pub payment_method: Option<String>,
    pub vendor: Option<String>,
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_recurring: Option<bool>,
    pub recurring_frequency: Option<RecurringFrequency>,
}

impl ExpensePayload {
    fn to_new_expense(&self) -> ApiResult<NewExpense> {
        let description = required_text("description", self.description.clone())?;
        let category = required_text("category", self.category.clone())?;
        let amount = required("amount", self.amount)?;
        let date = required_text("date", self.date.clone())?;

        let is_recurring = self.is_recurring.unwrap_or(false);
        let expense = NewExpense {
            description,
            category,
            amount,
            date: parse_date("date", &date)?,
            payment_method: optional_text(self.payment_method.clone())
                .unwrap_or_else(|| "cash".to_string()),
            vendor: optional_text(self.vendor.clone()),
            notes: optional_text(self.notes.clone()),
            is_recurring,
            recurring_frequency: if is_recurring {
                self.recurring_frequency
            } else {
                None
            },
        };
        validate_new_expense(&expense)?;
        Ok(expense)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/expenses",
            get(list_expenses).post(save_expense).delete(delete_expense),
        )
        .route(
            "/expenses/categories",
            get(list_categories).post(add_category),
        )
        .route("/expenses/categories/distinct", get(distinct_categories))
}

async fn list_expenses(State(state): State<AppState>) -> ApiResult<Json<Vec<ExpenseView>>> {
    let expenses = state.db.expenses().list().await?;
    Ok(Json(expenses.into_iter().map(ExpenseView::from).collect()))
}

async fn save_expense(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<ExpensePayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let expense = payload.to_new_expense()?;

    match payload.id {
        Some(id) => {
            state
                .db
                .expenses()
                .update(id, &expense, Some(&user.name))
                .await?;
            Ok(Json(Message::new("Expense updated")).into_response())
        }
        None => {
            let id = state
                .db
                .expenses()
                .insert(&expense, Some(&user.name))
                .await?;
            Ok(Json(json!({ "message": "Expense added", "id": id })).into_response())
        }
    }
}

async fn delete_expense(
    State(state): State<AppState>,
    _user: CurrentUser,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<Json<Message>> {
    let Query(query) = query?;
    let id: i64 = query
        .value()
        .ok_or_else(|| ApiError::bad_request("Missing id parameter"))?
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid id parameter"))?;

    state.db.expenses().delete(id).await?;
    Ok(Json(Message::new("Expense deleted")))
}

async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<ExpenseCategory>>> {
    Ok(Json(state.db.expenses().list_active_categories().await?))
}

async fn distinct_categories(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<DistinctCategory>>> {
    let names = state.db.expenses().distinct_categories().await?;
    Ok(Json(
        names
            .into_iter()
            .map(|name| DistinctCategory {
                id: name.clone(),
                name,
                description: "",
                color: DEFAULT_EXPENSE_COLOR,
                is_active: true,
            })
            .collect(),
    ))
}

async fn add_category(
    State(state): State<AppState>,
    _user: CurrentUser,
    payload: Result<Json<CategoryPayload>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Json(payload) = payload?;
    let name = optional_text(payload.name)
        .ok_or_else(|| ApiError::bad_request("Category name is required"))?;
    let color = optional_text(payload.color).unwrap_or_else(|| DEFAULT_EXPENSE_COLOR.to_string());
    validate_hex_color(&color)?;

    let id = state
        .db
        .expenses()
        .add_category(&NewExpenseCategory {
            name,
            description: optional_text(payload.description).unwrap_or_default(),
            color,
            is_active: true,
        })
        .await?;
    Ok(Json(json!({ "message": "Category added", "id": id })))
}
