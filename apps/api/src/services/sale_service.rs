//! Sales endpoints.
//!
//! Sales rows are written by bill creation; `POST /sales` is the manual entry
//! path for sales made outside the billing screen.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use billdesk_core::period::SalesPeriod;
use billdesk_core::validation::{optional_text, parse_date, required, required_text, validate_search_query};
use billdesk_core::{Money, NewSale, Sale};
use billdesk_db::SaleFilter;
use chrono::Local;
use http::StatusCode;
use serde::Deserialize;

use super::Message;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SaleListQuery {
    pub period: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalePayload {
    pub product_name: Option<String>,
    pub invoice_number: Option<String>,
    pub date_sold: Option<String>,
    pub amount: Option<Money>,
    pub category: Option<String>,
    pub user: Option<String>,
}

impl SalePayload {
    fn into_new_sale(self, operator: &CurrentUser) -> ApiResult<NewSale> {
        let product_name = required_text("productName", self.product_name)?;
        let invoice_number = required_text("invoiceNumber", self.invoice_number)?;
        let date_sold = required_text("dateSold", self.date_sold)?;
        let amount = required("amount", self.amount)?;
        let category = required_text("category", self.category)?;

        let date_sold = parse_date("dateSold", &date_sold)
            .map_err(|_| ApiError::bad_request("Invalid date format. Use YYYY-MM-DD"))?;
        if amount.is_negative() {
            return Err(ApiError::bad_request("amount must be a non-negative number"));
        }

        Ok(NewSale {
            product_name,
            invoice_number,
            date_sold,
            amount,
            category: Some(category),
            user: optional_text(self.user).or_else(|| Some(operator.name.clone())),
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/sales", get(list_sales).post(add_sale))
}

async fn list_sales(
    State(state): State<AppState>,
    _user: CurrentUser,
    query: Result<Query<SaleListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Sale>>> {
    let Query(query) = query?;

    let period: SalesPeriod = match optional_text(query.period) {
        Some(period) => period
            .to_lowercase()
            .parse()
            .map_err(|_| ApiError::bad_request("Invalid period parameter"))?,
        None => SalesPeriod::All,
    };
    let search = match query.search.as_deref() {
        Some(search) => Some(validate_search_query(search)?).filter(|s| !s.is_empty()),
        None => None,
    };

    let filter = SaleFilter {
        range: period.date_range(Local::now().date_naive()),
        search,
    };
    Ok(Json(state.db.sales().list(&filter).await?))
}

async fn add_sale(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<SalePayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let sale = payload.into_new_sale(&user)?;

    state.db.sales().insert(&sale).await?;
    Ok((StatusCode::CREATED, Json(Message::new("Sale added successfully"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use billdesk_core::Role;
    use serde_json::json;

    fn operator() -> CurrentUser {
        CurrentUser {
            id: 3,
            name: "Ram".to_string(),
            email: "ram@example.com".to_string(),
            role: Role::Cashier,
        }
    }

    #[test]
    fn test_sale_payload() {
        let payload: SalePayload = serde_json::from_value(json!({
            "productName": "Tea",
            "invoiceNumber": "MANUAL-1",
            "dateSold": "2024-05-15",
            "amount": "45.00",
            "category": "Beverages"
        }))
        .unwrap();
        let sale = payload.into_new_sale(&operator()).unwrap();
        assert_eq!(sale.amount.cents(), 4500);
        assert_eq!(sale.user.as_deref(), Some("Ram"));
    }

    #[test]
    fn test_sale_date_format() {
        let payload: SalePayload = serde_json::from_value(json!({
            "productName": "Tea",
            "invoiceNumber": "MANUAL-1",
            "dateSold": "15-05-2024",
            "amount": 45,
            "category": "Beverages"
        }))
        .unwrap();
        assert_eq!(
            payload.into_new_sale(&operator()).unwrap_err().to_string(),
            "Invalid date format. Use YYYY-MM-DD"
        );
    }
}
