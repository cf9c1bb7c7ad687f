//! Bill endpoints.
//!
//! ## Routes
//! ```text
//! GET    /bills?status=&search=     list with items
//! GET    /bills/next-number         preview of the next allocated number
//! GET    /bills/{bill_id}           one bill
//! POST   /bills                     create (201)
//! PUT    /bills   {bill_id, ...}    replace header and items
//! DELETE /bills?bill_id=            delete with items
//!
//! /invoices                         same handlers, `id` accepted for
//!                                   `bill_id`, responses carry
//!                                   `Deprecation: true`
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use billdesk_core::validation::{
    optional_text, parse_date_time, required, required_text, validate_new_bill,
    validate_quantity, validate_search_query,
};
use billdesk_core::{totals, BillStatus, BillWithItems, DiscountType, Money, NewBill, NewBillItem, TaxRate};
use billdesk_db::BillFilter;
use http::{HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{string_or_number, Message};
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Bill body of POST and PUT.
///
/// Everything is optional at the serde level so missing fields produce
/// `Missing required field: <name>` in a fixed order.
#[derive(Debug, Default, Deserialize)]
pub struct BillPayload {
    #[serde(default, alias = "id", deserialize_with = "string_or_number")]
    pub bill_id: Option<String>,
    pub bill_number: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub subtotal: Option<Money>,
    pub discount: Option<Money>,
    pub discount_type: Option<String>,
    pub vat_rate: Option<TaxRate>,
    pub vat_amount: Option<Money>,
    pub net_amount: Option<Money>,
    pub date_time: Option<String>,
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub cashier_id: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemPayload>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemPayload {
    #[serde(default, deserialize_with = "string_or_number")]
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Money>,
    pub total_price: Option<Money>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BillListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BillIdQuery {
    #[serde(alias = "id")]
    pub bill_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NextNumberResponse {
    pub bill_number: String,
}

fn parse_bill_id(raw: Option<&str>) -> ApiResult<i64> {
    let raw = raw
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing bill id"))?;
    raw.parse()
        .map_err(|_| ApiError::bad_request("Invalid bill id"))
}

fn parse_lowercase<T>(value: &str) -> ApiResult<T>
where
    T: std::str::FromStr<Err = billdesk_core::ValidationError>,
{
    Ok(value.trim().to_lowercase().parse()?)
}

impl ItemPayload {
    fn into_new_item(self) -> ApiResult<NewBillItem> {
        let product_name = required_text("product_name", self.product_name)?;
        let quantity = required("quantity", self.quantity)?;
        let price = required("price", self.price)?;
        validate_quantity(quantity)?;

        let total_price = match self.total_price {
            Some(total) => total,
            None => totals::line_total(price, quantity)?,
        };

        Ok(NewBillItem {
            product_id: optional_text(self.product_id),
            product_name,
            quantity,
            price,
            total_price,
        })
    }
}

impl BillPayload {
    /// Converts the body into a validated [`NewBill`].
    ///
    /// `operator` fills `cashier_id` when the body has none.
    pub fn into_new_bill(
        self,
        operator: Option<&CurrentUser>,
        verify: bool,
    ) -> ApiResult<NewBill> {
        let customer_name = required_text("customer_name", self.customer_name)?;
        let subtotal = required("subtotal", self.subtotal)?;
        let net_amount = required("net_amount", self.net_amount)?;
        let date_time = required_text("date_time", self.date_time)?;
        let status = required_text("status", self.status)?;

        let date_time = parse_date_time("date_time", &date_time)?;
        let status: BillStatus = parse_lowercase(&status)?;
        let discount_type: DiscountType = match optional_text(self.discount_type) {
            Some(kind) => parse_lowercase(&kind)?,
            None => DiscountType::default(),
        };

        let items = self
            .items
            .into_iter()
            .map(ItemPayload::into_new_item)
            .collect::<ApiResult<Vec<_>>>()?;

        let cashier_id =
            optional_text(self.cashier_id).or_else(|| operator.map(|user| user.name.clone()));

        let bill = NewBill {
            bill_number: optional_text(self.bill_number),
            customer_name,
            customer_phone: optional_text(self.customer_phone),
            customer_address: optional_text(self.customer_address),
            subtotal,
            discount: self.discount.unwrap_or_default(),
            discount_type,
            vat_rate: self.vat_rate.unwrap_or_else(TaxRate::zero),
            vat_amount: self.vat_amount.unwrap_or_default(),
            net_amount,
            date_time,
            status,
            payment_method: optional_text(self.payment_method),
            notes: optional_text(self.notes),
            cashier_id,
            items,
        };

        validate_new_bill(&bill)?;
        if verify {
            totals::verify_totals(&bill)?;
        }
        Ok(bill)
    }
}

// =============================================================================
// Routers
// =============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/bills",
            get(list_bills)
                .post(create_bill)
                .put(update_bill)
                .patch(update_bill)
                .delete(delete_bill),
        )
        .route("/bills/next-number", get(next_number))
        .route("/bills/{bill_id}", get(get_bill))
}

/// The legacy `/invoices` surface.
pub fn invoice_router() -> Router<AppState> {
    Router::new()
        .route(
            "/invoices",
            get(list_bills)
                .post(create_bill)
                .put(update_bill)
                .patch(update_bill)
                .delete(delete_bill),
        )
        .layer(map_response(mark_deprecated))
}

async fn mark_deprecated(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert("deprecation", HeaderValue::from_static("true"));
    response
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_bills(
    State(state): State<AppState>,
    query: Result<Query<BillListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<BillWithItems>>> {
    let Query(query) = query?;

    // Unknown statuses are ignored rather than rejected
    let status = query
        .status
        .as_deref()
        .and_then(|s| s.trim().to_lowercase().parse::<BillStatus>().ok());
    let search = match query.search.as_deref() {
        Some(search) => Some(validate_search_query(search)?).filter(|s| !s.is_empty()),
        None => None,
    };

    let bills = state.db.bills().list(&BillFilter { status, search }).await?;
    debug!(count = bills.len(), "Listed bills");
    Ok(Json(bills))
}

async fn get_bill(
    State(state): State<AppState>,
    bill_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<BillWithItems>> {
    let Path(bill_id) = bill_id?;
    let bill = state
        .db
        .bills()
        .get(bill_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Bill not found".to_string()))?;
    Ok(Json(bill))
}

async fn next_number(State(state): State<AppState>) -> ApiResult<Json<NextNumberResponse>> {
    let bill_number = state.db.bills().next_bill_number().await?;
    Ok(Json(NextNumberResponse { bill_number }))
}

async fn create_bill(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    payload: Result<Json<BillPayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let bill = payload.into_new_bill(user.as_ref(), state.config.billing.verify_totals)?;

    let created = state.db.bills().create(&bill).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Bill created",
            "bill_id": created.bill_id,
            "bill_number": created.bill_number,
        })),
    ))
}

async fn update_bill(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    payload: Result<Json<BillPayload>, JsonRejection>,
) -> ApiResult<Json<Message>> {
    let Json(mut payload) = payload?;
    let bill_id = parse_bill_id(payload.bill_id.take().as_deref())?;
    let bill = payload.into_new_bill(user.as_ref(), state.config.billing.verify_totals)?;

    state.db.bills().update(bill_id, &bill).await?;
    Ok(Json(Message::new("Bill updated")))
}

async fn delete_bill(
    State(state): State<AppState>,
    query: Result<Query<BillIdQuery>, QueryRejection>,
) -> ApiResult<Json<Message>> {
    let Query(query) = query?;
    let bill_id = parse_bill_id(query.bill_id.as_deref())?;

    state.db.bills().delete(bill_id).await?;
    Ok(Json(Message::new("Bill deleted")))
}
