//! Product catalogue endpoints.
//!
//! `POST /products` both adds and edits: a body with a non-blank `id` is an
//! update, otherwise a new product with a generated id.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use billdesk_core::validation::{optional_text, required, required_text, validate_new_product};
use billdesk_core::{Money, NewProduct, Product};
use serde::{Deserialize, Serialize};

use super::{string_or_number, IdQuery, Message};
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductPayload {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub selling_price: Option<Money>,
    pub cost_price: Option<Money>,
    pub stock: Option<i64>,
    pub min_stock: Option<i64>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub barcode: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "createdBy")]
    pub created_by: Option<String>,
    #[serde(rename = "updatedBy")]
    pub updated_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductAdded {
    pub message: &'static str,
    pub id: String,
}

impl ProductPayload {
    fn to_new_product(&self) -> ApiResult<NewProduct> {
        let product = NewProduct {
            name: required_text("name", self.name.clone())?,
            category: required_text("category", self.category.clone())?,
            unit: required_text("unit", self.unit.clone())?,
            selling_price: required("selling_price", self.selling_price)?,
            cost_price: required("cost_price", self.cost_price)?,
            stock: required("stock", self.stock)?,
            min_stock: required("min_stock", self.min_stock)?,
            barcode: optional_text(self.barcode.clone()),
            description: optional_text(self.description.clone()),
        };
        validate_new_product(&product)?;
        Ok(product)
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/products",
        get(list_products).post(save_product).delete(delete_product),
    )
}

async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().list().await?))
}

async fn save_product(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    payload: Result<Json<ProductPayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let product = payload.to_new_product()?;
    let token_name = user.map(|u| u.name);

    match optional_text(payload.id) {
        Some(id) => {
            let operator = token_name.or(optional_text(payload.updated_by));
            state
                .db
                .products()
                .update(&id, &product, operator.as_deref())
                .await?;
            Ok(Json(Message::new("Product updated")).into_response())
        }
        None => {
            let operator = token_name.or(optional_text(payload.created_by));
            let id = state
                .db
                .products()
                .insert(&product, operator.as_deref())
                .await?;
            Ok(Json(ProductAdded {
                message: "Product added",
                id,
            })
            .into_response())
        }
    }
}

async fn delete_product(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> ApiResult<Json<Message>> {
    let Query(query) = query?;
    let id = query
        .value()
        .ok_or_else(|| ApiError::bad_request("Missing id parameter"))?;

    state.db.products().delete(id).await?;
    Ok(Json(Message::new("Product deleted")))
}
