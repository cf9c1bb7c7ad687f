//! User directory endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use billdesk_core::User;

use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/users", get(list_users))
}

/// Password hashes never serialize.
async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.db.users().list().await?))
}
