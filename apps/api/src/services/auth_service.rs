//! Authentication endpoints.
//!
//! ## Login Flow
//! ```text
//! POST /login {email, password}
//!      │
//!      ├── unknown email or wrong password ──► 401 "Invalid email or password"
//!      ├── account disabled               ──► 403
//!      ▼
//! touch last_active, sign JWT ──► {token, user}
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use billdesk_core::validation::{normalize_email, required, required_text, validate_name, validate_password};
use billdesk_core::{NewUser, Role};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub employee_id: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
}

/// Parses a role name, case-insensitively.
pub(crate) fn parse_role(value: &str) -> ApiResult<Role> {
    value
        .trim()
        .to_lowercase()
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid role. Must be 'admin' or 'cashier'."))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(request) = payload?;
    let email = required_text("email", request.email)?;
    let password = required("password", request.password)?;

    let Some(user) = state.db.users().find_by_email(email.trim()).await? else {
        warn!("Login failed: unknown email");
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    };

    if !verify_password(&password, &user.password_hash) {
        warn!(user_id = user.id, "Login failed: wrong password");
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    }

    if !user.is_active {
        warn!(user_id = user.id, "Login refused: account disabled");
        return Err(ApiError::Forbidden("Account is disabled".to_string()));
    }

    state.db.users().touch_last_active(user.id).await?;
    let token = state.jwt.generate_token(&user)?;

    info!(user_id = user.id, role = %user.role, "User logged in");
    Ok(Json(LoginResponse {
        message: "Login successful",
        token,
        token_type: "Bearer",
        expires_in: state.jwt.lifetime_secs(),
        user: SessionUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            employee_id: user.employee_id,
        },
    }))
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;

    let name = required_text("name", request.name)?;
    let email = required_text("email", request.email)?;
    let password = required("password", request.password)?;
    let role = required_text("role", request.role)?;

    validate_name("name", &name)?;
    let email = normalize_email(&email)?;
    let role = parse_role(&role)?;
    validate_password(&password)?;

    let user = NewUser {
        name,
        email,
        password_hash: hash_password(&password)?,
        role,
        phone: request.phone,
        address: request.address,
    };
    let (_, employee_id) = state.db.users().insert(&user).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "role": role,
            "employee_id": employee_id,
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("Admin").unwrap(), Role::Admin);
        assert_eq!(parse_role(" cashier ").unwrap(), Role::Cashier);
        let err = parse_role("manager").unwrap_err();
        assert_eq!(err.to_string(), "Invalid role. Must be 'admin' or 'cashier'.");
    }
}
