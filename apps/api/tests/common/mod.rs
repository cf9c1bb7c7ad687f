//! Shared harness for the HTTP tests.
//!
//! Drives the real router with `tower::ServiceExt::oneshot` against an
//! in-memory database.

#![allow(dead_code)]

use axum::body::Body;
use axum::Router;
use billdesk_api::auth::hash_password;
use billdesk_api::config::ApiConfig;
use billdesk_api::{build_router, AppState};
use billdesk_core::{NewUser, Role};
use billdesk_db::{Database, DbConfig};
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(ApiConfig::default()).await
    }

    pub async fn with_config(config: ApiConfig) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(db, config);
        TestApp {
            router: build_router(state.clone()),
            state,
        }
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Creates a user and returns a bearer token for it.
    pub async fn token_for(&self, name: &str, email: &str, password: &str, role: Role) -> String {
        let (id, _) = self
            .db()
            .users()
            .insert(&NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: hash_password(password).unwrap(),
                role,
                phone: None,
                address: None,
            })
            .await
            .unwrap();
        let user = self.db().users().get(id).await.unwrap().unwrap();
        self.state.jwt.generate_token(&user).unwrap()
    }

    pub async fn admin_token(&self) -> String {
        self.token_for("Store Admin", "admin@example.com", "admin123", Role::Admin)
            .await
    }

    pub async fn cashier_token(&self) -> String {
        self.token_for("Ram", "ram@example.com", "cashier123", Role::Cashier)
            .await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, None, token).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.send(Method::POST, uri, Some(body), token).await
    }

    pub async fn put(&self, uri: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.send(Method::PUT, uri, Some(body), token).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, uri, None, token).await
    }
}

/// A bill whose totals add up: 2 × 100.00, 10.00 off, 13% VAT.
pub fn bill_body() -> Value {
    serde_json::json!({
        "customer_name": "Walk-in",
        "subtotal": 200,
        "discount": 10,
        "discount_type": "amount",
        "vat_rate": 13,
        "vat_amount": 24.7,
        "net_amount": 214.7,
        "date_time": "2024-05-15 10:30:00",
        "status": "paid",
        "payment_method": "cash",
        "items": [
            {"product_id": "p-1", "product_name": "Rice", "quantity": 2, "price": 100, "total_price": 200}
        ]
    })
}
