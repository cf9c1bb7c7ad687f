//! HTTP tests for products, expenses, sales, reports and health.

mod common;

use common::{bill_body, TestApp};
use http::StatusCode;
use serde_json::json;

fn product_body() -> serde_json::Value {
    json!({
        "name": "Basmati Rice",
        "category": "Grocery",
        "unit": "kg",
        "selling_price": 180,
        "cost_price": 150,
        "stock": 5,
        "min_stock": 10
    })
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let health = app.get("/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "ok");
    assert_eq!(health.body["database"], "connected");
    assert_eq!(health.body["migrations"]["total"], health.body["migrations"]["applied"]);
}

#[tokio::test]
async fn test_product_add_update_delete() {
    let app = TestApp::new().await;
    let token = app.cashier_token().await;

    let added = app.post("/products", product_body(), Some(&token)).await;
    assert_eq!(added.status, StatusCode::OK);
    assert_eq!(added.body["message"], "Product added");
    let id = added.body["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 32);

    let mut body = product_body();
    body["id"] = json!(id);
    body["stock"] = json!(50);
    let updated = app.post("/products", body, Some(&token)).await;
    assert_eq!(updated.body["message"], "Product updated");

    let listed = app.get("/products", None).await;
    let product = &listed.body[0];
    assert_eq!(product["stock"], 50);
    assert_eq!(product["created_by"], "Ram");
    assert_eq!(product["updated_by"], "Ram");

    let missing = app.delete("/products", None).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"], "Missing id parameter");

    let deleted = app.delete(&format!("/products?id={id}"), None).await;
    assert_eq!(deleted.body["message"], "Product deleted");
    assert!(app.get("/products", None).await.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_product_validation() {
    let app = TestApp::new().await;

    let mut negative = product_body();
    negative["cost_price"] = json!(-5);
    let response = app.post("/products", negative, None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "cost_price must be a non-negative number");

    let mut unknown = product_body();
    unknown["id"] = json!("does-not-exist");
    let response = app.post("/products", unknown, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expenses_require_auth() {
    let app = TestApp::new().await;
    let body = json!({"description": "Rent", "category": "Rent", "amount": 5000, "date": "2024-05-01"});

    let anonymous = app.post("/expenses", body, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.body["error"], "Unauthorized");

    let anonymous = app.delete("/expenses?id=1", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expense_lifecycle() {
    let app = TestApp::new().await;
    let token = app.cashier_token().await;

    let added = app
        .post(
            "/expenses",
            json!({
                "description": "Electricity",
                "category": "Utilities",
                "amount": "1500.50",
                "date": "2024-05-10",
                "payment_method": "bank",
                "is_recurring": 1,
                "recurring_frequency": "monthly"
            }),
            Some(&token),
        )
        .await;
    assert_eq!(added.body["message"], "Expense added");
    let id = added.body["id"].as_i64().unwrap();

    let listed = app.get("/expenses", None).await;
    let expense = &listed.body[0];
    assert_eq!(expense["paymentMethod"], "bank");
    assert_eq!(expense["isRecurring"], true);
    assert_eq!(expense["recurringFrequency"], "monthly");
    assert_eq!(expense["createdBy"], "Ram");
    assert_eq!(expense["amount"], "1500.50");

    let updated = app
        .post(
            "/expenses",
            json!({"id": id, "description": "Electricity (May)", "category": "Utilities",
                   "amount": 1600, "date": "2024-05-10"}),
            Some(&token),
        )
        .await;
    assert_eq!(updated.body["message"], "Expense updated");

    let distinct = app.get("/expenses/categories/distinct", None).await;
    assert_eq!(
        distinct.body,
        json!([{"id": "Utilities", "name": "Utilities", "description": "", "color": "#6B7280", "isActive": true}])
    );

    let deleted = app.delete(&format!("/expenses?id={id}"), Some(&token)).await;
    assert_eq!(deleted.body["message"], "Expense deleted");
}

#[tokio::test]
async fn test_expense_categories() {
    let app = TestApp::new().await;
    let token = app.cashier_token().await;

    let blank = app.post("/expenses/categories", json!({"name": "  "}), Some(&token)).await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert_eq!(blank.body["error"], "Category name is required");

    let added = app.post("/expenses/categories", json!({"name": "Fuel"}), Some(&token)).await;
    assert_eq!(added.body["message"], "Category added");

    let duplicate = app.post("/expenses/categories", json!({"name": "FUEL"}), Some(&token)).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.body["error"], "Category already exists");

    let active = app.get("/expenses/categories", None).await;
    let fuel = active
        .body
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Fuel")
        .unwrap()
        .clone();
    assert_eq!(fuel["color"], "#6B7280");
}

#[tokio::test]
async fn test_sales_listing_and_manual_entry() {
    let app = TestApp::new().await;
    let token = app.cashier_token().await;

    let anonymous = app.get("/sales", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let invalid = app.get("/sales?period=hourly", Some(&token)).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["error"], "Invalid period parameter");

    app.post("/bills", bill_body(), None).await;
    let added = app
        .post(
            "/sales",
            json!({"productName": "Tea", "invoiceNumber": "MANUAL-1", "dateSold": "2024-05-16",
                   "amount": 45, "category": "Beverages"}),
            Some(&token),
        )
        .await;
    assert_eq!(added.status, StatusCode::CREATED);
    assert_eq!(added.body["message"], "Sale added successfully");

    let all = app.get("/sales?period=all", Some(&token)).await;
    let rows = all.body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["product_name"], "Tea");
    assert_eq!(rows[0]["user"], "Ram");

    let search = app.get("/sales?search=B-1000", Some(&token)).await;
    assert_eq!(search.body.as_array().unwrap().len(), 1);

    let bad_date = app
        .post(
            "/sales",
            json!({"productName": "Tea", "invoiceNumber": "M-2", "dateSold": "16/05/2024",
                   "amount": 45, "category": "Beverages"}),
            Some(&token),
        )
        .await;
    assert_eq!(bad_date.body["error"], "Invalid date format. Use YYYY-MM-DD");
}

#[tokio::test]
async fn test_summary_report() {
    let app = TestApp::new().await;
    let token = app.cashier_token().await;

    app.post("/products", product_body(), None).await;
    app.post("/bills", bill_body(), None).await;
    let mut cancelled = bill_body();
    cancelled["status"] = json!("cancelled");
    app.post("/bills", cancelled, None).await;
    app.post(
        "/expenses",
        json!({"description": "Rent", "category": "Rent", "amount": 100, "date": "2024-05-01"}),
        Some(&token),
    )
    .await;

    let anonymous = app.get("/reports/summary", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let report = app.get("/reports/summary", Some(&token)).await;
    assert_eq!(report.status, StatusCode::OK);
    assert_eq!(report.body["bill_count"], 2);
    assert_eq!(report.body["cancelled_bills"], 1);
    assert_eq!(report.body["total_sales"], "214.70");
    assert_eq!(report.body["total_expenses"], "100.00");
    assert_eq!(report.body["net_profit"], "114.70");
    assert_eq!(report.body["low_stock_products"], 1);

    let june = app
        .get("/reports/summary?from=2024-06-01&to=2024-06-30", Some(&token))
        .await;
    assert_eq!(june.body["bill_count"], 0);

    let half = app.get("/reports/summary?from=2024-06-01", Some(&token)).await;
    assert_eq!(half.status, StatusCode::BAD_REQUEST);
}
