use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, ManualClock};
use migration::MigratorTrait;

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap(),
    ));
    let engine = Engine::builder()
        .database(db)
        .clock(clock)
        .build()
        .await
        .unwrap();
    server::router(Arc::new(engine))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    client: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(client) = client {
        builder = builder.header("x-client-id", client);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_account(app: &Router, client: &str, name: &str, balance: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/accounts",
        Some(client),
        Some(json!({
            "name": name,
            "currencyId": "HKD",
            "kind": "bank",
            "balance": balance,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn requests_without_client_are_unauthorized() {
    let app = app().await;
    let (status, _) = call(&app, Method::GET, "/accounts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/accounts", Some("  "), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expense_updates_balance_and_overdraw_is_rejected() {
    let app = app().await;
    let account = create_account(&app, "alice", "HSBC", "50.00").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/expenses",
        Some("alice"),
        Some(json!({
            "accountId": account,
            "amount": "20.25",
            "currencyId": "HKD",
            "category": "food",
            "executedAt": "2024-06-14T12:00:00+08:00",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["newBalance"], "29.75");

    let (status, body) = call(
        &app,
        Method::POST,
        "/expenses",
        Some("alice"),
        Some(json!({
            "accountId": account,
            "amount": "30.00",
            "currencyId": "HKD",
            "category": "food",
            "executedAt": "2024-06-14T13:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let (_, body) = call(
        &app,
        Method::GET,
        &format!("/accounts/{account}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(body["data"]["balance"], "29.75");

    let (_, body) = call(&app, Method::GET, "/expenses", Some("alice"), None).await;
    let expenses = body["data"].as_array().unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0]["executedAt"], "2024-06-14T04:00:00Z");
}

#[tokio::test]
async fn delete_with_revert_restores_balance() {
    let app = app().await;
    let account = create_account(&app, "alice", "HSBC", "10.00").await;

    let (_, body) = call(
        &app,
        Method::POST,
        "/transactions",
        Some("alice"),
        Some(json!({
            "accountId": account,
            "name": "Salary",
            "amount": "100.00",
            "isIncome": true,
            "currencyId": "HKD",
            "category": "salary",
            "executedAt": "2024-06-01T00:00:00Z",
        })),
    )
    .await;
    assert_eq!(body["data"]["newBalance"], "110.00");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Wrong kind of entry for this path.
    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/expenses/{id}?revertBalance=true"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &app,
        Method::DELETE,
        &format!("/transactions/{id}?revertBalance=true"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["newBalance"], "10.00");
}

#[tokio::test]
async fn accounts_of_other_clients_are_not_found() {
    let app = app().await;
    let account = create_account(&app, "alice", "HSBC", "10.00").await;

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/accounts/{account}"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (_, body) = call(&app, Method::GET, "/accounts", Some("bob"), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn transfer_between_accounts() {
    let app = app().await;
    let source = create_account(&app, "alice", "HSBC", "100.00").await;
    let target = create_account(&app, "alice", "Hang Seng", "10.00").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/accounts/transfer",
        Some("alice"),
        Some(json!({
            "sourceAccountId": source,
            "targetAccountId": target,
            "amount": "25.50",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["sourceBalance"], "74.50");
    assert_eq!(body["data"]["targetBalance"], "35.50");
    assert_eq!(body["data"]["entryIds"].as_array().unwrap().len(), 2);

    let (status, _) = call(
        &app,
        Method::POST,
        "/accounts/transfer",
        Some("alice"),
        Some(json!({
            "sourceAccountId": source,
            "targetAccountId": target,
            "amount": "1000.00",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn invalid_amount_is_rejected() {
    let app = app().await;
    let account = create_account(&app, "alice", "HSBC", "10.00").await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/expenses",
        Some("alice"),
        Some(json!({
            "accountId": account,
            "amount": "1.234",
            "currencyId": "HKD",
            "category": "food",
            "executedAt": "2024-06-14T13:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn future_payment_lifecycle() {
    let app = app().await;
    let account = create_account(&app, "alice", "HSBC", "10.00").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/future-payments",
        Some("alice"),
        Some(json!({
            "accountId": account,
            "name": "Rent",
            "amount": "80.00",
            "isRolling": true,
            "frequency": 2_592_000,
            "currencyId": "HKD",
            "scheduledAt": "2024-07-01T00:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["frequency"]["days"], 0);
    assert_eq!(body["data"]["frequency"]["months"], 1);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::PUT,
        "/future-payments",
        Some("alice"),
        Some(json!({
            "id": id,
            "accountId": account,
            "name": "Rent",
            "amount": "85.00",
            "isRolling": true,
            "frequency": 604_800,
            "currencyId": "HKD",
            "scheduledAt": "2024-07-01T00:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["amount"], "85.00");
    assert_eq!(body["data"]["frequency"]["days"], 7);

    // Past schedule.
    let (status, _) = call(
        &app,
        Method::POST,
        "/future-payments",
        Some("alice"),
        Some(json!({
            "accountId": account,
            "name": "Late",
            "amount": "1.00",
            "currencyId": "HKD",
            "scheduledAt": "2024-06-01T00:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/future-payments/{id}"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/future-payments/{id}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&app, Method::GET, "/future-payments", Some("alice"), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn account_update_filter_and_delete() {
    let app = app().await;
    let account = create_account(&app, "alice", "HSBC", "50.00").await;

    let (status, body) = call(
        &app,
        Method::PUT,
        "/accounts",
        Some("alice"),
        Some(json!({
            "id": account,
            "balance": "80.00",
            "kind": "cash",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["balance"], "80.00");
    assert_eq!(body["data"]["kind"], "cash");
    assert_eq!(body["data"]["currencyId"], "HKD");

    let (_, body) = call(&app, Method::GET, "/transactions", Some("alice"), None).await;
    let adjustments = body["data"].as_array().unwrap();
    assert_eq!(adjustments.len(), 1);
    assert_eq!(adjustments[0]["amount"], "30.00");
    assert_eq!(adjustments[0]["isIncome"], true);

    let (_, body) = call(&app, Method::GET, "/accounts?kind=cash", Some("alice"), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let (_, body) = call(&app, Method::GET, "/accounts?kind=bank", Some("alice"), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/accounts/{account}"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &app,
        Method::DELETE,
        &format!("/accounts/{account}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["detachedEntries"], 1);

    let (_, body) = call(&app, Method::GET, "/accounts", Some("alice"), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    let (_, body) = call(&app, Method::GET, "/transactions", Some("alice"), None).await;
    assert_eq!(body["data"][0]["accountId"], Value::Null);
}

#[tokio::test]
async fn malformed_requests_get_the_error_envelope() {
    let app = app().await;
    let account = create_account(&app, "alice", "HSBC", "10.00").await;

    // Amount must be a decimal string.
    let (status, body) = call(
        &app,
        Method::POST,
        "/expenses",
        Some("alice"),
        Some(json!({
            "accountId": account,
            "amount": 5,
            "currencyId": "HKD",
            "category": "food",
            "executedAt": "2024-06-14T13:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let (status, body) = call(&app, Method::GET, "/accounts/not-a-uuid", Some("alice"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = call(&app, Method::GET, "/accounts?kind=piggy", Some("alice"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let (status, body) = call(
        &app,
        Method::DELETE,
        &format!("/expenses/{account}?revertBalance=maybe"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
