//! End-to-end flows against Postgres. Run with
//! `DATABASE_URL=postgres://... cargo test -- --ignored`.

use std::time::Duration;

use asset_tracker_backend::{create_app, AppState, Config};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

fn app(pool: PgPool) -> Router {
    let config = Config {
        database_url: String::new(),
        database_max_connections: 1,
        listen_addr: ([127, 0, 0, 1], 0).into(),
        frontend_url: "http://localhost:3000".into(),
        jwt_secret: "db-flow-test-secret-0123456789abcdef".into(),
        jwt_ttl: chrono::Duration::days(7),
        rate_limit_window: Duration::from_secs(900),
        rate_limit_max_requests: 10_000,
        trust_proxy: false,
    };
    create_app(AppState::new(pool, &config))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"email": email, "password": "Secur3Pass", "name": "Tester"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn create_asset(app: &Router, token: &str, body: Value) -> Value {
    let (status, created) = call(app, Method::POST, "/api/assets", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    created["data"].clone()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn second_login_invalidates_first_token(pool: PgPool) {
    let app = app(pool);
    let first = register(&app, "hanako@example.com").await;

    let (status, _) = call(&app, Method::GET, "/api/auth/me", Some(&first), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "hanako@example.com", "password": "Secur3Pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::GET, "/api/auth/me", Some(&first), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Session is invalid or expired");

    let (status, body) = call(&app, Method::POST, "/api/auth/verify", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], true);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn duplicate_registration_and_bad_login(pool: PgPool) {
    let app = app(pool);
    register(&app, "taro@example.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"email": "taro@example.com", "password": "Secur3Pass", "name": "Taro"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_EMAIL");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "taro@example.com", "password": "Wr0ngPass"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Invalid email or password");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn logout_revokes_session(pool: PgPool) {
    let app = app(pool);
    let token = register(&app, "jiro@example.com").await;

    let (status, _) = call(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn create_defaults_current_price_and_currency(pool: PgPool) {
    let app = app(pool);
    let token = register(&app, "owner@example.com").await;

    let asset = create_asset(
        &app,
        &token,
        json!({
            "categoryId": "stocks",
            "name": "Toyota",
            "quantity": 100,
            "acquisitionPrice": 2500,
            "acquisitionDate": "2024-04-01"
        }),
    )
    .await;

    assert_eq!(asset["currentPrice"], 2500.0);
    assert_eq!(asset["currency"], "JPY");
    assert_eq!(asset["gainLoss"], 0.0);
    assert_eq!(asset["category"]["id"], "stocks");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn unknown_category_is_not_found(pool: PgPool) {
    let app = app(pool);
    let token = register(&app, "owner@example.com").await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/assets",
        Some(&token),
        Some(json!({
            "categoryId": "art",
            "name": "Painting",
            "quantity": 1,
            "acquisitionPrice": 1000,
            "acquisitionDate": "2024-04-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn non_owner_cannot_delete_or_read(pool: PgPool) {
    let app = app(pool);
    let owner = register(&app, "owner@example.com").await;
    let intruder = register(&app, "intruder@example.com").await;

    let asset = create_asset(
        &app,
        &owner,
        json!({
            "categoryId": "crypto",
            "name": "Bitcoin",
            "symbol": "BTC",
            "quantity": 0.5,
            "acquisitionPrice": 5000000,
            "acquisitionDate": "2023-01-10"
        }),
    )
    .await;
    let uri = format!("/api/assets/{}", asset["id"].as_str().unwrap());

    let (status, _) = call(&app, Method::DELETE, &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, Method::GET, &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn price_update_records_history(pool: PgPool) {
    let app = app(pool);
    let token = register(&app, "owner@example.com").await;
    let asset = create_asset(
        &app,
        &token,
        json!({
            "categoryId": "stocks",
            "name": "Sony",
            "quantity": 10,
            "acquisitionPrice": 100,
            "acquisitionDate": "2024-01-01"
        }),
    )
    .await;
    let uri = format!("/api/assets/{}", asset["id"].as_str().unwrap());

    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("{uri}/price"),
        Some(&token),
        Some(json!({"currentPrice": 150})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currentValue"], 1500.0);

    let (_, body) = call(&app, Method::GET, &uri, Some(&token), None).await;
    let history = body["data"]["priceHistory"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["price"], 150.0);
    assert_eq!(history[0]["source"], "manual");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn gain_loss_sort_is_global_across_pages(pool: PgPool) {
    let app = app(pool);
    let token = register(&app, "owner@example.com").await;

    for (name, current) in [("a", 110), ("b", 300), ("c", 90), ("d", 200)] {
        create_asset(
            &app,
            &token,
            json!({
                "categoryId": "stocks",
                "name": name,
                "quantity": 1,
                "acquisitionPrice": 100,
                "currentPrice": current,
                "acquisitionDate": "2024-01-01"
            }),
        )
        .await;
    }

    let (_, first) = call(
        &app,
        Method::GET,
        "/api/assets?sort=gainLoss&order=desc&limit=2&page=1",
        Some(&token),
        None,
    )
    .await;
    let (_, second) = call(
        &app,
        Method::GET,
        "/api/assets?sort=gainLoss&order=desc&limit=2&page=2",
        Some(&token),
        None,
    )
    .await;

    let names = |page: &Value| -> Vec<String> {
        page["data"]["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["name"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(names(&first), vec!["b", "d"]);
    assert_eq!(names(&second), vec!["a", "c"]);
    assert_eq!(first["data"]["pagination"]["total"], 4);
    assert_eq!(first["data"]["pagination"]["pages"], 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn portfolio_summary_matches_worked_example(pool: PgPool) {
    let app = app(pool);
    let token = register(&app, "owner@example.com").await;

    for (quantity, acquisition, current) in [(10, 100, 150), (5, 200, 180)] {
        create_asset(
            &app,
            &token,
            json!({
                "categoryId": "stocks",
                "name": "holding",
                "quantity": quantity,
                "acquisitionPrice": acquisition,
                "currentPrice": current,
                "acquisitionDate": "2024-01-01"
            }),
        )
        .await;
    }

    let (status, body) = call(&app, Method::GET, "/api/portfolio/summary", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalValue"], 2400.0);
    assert_eq!(body["data"]["totalGainLoss"], 400.0);
    assert_eq!(body["data"]["totalGainLossPercent"], 20.0);
    assert_eq!(body["data"]["categories"][0]["percentage"], 100.0);

    let (status, _) = call(&app, Method::POST, "/api/portfolio/snapshot", Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, body) = call(&app, Method::GET, "/api/portfolio/history?period=1w", Some(&token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
