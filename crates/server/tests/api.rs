use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::{ServerState, router};

async fn test_router() -> (Router, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    let state = ServerState {
        engine: Arc::new(engine),
        db: db.clone(),
    };
    (router(state), db)
}

async fn seed_account(db: &DatabaseConnection, id: &str, username: &str, balance_minor: i64) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO accounts (id, username, balance_minor, is_frozen, created_at) \
         VALUES (?, ?, ?, ?, ?)",
        vec![
            id.into(),
            username.into(),
            balance_minor.into(),
            false.into(),
            Utc::now().into(),
        ],
    ))
    .await
    .unwrap();
}

fn post_json(uri: &str, account: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-account-id", account)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_identity(uri: &str, account: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-account-id", account)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn deposit_returns_the_new_balance() {
    let (app, db) = test_router().await;
    seed_account(&db, "A-100", "alice", 5_000_00).await;

    let response = app
        .oneshot(post_json(
            "/deposit",
            "A-100",
            &json!({ "amount_minor": 100_00 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["balance_minor"], 5_100_00);
}

#[tokio::test]
async fn requests_without_an_identity_are_unauthorized() {
    let (app, _db) = test_router().await;

    let request = Request::builder()
        .method("POST")
        .uri("/deposit")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "amount_minor": 100 }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_identities_are_unauthorized() {
    let (app, _db) = test_router().await;

    let response = app
        .oneshot(post_json(
            "/deposit",
            "A-999",
            &json!({ "amount_minor": 100 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn policy_rejections_carry_a_specific_reason() {
    let (app, db) = test_router().await;
    seed_account(&db, "A-100", "alice", 5_000_00).await;

    let response = app
        .oneshot(post_json(
            "/withdraw",
            "A-100",
            &json!({ "amount_minor": 50_00 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid amount: minimum withdrawal is 100.00");
}

#[tokio::test]
async fn frozen_accounts_map_to_forbidden() {
    let (app, db) = test_router().await;
    seed_account(&db, "A-100", "alice", 5_000_00).await;
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE accounts SET is_frozen = ? WHERE id = ?",
        vec![true.into(), "A-100".into()],
    ))
    .await
    .unwrap();

    let response = app
        .oneshot(post_json(
            "/withdraw",
            "A-100",
            &json!({ "amount_minor": 100_00 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn transfer_settles_and_shows_up_in_history() {
    let (app, db) = test_router().await;
    seed_account(&db, "A-100", "alice", 5_000_00).await;
    seed_account(&db, "B-200", "bob", 2_000_00).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/transfer",
            "A-100",
            &json!({ "recipient": "bob", "amount_minor": 3_000_00 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["balance_minor"], 2_000_00);
    assert_eq!(body["reference"].as_str().unwrap().len(), 8);

    let response = app
        .oneshot(get_with_identity("/transactions?filter=Sent", "A-100"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["transactions"][0]["kind"], "TRANSFER");
    assert_eq!(body["transactions"][0]["receiver_name"], "bob");
}

#[tokio::test]
async fn unknown_recipients_map_to_not_found() {
    let (app, db) = test_router().await;
    seed_account(&db, "A-100", "alice", 5_000_00).await;

    let response = app
        .oneshot(post_json(
            "/transfer",
            "A-100",
            &json!({ "recipient": "nobody", "amount_minor": 100_00 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn high_value_transfers_without_a_code_are_unauthorized() {
    let (app, db) = test_router().await;
    seed_account(&db, "A-100", "alice", 30_000_00).await;
    seed_account(&db, "B-200", "bob", 0).await;

    let response = app
        .oneshot(post_json(
            "/transfer",
            "A-100",
            &json!({ "recipient": "bob", "amount_minor": 15_000_00 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn challenges_are_accepted_without_leaking_the_code() {
    let (app, db) = test_router().await;
    seed_account(&db, "A-100", "alice", 30_000_00).await;

    let response = app
        .oneshot(post_json(
            "/transfer/challenge",
            "A-100",
            &json!({ "amount_minor": 15_000_00 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({ "accepted": true }));
}

#[tokio::test]
async fn history_reports_the_pagination_block() {
    let (app, db) = test_router().await;
    seed_account(&db, "A-100", "alice", 5_000_00).await;

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(post_json(
                "/deposit",
                "A-100",
                &json!({ "amount_minor": 100_00 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(get_with_identity(
            "/transactions?page=2&page_size=2",
            "A-100",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["page"], 2);
    assert_eq!(body["page_size"], 2);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["transactions"].as_array().unwrap().len(), 1);
}
