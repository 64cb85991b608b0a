mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use schoolhub_api::{
    config::{Config, StoreBackend},
    models::user::UserRole,
    routes,
    store::MemoryStore,
    AppState,
};

use common::{add_student, add_user};

fn app(store: &MemoryStore) -> Router {
    let config = Config {
        database_url: String::new(),
        jwt_secret: "test-secret".into(),
        jwt_expiry_seconds: 900,
        host: "127.0.0.1".into(),
        port: 0,
        app_base_url: "http://localhost".into(),
        strict_class_access: false,
        count_late_as_present: true,
        store_backend: StoreBackend::Memory,
    };
    routes::app(AppState {
        store: Arc::new(store.clone()),
        config: Arc::new(config),
    })
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn login_rejects_bad_password_and_protects_routes() {
    let store = MemoryStore::new();
    add_user(&store, "admin@school.test", "s3cret", UserRole::Admin).await;
    let app = app(&store);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "admin@school.test", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/students", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app, "admin@school.test", "s3cret").await;
    let (status, me) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["role"], "admin");
    assert_eq!(me["classes"].as_array().unwrap().len(), 12);

    let (status, health) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
}

#[tokio::test]
async fn fee_payment_flow_over_http() {
    let store = MemoryStore::new();
    add_user(&store, "admin@school.test", "s3cret", UserRole::Admin).await;
    let s = add_student(&store, "1", "8", "A").await;
    let app = app(&store);
    let token = login(&app, "admin@school.test", "s3cret").await;

    let (status, dues) = send(
        &app,
        Method::POST,
        "/fees",
        Some(&token),
        Some(json!({
            "student_ids": [s.id],
            "fee_type": "tuition",
            "amount": 1000.0,
            "due_date": "2025-07-10",
            "academic_year": "2025-26",
            "term": "Term 1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{dues}");
    let fee_id = dues[0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/fees/{fee_id}/payments"),
        Some(&token),
        Some(json!({ "amount": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "amount");

    let (status, payment) = send(
        &app,
        Method::POST,
        &format!("/fees/{fee_id}/payments"),
        Some(&token),
        Some(json!({ "amount": 400 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payment["status"], "paid");
    assert_eq!(payment["amount"], 400.0);

    let (status, totals) = send(
        &app,
        Method::GET,
        "/fees/class-dues?class=8&section=A",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(totals[0]["total_due"], 600.0);

    let (status, check) =
        send(&app, Method::GET, &format!("/fees/{fee_id}/ledger"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["balanced"], true);
}

#[tokio::test]
async fn assigned_teacher_is_forbidden_elsewhere() {
    let store = MemoryStore::new();
    let admin = add_user(&store, "admin@school.test", "s3cret", UserRole::Admin).await;
    let teacher = add_user(&store, "teacher@school.test", "chalk", UserRole::Teacher).await;
    let other = add_student(&store, "1", "9", "B").await;
    let app = app(&store);
    let admin_token = login(&app, &admin.email, "s3cret").await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/users/{}/assignments", teacher.id),
        Some(&admin_token),
        Some(json!({ "class": "8", "section": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let token = login(&app, &teacher.email, "chalk").await;
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/students/{}", other.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("class 9 section B"));

    let (status, scope) = send(&app, Method::GET, "/access/scope?class=8", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scope["classes"], json!(["8"]));
    assert_eq!(scope["sections"], json!(["A"]));

    let (status, body) = send(
        &app,
        Method::POST,
        "/attendance",
        Some(&token),
        Some(json!({ "records": [
            { "student_id": other.id, "date": "2025-09-01", "status": "present" }
        ] })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (status, _) = send(
        &app,
        Method::POST,
        "/attendance",
        Some(&token),
        Some(json!({ "records": [
            { "student_id": other.id, "date": "2025-09-01", "status": "sick" }
        ] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
