// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use lead_desk::config::Config;
use lead_desk::db::{LeadStore, MemoryDb};
use lead_desk::middleware::auth::create_session_jwt;
use lead_desk::models::{LeadStatus, User};
use lead_desk::routes::create_router;
use lead_desk::services::AuthClient;
use lead_desk::AppState;
use std::sync::Arc;

/// Create a test app on top of an arbitrary store.
#[allow(dead_code)]
pub fn create_test_app_with_store(db: Arc<dyn LeadStore>) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let auth = AuthClient::new(&config);

    let state = Arc::new(AppState { config, db, auth });

    (create_router(state.clone()), state)
}

/// Create a test app backed by an in-memory store seeded with `rows`.
/// Returns the router, the shared state, and a handle on the store.
#[allow(dead_code)]
pub fn create_test_app(rows: Vec<User>) -> (axum::Router, Arc<AppState>, MemoryDb) {
    let db = MemoryDb::with_rows(rows);
    let (app, state) = create_test_app_with_store(Arc::new(db.clone()));
    (app, state, db)
}

/// Session token accepted by the test app.
#[allow(dead_code)]
pub fn session_token(state: &AppState) -> String {
    create_session_jwt(
        "00000000-0000-0000-0000-000000000001",
        Some("ops@example.com"),
        &state.config.jwt_secret,
        3600,
    )
    .unwrap()
}

/// GET `uri` with a valid bearer session.
#[allow(dead_code)]
pub fn authed_get(state: &AppState, uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", session_token(state)))
        .body(Body::empty())
        .unwrap()
}

/// Send `body` as JSON with a valid bearer session.
#[allow(dead_code)]
pub fn authed_json(state: &AppState, method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", session_token(state)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A lead row with sensible defaults.
#[allow(dead_code)]
pub fn lead(id: i64, status: &str, created: &str) -> User {
    User {
        userid: id,
        username: Some(format!("tg_user_{}", id)),
        first_name: format!("Lead{}", id),
        last_name: Some("Tester".to_string()),
        language_code: Some("en".to_string()),
        phone_number: Some(format!("+99890{:07}", id)),
        onboarding: Some(false),
        status: Some(LeadStatus::from(status.to_string())),
        lead_type: Some("free".to_string()),
        attended: None,
        remarks: None,
        created_at: created.to_string(),
        updated_at: created.to_string(),
    }
}
