// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Operator sign-in routes (public).

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::config::{Config, SESSION_COOKIE};
use crate::error::{AppError, Result};
use crate::middleware::auth::current_session;
use crate::middleware::SessionUser;
use crate::services::AuthUser;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/check", get(check))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}

/// Session cookie carrying `token`.
fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(config.frontend_url.starts_with("https://"))
        .same_site(SameSite::Lax)
        .build()
}

// ─── Session check ───────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCheckResponse {
    pub authenticated: bool,
    pub user: Option<SessionUser>,
    pub supabase_url: String,
    /// Whether an anon key is configured; the key itself is never sent.
    pub has_supabase_key: bool,
}

async fn check(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Json<AuthCheckResponse> {
    let user = current_session(&state.config, &jar, &headers);

    Json(AuthCheckResponse {
        authenticated: user.is_some(),
        user,
        supabase_url: state.config.supabase_url.clone(),
        has_supabase_key: !state.config.supabase_anon_key.is_empty(),
    })
}

// ─── Login / logout ──────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user: AuthUser,
    pub expires_in: i64,
}

/// Sign in with email and password and set the session cookie.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let session = state
        .auth
        .sign_in_with_password(request.email.trim(), &request.password)
        .await?;

    let jar = jar.add(session_cookie(&state.config, session.access_token));

    Ok((
        jar,
        Json(LoginResponse {
            user: session.user,
            expires_in: session.expires_in,
        }),
    ))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Clear the session cookie. The token is revoked upstream on a best-effort basis.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = state.auth.sign_out(cookie.value()).await {
            tracing::warn!(error = %e, "Upstream sign-out failed; clearing cookie anyway");
        }
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(LogoutResponse { success: true }))
}
