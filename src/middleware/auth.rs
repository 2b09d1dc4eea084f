// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session gate for dashboard routes.
//!
//! The session token is the Supabase access token: an HS256 JWT signed
//! with the project's JWT secret and issued for the `authenticated`
//! audience. It is verified locally, without a round-trip to GoTrue.

use crate::config::{Config, SESSION_COOKIE};
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Audience claim on operator session tokens.
pub const SESSION_AUDIENCE: &str = "authenticated";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (GoTrue user ID)
    pub sub: String,
    pub aud: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Signed-in operator extracted from the session token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub email: Option<String>,
}

/// Verify a session token and return its operator.
pub fn verify_session_token(token: &str, secret: &[u8]) -> Result<SessionUser, AppError> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[SESSION_AUDIENCE]);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        AppError::InvalidToken
    })?;

    Ok(SessionUser {
        id: token_data.claims.sub,
        email: token_data.claims.email,
    })
}

/// Candidate session tokens: the cookie first, then a bearer header.
fn session_tokens<'a>(
    jar: &'a CookieJar,
    headers: &'a HeaderMap,
) -> impl Iterator<Item = &'a str> {
    let cookie = jar.get(SESSION_COOKIE).map(|c| c.value());
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    cookie.into_iter().chain(bearer)
}

/// Resolve the current operator, if the request carries a valid session.
///
/// A stale cookie does not shadow a valid bearer token.
pub fn current_session(config: &Config, jar: &CookieJar, headers: &HeaderMap) -> Option<SessionUser> {
    session_tokens(jar, headers)
        .find_map(|token| verify_session_token(token, &config.jwt_secret).ok())
}

/// Redirect to the frontend login page, remembering where the user was going.
pub fn login_redirect(frontend_url: &str, path: &str) -> Redirect {
    Redirect::temporary(&format!(
        "{}/login?redirectedFrom={}",
        frontend_url.trim_end_matches('/'),
        urlencoding::encode(path)
    ))
}

/// Middleware that requires a valid session.
///
/// Requests without one are redirected to the login page; no error body
/// is returned.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match current_session(&state.config, &jar, request.headers()) {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => {
            let path = request.uri().path().to_string();
            tracing::debug!(path = %path, "No valid session, redirecting to login");
            login_redirect(&state.config.frontend_url, &path).into_response()
        }
    }
}

/// Mint a session token the way GoTrue does.
///
/// Used by local tooling and tests; production tokens come from GoTrue.
pub fn create_session_jwt(
    user_id: &str,
    email: Option<&str>,
    secret: &[u8],
    ttl_secs: usize,
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        aud: SESSION_AUDIENCE.to_string(),
        iat: now,
        exp: now + ttl_secs,
        email: email.map(str::to_string),
        role: Some("authenticated".to_string()),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_jwt_secret_32_bytes_minimum!";

    #[test]
    fn test_round_trip_session_token() {
        let token = create_session_jwt("op-1", Some("ops@example.com"), SECRET, 3600).unwrap();
        let user = verify_session_token(&token, SECRET).unwrap();
        assert_eq!(user.id, "op-1");
        assert_eq!(user.email.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_session_jwt("op-1", None, SECRET, 3600).unwrap();
        let err = verify_session_token(&token, b"another_secret_of_some_length!!").unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let claims = Claims {
            sub: "anon".to_string(),
            aud: "anon".to_string(),
            iat: 1,
            exp: usize::MAX / 2,
            email: None,
            role: Some("anon".to_string()),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(verify_session_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_stale_cookie_falls_back_to_bearer() {
        use axum::http::HeaderValue;
        use axum_extra::extract::cookie::Cookie;

        let mut config = Config::test_default();
        config.jwt_secret = SECRET.to_vec();
        let token = create_session_jwt("op-2", None, SECRET, 3600).unwrap();

        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "expired.bad.token"));
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        let user = current_session(&config, &jar, &headers).unwrap();
        assert_eq!(user.id, "op-2");
        assert!(current_session(&config, &jar, &HeaderMap::new()).is_none());
    }

    #[test]
    fn test_login_redirect_encodes_path() {
        let redirect = login_redirect("http://localhost:3000/", "/api/users/42");
        let response = redirect.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "http://localhost:3000/login?redirectedFrom=%2Fapi%2Fusers%2F42"
        );
    }
}
