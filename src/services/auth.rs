// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supabase GoTrue client for dashboard sign-in.
//!
//! Handles:
//! - Email/password sign-in (password grant)
//! - Server-side sign-out of an access token

use crate::config::Config;
use crate::error::AppError;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// GoTrue API client.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Session returned by a successful sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until `access_token` expires
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: AuthUser,
}

/// Dashboard operator as known to GoTrue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("{}/auth/v1", config.supabase_url),
            api_key: config.supabase_anon_key.clone(),
        }
    }

    /// Exchange email and password for a session.
    ///
    /// Rejected credentials map to [`AppError::Unauthorized`].
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.base_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .map_err(|e| AppError::AuthProvider(format!("Sign-in request failed: {}", e)))?;

        let session: AuthSession = Self::check_response_json(response).await?;
        tracing::info!(user_id = %session.user.id, "Operator signed in");
        Ok(session)
    }

    /// Revoke the session behind an access token.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(format!("{}/logout", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::AuthProvider(format!("Sign-out request failed: {}", e)))?;

        Self::check_response(response).await?;
        Ok(())
    }

    /// Check response status and return error if not successful.
    async fn check_response(response: Response) -> Result<Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
            tracing::debug!(%status, "Credentials rejected by auth provider");
            return Err(AppError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::AuthProvider(format!("HTTP {}: {}", status, body)))
    }

    async fn check_response_json<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
        Self::check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::AuthProvider(format!("JSON parse error: {}", e)))
    }
}
