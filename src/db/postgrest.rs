// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supabase PostgREST client with typed operations on the `users` table.
//!
//! Every request carries the project `apikey` header plus a bearer key.
//! Failures are not retried.

use crate::config::Config;
use crate::db::query::{Page, UserFilter, UserQuery};
use crate::db::{tables, LeadStore};
use crate::error::AppError;
use crate::models::{User, UserPatch};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_RANGE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// PostgREST database client.
#[derive(Clone)]
pub struct PostgrestDb {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    bearer: String,
}

impl PostgrestDb {
    /// Create a client for the configured Supabase project.
    pub fn new(config: &Config) -> Self {
        tracing::info!(url = %config.supabase_url, "Using Supabase PostgREST store");
        Self {
            http: reqwest::Client::new(),
            base_url: format!("{}/rest/v1", config.supabase_url),
            api_key: config.supabase_anon_key.clone(),
            bearer: config.table_key().to_string(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/{}", self.base_url, tables::USERS)
    }

    /// Start a request against the `users` table with auth headers set.
    fn request(&self, method: Method) -> RequestBuilder {
        self.http
            .request(method, self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.bearer)
    }

    /// Check response status and return error if not successful.
    async fn check_response(response: Response) -> Result<Response, AppError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Database(format!("HTTP {}: {}", status, body)))
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
        Self::check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Database(format!("JSON parse error: {}", e)))
    }
}

/// Extract the total from a `Content-Range` header (`0-14/230`, `*/0`).
pub(crate) fn parse_content_range_total(header: Option<&HeaderValue>) -> Option<u64> {
    header
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.rsplit('/').next())
        .and_then(|total| total.trim().parse().ok())
}

#[async_trait]
impl LeadStore for PostgrestDb {
    async fn select_users(&self, query: &UserQuery) -> Result<Page<User>, AppError> {
        let mut request = self.request(Method::GET).query(&query.to_params());
        if query.exact_count {
            request = request.header("Prefer", "count=exact");
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let response = Self::check_response(response).await?;

        let total = if query.exact_count {
            let total = parse_content_range_total(response.headers().get(CONTENT_RANGE));
            if total.is_none() {
                return Err(AppError::Database(
                    "Missing or malformed Content-Range header".to_string(),
                ));
            }
            total
        } else {
            None
        };

        let rows: Vec<User> = response
            .json()
            .await
            .map_err(|e| AppError::Database(format!("JSON parse error: {}", e)))?;

        Ok(Page { rows, total })
    }

    async fn count_users(&self, filter: &UserFilter) -> Result<u64, AppError> {
        let response = self
            .request(Method::HEAD)
            .query(&[("select", "userid")])
            .query(&filter.to_params())
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let response = Self::check_response(response).await?;

        parse_content_range_total(response.headers().get(CONTENT_RANGE)).ok_or_else(|| {
            AppError::Database("Missing or malformed Content-Range header".to_string())
        })
    }

    async fn insert_user(&self, user: &User) -> Result<User, AppError> {
        let response = self
            .request(Method::POST)
            .header("Prefer", "return=representation")
            .json(user)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut rows: Vec<User> = Self::check_response_json(response).await?;
        rows.pop()
            .ok_or_else(|| AppError::Database("Insert returned no rows".to_string()))
    }

    async fn update_user(&self, userid: i64, patch: &UserPatch) -> Result<Vec<User>, AppError> {
        let response = self
            .request(Method::PATCH)
            .query(&[("userid", format!("eq.{}", userid))])
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::check_response_json(response).await
    }

    async fn delete_user(&self, userid: i64) -> Result<(), AppError> {
        let response = self
            .request(Method::DELETE)
            .query(&[("userid", format!("eq.{}", userid))])
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::check_response(response).await?;
        tracing::info!(userid, "Deleted user");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_range_total() {
        let h = HeaderValue::from_static("0-14/230");
        assert_eq!(parse_content_range_total(Some(&h)), Some(230));

        let h = HeaderValue::from_static("*/0");
        assert_eq!(parse_content_range_total(Some(&h)), Some(0));

        let h = HeaderValue::from_static("0-14/*");
        assert_eq!(parse_content_range_total(Some(&h)), None);

        assert_eq!(parse_content_range_total(None), None);
    }

    #[tokio::test]
    async fn test_unreachable_store_maps_to_database_error() {
        // The test config points at a port nothing listens on.
        let db = PostgrestDb::new(&Config::test_default());

        let err = db.count_users(&UserFilter::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
