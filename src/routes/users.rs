// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lead table routes (session required).

use crate::error::{AppError, Result};
use crate::middleware::SessionUser;
use crate::models::UserPatch;
use crate::services::users::{self, CreatedWindow, ListFilters, UpdateOutcome, UserListing};
use crate::time_utils::parse_day;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Lead routes. The session middleware is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/status-counts", get(status_counts))
        .route("/api/users/{userid}", patch(update_user))
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UsersQuery {
    #[serde(default)]
    search: String,
    /// 1-based page number
    page: Option<u64>,
    /// Zero-based row offset; overrides `page`
    offset: Option<u64>,
    #[serde(default = "default_limit")]
    limit: u64,
    status: Option<String>,
    /// `online`, `onsite` or `all`
    mode: Option<String>,
    /// `with`, `without` or `all`
    phone: Option<String>,
    #[serde(rename = "type")]
    lead_type: Option<String>,
    created_from: Option<String>,
    created_to: Option<String>,
    created_on: Option<String>,
}

fn default_limit() -> u64 {
    users::DEFAULT_PAGE_SIZE
}

const MAX_LIMIT: u64 = 100;

/// `None` for a missing, empty or `all` parameter.
fn selection(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

fn parse_day_param(name: &str, raw: Option<&str>) -> Result<Option<NaiveDate>> {
    selection(raw)
        .map(|value| {
            parse_day(value).ok_or_else(|| {
                AppError::BadRequest(format!("Invalid '{}' parameter: expected YYYY-MM-DD", name))
            })
        })
        .transpose()
}

impl UsersQuery {
    fn filters(&self) -> Result<ListFilters> {
        let onboarding = match selection(self.mode.as_deref()) {
            None => None,
            Some("online") => Some(true),
            Some("onsite") => Some(false),
            Some(other) => {
                return Err(AppError::BadRequest(format!(
                    "Invalid 'mode' parameter '{}': expected online, onsite or all",
                    other
                )))
            }
        };

        let has_phone_number = match selection(self.phone.as_deref()) {
            None => None,
            Some("with") => Some(true),
            Some("without") => Some(false),
            Some(other) => {
                return Err(AppError::BadRequest(format!(
                    "Invalid 'phone' parameter '{}': expected with, without or all",
                    other
                )))
            }
        };

        let from = parse_day_param("created_from", self.created_from.as_deref())?;
        let to = parse_day_param("created_to", self.created_to.as_deref())?;
        let on = parse_day_param("created_on", self.created_on.as_deref())?;

        let created = match (on, from, to) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(AppError::BadRequest(
                    "'created_on' cannot be combined with 'created_from'/'created_to'".to_string(),
                ))
            }
            (Some(day), None, None) => Some(CreatedWindow::Day(day)),
            (None, None, None) => None,
            (None, start, end) => {
                if let (Some(start), Some(end)) = (start, end) {
                    if start > end {
                        return Err(AppError::BadRequest(
                            "'created_from' must not be after 'created_to'".to_string(),
                        ));
                    }
                }
                Some(CreatedWindow::Range { start, end })
            }
        };

        Ok(ListFilters {
            status: selection(self.status.as_deref()).map(str::to_string),
            onboarding,
            has_phone_number,
            lead_type: selection(self.lead_type.as_deref()).map(str::to_string),
            created,
        })
    }

    fn window(&self) -> Result<(u64, u64)> {
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(AppError::BadRequest(format!(
                "Limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }

        let offset = match (self.offset, self.page) {
            (Some(offset), _) => offset,
            (None, Some(0)) => {
                return Err(AppError::BadRequest(
                    "Page must be greater than 0".to_string(),
                ))
            }
            (None, Some(page)) => (page - 1).checked_mul(self.limit).ok_or_else(|| {
                AppError::BadRequest("Page number causes overflow".to_string())
            })?,
            (None, None) => 0,
        };

        Ok((offset, self.limit))
    }
}

/// One page of leads plus summary counts.
async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Query(params): Query<UsersQuery>,
) -> Result<Json<UserListing>> {
    let (offset, limit) = params.window()?;
    let filters = params.filters()?;

    tracing::debug!(operator = %user.id, search = %params.search, offset, limit, "Fetching users");

    let listing = users::list_users(state.db.as_ref(), &params.search, offset, limit, &filters)
        .await
        .map_err(AppError::failed("Failed to fetch users"))?;

    Ok(Json(listing))
}

// ─── Inline edit ─────────────────────────────────────────────

async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(userid): Path<i64>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<UpdateOutcome>> {
    tracing::info!(operator = %user.id, userid, "Inline edit");

    let outcome = users::update_user(state.db.as_ref(), userid, patch)
        .await
        .map_err(AppError::failed("Failed to update user"))?;

    Ok(Json(outcome))
}

// ─── Status histogram ────────────────────────────────────────

async fn status_counts(State(state): State<Arc<AppState>>) -> Result<Json<BTreeMap<String, u64>>> {
    let counts = users::status_counts(state.db.as_ref())
        .await
        .map_err(AppError::failed("Failed to fetch status counts"))?;

    Ok(Json(counts))
}
