// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lead intake from the Telegram mini-app (public).

use crate::error::{AppError, Result};
use crate::models::{LeadSubmission, User};
use crate::services::users;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/telegram-lead", post(save_lead))
}

#[derive(Serialize)]
pub struct LeadSaved {
    pub message: &'static str,
    pub user: User,
}

async fn save_lead(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<LeadSubmission>, JsonRejection>,
) -> Result<Json<LeadSaved>> {
    let Json(submission) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Unreadable lead submission");
        AppError::Rejected(users::MISSING_FIELDS)
    })?;

    tracing::debug!(userid = ?submission.userid, "Lead submission received");

    let user = users::upsert_lead(state.db.as_ref(), submission)
        .await
        .map_err(AppError::failed("Failed to save user information"))?;

    Ok(Json(LeadSaved {
        message: "User information saved successfully",
        user,
    }))
}
