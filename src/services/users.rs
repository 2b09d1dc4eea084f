// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lead data access: listing, inline edits and lead upserts.
//!
//! Translates dashboard filter state into [`UserQuery`]s and maps edits
//! back to the store. Nothing is retried; a failed remote call fails the
//! whole operation.

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::{Cmp, Column, LeadStore, Order, UserFilter, UserQuery};
use crate::error::{AppError, Result};
use crate::models::stats::status_key;
use crate::models::{LeadStatus, LeadSubmission, User, UserPatch};
use crate::time_utils::{format_utc_rfc3339, start_of_day};

/// Error message for an incomplete lead submission.
pub const MISSING_FIELDS: &str = "Missing required fields";

/// Rows per dashboard page.
pub const DEFAULT_PAGE_SIZE: u64 = 15;

/// Created-at window, in whole UTC days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatedWindow {
    /// From the start of `start` up to, not including, the day after `end`.
    Range {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    /// A single calendar day.
    Day(NaiveDate),
}

/// Dashboard table filters. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilters {
    pub status: Option<String>,
    pub onboarding: Option<bool>,
    pub has_phone_number: Option<bool>,
    pub lead_type: Option<String>,
    pub created: Option<CreatedWindow>,
}

impl ListFilters {
    /// Build the store filter for these settings plus a search term.
    pub fn to_filter(&self, search: &str) -> UserFilter {
        let mut filter = UserFilter::new().search(search);

        if let Some(status) = &self.status {
            filter = filter.eq(Column::Status, status.as_str());
        }
        if let Some(onboarding) = self.onboarding {
            filter = filter.eq(Column::Onboarding, onboarding);
        }
        filter = match self.has_phone_number {
            Some(true) => filter.not_null(Column::PhoneNumber),
            Some(false) => filter.is_null(Column::PhoneNumber),
            None => filter,
        };
        if let Some(lead_type) = self.lead_type.as_deref().filter(|t| *t != "all") {
            filter = filter.eq(Column::Type, lead_type);
        }

        match self.created {
            Some(CreatedWindow::Range { start, end }) => {
                if let Some(start) = start {
                    filter = filter.created(Cmp::Gte, start_of_day(start));
                }
                if let Some(end) = end {
                    filter = filter.created(Cmp::Lt, start_of_day(end) + Duration::days(1));
                }
            }
            Some(CreatedWindow::Day(day)) => {
                filter = filter
                    .created(Cmp::Gte, start_of_day(day))
                    .created(Cmp::Lt, start_of_day(day) + Duration::days(1));
            }
            None => {}
        }

        filter
    }
}

/// One page of the lead table plus the summary-card counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserListing {
    pub users: Vec<User>,
    /// Rows matching the filters, ignoring pagination
    pub total_users: u64,
    /// Whole-table counts, independent of filters. `total_new` goes out
    /// as `totalOnboarded`, the name the dashboard client reads.
    #[serde(rename = "totalOnboarded")]
    pub total_new: u64,
    pub total_qualified: u64,
    pub total_unqualified: u64,
}

/// Fetch one page of leads.
///
/// Also issues three whole-table count queries for the summary cards;
/// they ignore `search` and `filters`.
pub async fn list_users(
    store: &dyn LeadStore,
    search: &str,
    offset: u64,
    limit: u64,
    filters: &ListFilters,
) -> Result<UserListing> {
    tracing::debug!(search, offset, limit, ?filters, "Listing users");

    let query = UserQuery::new(filters.to_filter(search))
        .order(Order::CreatedDesc)
        .range(offset, limit)
        .with_count();

    let status_filter = |status: LeadStatus| UserFilter::new().eq(Column::Status, status.as_str());
    let (new_filter, qualified_filter, unqualified_filter) = (
        status_filter(LeadStatus::New),
        status_filter(LeadStatus::Qualified),
        status_filter(LeadStatus::Unqualified),
    );

    let (page, total_new, total_qualified, total_unqualified) = tokio::try_join!(
        store.select_users(&query),
        store.count_users(&new_filter),
        store.count_users(&qualified_filter),
        store.count_users(&unqualified_filter),
    )?;

    let total_users = page.total.unwrap_or(page.rows.len() as u64);

    Ok(UserListing {
        users: page.rows,
        total_users,
        total_new,
        total_qualified,
        total_unqualified,
    })
}

/// Result of an inline edit.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateOutcome {
    pub success: bool,
    pub data: Vec<User>,
}

/// Apply a partial update to one lead.
pub async fn update_user(
    store: &dyn LeadStore,
    userid: i64,
    mut patch: UserPatch,
) -> Result<UpdateOutcome> {
    patch.check().map_err(AppError::BadRequest)?;
    patch.updated_at = Some(format_utc_rfc3339(Utc::now()));

    tracing::debug!(userid, ?patch, "Updating user");

    let data = store.update_user(userid, &patch).await?;
    if data.is_empty() {
        return Err(AppError::NotFound(format!("User {} not found", userid)));
    }

    tracing::info!(userid, "User updated");
    Ok(UpdateOutcome {
        success: true,
        data,
    })
}

/// Create or refresh a lead submitted by the Telegram mini-app.
///
/// Existing leads get their contact fields and `updatedat` refreshed;
/// status, remarks and other dashboard edits are left alone. New leads
/// start as `new`.
pub async fn upsert_lead(store: &dyn LeadStore, submission: LeadSubmission) -> Result<User> {
    submission
        .validate()
        .map_err(|_| AppError::Rejected(MISSING_FIELDS))?;

    let (Some(userid), Some(first_name), Some(last_name), Some(phone_number)) = (
        submission.userid,
        submission.firstname,
        submission.lastname,
        submission.phonenumber,
    ) else {
        return Err(AppError::Rejected(MISSING_FIELDS));
    };
    let now = format_utc_rfc3339(Utc::now());

    if store.get_user(userid).await?.is_some() {
        let patch = UserPatch {
            first_name: Some(first_name),
            last_name: Some(Some(last_name)),
            phone_number: Some(Some(phone_number)),
            username: submission.username.map(Some),
            language_code: submission.languagecode.map(Some),
            updated_at: Some(now),
            ..Default::default()
        };

        let updated = store.update_user(userid, &patch).await?;
        tracing::info!(userid, "Existing lead refreshed");
        return updated
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Database(format!("Lead {} vanished during update", userid)));
    }

    let user = User {
        userid,
        username: submission.username,
        first_name,
        last_name: Some(last_name),
        language_code: submission.languagecode,
        phone_number: Some(phone_number),
        onboarding: None,
        status: Some(LeadStatus::New),
        lead_type: None,
        attended: None,
        remarks: None,
        created_at: now.clone(),
        updated_at: now,
    };

    let stored = store.insert_user(&user).await?;
    tracing::info!(userid, "New lead created");
    Ok(stored)
}

/// Hard-delete a lead. Not exposed over HTTP.
pub async fn delete_user(store: &dyn LeadStore, userid: i64) -> Result<()> {
    store.delete_user(userid).await?;
    tracing::info!(userid, "User deleted");
    Ok(())
}

/// Count leads per status (rows with a null status are excluded).
pub async fn status_counts(store: &dyn LeadStore) -> Result<BTreeMap<String, u64>> {
    let page = store
        .select_users(&UserQuery::new(UserFilter::new().not_null(Column::Status)))
        .await?;

    let mut counts = BTreeMap::new();
    for user in &page.rows {
        *counts.entry(status_key(user).to_string()).or_insert(0) += 1;
    }
    Ok(counts)
}
