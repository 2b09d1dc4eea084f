// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Analytics routes (session required).

use crate::error::{AppError, Result};
use crate::models::{MonthlyTrend, OnboardingStats, WeeklyMetrics};
use crate::services::analytics::{self, WindowEnd};
use crate::time_utils::{parse_day, parse_timestamp, start_of_day};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/analytics/weekly-metrics", get(weekly_metrics))
        .route("/api/analytics/onboarding-stats", get(onboarding_stats))
        .route("/api/analytics/user-trends", get(user_trends))
}

/// Default window when no dates are given.
const DEFAULT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeeklyQuery {
    start_date: Option<String>,
    end_date: Option<String>,
}

/// A query bound: an exact timestamp or a whole calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Bound {
    At(DateTime<Utc>),
    Day(NaiveDate),
}

fn parse_bound(name: &str, raw: &str) -> Result<Bound> {
    if let Some(at) = parse_timestamp(raw) {
        return Ok(Bound::At(at));
    }
    if let Some(day) = parse_day(raw) {
        return Ok(Bound::Day(day));
    }
    Err(AppError::BadRequest(format!(
        "Invalid '{}' parameter: must be RFC3339 datetime or YYYY-MM-DD",
        name
    )))
}

impl WeeklyQuery {
    /// Resolve the window. A bare end day covers that whole day. Without a
    /// start, the window opens seven days before its last instant.
    fn range(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, WindowEnd)> {
        let end = match self.end_date.as_deref().filter(|v| !v.is_empty()) {
            Some(raw) => match parse_bound("endDate", raw)? {
                Bound::At(at) => WindowEnd::At(at),
                Bound::Day(day) => WindowEnd::through_day(day),
            },
            None => WindowEnd::At(now),
        };
        let start = match self.start_date.as_deref().filter(|v| !v.is_empty()) {
            Some(raw) => match parse_bound("startDate", raw)? {
                Bound::At(at) => at,
                Bound::Day(day) => start_of_day(day),
            },
            None => end.last_instant() - Duration::days(DEFAULT_WINDOW_DAYS),
        };

        if !end.admits(start) {
            return Err(AppError::BadRequest(
                "'startDate' must not be after 'endDate'".to_string(),
            ));
        }
        Ok((start, end))
    }
}

async fn weekly_metrics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WeeklyQuery>,
) -> Result<Json<WeeklyMetrics>> {
    let (start, end) = params.range(Utc::now())?;
    tracing::debug!(%start, ?end, "Fetching weekly metrics");

    let metrics = analytics::weekly_metrics(state.db.as_ref(), start, end)
        .await
        .map_err(AppError::failed("Failed to fetch weekly metrics"))?;

    Ok(Json(metrics))
}

async fn onboarding_stats(State(state): State<Arc<AppState>>) -> Result<Json<OnboardingStats>> {
    let stats = analytics::onboarding_stats(state.db.as_ref())
        .await
        .map_err(AppError::failed("Failed to fetch onboarding stats"))?;

    Ok(Json(stats))
}

async fn user_trends(State(state): State<Arc<AppState>>) -> Result<Json<Vec<MonthlyTrend>>> {
    let trends = analytics::user_trends(state.db.as_ref(), Utc::now())
        .await
        .map_err(AppError::failed("Failed to fetch user trends"))?;

    Ok(Json(trends))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn weekly(start: Option<&str>, end: Option<&str>) -> WeeklyQuery {
        WeeklyQuery {
            start_date: start.map(String::from),
            end_date: end.map(String::from),
        }
    }

    #[test]
    fn test_default_window_is_last_seven_days() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let (start, end) = weekly(None, None).range(now).unwrap();
        assert_eq!(end, WindowEnd::At(now));
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 3, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_bare_days_cover_whole_end_day() {
        let now = Utc::now();
        let (start, end) = weekly(Some("2024-03-01"), Some("2024-03-07"))
            .range(now)
            .unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(
            end,
            WindowEnd::Before(Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_rfc3339_bounds_used_verbatim() {
        let (start, end) = weekly(Some("2024-03-01T08:00:00Z"), Some("2024-03-02T08:00:00+02:00"))
            .range(Utc::now())
            .unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
        assert_eq!(
            end,
            WindowEnd::At(Utc.with_ymd_and_hms(2024, 3, 2, 6, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_end_day_alone_opens_week_before_it() {
        let (start, _) = weekly(None, Some("2024-03-07")).range(Utc::now()).unwrap();
        assert_eq!(
            start,
            Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_same_start_and_end_day_is_allowed() {
        assert!(weekly(Some("2024-03-07"), Some("2024-03-07"))
            .range(Utc::now())
            .is_ok());
    }

    #[test]
    fn test_invalid_dates_rejected() {
        assert!(weekly(Some("yesterday"), None).range(Utc::now()).is_err());
        assert!(weekly(Some("2024-03-08"), Some("2024-03-01"))
            .range(Utc::now())
            .is_err());
    }
}
