// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard analytics.
//!
//! Each view fetches the relevant rows once and folds them in memory.

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::db::{Cmp, Column, LeadStore, Order, UserFilter, UserQuery};
use crate::error::Result;
use crate::models::stats::{
    status_key, type_key, AttendanceCounts, DailyBuckets, DateRange, MonthlyBuckets,
    OnboardingCounts,
};
use crate::models::{LeadStatus, MonthlyTrend, OnboardingStats, User, WeeklyMetrics};
use crate::time_utils::{format_utc_rfc3339, start_of_day};

/// How far back the monthly trend looks.
pub const TREND_MONTHS: u32 = 6;

/// Upper edge of the weekly window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEnd {
    /// An explicit timestamp, included in the window.
    At(DateTime<Utc>),
    /// Midnight after the last requested day, excluded from the window.
    Before(DateTime<Utc>),
}

impl WindowEnd {
    /// Whole days requested through `day`.
    pub fn through_day(day: NaiveDate) -> Self {
        WindowEnd::Before(start_of_day(day) + Duration::days(1))
    }

    /// Last instant reported back to the client.
    pub fn last_instant(self) -> DateTime<Utc> {
        match self {
            WindowEnd::At(at) => at,
            WindowEnd::Before(before) => before - Duration::milliseconds(1),
        }
    }

    /// Whether `start` lies inside a window ending here.
    pub fn admits(self, start: DateTime<Utc>) -> bool {
        match self {
            WindowEnd::At(at) => start <= at,
            WindowEnd::Before(before) => start < before,
        }
    }

    fn predicate(self) -> (Cmp, DateTime<Utc>) {
        match self {
            WindowEnd::At(at) => (Cmp::Lte, at),
            WindowEnd::Before(before) => (Cmp::Lt, before),
        }
    }
}

/// Metrics for leads created from `start` up to `end`.
pub async fn weekly_metrics(
    store: &dyn LeadStore,
    start: DateTime<Utc>,
    end: WindowEnd,
) -> Result<WeeklyMetrics> {
    let (end_cmp, end_at) = end.predicate();
    let query = UserQuery::new(
        UserFilter::new()
            .created(Cmp::Gte, start)
            .created(end_cmp, end_at),
    )
    .order(Order::CreatedAsc);

    let page = store.select_users(&query).await?;
    tracing::debug!(rows = page.rows.len(), %start, ?end, "Computing weekly metrics");

    Ok(fold_weekly_metrics(
        &page.rows,
        DateRange {
            start_date: format_utc_rfc3339(start),
            end_date: format_utc_rfc3339(end.last_instant()),
        },
    ))
}

/// Fold rows into weekly metrics.
pub fn fold_weekly_metrics(rows: &[User], date_range: DateRange) -> WeeklyMetrics {
    let mut days = DailyBuckets::default();
    let mut status_counts: BTreeMap<String, u32> = BTreeMap::new();
    let mut onboarding_counts = OnboardingCounts::default();
    let mut attendance_counts = AttendanceCounts::default();
    let mut type_distribution: BTreeMap<String, u32> = BTreeMap::new();

    for user in rows {
        days.record(user);
        *status_counts.entry(status_key(user).to_string()).or_insert(0) += 1;

        if user.has_status(&LeadStatus::Qualified) {
            onboarding_counts.record(user);
            attendance_counts.record(user);
            *type_distribution
                .entry(type_key(user).to_string())
                .or_insert(0) += 1;
        }
    }

    WeeklyMetrics {
        daily_stats: days.into_sorted(),
        status_counts,
        onboarding_counts,
        attendance_counts,
        type_distribution,
        date_range,
    }
}

/// Onboarding overview over all leads with a type.
pub async fn onboarding_stats(store: &dyn LeadStore) -> Result<OnboardingStats> {
    let page = store
        .select_users(&UserQuery::new(UserFilter::new().not_null(Column::Type)))
        .await?;

    Ok(fold_onboarding_stats(&page.rows))
}

pub fn fold_onboarding_stats(rows: &[User]) -> OnboardingStats {
    rows.iter().fold(OnboardingStats::default(), |mut stats, user| {
        stats.record(user);
        stats
    })
}

/// Monthly counts over the last six months, oldest first.
pub async fn user_trends(store: &dyn LeadStore, now: DateTime<Utc>) -> Result<Vec<MonthlyTrend>> {
    let since = now
        .checked_sub_months(Months::new(TREND_MONTHS))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let page = store
        .select_users(
            &UserQuery::new(UserFilter::new().created(Cmp::Gte, since)).order(Order::CreatedAsc),
        )
        .await?;

    Ok(fold_user_trends(&page.rows))
}

pub fn fold_user_trends(rows: &[User]) -> Vec<MonthlyTrend> {
    let mut months = MonthlyBuckets::default();
    for user in rows {
        months.record(user);
    }
    months.into_sorted()
}
