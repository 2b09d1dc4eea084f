// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Aggregate views folded from lead rows.
//!
//! Nothing here is persisted: every view is recomputed from the current
//! row set on each request.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{LeadStatus, User};
use crate::time_utils::format_utc_rfc3339;

/// Per-day lead counts for the weekly chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DailyStats {
    /// Display label, e.g. "Mon, Jan 15"
    pub day: String,
    pub invalid: u32,
    pub qualified: u32,
    pub unqualified: u32,
    pub new: u32,
    pub attended: u32,
    pub not_attended: u32,
    /// Earliest creation timestamp in this bucket (ISO 8601)
    pub date: String,
}

impl DailyStats {
    fn new(created: DateTime<Utc>) -> Self {
        Self {
            day: created.format("%a, %b %-d").to_string(),
            invalid: 0,
            qualified: 0,
            unqualified: 0,
            new: 0,
            attended: 0,
            not_attended: 0,
            date: format_utc_rfc3339(created),
        }
    }

    /// Count one lead created on this day.
    ///
    /// Statuses outside new/invalid/qualified/unqualified are not counted.
    /// Attendance counts only values stored as real booleans.
    fn record(&mut self, user: &User) {
        match user.status {
            Some(LeadStatus::Invalid) => self.invalid += 1,
            Some(LeadStatus::Qualified) => self.qualified += 1,
            Some(LeadStatus::Unqualified) => self.unqualified += 1,
            Some(LeadStatus::New) => self.new += 1,
            _ => {}
        }

        match user.attended.as_ref().and_then(|a| a.as_flag()) {
            Some(true) => self.attended += 1,
            Some(false) => self.not_attended += 1,
            None => {}
        }
    }
}

/// Day buckets keyed by UTC calendar day.
#[derive(Debug, Default)]
pub struct DailyBuckets {
    days: BTreeMap<NaiveDate, (DateTime<Utc>, DailyStats)>,
}

impl DailyBuckets {
    /// Add a lead to its day bucket. Rows with unparseable timestamps are skipped.
    pub fn record(&mut self, user: &User) {
        let Some(created) = user.created_at_utc() else {
            tracing::debug!(userid = user.userid, created_at = %user.created_at, "Skipping row with unparseable createdat");
            return;
        };

        let (earliest, stats) = self
            .days
            .entry(created.date_naive())
            .or_insert_with(|| (created, DailyStats::new(created)));

        if created < *earliest {
            *earliest = created;
            stats.date = format_utc_rfc3339(created);
        }
        stats.record(user);
    }

    /// Buckets in chronological order.
    pub fn into_sorted(self) -> Vec<DailyStats> {
        self.days.into_values().map(|(_, stats)| stats).collect()
    }
}

/// Attended vs. not attended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AttendanceCounts {
    pub attended: u32,
    pub not_attended: u32,
}

impl AttendanceCounts {
    /// `true` and `"true"` count as attended; everything else does not.
    pub fn record(&mut self, user: &User) {
        if user.attended.as_ref().is_some_and(|a| a.is_truthy()) {
            self.attended += 1;
        } else {
            self.not_attended += 1;
        }
    }
}

/// Online vs. on-site onboarding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OnboardingCounts {
    pub onboarded: u32,
    pub not_onboarded: u32,
}

impl OnboardingCounts {
    pub fn record(&mut self, user: &User) {
        if user.is_onboarded() {
            self.onboarded += 1;
        } else {
            self.not_onboarded += 1;
        }
    }
}

/// Requested window, echoed back to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

/// Weekly dashboard metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeeklyMetrics {
    pub daily_stats: Vec<DailyStats>,
    /// Count per status over all rows in range ("unknown" for missing)
    pub status_counts: BTreeMap<String, u32>,
    /// Qualified leads only
    pub onboarding_counts: OnboardingCounts,
    /// Qualified leads only
    pub attendance_counts: AttendanceCounts,
    /// Qualified leads only ("unknown" for missing type)
    pub type_distribution: BTreeMap<String, u32>,
    pub date_range: DateRange,
}

/// Counts for the onboarding overview.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OnboardingStats {
    pub total_users: u32,
    pub onboarding_stats: OnboardingSplit,
    pub qualification_stats: QualificationSplit,
    pub phone_number_stats: PhoneSplit,
    pub type_distribution: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct OnboardingSplit {
    pub completed: u32,
    pub pending: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct QualificationSplit {
    pub qualified: u32,
    pub unqualified: u32,
    pub new: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct PhoneSplit {
    pub with_phone: u32,
    pub without_phone: u32,
}

impl OnboardingStats {
    pub fn record(&mut self, user: &User) {
        self.total_users += 1;

        if user.is_onboarded() {
            self.onboarding_stats.completed += 1;
        } else {
            self.onboarding_stats.pending += 1;
        }

        match user.status {
            Some(LeadStatus::Qualified) => self.qualification_stats.qualified += 1,
            Some(LeadStatus::Unqualified) => self.qualification_stats.unqualified += 1,
            Some(LeadStatus::New) => self.qualification_stats.new += 1,
            _ => {}
        }

        if user.phone_number.as_deref().is_some_and(|p| !p.is_empty()) {
            self.phone_number_stats.with_phone += 1;
        } else {
            self.phone_number_stats.without_phone += 1;
        }

        *self
            .type_distribution
            .entry(type_key(user).to_string())
            .or_insert(0) += 1;
    }
}

/// Lead counts for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MonthlyTrend {
    /// Short month name ("Jan")
    pub month: String,
    /// "YYYY-MM"
    pub key: String,
    pub total: u32,
    pub onboarded: u32,
    pub new: u32,
    pub qualified: u32,
    pub unqualified: u32,
}

impl MonthlyTrend {
    fn new(created: DateTime<Utc>) -> Self {
        Self {
            month: created.format("%b").to_string(),
            key: format!("{:04}-{:02}", created.year(), created.month()),
            total: 0,
            onboarded: 0,
            new: 0,
            qualified: 0,
            unqualified: 0,
        }
    }

    fn record(&mut self, user: &User) {
        self.total += 1;
        if user.is_onboarded() {
            self.onboarded += 1;
        }
        match user.status {
            Some(LeadStatus::New) => self.new += 1,
            Some(LeadStatus::Qualified) => self.qualified += 1,
            Some(LeadStatus::Unqualified) => self.unqualified += 1,
            _ => {}
        }
    }
}

/// Month buckets keyed by (year, month).
#[derive(Debug, Default)]
pub struct MonthlyBuckets {
    months: BTreeMap<(i32, u32), MonthlyTrend>,
}

impl MonthlyBuckets {
    pub fn record(&mut self, user: &User) {
        let Some(created) = user.created_at_utc() else {
            return;
        };
        self.months
            .entry((created.year(), created.month()))
            .or_insert_with(|| MonthlyTrend::new(created))
            .record(user);
    }

    /// Months in chronological order.
    pub fn into_sorted(self) -> Vec<MonthlyTrend> {
        self.months.into_values().collect()
    }
}

/// Histogram key for a lead's status; missing status is "unknown".
pub fn status_key(user: &User) -> &str {
    user.status.as_ref().map(|s| s.as_str()).unwrap_or("unknown")
}

/// Histogram key for a lead's type; missing type is "unknown".
pub fn type_key(user: &User) -> &str {
    user.lead_type.as_deref().unwrap_or("unknown")
}
