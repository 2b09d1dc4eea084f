// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod stats;
pub mod user;

pub use stats::{MonthlyTrend, OnboardingStats, WeeklyMetrics};
pub use user::{Attended, LeadStatus, LeadSubmission, User, UserPatch};
