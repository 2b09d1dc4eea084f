// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod analytics;
pub mod auth;
pub mod users;

pub use analytics::WindowEnd;
pub use auth::{AuthClient, AuthSession, AuthUser};
pub use users::{CreatedWindow, ListFilters, UpdateOutcome, UserListing};
