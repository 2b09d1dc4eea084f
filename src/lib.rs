// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lead Desk: admin dashboard backend for Telegram-sourced leads
//!
//! This crate provides the HTTP API behind the lead dashboard: listing
//! and editing leads stored in Supabase, aggregate analytics, lead intake
//! from the Telegram mini-app, and operator session gating.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::LeadStore;
use services::AuthClient;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn LeadStore>,
    pub auth: AuthClient,
}
