// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Supabase credentials are always read from the environment; nothing is
//! compiled into the binary.

use std::env;

/// Name of the cookie carrying the Supabase access token.
pub const SESSION_COOKIE: &str = "lead_desk_session";

/// Which store backend to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Supabase PostgREST over HTTP.
    Postgrest,
    /// In-process store, for local runs without a Supabase project.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgrest" | "supabase" => Ok(Self::Postgrest),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("LEAD_DESK_STORE")),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Supabase project URL (e.g. `https://xyz.supabase.co`)
    pub supabase_url: String,
    /// Public anon key, sent as `apikey` on every Supabase request
    pub supabase_anon_key: String,
    /// Optional service-role key used as the bearer for table access
    pub supabase_service_key: Option<String>,
    /// Project JWT secret used to verify session tokens (raw bytes)
    pub jwt_secret: Vec<u8>,
    /// Frontend URL for CORS and login redirects
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Store backend selection
    pub store: StoreBackend,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            supabase_url: env::var("SUPABASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("SUPABASE_URL"))?,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .map_err(|_| ConfigError::Missing("SUPABASE_JWT_SECRET"))?
                .into_bytes(),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            store: match env::var("LEAD_DESK_STORE") {
                Ok(raw) => raw.parse()?,
                Err(_) => StoreBackend::Postgrest,
            },
        })
    }

    /// Fixed configuration for tests.
    pub fn test_default() -> Self {
        Self {
            supabase_url: "http://127.0.0.1:1".to_string(),
            supabase_anon_key: "test_anon_key".to_string(),
            supabase_service_key: None,
            jwt_secret: b"test_jwt_secret_32_bytes_minimum!".to_vec(),
            frontend_url: "http://localhost:3000".to_string(),
            port: 8080,
            store: StoreBackend::Memory,
        }
    }

    /// Key used as the bearer token for table requests.
    pub fn table_key(&self) -> &str {
        self.supabase_service_key
            .as_deref()
            .unwrap_or(&self.supabase_anon_key)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
