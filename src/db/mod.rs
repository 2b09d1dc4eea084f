// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Supabase PostgREST, or in-memory for tests).

pub mod memory;
pub mod postgrest;
pub mod query;

pub use memory::MemoryDb;
pub use postgrest::PostgrestDb;
pub use query::{Cmp, Column, Order, Page, UserFilter, UserQuery};

use crate::error::AppError;
use crate::models::{User, UserPatch};
use async_trait::async_trait;

/// Table names as constants.
pub mod tables {
    pub const USERS: &str = "users";
}

/// Handle to the remote lead store.
///
/// Constructed once at startup and shared through `AppState`.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Rows matching `query`, plus the exact total when `query.exact_count` is set.
    async fn select_users(&self, query: &UserQuery) -> Result<Page<User>, AppError>;

    /// Exact number of rows matching `filter`.
    async fn count_users(&self, filter: &UserFilter) -> Result<u64, AppError>;

    /// Insert a new row and return it as stored.
    async fn insert_user(&self, user: &User) -> Result<User, AppError>;

    /// Patch the row with `userid`; returns the updated rows (empty if none matched).
    async fn update_user(&self, userid: i64, patch: &UserPatch) -> Result<Vec<User>, AppError>;

    /// Hard-delete the row with `userid`.
    async fn delete_user(&self, userid: i64) -> Result<(), AppError>;

    /// Get a single row by user ID.
    async fn get_user(&self, userid: i64) -> Result<Option<User>, AppError> {
        let query = UserQuery::new(UserFilter::new().eq(Column::UserId, userid)).range(0, 1);
        let page = self.select_users(&query).await?;
        Ok(page.rows.into_iter().next())
    }
}
