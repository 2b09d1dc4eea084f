// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process lead store.
//!
//! Evaluates the same [`UserQuery`] semantics as PostgREST against a
//! `DashMap` keyed by user ID. Used by tests and local development.

use crate::db::query::{Order, Page, UserFilter, UserQuery};
use crate::db::LeadStore;
use crate::error::AppError;
use crate::models::{User, UserPatch};
use async_trait::async_trait;
use dashmap::DashMap;
use std::cmp::Ordering;
use std::sync::Arc;

/// In-memory database.
#[derive(Clone, Default)]
pub struct MemoryDb {
    rows: Arc<DashMap<i64, User>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing rows (later duplicates win).
    pub fn with_rows(rows: impl IntoIterator<Item = User>) -> Self {
        let db = Self::new();
        for row in rows {
            db.rows.insert(row.userid, row);
        }
        db
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn matching(&self, filter: &UserFilter) -> Vec<User> {
        self.rows
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }
}

/// Order by creation time, unparseable timestamps last, then by ID.
fn compare_created(a: &User, b: &User) -> Ordering {
    match (a.created_at_utc(), b.created_at_utc()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.created_at.cmp(&b.created_at),
    }
    .then_with(|| a.userid.cmp(&b.userid))
}

#[async_trait]
impl LeadStore for MemoryDb {
    async fn select_users(&self, query: &UserQuery) -> Result<Page<User>, AppError> {
        let mut rows = self.matching(&query.filter);

        match query.order {
            Some(Order::CreatedAsc) => rows.sort_by(compare_created),
            Some(Order::CreatedDesc) => rows.sort_by(|a, b| compare_created(b, a)),
            None => rows.sort_by_key(|u| u.userid),
        }

        let total = query.exact_count.then_some(rows.len() as u64);

        if let Some((offset, limit)) = query.range {
            rows = rows
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect();
        }

        Ok(Page { rows, total })
    }

    async fn count_users(&self, filter: &UserFilter) -> Result<u64, AppError> {
        Ok(self
            .rows
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .count() as u64)
    }

    async fn insert_user(&self, user: &User) -> Result<User, AppError> {
        match self.rows.entry(user.userid) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AppError::Database(format!(
                "duplicate key value violates unique constraint (userid={})",
                user.userid
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(user.clone())
            }
        }
    }

    async fn update_user(&self, userid: i64, patch: &UserPatch) -> Result<Vec<User>, AppError> {
        Ok(match self.rows.get_mut(&userid) {
            Some(mut row) => {
                patch.apply_to(row.value_mut());
                vec![row.value().clone()]
            }
            None => vec![],
        })
    }

    async fn delete_user(&self, userid: i64) -> Result<(), AppError> {
        self.rows.remove(&userid);
        Ok(())
    }
}
