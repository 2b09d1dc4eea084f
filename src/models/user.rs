// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lead record model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::time_utils::parse_timestamp;

/// Lead status.
///
/// Rows written by older versions of the bot carry statuses outside the
/// canonical set (`lead`, `pending`); those read back as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeadStatus {
    New,
    Invalid,
    Qualified,
    Unqualified,
    Follow,
    Other(String),
}

impl LeadStatus {
    pub fn as_str(&self) -> &str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Invalid => "invalid",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Unqualified => "unqualified",
            LeadStatus::Follow => "follow",
            LeadStatus::Other(s) => s,
        }
    }

    pub fn is_canonical(&self) -> bool {
        !matches!(self, LeadStatus::Other(_))
    }
}

impl From<String> for LeadStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "new" => LeadStatus::New,
            "invalid" => LeadStatus::Invalid,
            "qualified" => LeadStatus::Qualified,
            "unqualified" => LeadStatus::Unqualified,
            "follow" => LeadStatus::Follow,
            _ => LeadStatus::Other(raw),
        }
    }
}

impl From<LeadStatus> for String {
    fn from(status: LeadStatus) -> Self {
        match status {
            LeadStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored `attended` value.
///
/// The column has held both booleans and the strings `"true"`/`"false"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attended {
    Flag(bool),
    Text(String),
}

impl Attended {
    /// Boolean `true` or the string `"true"`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Attended::Flag(b) => *b,
            Attended::Text(s) => s == "true",
        }
    }

    /// The value if it was stored as a real boolean.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Attended::Flag(b) => Some(*b),
            Attended::Text(_) => None,
        }
    }
}

/// Lead record stored in the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    /// Telegram user ID (upsert key)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub userid: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "firstname")]
    pub first_name: String,
    #[serde(rename = "lastname", default)]
    pub last_name: Option<String>,
    #[serde(rename = "languagecode", default)]
    pub language_code: Option<String>,
    #[serde(rename = "phonenumber", default)]
    pub phone_number: Option<String>,
    /// Online (true) or on-site (false) onboarding
    #[serde(default)]
    pub onboarding: Option<bool>,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub status: Option<LeadStatus>,
    /// Free or paid
    #[serde(rename = "type", default)]
    pub lead_type: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "boolean | string | null"))]
    pub attended: Option<Attended>,
    #[serde(default)]
    pub remarks: Option<String>,
    /// Creation timestamp (ISO 8601)
    #[serde(rename = "createdat")]
    pub created_at: String,
    /// Last update timestamp (ISO 8601)
    #[serde(rename = "updatedat")]
    pub updated_at: String,
}

impl User {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    pub fn is_onboarded(&self) -> bool {
        self.onboarding.unwrap_or(false)
    }

    pub fn has_status(&self, status: &LeadStatus) -> bool {
        self.status.as_ref() == Some(status)
    }
}

/// Deserialize a field that distinguishes "absent" from "null".
///
/// Absent stays `None` via `#[serde(default)]`; an explicit null becomes
/// `Some(None)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update of a lead (inline edit).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserPatch {
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub username: Option<Option<String>>,
    #[serde(rename = "firstname", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(
        rename = "lastname",
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_name: Option<Option<String>>,
    #[serde(
        rename = "languagecode",
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub language_code: Option<Option<String>>,
    #[serde(
        rename = "phonenumber",
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone_number: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub status: Option<LeadStatus>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub lead_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub attended: Option<Option<bool>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub remarks: Option<Option<String>>,
    /// Stamped by the server, never taken from the client.
    #[serde(rename = "updatedat", skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl UserPatch {
    /// True if no editable field is set.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.language_code.is_none()
            && self.phone_number.is_none()
            && self.onboarding.is_none()
            && self.status.is_none()
            && self.lead_type.is_none()
            && self.attended.is_none()
            && self.remarks.is_none()
    }

    /// Check write-side constraints.
    pub fn check(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("Patch must set at least one field".to_string());
        }
        if let Some(status) = &self.status {
            if !status.is_canonical() {
                return Err(format!(
                    "Unknown status '{}' (expected new, invalid, qualified, unqualified or follow)",
                    status
                ));
            }
        }
        if matches!(&self.first_name, Some(name) if name.trim().is_empty()) {
            return Err("firstname cannot be empty".to_string());
        }
        Ok(())
    }

    /// Apply the patch to a record in place.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(v) = &self.username {
            user.username = v.clone();
        }
        if let Some(v) = &self.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            user.last_name = v.clone();
        }
        if let Some(v) = &self.language_code {
            user.language_code = v.clone();
        }
        if let Some(v) = &self.phone_number {
            user.phone_number = v.clone();
        }
        if let Some(v) = self.onboarding {
            user.onboarding = Some(v);
        }
        if let Some(v) = &self.status {
            user.status = Some(v.clone());
        }
        if let Some(v) = &self.lead_type {
            user.lead_type = v.clone();
        }
        if let Some(v) = self.attended {
            user.attended = v.map(Attended::Flag);
        }
        if let Some(v) = &self.remarks {
            user.remarks = v.clone();
        }
        if let Some(v) = &self.updated_at {
            user.updated_at = v.clone();
        }
    }
}

/// Lead submitted by the Telegram mini-app.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LeadSubmission {
    #[validate(required, range(min = 1))]
    pub userid: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub languagecode: Option<String>,
    #[validate(required, length(min = 1))]
    pub firstname: Option<String>,
    #[validate(required, length(min = 1))]
    pub lastname: Option<String>,
    #[validate(required, length(min = 1))]
    pub phonenumber: Option<String>,
}
