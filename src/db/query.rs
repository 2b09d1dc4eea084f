// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Store-independent query model for the `users` table.
//!
//! A [`UserQuery`] is built once by the data access layer and either
//! rendered to PostgREST query parameters or evaluated in memory.

use chrono::{DateTime, Utc};

use crate::models::User;
use crate::time_utils::format_utc_rfc3339;

/// Columns that can appear in a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    UserId,
    Username,
    FirstName,
    LastName,
    PhoneNumber,
    Onboarding,
    Status,
    Type,
}

impl Column {
    /// Stored column name.
    pub fn name(self) -> &'static str {
        match self {
            Column::UserId => "userid",
            Column::Username => "username",
            Column::FirstName => "firstname",
            Column::LastName => "lastname",
            Column::PhoneNumber => "phonenumber",
            Column::Onboarding => "onboarding",
            Column::Status => "status",
            Column::Type => "type",
        }
    }

    /// Columns searched by a free-text term.
    pub const SEARCHABLE: [Column; 4] = [
        Column::Username,
        Column::FirstName,
        Column::LastName,
        Column::PhoneNumber,
    ];
}

/// Literal compared against a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Bool(bool),
    Int(i64),
}

impl Value {
    fn render(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

/// Comparison on `createdat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Gte,
    Lte,
    Lt,
}

impl Cmp {
    fn operator(self) -> &'static str {
        match self {
            Cmp::Gte => "gte",
            Cmp::Lte => "lte",
            Cmp::Lt => "lt",
        }
    }
}

/// A single filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Column, Value),
    IsNull(Column),
    NotNull(Column),
    CreatedAt(Cmp, DateTime<Utc>),
    /// Case-insensitive substring match OR-ed across [`Column::SEARCHABLE`].
    /// The term is literal: `%` and `_` are not wildcards.
    Search(String),
}

fn text_column(user: &User, column: Column) -> Option<String> {
    match column {
        Column::UserId => Some(user.userid.to_string()),
        Column::Username => user.username.clone(),
        Column::FirstName => Some(user.first_name.clone()),
        Column::LastName => user.last_name.clone(),
        Column::PhoneNumber => user.phone_number.clone(),
        Column::Onboarding => user.onboarding.map(|b| b.to_string()),
        Column::Status => user.status.as_ref().map(|s| s.as_str().to_string()),
        Column::Type => user.lead_type.clone(),
    }
}

impl Predicate {
    /// Evaluate against a record.
    pub fn matches(&self, user: &User) -> bool {
        match self {
            Predicate::Eq(column, value) => match (column, value) {
                (Column::UserId, Value::Int(id)) => user.userid == *id,
                (Column::Onboarding, Value::Bool(b)) => user.onboarding == Some(*b),
                (column, value) => {
                    text_column(user, *column).as_deref() == Some(value.render().as_str())
                }
            },
            Predicate::IsNull(column) => text_column(user, *column).is_none(),
            Predicate::NotNull(column) => text_column(user, *column).is_some(),
            Predicate::CreatedAt(cmp, at) => match user.created_at_utc() {
                Some(created) => match cmp {
                    Cmp::Gte => created >= *at,
                    Cmp::Lte => created <= *at,
                    Cmp::Lt => created < *at,
                },
                None => false,
            },
            Predicate::Search(term) => {
                let needle = term.to_lowercase();
                Column::SEARCHABLE.iter().any(|column| {
                    text_column(user, *column)
                        .map(|v| v.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
            }
        }
    }

    /// Render as a PostgREST query parameter.
    pub fn to_param(&self) -> (String, String) {
        match self {
            Predicate::Eq(column, value) => {
                (column.name().to_string(), format!("eq.{}", value.render()))
            }
            Predicate::IsNull(column) => (column.name().to_string(), "is.null".to_string()),
            Predicate::NotNull(column) => (column.name().to_string(), "not.is.null".to_string()),
            Predicate::CreatedAt(cmp, at) => (
                "createdat".to_string(),
                format!("{}.{}", cmp.operator(), format_utc_rfc3339(*at)),
            ),
            Predicate::Search(term) => {
                let pattern = quote_or_value(&format!("*{}*", escape_like(term)));
                let clauses: Vec<String> = Column::SEARCHABLE
                    .iter()
                    .map(|column| format!("{}.ilike.{}", column.name(), pattern))
                    .collect();
                ("or".to_string(), format!("({})", clauses.join(",")))
            }
        }
    }
}

/// Escape LIKE metacharacters so a search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Quote a value inside an `or=(...)` list so reserved characters survive.
fn quote_or_value(raw: &str) -> String {
    let escaped = raw.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Conjunction of predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    predicates: Vec<Predicate>,
}

impl UserFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: Column, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Eq(column, value.into()));
        self
    }

    pub fn is_null(mut self, column: Column) -> Self {
        self.predicates.push(Predicate::IsNull(column));
        self
    }

    pub fn not_null(mut self, column: Column) -> Self {
        self.predicates.push(Predicate::NotNull(column));
        self
    }

    pub fn created(mut self, cmp: Cmp, at: DateTime<Utc>) -> Self {
        self.predicates.push(Predicate::CreatedAt(cmp, at));
        self
    }

    /// Add a search term; blank terms are ignored.
    pub fn search(mut self, term: &str) -> Self {
        let term = term.trim();
        if !term.is_empty() {
            self.predicates.push(Predicate::Search(term.to_string()));
        }
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, user: &User) -> bool {
        self.predicates.iter().all(|p| p.matches(user))
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        self.predicates.iter().map(Predicate::to_param).collect()
    }
}

/// Sort direction on `createdat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    CreatedAsc,
    CreatedDesc,
}

/// A filtered, ordered, optionally paginated select.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserQuery {
    pub filter: UserFilter,
    pub order: Option<Order>,
    /// Zero-based offset and row limit.
    pub range: Option<(u64, u64)>,
    /// Ask the store for the exact number of matching rows.
    pub exact_count: bool,
}

impl UserQuery {
    pub fn new(filter: UserFilter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn range(mut self, offset: u64, limit: u64) -> Self {
        self.range = Some((offset, limit));
        self
    }

    pub fn with_count(mut self) -> Self {
        self.exact_count = true;
        self
    }

    /// Render as PostgREST query parameters (filters, order, pagination).
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(self.filter.to_params());
        if let Some(order) = self.order {
            let value = match order {
                Order::CreatedAsc => "createdat.asc",
                Order::CreatedDesc => "createdat.desc",
            };
            params.push(("order".to_string(), value.to_string()));
        }
        if let Some((offset, limit)) = self.range {
            params.push(("offset".to_string(), offset.to_string()));
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

/// Rows from a select plus the exact total, when requested.
#[derive(Debug, Clone, Default)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LeadStatus;
    use chrono::TimeZone;

    fn user(id: i64, first: &str, phone: Option<&str>, created: &str) -> User {
        User {
            userid: id,
            username: Some(format!("tg_{}", id)),
            first_name: first.to_string(),
            last_name: None,
            language_code: None,
            phone_number: phone.map(String::from),
            onboarding: Some(true),
            status: Some(LeadStatus::New),
            lead_type: None,
            attended: None,
            remarks: None,
            created_at: created.to_string(),
            updated_at: created.to_string(),
        }
    }

    #[test]
    fn test_search_is_case_insensitive_across_columns() {
        let u = user(1, "Dilnoza", Some("+998901112233"), "2024-01-15T10:00:00Z");
        assert!(UserFilter::new().search("dILN").matches(&u));
        assert!(UserFilter::new().search("tg_1").matches(&u));
        assert!(UserFilter::new().search("1112").matches(&u));
        assert!(!UserFilter::new().search("karim").matches(&u));
    }

    #[test]
    fn test_search_wildcards_are_literal() {
        let u = user(1, "Promo 50xyoff", None, "2024-01-15T10:00:00Z");
        assert!(!UserFilter::new().search("50%_off").matches(&u));

        let (key, value) = Predicate::Search("50%_off".to_string()).to_param();
        assert_eq!(key, "or");
        assert!(value.starts_with("(username.ilike.\"*50\\\\%\\\\_off*\","));
    }

    #[test]
    fn test_blank_search_adds_no_predicate() {
        assert!(UserFilter::new().search("   ").predicates().is_empty());
    }

    #[test]
    fn test_null_checks() {
        let with_phone = user(1, "A", Some("+1"), "2024-01-15T10:00:00Z");
        let without = user(2, "B", None, "2024-01-15T10:00:00Z");
        let filter = UserFilter::new().not_null(Column::PhoneNumber);
        assert!(filter.matches(&with_phone));
        assert!(!filter.matches(&without));
        assert!(UserFilter::new().is_null(Column::PhoneNumber).matches(&without));
    }

    #[test]
    fn test_created_range_bounds() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap();
        let filter = UserFilter::new()
            .created(Cmp::Gte, start)
            .created(Cmp::Lt, end);

        assert!(filter.matches(&user(1, "A", None, "2024-01-15T00:00:00Z")));
        assert!(filter.matches(&user(2, "B", None, "2024-01-15T23:59:59Z")));
        assert!(!filter.matches(&user(3, "C", None, "2024-01-16T00:00:00Z")));
        assert!(!filter.matches(&user(4, "D", None, "not a date")));
    }

    #[test]
    fn test_eq_on_bool_and_status() {
        let u = user(1, "A", None, "2024-01-15T10:00:00Z");
        assert!(UserFilter::new().eq(Column::Onboarding, true).matches(&u));
        assert!(!UserFilter::new().eq(Column::Onboarding, false).matches(&u));
        assert!(UserFilter::new().eq(Column::Status, "new").matches(&u));
        assert!(UserFilter::new().eq(Column::UserId, 1i64).matches(&u));
    }

    #[test]
    fn test_render_postgrest_params() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let query = UserQuery::new(
            UserFilter::new()
                .eq(Column::Status, "qualified")
                .not_null(Column::PhoneNumber)
                .created(Cmp::Gte, at)
                .search("ali, \"x\""),
        )
        .order(Order::CreatedDesc)
        .range(30, 15);

        let params = query.to_params();
        let get = |k: &str| -> Vec<&str> {
            params
                .iter()
                .filter(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
                .collect()
        };

        assert_eq!(get("select"), vec!["*"]);
        assert_eq!(get("status"), vec!["eq.qualified"]);
        assert_eq!(get("phonenumber"), vec!["not.is.null"]);
        assert_eq!(get("createdat"), vec!["gte.2024-01-15T00:00:00.000Z"]);
        assert_eq!(get("order"), vec!["createdat.desc"]);
        assert_eq!(get("offset"), vec!["30"]);
        assert_eq!(get("limit"), vec!["15"]);
        assert_eq!(
            get("or"),
            vec![
                "(username.ilike.\"*ali, \\\"x\\\"*\",firstname.ilike.\"*ali, \\\"x\\\"*\",\
                 lastname.ilike.\"*ali, \\\"x\\\"*\",phonenumber.ilike.\"*ali, \\\"x\\\"*\")"
            ]
        );
    }
}
