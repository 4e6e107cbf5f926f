//! User entity and the request/response payloads built around it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User entity
///
/// Timestamps are milliseconds since the Unix epoch. `deleted_at` is set when
/// the record is soft-deleted; such rows are never returned by normal reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    #[serde(rename = "firstname")]
    pub first_name: String,
    #[serde(rename = "lastname")]
    pub last_name: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Build a fresh record from a validated create request.
    ///
    /// An absent identifier is replaced by a new UUID; both timestamps are
    /// set to `now_ms`.
    pub fn new(request: CreateUserRequest, now_ms: i64) -> Self {
        let id = request
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            id,
            first_name: request.first_name,
            last_name: request.last_name,
            created_at: now_ms,
            updated_at: now_ms,
            deleted_at: None,
        }
    }

    /// Overwrite the mutable fields. Identifier and creation time are kept.
    pub fn apply(&mut self, request: UpdateUserRequest, now_ms: i64) {
        self.first_name = request.first_name;
        self.last_name = request.last_name;
        self.updated_at = now_ms;
    }
}

/// Request for user creation
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "firstname")]
    pub first_name: String,
    #[serde(rename = "lastname")]
    pub last_name: String,
}

/// Request for updating a user's name
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub id: String,
    #[serde(rename = "firstname")]
    pub first_name: String,
    #[serde(rename = "lastname")]
    pub last_name: String,
}

/// Payloads that need checks beyond what deserialization enforces.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(())
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), String> {
        require("firstname", &self.first_name)?;
        require("lastname", &self.last_name)
    }
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), String> {
        require("id", &self.id)?;
        require("firstname", &self.first_name)?;
        require("lastname", &self.last_name)
    }
}

/// Raw query parameters of the list endpoint.
///
/// Kept as strings so that malformed paging values fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Clone, Default)]
pub struct ListUsersQuery {
    pub earliest: Option<String>,
    pub latest: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl ListUsersQuery {
    /// Collect the known parameters from decoded query pairs.
    ///
    /// A repeated key keeps its first value; unknown keys are ignored.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "earliest" => &mut query.earliest,
                "latest" => &mut query.latest,
                "page" => &mut query.page,
                "page_size" => &mut query.page_size,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// Inclusive creation-time window, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedRange {
    pub earliest: i64,
    pub latest: i64,
}

impl CreatedRange {
    /// Parse the `earliest`/`latest` bounds, defaulting to the epoch and `now_ms`.
    pub fn from_query(query: &ListUsersQuery, now_ms: i64) -> Result<Self, String> {
        let earliest = parse_millis("earliest", query.earliest.as_deref())?.unwrap_or(0);
        let latest = parse_millis("latest", query.latest.as_deref())?.unwrap_or(now_ms);
        Ok(Self { earliest, latest })
    }

    pub fn contains(&self, millis: i64) -> bool {
        self.earliest <= millis && millis <= self.latest
    }
}

fn parse_millis(name: &str, value: Option<&str>) -> Result<Option<i64>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| format!("{} must be a timestamp in milliseconds, got {:?}", name, v)),
    }
}

/// Response for a successful create
#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub message: &'static str,
    pub id: String,
}

/// Response carrying a single user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub result: User,
}

/// Response for the list endpoint
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub earliest: i64,
    pub latest: i64,
    pub results: Vec<User>,
}
