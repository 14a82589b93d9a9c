use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
///
/// `password_hash` is part of the JSON representation; clients reading the API
/// receive the Argon2 PHC string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Row to insert. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Data columns an update may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Username,
    Email,
    PasswordHash,
}

impl Column {
    pub fn as_str(self) -> &'static str {
        match self {
            Column::Username => "username",
            Column::Email => "email",
            Column::PasswordHash => "password_hash",
        }
    }
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    /// Present columns in a fixed order.
    pub fn into_assignments(self) -> Vec<(Column, String)> {
        [
            (Column::Username, self.username),
            (Column::Email, self.email),
            (Column::PasswordHash, self.password_hash),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password_hash.is_none()
    }
}

/// Limit/offset window for listing. `limit: None` means no limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page {
    pub limit: Option<i64>,
    pub offset: i64,
}

impl Page {
    /// Non-positive limits mean "no limit" and negative offsets clamp to zero.
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: (limit > 0).then_some(limit),
            offset: offset.max(0),
        }
    }
}
