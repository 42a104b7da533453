//! # Session
//!
//! The identity record an external login flow leaves in client storage,
//! and the explicit `Session` value threaded through every client
//! operation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Author name used when no username is available.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// The stored `currentUser` record: `{ "username": ..., "isAdmin": ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "isAdmin", default, deserialize_with = "truthy")]
    pub is_admin: bool,
}

impl CurrentUser {
    pub fn new(username: impl Into<String>, is_admin: bool) -> Self {
        Self {
            username: Some(username.into()),
            is_admin,
        }
    }
}

/// Who is looking at the board. `None` means anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<CurrentUser>,
}

impl Session {
    pub fn new(user: Option<CurrentUser>) -> Self {
        Self { user }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Grants delete controls and delete requests. Client-side only.
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }

    /// Username, or `Anonymous` when absent or empty.
    pub fn author_name(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|u| u.username.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(ANONYMOUS_AUTHOR)
    }
}

impl From<CurrentUser> for Session {
    fn from(user: CurrentUser) -> Self {
        Self { user: Some(user) }
    }
}

// Stored records are written by other code; accept any JSON truthiness.
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}
