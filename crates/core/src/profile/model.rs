//! Profile model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::AuthUser;

/// A row of the `profiles` collection.
///
/// Every column added after the first release must carry `#[serde(default)]`
/// so rows written by older clients still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub total_minutes: i64,
    #[serde(default)]
    pub completed_tasks: i64,
    #[serde(default)]
    pub pending_tasks: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub last_sign_in: Option<DateTime<Utc>>,
}

impl Profile {
    /// Create an empty profile for an account
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            username: None,
            name: None,
            total_minutes: 0,
            completed_tasks: 0,
            pending_tasks: 0,
            created_at: None,
            updated_at: None,
            avatar_url: None,
            last_sign_in: None,
        }
    }

    /// Set the username
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the avatar URL
    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    /// Build a profile from session data when the profile row is unreadable
    pub fn fallback(user: &AuthUser) -> Self {
        let email = user.email.clone().unwrap_or_default();
        let username = user
            .username
            .clone()
            .or_else(|| user.email.clone())
            .unwrap_or_else(|| "Guest User".to_string());
        Self::new(user.id.clone(), email).with_username(username)
    }

    /// Name shown on leaderboards and chat bubbles
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.name.as_deref().filter(|s| !s.trim().is_empty()))
            .unwrap_or(self.email.as_str())
    }
}
