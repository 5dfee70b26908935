//! Wire types for the forum REST API
//!
//! Field names are camelCase on the wire. Search endpoints wrap their payload in
//! an [`Envelope`] whose `result` carries a domain-named array (`threads`,
//! `posts`, `boards`); callers map those into the generic list contract
//! themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal author information embedded in threads and posts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl UserSummary {
    /// Name to show in listings
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}

/// A forum account as returned for the session user and profile endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }

    /// Current value of an editable profile field
    pub fn field_value(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::DisplayName => self.display_name.as_deref(),
            ProfileField::Email => self.email.as_deref(),
            ProfileField::Bio => self.bio.as_deref(),
        }
        .unwrap_or("")
    }

    /// Overwrite an editable profile field
    pub fn set_field_value(&mut self, field: ProfileField, value: String) {
        let value = if value.is_empty() { None } else { Some(value) };
        match field {
            ProfileField::DisplayName => self.display_name = value,
            ProfileField::Email => self.email = value,
            ProfileField::Bio => self.bio = value,
        }
    }
}

/// Profile fields that can be edited inline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    DisplayName,
    Email,
    Bio,
}

impl ProfileField {
    pub const ALL: [ProfileField; 3] = [
        ProfileField::DisplayName,
        ProfileField::Email,
        ProfileField::Bio,
    ];

    /// JSON key used by `PATCH /users/{id}`
    pub fn wire_name(self) -> &'static str {
        match self {
            ProfileField::DisplayName => "displayName",
            ProfileField::Email => "email",
            ProfileField::Bio => "bio",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProfileField::DisplayName => "Display name",
            ProfileField::Email => "Email",
            ProfileField::Bio => "Bio",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thread_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: i64,
    pub board_id: i64,
    pub title: String,
    #[serde(default)]
    pub author: Option<UserSummary>,
    #[serde(default)]
    pub post_count: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_post_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub thread_id: i64,
    #[serde(default)]
    pub author: Option<UserSummary>,
    /// Post content as HTML produced by the web editor
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Standard response wrapper for list endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<R> {
    pub result: R,
    #[serde(default)]
    pub session_user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardList {
    pub boards: Vec<Board>,
    #[serde(default)]
    pub matched_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSearch {
    pub threads: Vec<Thread>,
    pub matched_count: usize,
    #[serde(default)]
    pub return_count: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSearch {
    pub posts: Vec<Post>,
    pub matched_count: usize,
    #[serde(default)]
    pub return_count: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBody {
    #[serde(default)]
    pub session_user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadBody {
    pub thread: Thread,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostBody {
    pub post: Post,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserBody {
    pub user: User,
}

/// Offset/limit query parameters for search endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewThread {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPost {
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}
