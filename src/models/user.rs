use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Post;
use crate::identity::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Opaque to this crate; hashing and verification belong to the
    /// Authenticator capability.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// One author's feed: the current username plus their posts, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct UserPosts {
    pub username: String,
    pub posts: Vec<Post>,
}

/// Moderation dashboard totals.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Stats {
    pub total_users: u64,
    pub total_posts: u64,
    pub total_comments: u64,
    pub total_likes: u64,
}
