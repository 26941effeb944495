use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image_ref: Option<String>,
    pub user_id: i64,
    /// Username captured when the post was created. Deliberately a snapshot:
    /// it does not track later account renames.
    pub author_username: String,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
    /// Populated on single-post reads and mutations; list queries leave it
    /// empty to keep feed pages to one statement.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Caller-supplied fields for creating or updating a post.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub image_ref: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One page of the post feed.
#[derive(Debug, Clone, Serialize)]
pub struct PostPage {
    pub items: Vec<Post>,
    pub total_pages: u32,
    pub current_page: u32,
    pub total_count: u64,
}
