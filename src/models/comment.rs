use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub post_id: i64,
    pub user_id: i64,
    /// Snapshot of the author's username at comment time.
    pub author_username: String,
    pub created_at: DateTime<Utc>,
}
