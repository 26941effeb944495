use crate::error::Result;
use crate::identity::{ensure_admin, Principal};
use crate::models::{Post, Stats};

use super::repository::{post_from_row, Repository};

impl Repository {
    /// Case-insensitive substring match on titles. An empty term is an
    /// empty result, not "all posts", and never reaches the store.
    pub async fn search_by_title(&self, term: &str) -> Result<Vec<Post>> {
        let term = term.trim().to_string();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let posts = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, title, content, image_ref, user_id, author_username,
                            like_count, created_at
                     FROM posts
                     WHERE title LIKE '%' || ?1 || '%'
                     ORDER BY created_at DESC, id DESC",
                )?;
                let posts = stmt
                    .query_map([term], post_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(posts)
            })
            .await?;
        Ok(posts)
    }

    /// Most-liked posts. Recency breaks ties so the ranking is
    /// deterministic; unliked posts never appear.
    pub async fn popular_posts(&self, limit: u32) -> Result<Vec<Post>> {
        let limit = limit.max(1);
        let posts = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, title, content, image_ref, user_id, author_username,
                            like_count, created_at
                     FROM posts
                     WHERE like_count > 0
                     ORDER BY like_count DESC, created_at DESC, id DESC
                     LIMIT ?1",
                )?;
                let posts = stmt
                    .query_map([limit as i64], post_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(posts)
            })
            .await?;
        Ok(posts)
    }

    /// Moderation dashboard totals. Admin only.
    pub async fn stats(&self, actor: &Principal) -> Result<Stats> {
        ensure_admin(actor)?;

        let stats = self
            .conn
            .call(|conn| {
                let count = |sql: &str| -> rusqlite::Result<u64> {
                    conn.query_row(sql, [], |row| row.get::<_, i64>(0))
                        .map(|n| n as u64)
                };
                Ok(Stats {
                    total_users: count("SELECT COUNT(*) FROM users")?,
                    total_posts: count("SELECT COUNT(*) FROM posts")?,
                    total_comments: count("SELECT COUNT(*) FROM comments")?,
                    total_likes: count("SELECT COUNT(*) FROM likes")?,
                })
            })
            .await?;
        Ok(stats)
    }
}
