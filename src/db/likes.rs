use rusqlite::{params, OptionalExtension};

use crate::error::{AppError, Result};

use super::repository::Repository;

impl Repository {
    /// Flips one user's like on one post and keeps `like_count` exactly in
    /// step with the likes table. Returns whether the post is liked after
    /// the call.
    ///
    /// The whole toggle is one transaction and the counter moves by a
    /// relative delta evaluated by SQLite, never by a value computed from a
    /// prior read. The decrement floors at zero so prior drift can never
    /// push the counter negative.
    pub async fn toggle_like(&self, user_id: i64, post_id: i64) -> Result<bool> {
        let liked = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let post_exists = tx
                    .query_row("SELECT 1 FROM posts WHERE id = ?1", [post_id], |_| Ok(()))
                    .optional()?
                    .is_some();
                if !post_exists {
                    return Err(AppError::NotFound("post").into());
                }

                let already_liked = tx
                    .query_row(
                        "SELECT 1 FROM likes WHERE user_id = ?1 AND post_id = ?2",
                        params![user_id, post_id],
                        |_| Ok(()),
                    )
                    .optional()?
                    .is_some();

                let liked = if already_liked {
                    tx.execute(
                        "DELETE FROM likes WHERE user_id = ?1 AND post_id = ?2",
                        params![user_id, post_id],
                    )?;
                    tx.execute(
                        "UPDATE posts SET like_count = MAX(like_count - 1, 0) WHERE id = ?1",
                        [post_id],
                    )?;
                    false
                } else {
                    tx.execute(
                        "INSERT INTO likes (user_id, post_id) VALUES (?1, ?2)",
                        params![user_id, post_id],
                    )?;
                    tx.execute(
                        "UPDATE posts SET like_count = like_count + 1 WHERE id = ?1",
                        [post_id],
                    )?;
                    true
                };
                tx.commit()?;
                Ok(liked)
            })
            .await?;

        tracing::debug!(user_id, post_id, liked, "toggled like");
        Ok(liked)
    }

    /// Ids of every post the user currently likes.
    pub async fn liked_post_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        let ids = self
            .conn
            .call(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT post_id FROM likes WHERE user_id = ?1 ORDER BY post_id")?;
                let ids = stmt
                    .query_map([user_id], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(ids)
            })
            .await?;
        Ok(ids)
    }

    /// Usernames of everyone who liked the post, in like order.
    pub async fn likers_of(&self, post_id: i64) -> Result<Vec<String>> {
        let names = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT u.username FROM users u
                     JOIN likes l ON l.user_id = u.id
                     WHERE l.post_id = ?1
                     ORDER BY l.created_at ASC, u.id ASC",
                )?;
                let names = stmt
                    .query_map([post_id], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await?;
        Ok(names)
    }
}
