use rusqlite::{params, OptionalExtension};

use crate::error::{AppError, Result};
use crate::identity::{ensure_owner, Principal};
use crate::models::Comment;

use super::repository::{comment_from_row, require_nonempty, Repository};

impl Repository {
    /// The parent post is checked inside the transaction so a comment
    /// against a just-deleted post surfaces as `NotFound`, not as a
    /// generic storage failure.
    pub async fn create_comment(
        &self,
        author: &Principal,
        post_id: i64,
        content: &str,
    ) -> Result<Comment> {
        require_nonempty(content, "content")?;

        let author = author.clone();
        let content = content.to_string();
        let comment = self
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

                tx.execute(
                    "INSERT INTO comments (content, post_id, user_id, author_username)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![content, post_id, author.id, author.username],
                )?;
                let comment = tx.query_row(
                    "SELECT id, content, post_id, user_id, author_username, created_at
                     FROM comments WHERE id = ?1",
                    [tx.last_insert_rowid()],
                    comment_from_row,
                )?;
                tx.commit()?;
                Ok(comment)
            })
            .await?;
        Ok(comment)
    }

    /// Conversation order: oldest first.
    pub async fn comments_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let comments = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, content, post_id, user_id, author_username, created_at
                     FROM comments
                     WHERE post_id = ?1
                     ORDER BY created_at ASC, id ASC",
                )?;
                let comments = stmt
                    .query_map([post_id], comment_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(comments)
            })
            .await?;
        Ok(comments)
    }

    pub async fn delete_comment(&self, actor: &Principal, id: i64) -> Result<()> {
        let actor = actor.clone();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let author_id: i64 = tx
                    .query_row("SELECT user_id FROM comments WHERE id = ?1", [id], |row| {
                        row.get(0)
                    })
                    .optional()?
                    .ok_or(AppError::NotFound("comment"))?;
                ensure_owner(&actor, author_id)?;

                tx.execute("DELETE FROM comments WHERE id = ?1", [id])?;
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}
