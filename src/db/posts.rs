use rusqlite::{params, OptionalExtension};

use crate::error::{AppError, Result};
use crate::identity::{ensure_owner, Principal};
use crate::models::{Post, PostDraft, PostPage};

use super::repository::{post_from_row, require_nonempty, Repository};
use super::tags;

impl Repository {
    /// Inserts the post and its tag links as one transaction: either both
    /// exist afterwards or neither does.
    pub async fn create_post(&self, author: &Principal, draft: PostDraft) -> Result<Post> {
        require_nonempty(&draft.title, "title")?;
        require_nonempty(&draft.content, "content")?;

        let author = author.clone();
        let post = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO posts (title, content, image_ref, user_id, author_username)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        draft.title,
                        draft.content,
                        draft.image_ref,
                        author.id,
                        author.username
                    ],
                )?;
                let post_id = tx.last_insert_rowid();
                tags::replace_links(&tx, post_id, &draft.tags)?;

                let mut post = tx.query_row(
                    "SELECT id, title, content, image_ref, user_id, author_username,
                            like_count, created_at
                     FROM posts WHERE id = ?1",
                    [post_id],
                    post_from_row,
                )?;
                post.tags = tags::tags_for_post(&tx, post_id)?;
                tx.commit()?;
                Ok(post)
            })
            .await?;

        tracing::debug!(post_id = post.id, "created post");
        Ok(post)
    }

    pub async fn get_post(&self, id: i64) -> Result<Post> {
        let post = self
            .conn
            .call(move |conn| {
                let post = conn
                    .query_row(
                        "SELECT id, title, content, image_ref, user_id, author_username,
                                like_count, created_at
                         FROM posts WHERE id = ?1",
                        [id],
                        post_from_row,
                    )
                    .optional()?;
                let mut post = post.ok_or(AppError::NotFound("post"))?;
                post.tags = tags::tags_for_post(conn, id)?;
                Ok(post)
            })
            .await?;
        Ok(post)
    }

    /// Replaces title/content/image and the tag links, gated on ownership.
    /// The ownership check reads the stored owner inside the same
    /// transaction that mutates the row.
    pub async fn update_post(
        &self,
        actor: &Principal,
        id: i64,
        draft: PostDraft,
    ) -> Result<Post> {
        require_nonempty(&draft.title, "title")?;
        require_nonempty(&draft.content, "content")?;

        let actor = actor.clone();
        let post = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let owner_id: i64 = tx
                    .query_row("SELECT user_id FROM posts WHERE id = ?1", [id], |row| {
                        row.get(0)
                    })
                    .optional()?
                    .ok_or(AppError::NotFound("post"))?;
                ensure_owner(&actor, owner_id)?;

                tx.execute(
                    "UPDATE posts SET title = ?1, content = ?2, image_ref = ?3 WHERE id = ?4",
                    params![draft.title, draft.content, draft.image_ref, id],
                )?;
                tags::replace_links(&tx, id, &draft.tags)?;

                let mut post = tx.query_row(
                    "SELECT id, title, content, image_ref, user_id, author_username,
                            like_count, created_at
                     FROM posts WHERE id = ?1",
                    [id],
                    post_from_row,
                )?;
                post.tags = tags::tags_for_post(&tx, id)?;
                tx.commit()?;
                Ok(post)
            })
            .await?;
        Ok(post)
    }

    /// Deletes a post; comments, likes and tag links go with it via the
    /// store's cascading foreign keys.
    pub async fn delete_post(&self, actor: &Principal, id: i64) -> Result<()> {
        let actor = actor.clone();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let owner_id: i64 = tx
                    .query_row("SELECT user_id FROM posts WHERE id = ?1", [id], |row| {
                        row.get(0)
                    })
                    .optional()?
                    .ok_or(AppError::NotFound("post"))?;
                ensure_owner(&actor, owner_id)?;

                tx.execute("DELETE FROM posts WHERE id = ?1", [id])?;
                tx.commit()?;
                Ok(())
            })
            .await?;

        tracing::debug!(post_id = id, "deleted post");
        Ok(())
    }

    /// Paginated feed, newest first. Page and limit are clamped to at
    /// least 1; `total_pages = ceil(total_count / limit)`.
    pub async fn list_posts(&self, page: u32, limit: u32) -> Result<PostPage> {
        let page = page.max(1);
        let limit = limit.max(1);
        let offset = (page as i64 - 1) * limit as i64;

        let (items, total_count) = self
            .conn
            .call(move |conn| {
                let total: i64 =
                    conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
                let mut stmt = conn.prepare(
                    "SELECT id, title, content, image_ref, user_id, author_username,
                            like_count, created_at
                     FROM posts
                     ORDER BY created_at DESC, id DESC
                     LIMIT ?1 OFFSET ?2",
                )?;
                let items = stmt
                    .query_map(params![limit as i64, offset], post_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok((items, total as u64))
            })
            .await?;

        let total_pages = (total_count.div_ceil(limit as u64)) as u32;
        Ok(PostPage {
            items,
            total_pages,
            current_page: page,
            total_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::repository::test_support::{draft, repo, seeded_user};
    use crate::error::AppError;
    use crate::models::PostDraft;

    #[tokio::test]
    async fn empty_title_or_content_is_rejected() {
        let repo = repo().await;
        let author = seeded_user(&repo, "alice").await;

        let err = repo
            .create_post(&author, draft("   ", "body", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = repo
            .create_post(&author, draft("title", "", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn only_the_owner_may_update_or_delete() {
        let repo = repo().await;
        let alice = seeded_user(&repo, "alice").await;
        let bob = seeded_user(&repo, "bob").await;

        let post = repo
            .create_post(&alice, draft("Mine", "body", &[]))
            .await
            .unwrap();

        let err = repo
            .update_post(&bob, post.id, draft("Stolen", "body", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = repo.delete_post(&bob, post.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let updated = repo
            .update_post(&alice, post.id, draft("Still mine", "body", &[]))
            .await
            .unwrap();
        assert_eq!(updated.title, "Still mine");
        repo.delete_post(&alice, post.id).await.unwrap();
        assert!(matches!(
            repo.get_post(post.id).await.unwrap_err(),
            AppError::NotFound("post")
        ));
    }

    #[tokio::test]
    async fn update_of_missing_post_is_not_found() {
        let repo = repo().await;
        let alice = seeded_user(&repo, "alice").await;
        let err = repo
            .update_post(&alice, 999, draft("x", "y", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("post")));
    }

    #[tokio::test]
    async fn update_replaces_tag_links() {
        let repo = repo().await;
        let alice = seeded_user(&repo, "alice").await;
        let post = repo
            .create_post(&alice, draft("Tagged", "body", &["rust", "sqlite"]))
            .await
            .unwrap();
        assert_eq!(post.tags, vec!["rust", "sqlite"]);

        let updated = repo
            .update_post(&alice, post.id, draft("Tagged", "body", &["tokio"]))
            .await
            .unwrap();
        assert_eq!(updated.tags, vec!["tokio"]);
        assert!(repo.posts_by_tag("rust").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn author_username_is_a_snapshot() {
        let repo = repo().await;
        let alice = seeded_user(&repo, "alice").await;
        let post = repo
            .create_post(&alice, draft("Snapshot", "body", &[]))
            .await
            .unwrap();

        // Captured at creation time, stored on the row itself.
        let fetched = repo.get_post(post.id).await.unwrap();
        assert_eq!(fetched.author_username, "alice");
        assert_eq!(fetched.user_id, alice.id);
    }

    #[tokio::test]
    async fn pagination_arithmetic() {
        let repo = repo().await;
        let alice = seeded_user(&repo, "alice").await;
        for i in 0..12 {
            repo.create_post(&alice, draft(&format!("Post {i}"), "body", &[]))
                .await
                .unwrap();
        }

        let page = repo.list_posts(3, 5).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.total_count, 12);

        // Page and limit clamp to 1 instead of erroring.
        let clamped = repo.list_posts(0, 0).await.unwrap();
        assert_eq!(clamped.current_page, 1);
        assert_eq!(clamped.items.len(), 1);
    }

    #[tokio::test]
    async fn feed_is_newest_first() {
        let repo = repo().await;
        let alice = seeded_user(&repo, "alice").await;
        repo.create_post(&alice, draft("older", "body", &[]))
            .await
            .unwrap();
        repo.create_post(&alice, draft("newer", "body", &[]))
            .await
            .unwrap();

        let page = repo.list_posts(1, 10).await.unwrap();
        assert_eq!(page.items[0].title, "newer");
    }

    #[tokio::test]
    async fn draft_default_has_no_tags() {
        // Serde default keeps tag-less payloads valid.
        let draft: PostDraft =
            serde_json::from_str(r#"{"title":"t","content":"c"}"#).unwrap();
        assert!(draft.tags.is_empty());
        assert!(draft.image_ref.is_none());
    }
}
