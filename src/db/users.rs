use rusqlite::{params, OptionalExtension};

use crate::error::{AppError, Result};
use crate::identity::{ensure_admin, Principal, Role};
use crate::models::{User, UserPosts};

use super::repository::{post_from_row, require_nonempty, user_from_row, Repository};

impl Repository {
    /// Registers an account. The password hash is opaque here; producing
    /// and verifying it is the Authenticator's job.
    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        require_nonempty(username, "username")?;
        require_nonempty(password_hash, "password")?;

        let username = username.to_string();
        let password_hash = password_hash.to_string();
        let user = self
            .conn
            .call(move |conn| {
                let taken = conn
                    .query_row("SELECT 1 FROM users WHERE username = ?1", [&username], |_| {
                        Ok(())
                    })
                    .optional()?
                    .is_some();
                if taken {
                    return Err(
                        AppError::Conflict(format!("username '{username}' already exists")).into(),
                    );
                }

                conn.execute(
                    "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                    params![username, password_hash],
                )?;
                let user = conn.query_row(
                    "SELECT id, username, password_hash, role, created_at
                     FROM users WHERE id = ?1",
                    [conn.last_insert_rowid()],
                    user_from_row,
                )?;
                Ok(user)
            })
            .await?;

        tracing::debug!(user_id = user.id, "registered user");
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_string();
        let user = self
            .conn
            .call(move |conn| {
                let user = conn
                    .query_row(
                        "SELECT id, username, password_hash, role, created_at
                         FROM users WHERE username = ?1",
                        [username],
                        user_from_row,
                    )
                    .optional()?;
                Ok(user)
            })
            .await?;
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<User> {
        let user = self
            .conn
            .call(move |conn| {
                let user = conn
                    .query_row(
                        "SELECT id, username, password_hash, role, created_at
                         FROM users WHERE id = ?1",
                        [id],
                        user_from_row,
                    )
                    .optional()?;
                user.ok_or_else(|| AppError::NotFound("user").into())
            })
            .await?;
        Ok(user)
    }

    /// Role is the only account field that changes after creation, and only
    /// an admin may change it.
    pub async fn set_role(&self, actor: &Principal, user_id: i64, role: Role) -> Result<()> {
        ensure_admin(actor)?;

        self.conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE users SET role = ?1 WHERE id = ?2",
                    params![role.as_str(), user_id],
                )?;
                if changed == 0 {
                    return Err(AppError::NotFound("user").into());
                }
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Removes an account and, through the cascades, everything it owns.
    /// Allowed for the account itself or an admin.
    pub async fn delete_user(&self, actor: &Principal, user_id: i64) -> Result<()> {
        if !actor.is_owner(user_id) {
            ensure_admin(actor)?;
        }

        self.conn
            .call(move |conn| {
                let deleted = conn.execute("DELETE FROM users WHERE id = ?1", [user_id])?;
                if deleted == 0 {
                    return Err(AppError::NotFound("user").into());
                }
                Ok(())
            })
            .await?;

        tracing::debug!(user_id, "deleted user");
        Ok(())
    }

    /// One author's feed: current username plus their posts, newest first.
    pub async fn posts_by_user(&self, user_id: i64) -> Result<UserPosts> {
        let feed = self
            .conn
            .call(move |conn| {
                let username: String = conn
                    .query_row("SELECT username FROM users WHERE id = ?1", [user_id], |row| {
                        row.get(0)
                    })
                    .optional()?
                    .ok_or(AppError::NotFound("user"))?;

                let mut stmt = conn.prepare(
                    "SELECT id, title, content, image_ref, user_id, author_username,
                            like_count, created_at
                     FROM posts
                     WHERE user_id = ?1
                     ORDER BY created_at DESC, id DESC",
                )?;
                let posts = stmt
                    .query_map([user_id], post_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(UserPosts { username, posts })
            })
            .await?;
        Ok(feed)
    }
}

#[cfg(test)]
mod tests {
    use super::super::repository::test_support::{as_admin, draft, repo, seeded_user};
    use crate::error::AppError;
    use crate::identity::Role;

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let repo = repo().await;
        repo.create_user("alice", "hash-1").await.unwrap();
        let err = repo.create_user("alice", "hash-2").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.status(), 409);
    }

    #[tokio::test]
    async fn lookup_by_name_and_id() {
        let repo = repo().await;
        let created = repo.create_user("alice", "hash").await.unwrap();
        assert_eq!(created.role, Role::User);

        let found = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.find_by_username("nobody").await.unwrap().is_none());

        assert!(matches!(
            repo.get_user(999).await.unwrap_err(),
            AppError::NotFound("user")
        ));
    }

    #[tokio::test]
    async fn only_admins_change_roles() {
        let repo = repo().await;
        let alice = seeded_user(&repo, "alice").await;
        let bob = seeded_user(&repo, "bob").await;

        let err = repo.set_role(&alice, bob.id, Role::Admin).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        repo.set_role(&as_admin(&alice), bob.id, Role::Admin)
            .await
            .unwrap();
        assert_eq!(repo.get_user(bob.id).await.unwrap().role, Role::Admin);

        let err = repo
            .set_role(&as_admin(&alice), 999, Role::User)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("user")));
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_to_their_content() {
        let repo = repo().await;
        let alice = seeded_user(&repo, "alice").await;
        let bob = seeded_user(&repo, "bob").await;
        let post = repo
            .create_post(&bob, draft("Bob's post", "body", &[]))
            .await
            .unwrap();
        repo.create_comment(&bob, post.id, "my own comment")
            .await
            .unwrap();
        repo.toggle_like(bob.id, post.id).await.unwrap();

        // Another user may not remove the account.
        let err = repo.delete_user(&alice, bob.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        repo.delete_user(&bob, bob.id).await.unwrap();
        assert!(matches!(
            repo.get_post(post.id).await.unwrap_err(),
            AppError::NotFound("post")
        ));
    }

    #[tokio::test]
    async fn author_feed_is_newest_first_or_not_found() {
        let repo = repo().await;
        let alice = seeded_user(&repo, "alice").await;
        repo.create_post(&alice, draft("old", "body", &[]))
            .await
            .unwrap();
        repo.create_post(&alice, draft("new", "body", &[]))
            .await
            .unwrap();

        let feed = repo.posts_by_user(alice.id).await.unwrap();
        assert_eq!(feed.username, "alice");
        assert_eq!(feed.posts.len(), 2);
        assert_eq!(feed.posts[0].title, "new");

        assert!(matches!(
            repo.posts_by_user(999).await.unwrap_err(),
            AppError::NotFound("user")
        ));
    }
}
