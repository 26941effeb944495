use chrono::{DateTime, Utc};
use rusqlite::Row;
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{Comment, Post, User};

use super::schema::SCHEMA;

/// Async facade over the content store. One background thread owns the
/// SQLite handle; every operation runs as a closure on that thread, so a
/// transaction inside one closure never interleaves with another call.
pub struct Repository {
    pub(super) conn: Connection,
}

impl Repository {
    pub async fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    /// Private throwaway store, mainly for tests and embedding demos.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            // Cascading deletes depend on this pragma; SQLite defaults it off.
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }
}

pub(super) fn require_nonempty(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        Err(AppError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

pub(super) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn datetime_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(row
        .get::<_, String>(idx)
        .ok()
        .and_then(|s| parse_datetime(&s))
        .unwrap_or_else(Utc::now))
}

// Column order: id, title, content, image_ref, user_id, author_username,
// like_count, created_at
pub(super) fn post_from_row(row: &Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        image_ref: row.get(3)?,
        user_id: row.get(4)?,
        author_username: row.get(5)?,
        like_count: row.get(6)?,
        created_at: datetime_column(row, 7)?,
        tags: Vec::new(),
    })
}

// Column order: id, content, post_id, user_id, author_username, created_at
pub(super) fn comment_from_row(row: &Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        content: row.get(1)?,
        post_id: row.get(2)?,
        user_id: row.get(3)?,
        author_username: row.get(4)?,
        created_at: datetime_column(row, 5)?,
    })
}

// Column order: id, username, password_hash, role, created_at
pub(super) fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role: crate::identity::Role::parse(&row.get::<_, String>(3)?),
        created_at: datetime_column(row, 4)?,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Repository;
    use crate::identity::{Principal, Role};
    use crate::models::PostDraft;

    pub(crate) async fn repo() -> Repository {
        Repository::open_in_memory().await.unwrap()
    }

    /// Inserts a user row and returns the principal an Authenticator would
    /// hand out for it.
    pub(crate) async fn seeded_user(repo: &Repository, name: &str) -> Principal {
        let user = repo.create_user(name, "opaque-hash").await.unwrap();
        Principal {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }

    pub(crate) fn as_admin(principal: &Principal) -> Principal {
        Principal {
            role: Role::Admin,
            ..principal.clone()
        }
    }

    pub(crate) fn draft(title: &str, content: &str, tags: &[&str]) -> PostDraft {
        PostDraft {
            title: title.to_string(),
            content: content.to_string(),
            image_ref: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}
