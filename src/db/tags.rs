use rusqlite::OptionalExtension;

use crate::error::Result;
use crate::models::Post;

use super::repository::{post_from_row, Repository};

/// Normalizes raw tag input: trim, lower-case, drop empties, collapse
/// duplicates while keeping first-seen order.
pub(super) fn normalize(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in names {
        let name = raw.trim().to_lowercase();
        if name.is_empty() || out.contains(&name) {
            continue;
        }
        out.push(name);
    }
    out
}

/// Resolves a normalized name to a tag id, creating the row lazily.
/// `INSERT OR IGNORE` then re-select keeps concurrent creation of the same
/// name idempotent instead of surfacing a unique-key failure.
pub(super) fn find_or_create(conn: &rusqlite::Connection, name: &str) -> rusqlite::Result<i64> {
    let existing = conn
        .query_row("SELECT id FROM tags WHERE name = ?1", [name], |row| {
            row.get(0)
        })
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", [name])?;
    conn.query_row("SELECT id FROM tags WHERE name = ?1", [name], |row| {
        row.get(0)
    })
}

/// Clears a post's links and attaches fresh ones. Runs inside the caller's
/// transaction so readers never observe a half-replaced tag set.
pub(super) fn replace_links(
    conn: &rusqlite::Connection,
    post_id: i64,
    names: &[String],
) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM post_tags WHERE post_id = ?1", [post_id])?;
    for name in normalize(names) {
        let tag_id = find_or_create(conn, &name)?;
        conn.execute(
            "INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?1, ?2)",
            [post_id, tag_id],
        )?;
    }
    Ok(())
}

pub(super) fn tags_for_post(
    conn: &rusqlite::Connection,
    post_id: i64,
) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name FROM tags t
         JOIN post_tags pt ON pt.tag_id = t.id
         WHERE pt.post_id = ?1
         ORDER BY t.name",
    )?;
    let tags = stmt
        .query_map([post_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(tags)
}

impl Repository {
    /// Tag → PostTag → Post traversal, newest posts first.
    pub async fn posts_by_tag(&self, tag_name: &str) -> Result<Vec<Post>> {
        let name = tag_name.trim().to_lowercase();
        if name.is_empty() {
            return Ok(Vec::new());
        }

        let posts = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT p.id, p.title, p.content, p.image_ref, p.user_id,
                            p.author_username, p.like_count, p.created_at
                     FROM posts p
                     JOIN post_tags pt ON pt.post_id = p.id
                     JOIN tags t ON t.id = pt.tag_id
                     WHERE t.name = ?1
                     ORDER BY p.created_at DESC, p.id DESC",
                )?;
                let posts = stmt
                    .query_map([name], post_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(posts)
            })
            .await?;
        Ok(posts)
    }
}
