// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Post (`content` table) queries.

use crate::db::is_unique_violation;
use crate::error::{AppError, Result};
use crate::ids::MAX_ID_ATTEMPTS;
use crate::models::{from_epoch, NewPost, Post};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, warn};

const POST_COLUMNS: &str =
    "url_id, title, author, content, ip_address, edit_token, created_at, expires_at, views";

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        url_id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        content: row.get(3)?,
        ip_address: row.get(4)?,
        edit_token: row.get(5)?,
        created_at: from_epoch(row.get(6)?),
        expires_at: row.get::<_, Option<i64>>(7)?.map(from_epoch),
        views: row.get(8)?,
    })
}

/// Whether any row already uses `url_id`.
pub fn url_id_exists(conn: &Connection, url_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM content WHERE url_id = ?1",
        [url_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Insert `post` under a freshly drawn public id and return that id.
///
/// Candidates from `next_id` that already exist are skipped; a UNIQUE
/// violation on insert (another writer took the id in between) is also
/// treated as a collision. Gives up after [`MAX_ID_ATTEMPTS`] draws.
pub fn insert(
    conn: &Connection,
    post: &NewPost,
    mut next_id: impl FnMut() -> String,
) -> Result<String> {
    for attempt in 1..=MAX_ID_ATTEMPTS {
        let url_id = next_id();
        if url_id_exists(conn, &url_id)? {
            debug!(attempt, "Public id collision, drawing again");
            continue;
        }

        let inserted = conn.execute(
            "INSERT INTO content
             (url_id, title, author, content, ip_address, edit_token, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                url_id,
                post.title,
                post.author,
                post.content,
                post.ip_address,
                post.edit_token,
                post.created_at.timestamp(),
                post.expires_at.map(|t| t.timestamp()),
            ],
        );

        match inserted {
            Ok(_) => return Ok(url_id),
            Err(e) if is_unique_violation(&e) => {
                debug!(attempt, "Public id taken during insert, drawing again");
            }
            Err(e) => return Err(e.into()),
        }
    }

    warn!(attempts = MAX_ID_ATTEMPTS, "Gave up allocating a public id");
    Err(AppError::IdSpaceExhausted)
}

/// Fetch a post regardless of expiry.
pub fn get(conn: &Connection, url_id: &str) -> Result<Option<Post>> {
    let post = conn
        .query_row(
            &format!("SELECT {POST_COLUMNS} FROM content WHERE url_id = ?1"),
            [url_id],
            post_from_row,
        )
        .optional()?;
    Ok(post)
}

/// Fetch a post only while it is live at `now`. Missing and expired posts
/// are indistinguishable to the caller.
pub fn get_visible(conn: &Connection, url_id: &str, now: DateTime<Utc>) -> Result<Option<Post>> {
    let post = conn
        .query_row(
            &format!(
                "SELECT {POST_COLUMNS} FROM content
                 WHERE url_id = ?1 AND (expires_at IS NULL OR expires_at > ?2)"
            ),
            params![url_id, now.timestamp()],
            post_from_row,
        )
        .optional()?;
    Ok(post)
}

/// Bump the view counter by one.
pub fn increment_views(conn: &Connection, url_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE content SET views = views + 1 WHERE url_id = ?1",
        [url_id],
    )?;
    Ok(())
}

/// Overwrite the editable fields. Returns whether a row was updated.
pub fn update(
    conn: &Connection,
    url_id: &str,
    title: &str,
    author: &str,
    content: &str,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE content SET title = ?1, author = ?2, content = ?3 WHERE url_id = ?4",
        params![title, author, content, url_id],
    )?;
    Ok(changed > 0)
}

/// Hard-delete a post. Returns whether a row was removed.
pub fn delete(conn: &Connection, url_id: &str) -> Result<bool> {
    let removed = conn.execute("DELETE FROM content WHERE url_id = ?1", [url_id])?;
    Ok(removed > 0)
}

/// Newest posts first, including expired ones.
pub fn list_page(conn: &Connection, limit: u32, offset: u32) -> Result<Vec<Post>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS} FROM content
         ORDER BY created_at DESC, id DESC
         LIMIT ?1 OFFSET ?2"
    ))?;
    let posts = stmt
        .query_map(params![limit, offset], post_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(posts)
}

/// Total number of stored posts.
pub fn count(conn: &Connection) -> Result<u64> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM content", [], |row| row.get(0))?;
    Ok(total as u64)
}
