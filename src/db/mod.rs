// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! SQLite storage for posts, rate limits, bans and the admin audit log.
//!
//! One connection is shared behind a mutex; every query helper takes a
//! `&Connection` so callers can run several of them inside a single
//! transaction. All timestamps are stored as Unix epoch seconds.

pub mod admin_logs;
pub mod bans;
pub mod posts;
pub mod rate_limits;

use crate::error::{AppError, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS content (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    url_id      TEXT    NOT NULL UNIQUE,
    title       TEXT    NOT NULL DEFAULT '',
    author      TEXT    NOT NULL DEFAULT '',
    content     TEXT    NOT NULL,
    ip_address  TEXT    NOT NULL,
    edit_token  TEXT    NOT NULL,
    created_at  INTEGER NOT NULL,
    expires_at  INTEGER,
    views       INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS content_created_idx ON content (created_at);

CREATE TABLE IF NOT EXISTS rate_limits (
    ip_address      TEXT    PRIMARY KEY,
    is_saudi        INTEGER NOT NULL DEFAULT 0,
    hourly_count    INTEGER NOT NULL DEFAULT 0,
    daily_count     INTEGER NOT NULL DEFAULT 0,
    hourly_reset_at INTEGER NOT NULL,
    daily_reset_at  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS banned_ips (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    ip_address  TEXT    NOT NULL UNIQUE,
    banned_at   INTEGER NOT NULL,
    banned_by   TEXT    NOT NULL,
    reason      TEXT    NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS admin_logs (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT    NOT NULL,
    action      TEXT    NOT NULL,
    details     TEXT,
    ip_address  TEXT    NOT NULL,
    created_at  INTEGER NOT NULL
);
"#;

/// Database connection wrapper
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `path`. `:memory:` opens a private
    /// in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            let conn = Connection::open(Path::new(path))?;
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            conn
        };
        Self::init(conn)
    }

    /// Open a fresh in-memory database (tests).
    pub fn open_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute_batch(SCHEMA)?;
        debug!("Database schema ready");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| AppError::Internal("database connection lock poisoned".to_string()))?;
        f(&mut conn)
    }
}

/// Whether `err` is a UNIQUE or PRIMARY KEY constraint violation.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}
