// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Append-only admin audit log.

use crate::error::{AppError, Result};
use crate::models::{from_epoch, AdminLogEntry};
use rusqlite::{params, Connection};

pub fn append(conn: &Connection, entry: &AdminLogEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO admin_logs (username, action, details, ip_address, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.username,
            entry.action.as_str(),
            entry.details,
            entry.ip_address,
            entry.created_at.timestamp(),
        ],
    )?;
    Ok(())
}

/// The most recent `limit` entries, newest first.
pub fn recent(conn: &Connection, limit: u32) -> Result<Vec<AdminLogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT username, action, details, ip_address, created_at FROM admin_logs
         ORDER BY created_at DESC, id DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(username, action, details, ip_address, created_at)| {
            Ok(AdminLogEntry {
                username,
                action: action.parse().map_err(AppError::Internal)?,
                details,
                ip_address,
                created_at: from_epoch(created_at),
            })
        })
        .collect()
}
