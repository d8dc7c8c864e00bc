// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Banned address registry.

use crate::db::is_unique_violation;
use crate::error::Result;
use crate::models::{from_epoch, BannedIp};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

pub fn is_banned(conn: &Connection, ip: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM banned_ips WHERE ip_address = ?1",
        [ip],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Record a ban. Returns `false` when the address was already banned.
pub fn insert(
    conn: &Connection,
    ip: &str,
    banned_by: &str,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO banned_ips (ip_address, banned_at, banned_by, reason) VALUES (?1, ?2, ?3, ?4)",
        params![ip, now.timestamp(), banned_by, reason],
    );
    match inserted {
        Ok(_) => Ok(true),
        Err(e) if is_unique_violation(&e) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Lift a ban. Returns whether a ban existed.
pub fn delete(conn: &Connection, ip: &str) -> Result<bool> {
    let removed = conn.execute("DELETE FROM banned_ips WHERE ip_address = ?1", [ip])?;
    Ok(removed > 0)
}

/// All bans, most recent first.
pub fn list(conn: &Connection) -> Result<Vec<BannedIp>> {
    let mut stmt = conn.prepare(
        "SELECT ip_address, banned_at, banned_by, reason FROM banned_ips
         ORDER BY banned_at DESC, id DESC",
    )?;
    let bans = stmt
        .query_map([], |row| {
            Ok(BannedIp {
                ip_address: row.get(0)?,
                banned_at: from_epoch(row.get(1)?),
                banned_by: row.get(2)?,
                reason: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(bans)
}
