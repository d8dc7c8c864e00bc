// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Per-IP rate limit counters.

use crate::error::Result;
use crate::models::{from_epoch, RateLimitRecord};
use rusqlite::{params, Connection, OptionalExtension};

/// Fetch the counters for `ip`, if any submission has been counted.
pub fn get(conn: &Connection, ip: &str) -> Result<Option<RateLimitRecord>> {
    let record = conn
        .query_row(
            "SELECT ip_address, is_saudi, hourly_count, daily_count, hourly_reset_at, daily_reset_at
             FROM rate_limits WHERE ip_address = ?1",
            [ip],
            |row| {
                Ok(RateLimitRecord {
                    ip_address: row.get(0)?,
                    is_saudi: row.get(1)?,
                    hourly_count: row.get(2)?,
                    daily_count: row.get(3)?,
                    hourly_reset_at: from_epoch(row.get(4)?),
                    daily_reset_at: from_epoch(row.get(5)?),
                })
            },
        )
        .optional()?;
    Ok(record)
}

/// Insert or overwrite the counters for `record.ip_address`.
pub fn upsert(conn: &Connection, record: &RateLimitRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO rate_limits
         (ip_address, is_saudi, hourly_count, daily_count, hourly_reset_at, daily_reset_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(ip_address) DO UPDATE SET
            is_saudi = excluded.is_saudi,
            hourly_count = excluded.hourly_count,
            daily_count = excluded.daily_count,
            hourly_reset_at = excluded.hourly_reset_at,
            daily_reset_at = excluded.daily_reset_at",
        params![
            record.ip_address,
            record.is_saudi,
            record.hourly_count,
            record.daily_count,
            record.hourly_reset_at.timestamp(),
            record.daily_reset_at.timestamp(),
        ],
    )?;
    Ok(())
}
