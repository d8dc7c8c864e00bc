// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window submission limiter backed by the `rate_limits` table.
//!
//! Every address carries two counters, one per hour and one per day, each
//! with its own reset time. Preferred address ranges get a larger quota.
//! A check and its increment happen inside one IMMEDIATE transaction, so
//! concurrent submissions from the same address cannot both slip past the
//! last remaining slot.

use crate::config::RateLimitConfig;
use crate::db::{bans, rate_limits, Database};
use crate::error::Result;
use crate::models::RateLimitRecord;
use chrono::{DateTime, Duration, Utc};
use rusqlite::TransactionBehavior;
use serde::Serialize;
use tracing::{debug, info};

/// Which window rejected a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitWindow {
    Hourly,
    Daily,
}

impl std::fmt::Display for LimitWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hourly => write!(f, "hourly limit reached"),
            Self::Daily => write!(f, "daily limit reached"),
        }
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Submission counted
    Allowed {
        /// Submissions left in the hourly window
        remaining_hourly: u32,
        /// Submissions left in the daily window
        remaining_daily: u32,
    },
    /// Address is on the ban list; no counter was touched
    Banned,
    /// A window is full; no counter was touched
    Limited {
        window: LimitWindow,
        /// Time until that window resets
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Read-only view of an address's counters, as reported to admins.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitStats {
    pub ip_address: String,
    pub preferred: bool,
    pub hourly_limit: u32,
    pub daily_limit: u32,
    pub hourly_count: u32,
    pub daily_count: u32,
    pub hourly_reset_at: Option<DateTime<Utc>>,
    pub daily_reset_at: Option<DateTime<Utc>>,
    pub banned: bool,
}

/// Persistent per-IP rate limiter.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    db: Database,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, db: Database) -> Self {
        Self { config, db }
    }

    /// Check the ban list and both windows for `ip`, counting the
    /// submission if it is allowed.
    pub fn check_and_count(&self, ip: &str, now: DateTime<Utc>) -> Result<RateLimitResult> {
        let preferred = self.config.is_preferred(ip);
        let (hourly_limit, daily_limit) = self.config.limits(preferred);

        self.db.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if bans::is_banned(&tx, ip)? {
                info!(ip = %ip, "Submission from banned address");
                return Ok(RateLimitResult::Banned);
            }

            let Some(mut record) = rate_limits::get(&tx, ip)? else {
                let record = RateLimitRecord {
                    ip_address: ip.to_string(),
                    is_saudi: preferred,
                    hourly_count: 1,
                    daily_count: 1,
                    hourly_reset_at: now + Duration::hours(1),
                    daily_reset_at: now + Duration::days(1),
                };
                rate_limits::upsert(&tx, &record)?;
                tx.commit()?;
                debug!(ip = %ip, preferred, "First submission counted");
                return Ok(RateLimitResult::Allowed {
                    remaining_hourly: hourly_limit.saturating_sub(1),
                    remaining_daily: daily_limit.saturating_sub(1),
                });
            };

            let reset = roll_windows(&mut record, now);

            if record.hourly_count >= hourly_limit {
                if reset {
                    rate_limits::upsert(&tx, &record)?;
                    tx.commit()?;
                }
                info!(ip = %ip, count = record.hourly_count, limit = hourly_limit, "Hourly limit reached");
                return Ok(RateLimitResult::Limited {
                    window: LimitWindow::Hourly,
                    retry_after: record.hourly_reset_at - now,
                });
            }

            if record.daily_count >= daily_limit {
                if reset {
                    rate_limits::upsert(&tx, &record)?;
                    tx.commit()?;
                }
                info!(ip = %ip, count = record.daily_count, limit = daily_limit, "Daily limit reached");
                return Ok(RateLimitResult::Limited {
                    window: LimitWindow::Daily,
                    retry_after: record.daily_reset_at - now,
                });
            }

            record.hourly_count += 1;
            record.daily_count += 1;
            record.is_saudi = preferred;
            rate_limits::upsert(&tx, &record)?;
            tx.commit()?;

            debug!(
                ip = %ip,
                hourly = record.hourly_count,
                daily = record.daily_count,
                "Submission counted"
            );
            Ok(RateLimitResult::Allowed {
                remaining_hourly: hourly_limit.saturating_sub(record.hourly_count),
                remaining_daily: daily_limit.saturating_sub(record.daily_count),
            })
        })
    }

    /// Current counters for `ip` without counting anything.
    pub fn stats(&self, ip: &str, now: DateTime<Utc>) -> Result<RateLimitStats> {
        let preferred = self.config.is_preferred(ip);
        let (hourly_limit, daily_limit) = self.config.limits(preferred);

        self.db.with_conn(|conn| {
            let banned = bans::is_banned(conn, ip)?;
            let record = rate_limits::get(conn, ip)?.map(|mut record| {
                roll_windows(&mut record, now);
                record
            });

            Ok(RateLimitStats {
                ip_address: ip.to_string(),
                preferred,
                hourly_limit,
                daily_limit,
                hourly_count: record.as_ref().map_or(0, |r| r.hourly_count),
                daily_count: record.as_ref().map_or(0, |r| r.daily_count),
                hourly_reset_at: record.as_ref().map(|r| r.hourly_reset_at),
                daily_reset_at: record.as_ref().map(|r| r.daily_reset_at),
                banned,
            })
        })
    }
}

/// Zero any window whose reset time has passed. Returns whether anything changed.
fn roll_windows(record: &mut RateLimitRecord, now: DateTime<Utc>) -> bool {
    let mut changed = false;
    if now >= record.hourly_reset_at {
        record.hourly_count = 0;
        record.hourly_reset_at = now + Duration::hours(1);
        changed = true;
    }
    if now >= record.daily_reset_at {
        record.daily_count = 0;
        record.daily_reset_at = now + Duration::days(1);
        changed = true;
    }
    changed
}
