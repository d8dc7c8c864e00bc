// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Admin moderation: listing, deletion, bans and the audit trail.
//!
//! Every state-changing operation appends an [`AdminLogEntry`] carrying the
//! acting admin and the client address of the request.

use crate::config::AdminConfig;
use crate::db::{admin_logs, bans, posts, Database};
use crate::error::{AppError, Result};
use crate::limiter::{RateLimitStats, RateLimiter};
use crate::models::{AdminAction, AdminLogEntry, BannedIp, Post};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use tracing::{info, warn};

const DEFAULT_BAN_REASON: &str = "Banned by admin";
const FAILED_LOGIN_USER: &str = "unknown";

/// Raw admin action form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminForm {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub csrf_token: String,
}

/// A parsed admin command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Delete { url_id: String },
    Ban { ip: IpAddr, reason: String },
    Unban { ip: IpAddr },
    Logout,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("missing {field}")))
}

fn parse_ip(value: &Option<String>) -> Result<IpAddr> {
    let raw = required(value, "ip")?;
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid ip {raw:?}")))
}

impl TryFrom<&AdminForm> for AdminCommand {
    type Error = AppError;

    fn try_from(form: &AdminForm) -> Result<Self> {
        match form.action.as_str() {
            "delete" => Ok(Self::Delete {
                url_id: required(&form.id, "id")?.to_string(),
            }),
            "ban" => Ok(Self::Ban {
                ip: parse_ip(&form.ip)?,
                reason: form
                    .reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .unwrap_or(DEFAULT_BAN_REASON)
                    .to_string(),
            }),
            "unban" => Ok(Self::Unban {
                ip: parse_ip(&form.ip)?,
            }),
            "logout" => Ok(Self::Logout),
            other => Err(AppError::BadRequest(format!("unknown action {other:?}"))),
        }
    }
}

/// One page of the admin post listing.
#[derive(Debug, Clone, Serialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub page: u32,
    pub total: u64,
    pub total_pages: u64,
}

/// Admin operations.
#[derive(Clone)]
pub struct AdminService {
    config: AdminConfig,
    db: Database,
    limiter: RateLimiter,
}

impl AdminService {
    pub fn new(config: AdminConfig, db: Database, limiter: RateLimiter) -> Self {
        Self {
            config,
            db,
            limiter,
        }
    }

    /// Check credentials against the single configured admin.
    pub fn login(
        &self,
        username: &str,
        password: &str,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let ok = username == self.config.username && password == self.config.password;

        self.db.with_conn(|conn| {
            if ok {
                log(conn, username, AdminAction::Login, Some("Admin login successful"), ip, now)
            } else {
                let details = format!("Failed login attempt with username: {username}");
                log(conn, FAILED_LOGIN_USER, AdminAction::LoginFailed, Some(&details), ip, now)
            }
        })?;

        if ok {
            info!(admin = %username, ip = %ip, "Admin logged in");
            Ok(username.to_string())
        } else {
            warn!(ip = %ip, "Failed admin login");
            Err(AppError::InvalidCredentials)
        }
    }

    pub fn logout(&self, admin: &str, ip: &str, now: DateTime<Utc>) -> Result<()> {
        self.db
            .with_conn(|conn| log(conn, admin, AdminAction::Logout, Some("Admin logout"), ip, now))?;
        info!(admin = %admin, "Admin logged out");
        Ok(())
    }

    /// Posts newest first, `page` counted from 1. Expired posts are included.
    pub fn list_recent_posts(&self, page: u32) -> Result<PostPage> {
        let page = page.max(1);
        let page_size = self.config.page_size.max(1);
        let offset = (page - 1).saturating_mul(page_size);

        self.db.with_conn(|conn| {
            let total = posts::count(conn)?;
            let posts = posts::list_page(conn, page_size, offset)?;
            Ok(PostPage {
                posts,
                page,
                total,
                total_pages: total.div_ceil(u64::from(page_size)),
            })
        })
    }

    /// Delete a post. Returns whether a row was removed; the audit entry is
    /// written either way.
    pub fn delete_post(&self, url_id: &str, admin: &str, ip: &str, now: DateTime<Utc>) -> Result<bool> {
        let removed = self.db.with_conn(|conn| {
            let title = posts::get(conn, url_id)?
                .map(|post| post.title)
                .filter(|title| !title.is_empty());
            let removed = posts::delete(conn, url_id)?;
            let details = format!("Deleted post: {}", title.as_deref().unwrap_or(url_id));
            log(conn, admin, AdminAction::DeletePost, Some(&details), ip, now)?;
            Ok(removed)
        })?;
        info!(admin = %admin, url_id = %url_id, removed, "Post deleted");
        Ok(removed)
    }

    /// Ban `target`. Returns `false` without auditing when it was already banned.
    pub fn ban_ip(
        &self,
        target: IpAddr,
        reason: &str,
        admin: &str,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let target = target.to_string();
        let inserted = self.db.with_conn(|conn| {
            if bans::is_banned(conn, &target)? {
                return Ok(false);
            }
            if !bans::insert(conn, &target, admin, reason, now)? {
                return Ok(false);
            }
            let details = format!("Banned IP: {target} - Reason: {reason}");
            log(conn, admin, AdminAction::BanIp, Some(&details), ip, now)?;
            Ok(true)
        })?;

        if inserted {
            warn!(admin = %admin, target = %target, "Address banned");
        } else {
            info!(target = %target, "Address already banned");
        }
        Ok(inserted)
    }

    /// Lift any ban on `target`. Audited on every call.
    pub fn unban_ip(&self, target: IpAddr, admin: &str, ip: &str, now: DateTime<Utc>) -> Result<bool> {
        let target = target.to_string();
        let removed = self.db.with_conn(|conn| {
            let removed = bans::delete(conn, &target)?;
            let details = format!("Unbanned IP: {target}");
            log(conn, admin, AdminAction::UnbanIp, Some(&details), ip, now)?;
            Ok(removed)
        })?;
        info!(admin = %admin, target = %target, removed, "Address unbanned");
        Ok(removed)
    }

    pub fn list_banned_ips(&self) -> Result<Vec<BannedIp>> {
        self.db.with_conn(|conn| bans::list(conn))
    }

    pub fn recent_log(&self, limit: u32) -> Result<Vec<AdminLogEntry>> {
        self.db.with_conn(|conn| admin_logs::recent(conn, limit))
    }

    pub fn rate_limit_stats(&self, target: IpAddr, now: DateTime<Utc>) -> Result<RateLimitStats> {
        self.limiter.stats(&target.to_string(), now)
    }
}

fn log(
    conn: &Connection,
    username: &str,
    action: AdminAction,
    details: Option<&str>,
    ip: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    admin_logs::append(
        conn,
        &AdminLogEntry {
            username: username.to_string(),
            action,
            details: details.map(str::to_string),
            ip_address: ip.to_string(),
            created_at: now,
        },
    )
}
