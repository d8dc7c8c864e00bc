// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Data models for posts, rate limit records, bans and the admin audit log

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A published piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    /// Short public identifier
    pub url_id: String,
    pub title: String,
    pub author: String,
    pub content: String,
    /// Submitter address, captured at creation
    pub ip_address: String,
    /// Secret edit credential; never serialized to clients
    #[serde(skip_serializing)]
    pub edit_token: String,
    pub created_at: DateTime<Utc>,
    /// `None` means the post never expires
    pub expires_at: Option<DateTime<Utc>>,
    pub views: i64,
}

impl Post {
    /// Whether the post is still visible at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires| now < expires)
    }
}

/// A post about to be inserted. The public id is allocated by the store
/// and `views` starts at zero.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub author: String,
    pub content: String,
    pub ip_address: String,
    pub edit_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Per-IP submission counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    pub ip_address: String,
    /// Whether the address matched a preferred range on its last check
    pub is_saudi: bool,
    pub hourly_count: u32,
    pub daily_count: u32,
    pub hourly_reset_at: DateTime<Utc>,
    pub daily_reset_at: DateTime<Utc>,
}

/// A banned submitter address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannedIp {
    pub ip_address: String,
    pub banned_at: DateTime<Utc>,
    pub banned_by: String,
    pub reason: String,
}

/// Kinds of audited admin activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    Login,
    LoginFailed,
    Logout,
    DeletePost,
    BanIp,
    UnbanIp,
}

impl AdminAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::LoginFailed => "login_failed",
            Self::Logout => "logout",
            Self::DeletePost => "delete_post",
            Self::BanIp => "ban_ip",
            Self::UnbanIp => "unban_ip",
        }
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Self::Login),
            "login_failed" => Ok(Self::LoginFailed),
            "logout" => Ok(Self::Logout),
            "delete_post" => Ok(Self::DeletePost),
            "ban_ip" => Ok(Self::BanIp),
            "unban_ip" => Ok(Self::UnbanIp),
            other => Err(format!("unknown admin action: {other}")),
        }
    }
}

/// One append-only audit log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminLogEntry {
    pub username: String,
    pub action: AdminAction,
    pub details: Option<String>,
    pub ip_address: String,
    pub created_at: DateTime<Utc>,
}

/// Lifetime choices offered at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Expiration {
    #[serde(rename = "1_hour")]
    OneHour,
    #[serde(rename = "1_day")]
    OneDay,
    #[serde(rename = "1_week")]
    OneWeek,
    #[default]
    #[serde(rename = "1_month")]
    OneMonth,
    #[serde(rename = "6_months")]
    SixMonths,
    #[serde(rename = "1_year")]
    OneYear,
    #[serde(rename = "forever")]
    Forever,
}

impl Expiration {
    pub const ALL: [Expiration; 7] = [
        Self::OneHour,
        Self::OneDay,
        Self::OneWeek,
        Self::OneMonth,
        Self::SixMonths,
        Self::OneYear,
        Self::Forever,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::OneHour => "1_hour",
            Self::OneDay => "1_day",
            Self::OneWeek => "1_week",
            Self::OneMonth => "1_month",
            Self::SixMonths => "6_months",
            Self::OneYear => "1_year",
            Self::Forever => "forever",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }

    /// Lifetime in seconds; `None` for posts that never expire.
    pub fn seconds(&self) -> Option<i64> {
        match self {
            Self::OneHour => Some(3_600),
            Self::OneDay => Some(86_400),
            Self::OneWeek => Some(604_800),
            Self::OneMonth => Some(2_592_000),
            Self::SixMonths => Some(15_552_000),
            Self::OneYear => Some(31_536_000),
            Self::Forever => None,
        }
    }

    /// Expiry timestamp for a post created at `now`.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.seconds().map(|secs| now + Duration::seconds(secs))
    }
}

/// Convert stored epoch seconds back to a timestamp.
pub(crate) fn from_epoch(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
