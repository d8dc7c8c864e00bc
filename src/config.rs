// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the paste service.
//!
//! The whole configuration is read once at start-up and then shared
//! read-only (behind an `Arc`) with every component that needs it.
//! Defaults reproduce the production deployment: 5/10 submissions per
//! hour/day for general clients, 20/40 for the preferred address ranges.

use serde::{Deserialize, Serialize};

/// Configuration for the paste service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Public base URL used to build view and edit links
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Storage configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Field validation configuration
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Admin credential and listing configuration
    #[serde(default)]
    pub admin: AdminConfig,

    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// User-facing message table
    #[serde(default)]
    pub messages: Messages,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path, or `:memory:` (default: paste.db)
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// Per-IP submission limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Submissions per hour for general clients (default: 5)
    #[serde(default = "default_general_hourly")]
    pub general_hourly_limit: u32,

    /// Submissions per day for general clients (default: 10)
    #[serde(default = "default_general_daily")]
    pub general_daily_limit: u32,

    /// Submissions per hour for preferred ranges (default: 20)
    #[serde(default = "default_preferred_hourly")]
    pub preferred_hourly_limit: u32,

    /// Submissions per day for preferred ranges (default: 40)
    #[serde(default = "default_preferred_daily")]
    pub preferred_daily_limit: u32,

    /// Textual address prefixes that receive the preferred quota.
    /// The defaults are Saudi Arabian IPv4 ranges.
    #[serde(default = "default_preferred_prefixes")]
    pub preferred_prefixes: Vec<String>,
}

/// Field length policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Maximum title length in characters (default: 200)
    #[serde(default = "default_max_title")]
    pub max_title_chars: usize,

    /// Maximum author length in characters (default: 100)
    #[serde(default = "default_max_author")]
    pub max_author_chars: usize,

    /// Minimum content length in characters (default: 1)
    #[serde(default = "default_min_content")]
    pub min_content_chars: usize,

    /// Maximum content length in characters (default: 50000)
    #[serde(default = "default_max_content")]
    pub max_content_chars: usize,
}

/// The single shared admin credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,

    #[serde(default = "default_admin_password")]
    pub password: String,

    /// Posts per admin listing page (default: 20)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session cookie name (default: admin_session)
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Mark the cookie `Secure` (default: false). Enable when `base_url`
    /// is served over HTTPS.
    #[serde(default)]
    pub secure: bool,

    /// Lifetime of the post-creation edit grant in seconds (default: 3600)
    #[serde(default = "default_edit_grant_secs")]
    pub edit_grant_secs: i64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

/// Text returned to clients. Pure data; replace wholesale to localize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub title_too_long: String,
    pub author_too_long: String,
    pub content_required: String,
    pub content_too_short: String,
    pub content_too_long: String,
    pub invalid_expiration: String,
    pub rate_limit_hour: String,
    pub rate_limit_day: String,
    pub ip_banned: String,
    pub post_not_found: String,
    pub edit_expired: String,
    pub invalid_token: String,
    pub database_error: String,
    pub admin_invalid: String,
    pub admin_required: String,
    pub bad_request: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8080/".to_string()
}

fn default_database_path() -> String {
    "paste.db".to_string()
}

fn default_general_hourly() -> u32 {
    5
}

fn default_general_daily() -> u32 {
    10
}

fn default_preferred_hourly() -> u32 {
    20
}

fn default_preferred_daily() -> u32 {
    40
}

fn default_preferred_prefixes() -> Vec<String> {
    ["5.42.", "46.52.", "62.149.", "78.93.", "188.54.", "212.138."]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_max_title() -> usize {
    200
}

fn default_max_author() -> usize {
    100
}

fn default_min_content() -> usize {
    1
}

fn default_max_content() -> usize {
    50_000
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "ChangeThisPassword".to_string()
}

fn default_page_size() -> u32 {
    20
}

fn default_cookie_name() -> String {
    "admin_session".to_string()
}

fn default_edit_grant_secs() -> i64 {
    3600
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            base_url: default_base_url(),
            database: DatabaseConfig::default(),
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            admin: AdminConfig::default(),
            session: SessionConfig::default(),
            metrics: MetricsConfig::default(),
            messages: Messages::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general_hourly_limit: default_general_hourly(),
            general_daily_limit: default_general_daily(),
            preferred_hourly_limit: default_preferred_hourly(),
            preferred_daily_limit: default_preferred_daily(),
            preferred_prefixes: default_preferred_prefixes(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_title_chars: default_max_title(),
            max_author_chars: default_max_author(),
            min_content_chars: default_min_content(),
            max_content_chars: default_max_content(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: default_admin_password(),
            page_size: default_page_size(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secure: false,
            edit_grant_secs: default_edit_grant_secs(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            title_too_long: "Title is too long; it must be at most 200 characters".to_string(),
            author_too_long: "Author name is too long; it must be at most 100 characters"
                .to_string(),
            content_required: "Content is required".to_string(),
            content_too_short: "Content is too short; at least one character is required"
                .to_string(),
            content_too_long: "Content is too long; the maximum is 50,000 characters".to_string(),
            invalid_expiration: "Invalid expiration option".to_string(),
            rate_limit_hour: "You have reached the hourly posting limit, please try again later"
                .to_string(),
            rate_limit_day: "You have reached the daily posting limit, please try again later"
                .to_string(),
            ip_banned: "Your IP address has been banned; contact the administrators if you think this is a mistake".to_string(),
            post_not_found: "The post does not exist or has been removed".to_string(),
            edit_expired: "The edit period has ended; this post can no longer be edited"
                .to_string(),
            invalid_token: "Invalid security token, please refresh the page and try again"
                .to_string(),
            database_error: "A database error occurred, please try again later".to_string(),
            admin_invalid: "Invalid username or password".to_string(),
            admin_required: "Admin login required".to_string(),
            bad_request: "Invalid request".to_string(),
        }
    }
}

impl RateLimitConfig {
    /// Whether `ip` (in its canonical textual form) falls in a preferred range.
    pub fn is_preferred(&self, ip: &str) -> bool {
        self.preferred_prefixes
            .iter()
            .any(|prefix| ip.starts_with(prefix.as_str()))
    }

    /// `(hourly, daily)` limits for the given classification.
    pub fn limits(&self, preferred: bool) -> (u32, u32) {
        if preferred {
            (self.preferred_hourly_limit, self.preferred_daily_limit)
        } else {
            (self.general_hourly_limit, self.general_daily_limit)
        }
    }
}

impl Config {
    /// Load configuration from `.env`, an optional config file and
    /// `PASTE__`-prefixed environment variables, in increasing precedence.
    ///
    /// The file path comes from `PASTE_CONFIG` (default: `paste.toml`).
    /// Nested keys use a double underscore, e.g. `PASTE__RATE_LIMIT__GENERAL_HOURLY_LIMIT`.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let file = std::env::var("PASTE_CONFIG").unwrap_or_else(|_| "paste.toml".to_string());
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::with_prefix("PASTE")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("rate_limit.preferred_prefixes")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
