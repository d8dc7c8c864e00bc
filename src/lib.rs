// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Paste Service
//!
//! An anonymous text publishing service:
//!
//! - Short unguessable public ids and 64-hex-character edit tokens
//! - Per-IP hourly/daily submission limits (5/10, or 20/40 for preferred ranges)
//! - Persistent ban list checked before any counting
//! - Token-gated edits for as long as the post is live
//! - Session-held edit grants and CSRF tokens
//! - Admin moderation with an append-only audit log

pub mod admin;
pub mod client_ip;
pub mod config;
pub mod db;
pub mod edit;
pub mod error;
pub mod grants;
pub mod handlers;
pub mod ids;
pub mod limiter;
pub mod metrics;
pub mod models;
pub mod service;
pub mod session;
pub mod validator;

pub use admin::{AdminCommand, AdminService};
pub use config::Config;
pub use db::Database;
pub use error::{AppError, Result};
pub use handlers::{build_router, AppState};
pub use limiter::{RateLimitResult, RateLimiter};
pub use service::PasteService;
pub use validator::{PostValidator, ValidationResult};
