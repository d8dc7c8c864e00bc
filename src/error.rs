// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the paste service

use crate::config::Messages;
use crate::limiter::LimitWindow;
use crate::validator::FieldErrors;
use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Could not allocate a unique post identifier")]
    IdSpaceExhausted,

    #[error("CSRF token missing or mismatched")]
    InvalidCsrf,

    #[error("Submitter IP is banned")]
    Banned,

    #[error("Rate limit exceeded: {0}")]
    RateLimited(LimitWindow),

    #[error("Validation failed on {} field(s)", .0.len())]
    Invalid(FieldErrors),

    #[error("Edit not permitted")]
    EditDenied,

    #[error("Post not found")]
    NotFound,

    #[error("Admin session required")]
    Unauthorized,

    #[error("Invalid admin credentials")]
    InvalidCredentials,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The text a client is allowed to see for this error.
    ///
    /// Storage, session and internal failures all collapse into the generic
    /// database message so no query text or driver detail leaks out.
    pub fn public_message<'a>(&self, messages: &'a Messages) -> &'a str {
        match self {
            Self::InvalidCsrf => &messages.invalid_token,
            Self::Banned => &messages.ip_banned,
            Self::RateLimited(LimitWindow::Hourly) => &messages.rate_limit_hour,
            Self::RateLimited(LimitWindow::Daily) => &messages.rate_limit_day,
            Self::Invalid(_) => "",
            Self::EditDenied => &messages.edit_expired,
            Self::NotFound => &messages.post_not_found,
            Self::Unauthorized => &messages.admin_required,
            Self::InvalidCredentials => &messages.admin_invalid,
            Self::BadRequest(_) => &messages.bad_request,
            Self::Database(_) | Self::IdSpaceExhausted | Self::Session(_) | Self::Internal(_) => {
                &messages.database_error
            }
        }
    }

    /// True for failures of our own infrastructure rather than of the request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::IdSpaceExhausted | Self::Session(_) | Self::Internal(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
