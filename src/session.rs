// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Session-scoped state: the CSRF token, edit grants and the admin login.
//!
//! Thin typed accessors over a `tower_sessions::Session`. Every store error
//! is mapped into [`AppError::Session`].

use crate::error::{AppError, Result};
use crate::grants::EditGrants;
use crate::ids::new_secret_token;
use chrono::{DateTime, Duration, Utc};
use tower_sessions::Session;
use tracing::debug;

const CSRF_KEY: &str = "csrf_token";
const EDIT_GRANTS_KEY: &str = "edit_tokens";
const ADMIN_USER_KEY: &str = "admin_user";

fn session_err(e: tower_sessions::session::Error) -> AppError {
    AppError::Session(e.to_string())
}

/// Get the session's CSRF token, minting one on first use.
pub async fn csrf_token(session: &Session) -> Result<String> {
    if let Some(token) = session
        .get::<String>(CSRF_KEY)
        .await
        .map_err(session_err)?
    {
        return Ok(token);
    }

    let token = new_secret_token();
    session
        .insert(CSRF_KEY, token.clone())
        .await
        .map_err(session_err)?;
    debug!("Issued new CSRF token");
    Ok(token)
}

/// Check a submitted CSRF token against the session's.
///
/// A session without a token, an empty submission and any mismatch all
/// fail with [`AppError::InvalidCsrf`].
pub async fn verify_csrf(session: &Session, submitted: &str) -> Result<()> {
    let stored = session
        .get::<String>(CSRF_KEY)
        .await
        .map_err(session_err)?;
    match stored {
        Some(expected) if !submitted.is_empty() && expected == submitted => Ok(()),
        _ => {
            debug!("CSRF token rejected");
            Err(AppError::InvalidCsrf)
        }
    }
}

pub async fn edit_grants(session: &Session) -> Result<EditGrants> {
    Ok(session
        .get::<EditGrants>(EDIT_GRANTS_KEY)
        .await
        .map_err(session_err)?
        .unwrap_or_default())
}

/// Remember the edit token of a freshly created post for `ttl`.
pub async fn remember_edit_grant(
    session: &Session,
    url_id: &str,
    token: &str,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<()> {
    let mut grants = edit_grants(session).await?;
    grants.grant(url_id, token, now, ttl);
    session
        .insert(EDIT_GRANTS_KEY, grants)
        .await
        .map_err(session_err)
}

/// The remembered edit token for `url_id`, if still fresh.
pub async fn granted_token(
    session: &Session,
    url_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>> {
    let grants = edit_grants(session).await?;
    Ok(grants.token_for(url_id, now).map(str::to_string))
}

/// Username of the logged-in admin, if any.
pub async fn admin_user(session: &Session) -> Result<Option<String>> {
    session
        .get::<String>(ADMIN_USER_KEY)
        .await
        .map_err(session_err)
}

/// Like [`admin_user`], but a missing login is [`AppError::Unauthorized`].
pub async fn require_admin(session: &Session) -> Result<String> {
    admin_user(session).await?.ok_or(AppError::Unauthorized)
}

/// Mark the session as logged in. The session id is rotated first.
pub async fn login_admin(session: &Session, username: &str) -> Result<()> {
    session.cycle_id().await.map_err(session_err)?;
    session
        .insert(ADMIN_USER_KEY, username.to_string())
        .await
        .map_err(session_err)
}

/// Destroy the whole session.
pub async fn destroy(session: &Session) -> Result<()> {
    session.flush().await.map_err(session_err)
}
