// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission, view and edit flows.
//!
//! The service knows nothing about HTTP or sessions: callers pass in the
//! resolved client address, any session-held edit token and the current
//! time, and get back plain values or an [`AppError`].

use crate::config::Config;
use crate::db::{posts, Database};
use crate::edit::{can_edit, minutes_left};
use crate::error::{AppError, Result};
use crate::ids::{new_public_id, new_secret_token, PUBLIC_ID_LEN};
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::models::{Expiration, NewPost, Post};
use crate::validator::{PostFields, PostValidator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

fn default_expiration() -> String {
    Expiration::default().code().to_string()
}

/// A new submission as received from the client, before sanitization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
    /// Expiration code (default: 1_month)
    #[serde(default = "default_expiration")]
    pub expiration: String,
}

/// An edit as received from the client, before sanitization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditRequest {
    #[serde(rename = "id", default)]
    pub url_id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
}

/// Outcome of a successful submission.
#[derive(Debug, Clone)]
pub struct Created {
    pub url_id: String,
    pub edit_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A post as shown to a viewer.
#[derive(Debug, Clone, Serialize)]
pub struct ViewedPost {
    #[serde(flatten)]
    pub post: Post,
    /// Token to offer an edit link with, when the viewer may edit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_token: Option<String>,
}

/// Data for the edit form of an editable post.
#[derive(Debug, Clone, Serialize)]
pub struct EditForm {
    #[serde(flatten)]
    pub post: Post,
    /// Whole minutes until editing closes; absent for posts that never expire
    pub minutes_left: Option<i64>,
}

/// Builds the public links handed back to clients.
#[derive(Debug, Clone)]
pub struct Links {
    base: Url,
}

impl Links {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| AppError::Internal(format!("invalid base_url {base_url:?}: {e}")))?;
        Ok(Self { base })
    }

    fn build(&self, path: &str, query: &[(&str, &str)]) -> String {
        let mut url = self.base.join(path).unwrap_or_else(|_| self.base.clone());
        url.query_pairs_mut().clear().extend_pairs(query);
        url.to_string()
    }

    pub fn view_url(&self, url_id: &str) -> String {
        self.build("view", &[("id", url_id)])
    }

    pub fn edit_url(&self, url_id: &str, token: &str) -> String {
        self.build("edit", &[("id", url_id), ("token", token)])
    }
}

/// Public paste operations.
#[derive(Clone)]
pub struct PasteService {
    db: Database,
    limiter: RateLimiter,
    validator: Arc<PostValidator>,
    links: Links,
}

impl PasteService {
    pub fn new(config: Arc<Config>, db: Database) -> Result<Self> {
        let limiter = RateLimiter::new(config.rate_limit.clone(), db.clone());
        let validator = Arc::new(PostValidator::new(config.validation.clone()));
        let links = Links::new(&config.base_url)?;
        Ok(Self {
            db,
            limiter,
            validator,
            links,
        })
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Rate limit, sanitize, validate and store a new post.
    pub fn submit(&self, req: &SubmitRequest, ip: &str, now: DateTime<Utc>) -> Result<Created> {
        match self.limiter.check_and_count(ip, now)? {
            RateLimitResult::Allowed { .. } => {}
            RateLimitResult::Banned => {
                warn!(ip = %ip, "Rejected submission from banned address");
                return Err(AppError::Banned);
            }
            RateLimitResult::Limited { window, .. } => {
                warn!(ip = %ip, window = %window, "Rejected rate limited submission");
                return Err(AppError::RateLimited(window));
            }
        }

        let fields = PostFields::sanitize(&req.title, &req.author, &req.content);
        let errors = self.validator.validate_submission(&fields, &req.expiration);
        if !errors.is_empty() {
            debug!(ip = %ip, failed = errors.len(), "Submission failed validation");
            return Err(AppError::Invalid(errors));
        }
        let expiration = Expiration::from_code(&req.expiration)
            .ok_or_else(|| AppError::BadRequest(req.expiration.clone()))?;

        let edit_token = new_secret_token();
        let expires_at = expiration.expires_at(now);
        let draft = NewPost {
            title: fields.title,
            author: fields.author,
            content: fields.content,
            ip_address: ip.to_string(),
            edit_token: edit_token.clone(),
            created_at: now,
            expires_at,
        };

        let url_id = self
            .db
            .with_conn(|conn| posts::insert(conn, &draft, || new_public_id(PUBLIC_ID_LEN)))?;

        info!(url_id = %url_id, ip = %ip, expiration = expiration.code(), "Post created");
        Ok(Created {
            url_id,
            edit_token,
            expires_at,
        })
    }

    /// Load a live post and count the view.
    ///
    /// `granted` is a token remembered in the viewer's session, `presented`
    /// one supplied explicitly. Either is only surfaced if it actually
    /// authorizes an edit right now.
    pub fn view(
        &self,
        url_id: &str,
        presented: Option<&str>,
        granted: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<ViewedPost>> {
        let post = self.db.with_conn(|conn| {
            let Some(mut post) = posts::get_visible(conn, url_id, now)? else {
                return Ok(None);
            };
            posts::increment_views(conn, url_id)?;
            post.views += 1;
            Ok(Some(post))
        })?;

        let Some(post) = post else {
            debug!(url_id = %url_id, "View of missing or expired post");
            return Ok(None);
        };

        let edit_token = [granted, presented]
            .into_iter()
            .flatten()
            .find(|token| can_edit(Some(&post), token, now))
            .map(str::to_string);

        Ok(Some(ViewedPost { post, edit_token }))
    }

    /// The edit form for `url_id`, if `token` may edit it right now.
    pub fn edit_form(&self, url_id: &str, token: &str, now: DateTime<Utc>) -> Result<Option<EditForm>> {
        let post = self.db.with_conn(|conn| posts::get(conn, url_id))?;
        if !can_edit(post.as_ref(), token, now) {
            debug!(url_id = %url_id, "Edit form refused");
            return Ok(None);
        }
        Ok(post.map(|post| EditForm {
            minutes_left: minutes_left(&post, now),
            post,
        }))
    }

    /// Apply an authorized edit. Returns the post's public id.
    pub fn edit(&self, req: &EditRequest, now: DateTime<Utc>) -> Result<String> {
        let post = self.db.with_conn(|conn| posts::get(conn, &req.url_id))?;
        if !can_edit(post.as_ref(), &req.token, now) {
            info!(url_id = %req.url_id, "Edit refused");
            return Err(AppError::EditDenied);
        }

        let fields = PostFields::sanitize(&req.title, &req.author, &req.content);
        let errors = self.validator.validate_fields(&fields);
        if !errors.is_empty() {
            debug!(url_id = %req.url_id, failed = errors.len(), "Edit failed validation");
            return Err(AppError::Invalid(errors));
        }

        let updated = self.db.with_conn(|conn| {
            posts::update(conn, &req.url_id, &fields.title, &fields.author, &fields.content)
        })?;
        if !updated {
            // Deleted between the authorization read and the update.
            return Err(AppError::EditDenied);
        }

        info!(url_id = %req.url_id, "Post edited");
        Ok(req.url_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::from_epoch;
    use chrono::Duration;

    fn service() -> PasteService {
        PasteService::new(Arc::new(Config::default()), Database::open_memory().unwrap()).unwrap()
    }

    fn submission(content: &str, expiration: &str) -> SubmitRequest {
        SubmitRequest {
            title: "A title".to_string(),
            author: "Someone".to_string(),
            content: content.to_string(),
            expiration: expiration.to_string(),
        }
    }

    #[test]
    fn test_links() {
        let links = Links::new("https://paste.example/").unwrap();
        assert_eq!(links.view_url("abcdEFGH"), "https://paste.example/view?id=abcdEFGH");
        assert_eq!(
            links.edit_url("abcdEFGH", "ff"),
            "https://paste.example/edit?id=abcdEFGH&token=ff"
        );
        assert!(Links::new("not a url").is_err());
    }

    #[test]
    fn test_submit_then_view() {
        let svc = service();
        let now = from_epoch(1_700_000_000);
        let created = svc.submit(&submission("hello", "1_hour"), "8.8.8.8", now).unwrap();
        assert_eq!(created.url_id.len(), 8);
        assert_eq!(created.edit_token.len(), 64);
        assert_eq!(created.expires_at, Some(now + Duration::hours(1)));

        let viewed = svc.view(&created.url_id, None, None, now).unwrap().unwrap();
        assert_eq!(viewed.post.content, "hello");
        assert_eq!(viewed.post.views, 1);
        assert!(viewed.edit_token.is_none());

        let viewed = svc
            .view(&created.url_id, None, Some(&created.edit_token), now)
            .unwrap()
            .unwrap();
        assert_eq!(viewed.post.views, 2);
        assert_eq!(viewed.edit_token.as_deref(), Some(created.edit_token.as_str()));
    }

    #[test]
    fn test_wrong_presented_token_not_advertised() {
        let svc = service();
        let now = from_epoch(1_700_000_000);
        let created = svc.submit(&submission("hello", "forever"), "8.8.8.8", now).unwrap();
        let viewed = svc
            .view(&created.url_id, Some("deadbeef"), None, now)
            .unwrap()
            .unwrap();
        assert!(viewed.edit_token.is_none());
    }

    #[test]
    fn test_validation_reports_every_field() {
        let svc = service();
        let now = from_epoch(1_700_000_000);
        let req = SubmitRequest {
            title: "t".repeat(201),
            author: "a".repeat(101),
            content: "   ".to_string(),
            expiration: "someday".to_string(),
        };
        match svc.submit(&req, "8.8.8.8", now) {
            Err(AppError::Invalid(errors)) => assert_eq!(errors.len(), 4),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_submission_is_sanitized() {
        let svc = service();
        let now = from_epoch(1_700_000_000);
        let req = SubmitRequest {
            title: "  <b>bold</b> ".to_string(),
            ..submission("<script>x</script>", "1_day")
        };
        let created = svc.submit(&req, "8.8.8.8", now).unwrap();
        let post = svc.view(&created.url_id, None, None, now).unwrap().unwrap().post;
        assert_eq!(post.title, "&lt;b&gt;bold&lt;/b&gt;");
        assert_eq!(post.content, "&lt;script&gt;x&lt;/script&gt;");
    }

    #[test]
    fn test_edit_form_minutes_left() {
        let svc = service();
        let now = from_epoch(1_700_000_000);
        let created = svc.submit(&submission("hello", "1_hour"), "8.8.8.8", now).unwrap();

        let form = svc
            .edit_form(&created.url_id, &created.edit_token, now + Duration::minutes(15))
            .unwrap()
            .unwrap();
        assert_eq!(form.minutes_left, Some(45));

        assert!(svc
            .edit_form(&created.url_id, "wrong", now)
            .unwrap()
            .is_none());
        assert!(svc
            .edit_form(&created.url_id, &created.edit_token, now + Duration::hours(1))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_edit_missing_post_is_denied() {
        let svc = service();
        let req = EditRequest {
            url_id: "missing0".to_string(),
            token: "ff".to_string(),
            content: "x".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            svc.edit(&req, from_epoch(0)),
            Err(AppError::EditDenied)
        ));
    }

    #[test]
    fn test_edit_validates_after_authorization() {
        let svc = service();
        let now = from_epoch(1_700_000_000);
        let created = svc.submit(&submission("hello", "forever"), "8.8.8.8", now).unwrap();
        let req = EditRequest {
            url_id: created.url_id.clone(),
            token: created.edit_token.clone(),
            content: String::new(),
            ..Default::default()
        };
        match svc.edit(&req, now) {
            Err(AppError::Invalid(errors)) => assert!(errors.get("content").is_some()),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }
}
