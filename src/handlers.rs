// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the paste service.
//!
//! Handlers own everything HTTP- and session-shaped: CSRF checks, the
//! client address, cookies and status codes. Storage work is pushed onto
//! the blocking pool and delegated to [`PasteService`] and [`AdminService`].

use crate::admin::{AdminCommand, AdminForm, AdminService, PostPage};
use crate::client_ip::ClientIp;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::limiter::RateLimitStats;
use crate::metrics::Metrics;
use crate::models::{AdminAction, BannedIp};
use crate::service::{EditForm, EditRequest, PasteService, SubmitRequest, ViewedPost};
use crate::session;
use axum::{
    extract::{Form, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};
use tracing::{debug, error};

/// Shared application state.
pub struct AppState {
    pub config: Arc<Config>,
    pub service: PasteService,
    pub admin: AdminService,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: Arc<Config>, db: crate::db::Database) -> anyhow::Result<Self> {
        let service = PasteService::new(config.clone(), db.clone())?;
        let admin = AdminService::new(config.admin.clone(), db, service.limiter().clone());
        Ok(Self {
            config,
            service,
            admin,
            metrics: Metrics::new()?,
        })
    }
}

/// Form wrapper carrying the caller's CSRF token next to the payload.
#[derive(Debug, Deserialize)]
pub struct CsrfProtectedForm<T> {
    #[serde(default)]
    pub csrf_token: String,
    #[serde(flatten)]
    pub data: T,
}

/// JSON body of `/submit`, `/edit` and every failed request.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub errors: BTreeMap<String, String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_url: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PostQuery {
    pub id: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    #[serde(flatten)]
    pub viewed: ViewedPost,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EditFormResponse {
    #[serde(flatten)]
    pub form: EditForm,
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub admin: String,
    #[serde(flatten)]
    pub listing: PostPage,
    pub banned_ips: Vec<BannedIp>,
    pub csrf_token: String,
}

#[derive(Debug, Serialize)]
pub struct AdminActionResponse {
    pub success: bool,
    pub action: AdminAction,
    /// Whether the command changed any state
    pub changed: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct IpQuery {
    pub ip: Option<String>,
}

/// Run a storage call on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {e}")))?
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::InvalidCsrf => StatusCode::FORBIDDEN,
        AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound => StatusCode::NOT_FOUND,
        e if e.is_internal() => StatusCode::INTERNAL_SERVER_ERROR,
        // Business rejections travel in the body.
        _ => StatusCode::OK,
    }
}

fn outcome_label(err: &AppError) -> &'static str {
    match err {
        AppError::InvalidCsrf => "csrf",
        AppError::Banned => "banned",
        AppError::RateLimited(_) => "rate_limited",
        AppError::Invalid(_) => "invalid",
        AppError::EditDenied => "denied",
        _ => "error",
    }
}

/// Render an error as an [`ActionResponse`], logging infrastructure failures.
fn failure(state: &AppState, err: AppError) -> Response {
    if err.is_internal() {
        error!(error = %err, "Request failed");
    } else {
        debug!(error = %err, "Request rejected");
    }

    let messages = &state.config.messages;
    let body = ActionResponse {
        success: false,
        errors: match &err {
            AppError::Invalid(fields) => fields.to_messages(messages),
            _ => BTreeMap::new(),
        },
        message: err.public_message(messages).to_string(),
        ..Default::default()
    };
    (status_for(&err), Json(body)).into_response()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "paste-service",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Issue (or repeat) the session's CSRF token.
pub async fn get_token(State(state): State<Arc<AppState>>, session: Session) -> Response {
    match session::csrf_token(&session).await {
        Ok(token) => Json(TokenResponse { token }).into_response(),
        Err(e) => failure(&state, e),
    }
}

/// Create a post.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    session: Session,
    Form(form): Form<CsrfProtectedForm<SubmitRequest>>,
) -> Response {
    let submissions = &state.metrics.submissions;
    if let Err(e) = session::verify_csrf(&session, &form.csrf_token).await {
        submissions.with_label_values(&[outcome_label(&e)]).inc();
        return failure(&state, e);
    }

    let now = Utc::now();
    let service = state.service.clone();
    let req = form.data;
    let client = ip.to_string();
    let created = match run_blocking(move || service.submit(&req, &client, now)).await {
        Ok(created) => created,
        Err(e) => {
            submissions.with_label_values(&[outcome_label(&e)]).inc();
            return failure(&state, e);
        }
    };

    let ttl = Duration::seconds(state.config.session.edit_grant_secs);
    if let Err(e) =
        session::remember_edit_grant(&session, &created.url_id, &created.edit_token, now, ttl).await
    {
        // The post exists; losing the convenience grant is not fatal.
        error!(error = %e, url_id = %created.url_id, "Failed to store edit grant");
    }

    submissions.with_label_values(&["created"]).inc();
    let links = state.service.links();
    Json(ActionResponse {
        success: true,
        url: Some(links.view_url(&created.url_id)),
        edit_url: Some(links.edit_url(&created.url_id, &created.edit_token)),
        ..Default::default()
    })
    .into_response()
}

/// Show a live post, offering an edit link when the viewer may edit it.
pub async fn view(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<PostQuery>,
) -> Response {
    let Some(url_id) = non_empty(query.id) else {
        return Redirect::to("/").into_response();
    };

    let now = Utc::now();
    let granted = match session::granted_token(&session, &url_id, now).await {
        Ok(granted) => granted,
        Err(e) => return failure(&state, e),
    };

    let service = state.service.clone();
    let presented = non_empty(query.token);
    let id = url_id.clone();
    let viewed = run_blocking(move || {
        service.view(&id, presented.as_deref(), granted.as_deref(), now)
    })
    .await;

    match viewed {
        Ok(Some(viewed)) => {
            state.metrics.views.inc();
            let edit_url = viewed
                .edit_token
                .as_deref()
                .map(|token| state.service.links().edit_url(&url_id, token));
            Json(ViewResponse { viewed, edit_url }).into_response()
        }
        Ok(None) => Redirect::to("/").into_response(),
        Err(e) => failure(&state, e),
    }
}

/// Edit form data for an editable post.
pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<PostQuery>,
) -> Response {
    let (Some(url_id), Some(token)) = (non_empty(query.id), non_empty(query.token)) else {
        return Redirect::to("/").into_response();
    };

    let service = state.service.clone();
    let id = url_id.clone();
    let form = match run_blocking(move || service.edit_form(&id, &token, Utc::now())).await {
        Ok(form) => form,
        Err(e) => return failure(&state, e),
    };

    let Some(form) = form else {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("id", &url_id)
            .finish();
        return Redirect::to(&format!("/view?{query}")).into_response();
    };

    match session::csrf_token(&session).await {
        Ok(csrf_token) => Json(EditFormResponse { form, csrf_token }).into_response(),
        Err(e) => failure(&state, e),
    }
}

/// Apply an edit.
pub async fn edit(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<CsrfProtectedForm<EditRequest>>,
) -> Response {
    let edits = &state.metrics.edits;
    if let Err(e) = session::verify_csrf(&session, &form.csrf_token).await {
        edits.with_label_values(&[outcome_label(&e)]).inc();
        return failure(&state, e);
    }

    let service = state.service.clone();
    let req = form.data;
    match run_blocking(move || service.edit(&req, Utc::now())).await {
        Ok(url_id) => {
            edits.with_label_values(&["updated"]).inc();
            Json(ActionResponse {
                success: true,
                url: Some(state.service.links().view_url(&url_id)),
                ..Default::default()
            })
            .into_response()
        }
        Err(e) => {
            edits.with_label_values(&[outcome_label(&e)]).inc();
            failure(&state, e)
        }
    }
}

/// Log in as the configured admin.
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    if let Err(e) = session::verify_csrf(&session, &form.csrf_token).await {
        return failure(&state, e);
    }

    let admin = state.admin.clone();
    let client = ip.to_string();
    let result = run_blocking(move || {
        admin.login(&form.username, &form.password, &client, Utc::now())
    })
    .await;

    let action = if result.is_ok() {
        AdminAction::Login
    } else {
        AdminAction::LoginFailed
    };
    state
        .metrics
        .admin_actions
        .with_label_values(&[action.as_str()])
        .inc();

    let username = match result {
        Ok(username) => username,
        Err(e) => return failure(&state, e),
    };
    if let Err(e) = session::login_admin(&session, &username).await {
        return failure(&state, e);
    }

    Json(ActionResponse {
        success: true,
        ..Default::default()
    })
    .into_response()
}

/// Admin listing: one page of posts plus the ban list.
pub async fn admin_dashboard(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<PageQuery>,
) -> Response {
    let admin_user = match session::require_admin(&session).await {
        Ok(user) => user,
        Err(e) => return failure(&state, e),
    };

    let admin = state.admin.clone();
    let page = query.page.unwrap_or(1);
    let loaded = run_blocking(move || {
        let listing = admin.list_recent_posts(page)?;
        let banned_ips = admin.list_banned_ips()?;
        Ok((listing, banned_ips))
    })
    .await;

    let (listing, banned_ips) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => return failure(&state, e),
    };
    match session::csrf_token(&session).await {
        Ok(csrf_token) => Json(Dashboard {
            admin: admin_user,
            listing,
            banned_ips,
            csrf_token,
        })
        .into_response(),
        Err(e) => failure(&state, e),
    }
}

/// Execute one moderation command.
pub async fn admin_action(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    session: Session,
    Form(form): Form<AdminForm>,
) -> Response {
    if let Err(e) = session::verify_csrf(&session, &form.csrf_token).await {
        return failure(&state, e);
    }
    let admin_user = match session::require_admin(&session).await {
        Ok(user) => user,
        Err(e) => return failure(&state, e),
    };
    let command = match AdminCommand::try_from(&form) {
        Ok(command) => command,
        Err(e) => return failure(&state, e),
    };

    let admin = state.admin.clone();
    let client = ip.to_string();
    let now = Utc::now();
    let user = admin_user.clone();
    let cmd = command.clone();
    let result = run_blocking(move || match cmd {
        AdminCommand::Delete { url_id } => admin
            .delete_post(&url_id, &user, &client, now)
            .map(|changed| (AdminAction::DeletePost, changed)),
        AdminCommand::Ban { ip, reason } => admin
            .ban_ip(ip, &reason, &user, &client, now)
            .map(|changed| (AdminAction::BanIp, changed)),
        AdminCommand::Unban { ip } => admin
            .unban_ip(ip, &user, &client, now)
            .map(|changed| (AdminAction::UnbanIp, changed)),
        AdminCommand::Logout => admin
            .logout(&user, &client, now)
            .map(|()| (AdminAction::Logout, true)),
    })
    .await;

    let (action, changed) = match result {
        Ok(done) => done,
        Err(e) => return failure(&state, e),
    };
    state
        .metrics
        .admin_actions
        .with_label_values(&[action.as_str()])
        .inc();

    if command == AdminCommand::Logout {
        if let Err(e) = session::destroy(&session).await {
            return failure(&state, e);
        }
    }

    Json(AdminActionResponse {
        success: true,
        action,
        changed,
    })
    .into_response()
}

/// Current rate limit counters for one address.
pub async fn admin_rate_limit(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<IpQuery>,
) -> Response {
    if let Err(e) = session::require_admin(&session).await {
        return failure(&state, e);
    }
    let target: IpAddr = match non_empty(query.ip).map(|ip| ip.trim().parse()) {
        Some(Ok(ip)) => ip,
        _ => return failure(&state, AppError::BadRequest("ip".to_string())),
    };

    let admin = state.admin.clone();
    match run_blocking(move || admin.rate_limit_stats(target, Utc::now())).await {
        Ok(stats) => Json::<RateLimitStats>(stats).into_response(),
        Err(e) => failure(&state, e),
    }
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => failure(&state, AppError::Internal(e.to_string())),
    }
}

/// Build the full router, including the session and trace layers.
pub fn build_router(state: Arc<AppState>) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.config.session.secure)
        .with_same_site(SameSite::Lax)
        .with_name(state.config.session.cookie_name.clone());

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/get_token", get(get_token))
        .route("/submit", post(submit))
        .route("/view", get(view))
        .route("/edit", get(edit_form).post(edit))
        .route("/admin/login", post(admin_login))
        .route("/admin", get(admin_dashboard).post(admin_action))
        .route("/admin/rate_limit", get(admin_rate_limit));

    if state.config.metrics.enabled {
        router = router.route(&state.config.metrics.path, get(metrics));
    }

    router
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
