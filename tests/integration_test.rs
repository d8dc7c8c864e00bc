// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Integration tests for the paste service flows.

use chrono::{DateTime, Duration, Utc};
use paste_service::{
    config::Config,
    db::{posts, Database},
    ids::is_public_id,
    limiter::LimitWindow,
    models::AdminAction,
    service::{EditRequest, SubmitRequest},
    AdminService, AppError, PasteService,
};
use std::net::IpAddr;
use std::sync::Arc;

fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn setup() -> (PasteService, AdminService, Database) {
    let config = Arc::new(Config::default());
    let db = Database::open_memory().unwrap();
    let service = PasteService::new(config.clone(), db.clone()).unwrap();
    let admin = AdminService::new(config.admin.clone(), db.clone(), service.limiter().clone());
    (service, admin, db)
}

fn submission(content: &str, expiration: &str) -> SubmitRequest {
    SubmitRequest {
        content: content.to_string(),
        expiration: expiration.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_fresh_submission_scenario() {
    let (service, _, _) = setup();
    let now = start();

    let created = service
        .submit(&submission("hello", "1_hour"), "192.0.2.10", now)
        .unwrap();

    assert!(is_public_id(&created.url_id));
    assert_eq!(created.edit_token.len(), 64);
    assert!(created.edit_token.bytes().all(|b| b.is_ascii_hexdigit()));
    assert_eq!(created.expires_at, Some(now + Duration::seconds(3600)));
}

#[test]
fn test_first_submission_ignores_limit_values() {
    let mut config = Config::default();
    config.rate_limit.general_hourly_limit = 0;
    config.rate_limit.general_daily_limit = 0;
    let service = PasteService::new(Arc::new(config), Database::open_memory().unwrap()).unwrap();
    let now = start();

    assert!(service.submit(&submission("first", "1_day"), "8.8.8.8", now).is_ok());
    assert!(matches!(
        service.submit(&submission("second", "1_day"), "8.8.8.8", now),
        Err(AppError::RateLimited(LimitWindow::Hourly))
    ));
}

#[test]
fn test_round_trip_preserves_fields() {
    let (service, _, _) = setup();
    let now = start();
    let req = SubmitRequest {
        title: "Notes".to_string(),
        author: "Anonymous".to_string(),
        content: "line one\nline two".to_string(),
        expiration: "1_week".to_string(),
    };
    let created = service.submit(&req, "192.0.2.10", now).unwrap();

    let post = service
        .view(&created.url_id, None, None, now)
        .unwrap()
        .unwrap()
        .post;
    assert_eq!(post.title, "Notes");
    assert_eq!(post.author, "Anonymous");
    assert_eq!(post.content, "line one\nline two");
    assert_eq!(post.ip_address, "192.0.2.10");
}

#[test]
fn test_sixth_general_submission_rejected_without_row() {
    let (service, _, db) = setup();
    let now = start();

    for i in 0..5 {
        service
            .submit(&submission("hello", "1_day"), "192.0.2.20", now + Duration::minutes(i))
            .unwrap();
    }

    let sixth = service.submit(&submission("hello", "1_day"), "192.0.2.20", now + Duration::minutes(10));
    assert!(matches!(sixth, Err(AppError::RateLimited(LimitWindow::Hourly))));

    let rows = db.with_conn(|conn| posts::count(conn)).unwrap();
    assert_eq!(rows, 5);
}

#[test]
fn test_preferred_range_allows_twenty_per_hour() {
    let (service, _, _) = setup();
    let now = start();

    for i in 0..20 {
        assert!(
            service
                .submit(&submission("hello", "1_day"), "188.54.3.4", now)
                .is_ok(),
            "submission {} should be allowed",
            i + 1
        );
    }
    assert!(matches!(
        service.submit(&submission("hello", "1_day"), "188.54.3.4", now),
        Err(AppError::RateLimited(LimitWindow::Hourly))
    ));
}

#[test]
fn test_edit_before_expiry_updates_only_content_fields() {
    let (service, _, db) = setup();
    let now = start();
    let created = service
        .submit(&submission("original", "1_day"), "192.0.2.30", now)
        .unwrap();
    service.view(&created.url_id, None, None, now).unwrap();

    let before = db
        .with_conn(|conn| posts::get(conn, &created.url_id))
        .unwrap()
        .unwrap();

    let req = EditRequest {
        url_id: created.url_id.clone(),
        token: created.edit_token.clone(),
        title: "New title".to_string(),
        author: "New author".to_string(),
        content: "revised".to_string(),
    };
    service.edit(&req, now + Duration::hours(2)).unwrap();

    let after = db
        .with_conn(|conn| posts::get(conn, &created.url_id))
        .unwrap()
        .unwrap();
    assert_eq!(after.title, "New title");
    assert_eq!(after.author, "New author");
    assert_eq!(after.content, "revised");
    assert_eq!(after.ip_address, before.ip_address);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.views, before.views);
    assert_eq!(after.edit_token, before.edit_token);
    assert_eq!(after.expires_at, before.expires_at);
}

#[test]
fn test_edit_after_expiry_rejected_without_mutation() {
    let (service, _, db) = setup();
    let now = start();
    let created = service
        .submit(&submission("original", "1_hour"), "192.0.2.31", now)
        .unwrap();

    let req = EditRequest {
        url_id: created.url_id.clone(),
        token: created.edit_token.clone(),
        content: "too late".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        service.edit(&req, now + Duration::hours(1) + Duration::seconds(1)),
        Err(AppError::EditDenied)
    ));

    let post = db
        .with_conn(|conn| posts::get(conn, &created.url_id))
        .unwrap()
        .unwrap();
    assert_eq!(post.content, "original");
}

#[test]
fn test_edit_with_wrong_token_rejected_before_expiry() {
    let (service, _, _) = setup();
    let now = start();
    let created = service
        .submit(&submission("original", "forever"), "192.0.2.32", now)
        .unwrap();

    let mut forged = created.edit_token.clone();
    forged.replace_range(0..1, if forged.starts_with('0') { "1" } else { "0" });
    let req = EditRequest {
        url_id: created.url_id,
        token: forged,
        content: "hijack".to_string(),
        ..Default::default()
    };
    assert!(matches!(service.edit(&req, now), Err(AppError::EditDenied)));
}

/// Editing stays open exactly as long as the post is visible: a one-hour
/// post can only be edited during its single hour, while a post that never
/// expires can be edited by the token holder indefinitely.
#[test]
fn test_edit_window_is_the_content_lifetime() {
    let (service, _, _) = setup();
    let now = start();

    let short = service
        .submit(&submission("short lived", "1_hour"), "192.0.2.33", now)
        .unwrap();
    let forever = service
        .submit(&submission("permanent", "forever"), "192.0.2.33", now)
        .unwrap();

    let near_end = now + Duration::minutes(59);
    let form = service
        .edit_form(&short.url_id, &short.edit_token, near_end)
        .unwrap()
        .unwrap();
    assert_eq!(form.minutes_left, Some(1));
    assert!(service
        .edit_form(&short.url_id, &short.edit_token, now + Duration::hours(1))
        .unwrap()
        .is_none());

    let years_later = now + Duration::days(3650);
    let form = service
        .edit_form(&forever.url_id, &forever.edit_token, years_later)
        .unwrap()
        .unwrap();
    assert_eq!(form.minutes_left, None);
    let req = EditRequest {
        url_id: forever.url_id.clone(),
        token: forever.edit_token.clone(),
        content: "still editable".to_string(),
        ..Default::default()
    };
    assert!(service.edit(&req, years_later).is_ok());
}

#[test]
fn test_expired_post_is_not_found() {
    let (service, _, _) = setup();
    let now = start();
    let created = service
        .submit(&submission("brief", "1_hour"), "192.0.2.34", now)
        .unwrap();

    assert!(service
        .view(&created.url_id, None, None, now + Duration::hours(2))
        .unwrap()
        .is_none());
    assert!(service
        .view("nEvEr000", None, None, now)
        .unwrap()
        .is_none());
}

#[test]
fn test_admin_delete_hides_post_and_audits() {
    let (service, admin, _) = setup();
    let now = start();
    let created = service
        .submit(&submission("to remove", "forever"), "192.0.2.40", now)
        .unwrap();

    assert!(admin
        .delete_post(&created.url_id, "admin", "127.0.0.1", now)
        .unwrap());
    assert!(service
        .view(&created.url_id, None, None, now)
        .unwrap()
        .is_none());

    let log = admin.recent_log(10).unwrap();
    let deletes: Vec<_> = log
        .iter()
        .filter(|e| e.action == AdminAction::DeletePost)
        .collect();
    assert_eq!(deletes.len(), 1);
    assert_eq!(
        deletes[0].details.as_deref(),
        Some(format!("Deleted post: {}", created.url_id).as_str())
    );
}

#[test]
fn test_ban_blocks_and_unban_restores() {
    let (service, admin, _) = setup();
    let now = start();
    let target: IpAddr = "192.0.2.50".parse().unwrap();

    admin
        .ban_ip(target, "spam", "admin", "127.0.0.1", now)
        .unwrap();
    assert!(matches!(
        service.submit(&submission("hello", "1_day"), "192.0.2.50", now),
        Err(AppError::Banned)
    ));

    admin.unban_ip(target, "admin", "127.0.0.1", now).unwrap();
    assert!(service
        .submit(&submission("hello", "1_day"), "192.0.2.50", now)
        .is_ok());
}

#[test]
fn test_double_unban_audits_each_call() {
    let (_, admin, _) = setup();
    let now = start();
    let target: IpAddr = "192.0.2.51".parse().unwrap();

    assert!(!admin.unban_ip(target, "admin", "127.0.0.1", now).unwrap());
    assert!(!admin.unban_ip(target, "admin", "127.0.0.1", now).unwrap());

    let unbans = admin
        .recent_log(10)
        .unwrap()
        .into_iter()
        .filter(|e| e.action == AdminAction::UnbanIp)
        .count();
    assert_eq!(unbans, 2);
}
