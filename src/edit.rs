// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Edit authorization.
//!
//! A post may be edited by whoever holds its edit token, for as long as the
//! post itself is live. Posts that never expire stay editable forever.

use crate::models::Post;
use chrono::{DateTime, Utc};

/// Whether `token` authorizes an edit of `post` at `now`.
///
/// A missing post, an empty token, a token mismatch and an expired post all
/// deny. Tokens are compared exactly.
pub fn can_edit(post: Option<&Post>, token: &str, now: DateTime<Utc>) -> bool {
    let Some(post) = post else {
        return false;
    };
    if token.is_empty() || post.edit_token != token {
        return false;
    }
    post.is_live(now)
}

/// Whole minutes left before the edit window closes, or `None` for a post
/// that never expires.
pub fn minutes_left(post: &Post, now: DateTime<Utc>) -> Option<i64> {
    post.expires_at
        .map(|expires| (expires - now).num_minutes().max(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::from_epoch;
    use chrono::Duration;

    fn post(expires_at: Option<DateTime<Utc>>) -> Post {
        Post {
            url_id: "abcdEFGH".to_string(),
            title: String::new(),
            author: String::new(),
            content: "hello".to_string(),
            ip_address: "10.0.0.1".to_string(),
            edit_token: "f".repeat(64),
            created_at: from_epoch(1_700_000_000),
            expires_at,
            views: 0,
        }
    }

    #[test]
    fn test_token_must_match_exactly() {
        let now = from_epoch(1_700_000_000);
        let p = post(None);
        assert!(can_edit(Some(&p), &"f".repeat(64), now));
        assert!(!can_edit(Some(&p), &"F".repeat(64), now));
        assert!(!can_edit(Some(&p), &"f".repeat(63), now));
        assert!(!can_edit(Some(&p), "", now));
        assert!(!can_edit(None, &"f".repeat(64), now));
    }

    #[test]
    fn test_window_follows_expiry() {
        let now = from_epoch(1_700_000_000);
        let p = post(Some(now + Duration::minutes(30)));
        let token = "f".repeat(64);
        assert!(can_edit(Some(&p), &token, now + Duration::minutes(29)));
        assert!(!can_edit(Some(&p), &token, now + Duration::minutes(30)));
        assert_eq!(minutes_left(&p, now), Some(30));
        assert_eq!(minutes_left(&p, now + Duration::hours(2)), Some(0));
    }

    #[test]
    fn test_forever_posts_stay_editable() {
        let now = from_epoch(1_700_000_000);
        let p = post(None);
        assert!(can_edit(Some(&p), &"f".repeat(64), now + Duration::days(3650)));
        assert_eq!(minutes_left(&p, now), None);
    }
}
