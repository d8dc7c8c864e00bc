// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Edit grants remembered in the submitter's session.
//!
//! After a successful submission the session keeps the post's edit token
//! for a limited time, so the author's browser sees an edit link on the
//! view page without carrying the token in the URL.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One remembered edit token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditGrant {
    pub token: String,
    /// Epoch seconds after which the grant is ignored
    pub expires_at: i64,
}

/// All grants held by one session, keyed by public id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditGrants(BTreeMap<String, EditGrant>);

impl EditGrants {
    /// Remember `token` for `url_id` until `now + ttl`, dropping stale grants.
    pub fn grant(&mut self, url_id: &str, token: &str, now: DateTime<Utc>, ttl: Duration) {
        self.prune(now);
        self.0.insert(
            url_id.to_string(),
            EditGrant {
                token: token.to_string(),
                expires_at: (now + ttl).timestamp(),
            },
        );
    }

    /// The remembered token for `url_id`, if the grant is still fresh.
    pub fn token_for(&self, url_id: &str, now: DateTime<Utc>) -> Option<&str> {
        self.0
            .get(url_id)
            .filter(|grant| now.timestamp() < grant.expires_at)
            .map(|grant| grant.token.as_str())
    }

    pub fn prune(&mut self, now: DateTime<Utc>) {
        let now = now.timestamp();
        self.0.retain(|_, grant| now < grant.expires_at);
    }
}
