// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for the paste service.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Service counters, registered on a private registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    /// Submissions by outcome: created, invalid, rate_limited, banned, error
    pub submissions: IntCounterVec,
    pub views: IntCounter,
    /// Edit attempts by outcome: updated, invalid, denied, error
    pub edits: IntCounterVec,
    /// Admin actions by audit action name
    pub admin_actions: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("paste".to_string()), None)?;

        let submissions = IntCounterVec::new(
            Opts::new("submissions_total", "Submission attempts by outcome"),
            &["outcome"],
        )?;
        let views = IntCounter::new("views_total", "Successful post views")?;
        let edits = IntCounterVec::new(
            Opts::new("edits_total", "Edit attempts by outcome"),
            &["outcome"],
        )?;
        let admin_actions = IntCounterVec::new(
            Opts::new("admin_actions_total", "Audited admin actions"),
            &["action"],
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(views.clone()))?;
        registry.register(Box::new(edits.clone()))?;
        registry.register(Box::new(admin_actions.clone()))?;

        Ok(Self {
            registry,
            submissions,
            views,
            edits,
            admin_actions,
        })
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
