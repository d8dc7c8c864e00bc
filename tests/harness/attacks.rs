// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Traffic patterns for abuse simulation.

use chrono::Duration;

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of submissions to send
    pub total_requests: usize,
    /// Simulated time between consecutive submissions
    pub interval: Duration,
    /// Number of unique source addresses
    pub unique_ips: usize,
    /// Draw addresses from the preferred ranges
    pub preferred: bool,
}

impl AttackConfig {
    /// One address hammering the submit endpoint.
    pub fn single_ip_flood() -> Self {
        Self {
            total_requests: 100,
            interval: Duration::seconds(1),
            unique_ips: 1,
            preferred: false,
        }
    }

    /// Many addresses each staying under the limit.
    pub fn distributed_attack() -> Self {
        Self {
            total_requests: 400,
            interval: Duration::seconds(1),
            unique_ips: 100,
            preferred: false,
        }
    }

    /// One preferred-range address flooding.
    pub fn preferred_flood() -> Self {
        Self {
            total_requests: 100,
            interval: Duration::seconds(1),
            unique_ips: 1,
            preferred: true,
        }
    }

    /// One address pacing itself one submission every 15 minutes for two days.
    pub fn slow_drip() -> Self {
        Self {
            total_requests: 192,
            interval: Duration::minutes(15),
            unique_ips: 1,
            preferred: false,
        }
    }
}
