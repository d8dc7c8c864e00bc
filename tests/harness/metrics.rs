// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outcome tally for abuse simulation runs.

use paste_service::{limiter::LimitWindow, AppError};
use std::collections::HashMap;

/// Possible outcomes for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Created,
    RateLimitedHourly,
    RateLimitedDaily,
    Banned,
    Invalid,
    Error,
}

impl<T> From<&Result<T, AppError>> for Outcome {
    fn from(result: &Result<T, AppError>) -> Self {
        match result {
            Ok(_) => Outcome::Created,
            Err(AppError::RateLimited(LimitWindow::Hourly)) => Outcome::RateLimitedHourly,
            Err(AppError::RateLimited(LimitWindow::Daily)) => Outcome::RateLimitedDaily,
            Err(AppError::Banned) => Outcome::Banned,
            Err(AppError::Invalid(_)) => Outcome::Invalid,
            Err(_) => Outcome::Error,
        }
    }
}

/// Collects outcomes during a simulation.
#[derive(Debug, Default)]
pub struct AttackMetrics {
    outcomes: HashMap<Outcome, usize>,
    created_per_ip: HashMap<String, usize>,
}

impl AttackMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: Outcome, ip: &str) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        if outcome == Outcome::Created {
            *self.created_per_ip.entry(ip.to_string()).or_insert(0) += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.values().sum()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Highest number of posts any single address managed to create.
    pub fn max_created_per_ip(&self) -> usize {
        self.created_per_ip.values().copied().max().unwrap_or(0)
    }

    pub fn unique_creators(&self) -> usize {
        self.created_per_ip.len()
    }

    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            total: self.total(),
            created: self.count(Outcome::Created),
            limited_hourly: self.count(Outcome::RateLimitedHourly),
            limited_daily: self.count(Outcome::RateLimitedDaily),
            banned: self.count(Outcome::Banned),
            errors: self.count(Outcome::Error),
            unique_creators: self.unique_creators(),
        }
    }
}

/// Summary of a simulation run.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub total: usize,
    pub created: usize,
    pub limited_hourly: usize,
    pub limited_daily: usize,
    pub banned: usize,
    pub errors: usize,
    pub unique_creators: usize,
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Submission Abuse Report ===")?;
        writeln!(f, "Total:             {}", self.total)?;
        writeln!(f, "Created:           {}", self.created)?;
        writeln!(f, "Limited (hourly):  {}", self.limited_hourly)?;
        writeln!(f, "Limited (daily):   {}", self.limited_daily)?;
        writeln!(f, "Banned:            {}", self.banned)?;
        writeln!(f, "Errors:            {}", self.errors)?;
        writeln!(f, "Unique creators:   {}", self.unique_creators)?;
        Ok(())
    }
}
