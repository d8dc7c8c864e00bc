// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for submission abuse simulation.
//!
//! Drives the paste service with scripted traffic on a simulated clock and
//! tallies what the limiter and ban list let through.

pub mod attacks;
pub mod generators;
pub mod metrics;
