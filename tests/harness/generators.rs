// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators for abuse simulation.

use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of general (non-preferred) addresses.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// Generate addresses inside the default preferred ranges.
pub fn generate_preferred_ips(count: usize) -> Vec<IpAddr> {
    const PREFIXES: [[u8; 2]; 6] = [[5, 42], [46, 52], [62, 149], [78, 93], [188, 54], [212, 138]];
    (0..count)
        .map(|i| {
            let [a, b] = PREFIXES[i % PREFIXES.len()];
            let c = ((i / PREFIXES.len()) & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(a, b, c, 1))
        })
        .collect()
}

/// Generate well-formed but wrong edit tokens.
pub fn generate_guessed_tokens(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{:064x}", i)).collect()
}

/// Token variants that differ from `token` only in presentation.
pub fn near_miss_tokens(token: &str) -> Vec<String> {
    vec![
        String::new(),
        token.to_uppercase(),
        format!(" {token}"),
        format!("{token} "),
        token[..token.len() - 1].to_string(),
        format!("{token}0"),
    ]
}
