// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client address resolution.
//!
//! Candidates are tried in order: the first entry of `X-Forwarded-For`,
//! then `Client-IP`, then the socket peer address. The first candidate that
//! parses as an IP address wins, in canonical form. With nothing usable the
//! loopback address is returned.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::debug;

const FORWARDED_FOR: &str = "x-forwarded-for";
const CLIENT_IP: &str = "client-ip";

/// Resolve the client address from request headers and the peer address.
pub fn resolve(headers: &HeaderMap, peer: Option<IpAddr>) -> IpAddr {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(parse_candidate);
    if let Some(ip) = forwarded {
        return ip;
    }

    let client_ip = headers
        .get(CLIENT_IP)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_candidate);
    if let Some(ip) = client_ip {
        return ip;
    }

    match peer {
        Some(ip) => ip.to_canonical(),
        None => {
            debug!("No usable client address, falling back to loopback");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

/// IPv4-mapped IPv6 addresses are reduced to plain IPv4.
fn parse_candidate(raw: &str) -> Option<IpAddr> {
    raw.trim().parse::<IpAddr>().ok().map(|ip| ip.to_canonical())
}

/// Extractor for the resolved client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(ClientIp(resolve(&parts.headers, peer)))
    }
}
