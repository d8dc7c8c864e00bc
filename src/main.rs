// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Paste Service
//!
//! ## Configuration
//!
//! Settings come from `.env`, an optional TOML file and environment
//! variables, in increasing precedence:
//!
//! - `PASTE_CONFIG`: config file path (default: paste.toml)
//! - `PASTE__BIND_ADDR`: server bind address (default: 0.0.0.0:8080)
//! - `PASTE__BASE_URL`: public base URL for links
//! - `PASTE__DATABASE__PATH`: SQLite file (default: paste.db)
//! - `PASTE__ADMIN__USERNAME` / `PASTE__ADMIN__PASSWORD`: admin credential
//! - `PASTE__RATE_LIMIT__GENERAL_HOURLY_LIMIT` and friends
//! - `RUST_LOG`: log filter (default: info)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use paste_service::{build_router, AppState, Config, Database};

const DEFAULT_ADMIN_PASSWORD: &str = "ChangeThisPassword";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = Arc::new(Config::load()?);
    info!(
        bind_addr = %config.bind_addr,
        database = %config.database.path,
        general_limits = ?config.rate_limit.limits(false),
        preferred_limits = ?config.rate_limit.limits(true),
        metrics = config.metrics.enabled,
        "Starting paste service"
    );
    if config.admin.password == DEFAULT_ADMIN_PASSWORD {
        warn!("Admin password is the shipped default; set PASTE__ADMIN__PASSWORD");
    }

    // Open storage
    let db = Database::open(&config.database.path)?;

    // Build router
    let state = Arc::new(AppState::new(config.clone(), db)?);
    let app = build_router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
