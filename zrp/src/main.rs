// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ZRP Server Entry Point
//!
//! Boot sequence: parse CLI → install tracing → load configuration (file +
//! environment, CLI overrides) → build the application state (store,
//! services, seeding, audit worker) → serve until SIGINT/SIGTERM → drain
//! the audit queue within a bounded grace period → close the pool.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use zrp::infrastructure::config::AppConfig;
use zrp::{build_router, AppState};
use zrp_bootstrap::{Cli, ExitCode};

/// Audit-queue drain budget after the listener stops.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    zrp_bootstrap::logger::init(cli.verbose);

    let code = match run(cli).await {
        Ok(()) => ExitCode::Success,
        Err(err) => {
            error!(error = %err, "fatal");
            ExitCode::Error
        }
    };
    std::process::exit(code.as_i32());
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }
    if let Some(parts_dir) = cli.parts_dir {
        config.parts_dir = parts_dir.display().to_string();
    }

    let (state, audit_worker) = AppState::build(config).await.context("building application")?;
    let router = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&state.config.listen_addr)
        .await
        .with_context(|| format!("binding {}", state.config.listen_addr))?;
    info!(
        addr = %state.config.listen_addr,
        parts_dir = %state.config.parts_dir,
        "zrp listening"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(zrp_bootstrap::shutdown::wait_for_signal())
    .await
    .context("server error")?;

    // Bounded drain: the worker finishes the queue or the grace period ends.
    state.audit.initiate_shutdown();
    if tokio::time::timeout(SHUTDOWN_GRACE, audit_worker).await.is_err() {
        error!("audit queue did not drain within the grace period");
    }
    state.pool.close().await;
    info!("shutdown complete");
    Ok(())
}
