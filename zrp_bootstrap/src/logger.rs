// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Tracing initialisation. `ZRP_LOG` takes precedence (standard
//! `EnvFilter` syntax), then the `--verbose` flag, then `info`.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. Call once, before any other work.
pub fn init(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("ZRP_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
