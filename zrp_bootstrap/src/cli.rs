// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Command-line interface. Flags override file/environment configuration.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "zrp")]
#[command(about = "ZRP PLM back-end - JSON/HTTP API over SQLite and a CSV parts catalog")]
#[command(version)]
pub struct Cli {
    /// Socket address to bind (overrides configuration)
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Configuration file path (default: ./zrp.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// SQLite database URL (overrides configuration)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Parts catalog directory (overrides configuration)
    #[arg(long)]
    pub parts_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
