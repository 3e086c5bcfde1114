// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Structure
//!
//! `clap`-derived argument structure for the process entry point. The
//! binary has one long-running mode (`serve`, which runs the queue
//! consumers and the cron-driven schedulers of §4.11/§4.12) and a handful
//! of one-shot admin subcommands mirroring the HTTP surface's admin-only
//! endpoints (§6) that have no routing layer of their own in this system.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "docflow", version, about = "Document ingestion and processing core")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML configuration file; overridden by `DOCFLOW__*` env vars.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the queue consumers (C6/C7), the lifecycle scheduler (C11), and
    /// the GX poller/stale sweeper (C12) until a shutdown signal arrives.
    Serve,

    /// Apply pending database migrations and exit.
    Migrate,

    /// Re-queue a failed `FileMaster` or a `GxMaster` stuck in `ERROR`
    /// (§4.12's retry), mirroring `POST /documents/v1/jobs/retry`.
    Retry {
        /// Retry a FileMaster by id. Mutually exclusive with --gx-master-id.
        #[arg(long, value_name = "ID", conflicts_with = "gx_master_id")]
        file_master_id: Option<i64>,

        /// Retry a GxMaster by id. Mutually exclusive with --file-master-id.
        #[arg(long, value_name = "ID")]
        gx_master_id: Option<i64>,
    },

    /// Terminate a single job, mirroring
    /// `POST /documents/v1/jobs/{jobId}/terminate`.
    Terminate {
        /// The job id to terminate.
        job_id: i64,
    },

    /// Terminate every job in a terminable state and purge both queues,
    /// mirroring `POST /documents/v1/jobs/terminate-all-active`.
    TerminateAll,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
