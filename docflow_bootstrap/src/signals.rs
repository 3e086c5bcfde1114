// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Signal Handling
//!
//! Listens for `SIGTERM`/`SIGINT` (and `SIGHUP` on Unix) and drives the
//! [`crate::shutdown::ShutdownCoordinator`]. `terminate_job`/
//! `terminate_all_active_jobs` are advisory (§5): in-flight workers observe
//! the coordinator's cancellation token between units of work rather than
//! being forcibly interrupted.

use crate::shutdown::ShutdownCoordinator;

/// Wait for a termination signal, then initiate graceful shutdown on
/// `coordinator`. Runs until a signal arrives; intended to be spawned as
/// its own task alongside the serve loop.
pub async fn wait_for_shutdown_signal(coordinator: ShutdownCoordinator) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        let mut sighup = signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");

        tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM"),
            _ = sigint.recv() => tracing::info!("received SIGINT"),
            _ = sighup.recv() => tracing::info!("received SIGHUP"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received Ctrl-C");
    }

    coordinator.initiate_shutdown();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn initiating_shutdown_directly_is_observed_by_coordinator() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(1));
        coordinator.initiate_shutdown();
        assert!(coordinator.is_shutting_down());
    }
}
