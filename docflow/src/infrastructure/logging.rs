// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Logging
//!
//! Process-wide `tracing` initialization, driven by
//! [`LoggingConfig`](crate::infrastructure::config::LoggingConfig). Call
//! [`init_tracing`] exactly once, after configuration is loaded and before
//! any other subsystem logs.

use crate::infrastructure::config::LoggingConfig;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;

/// Installs the global tracing subscriber. `RUST_LOG` overrides
/// `config.level` when set.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        fmt().with_env_filter(filter).json().with_target(true).init();
    } else {
        fmt().with_env_filter(filter).with_target(true).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_logging_config_builds_a_filter_without_panicking() {
        let config = LoggingConfig { level: "info".to_string(), json: false };
        let _filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    }
}
