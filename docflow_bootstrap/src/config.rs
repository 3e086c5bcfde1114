// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Configuration
//!
//! The small set of settings needed before the application's own layered
//! configuration (`docflow::infrastructure::config::DocFlowConfig`) can be
//! loaded: where its config file lives and how verbose the logger should
//! be. Bootstrap sits outside the application layers and must be able to
//! start logging before any TOML/env loading happens.

use crate::cli::ValidatedCli;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Path to the application config file, if one was passed on the
    /// command line. `None` means the application layer falls back to its
    /// own default search path and environment overrides.
    pub config_path: Option<PathBuf>,
    pub verbose: bool,
}

impl From<&ValidatedCli> for BootstrapConfig {
    fn from(cli: &ValidatedCli) -> Self {
        Self { config_path: cli.config.clone(), verbose: cli.verbose }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ValidatedCommand;

    #[test]
    fn carries_config_path_and_verbosity_from_cli() {
        let cli = ValidatedCli { command: ValidatedCommand::Serve, verbose: true, config: Some("/etc/docflow.toml".into()) };
        let config = BootstrapConfig::from(&cli);
        assert!(config.verbose);
        assert_eq!(config.config_path, Some("/etc/docflow.toml".into()));
    }
}
