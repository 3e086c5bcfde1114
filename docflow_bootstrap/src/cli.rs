// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling with security-first design.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. parser::parse()                 │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validator::validate()           │  Security validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated config
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `parser` - CLI structure and clap parsing
//! - `validator` - Security validation layer

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli, Commands};
pub use validator::{ParseError, SecureArgParser};

use std::path::PathBuf;

/// Validated CLI configuration: all arguments security-checked and
/// range-checked.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config: Option<PathBuf>,
}

/// Validated command variants, one per admin action this binary exposes.
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Serve,
    Migrate,
    Retry { file_master_id: Option<i64>, gx_master_id: Option<i64> },
    Terminate { job_id: i64 },
    TerminateAll,
}

/// Parse CLI arguments with `clap`, then apply security and range
/// validation.
///
/// # Errors
/// Returns [`ParseError`] if any validation fails.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = parse_cli();
    validate_cli(cli)
}

fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let config = if let Some(ref path) = cli.config { Some(SecureArgParser::validate_path(&path.to_string_lossy())?) } else { None };

    let command = match cli.command {
        Commands::Serve => ValidatedCommand::Serve,
        Commands::Migrate => ValidatedCommand::Migrate,
        Commands::Retry { file_master_id, gx_master_id } => {
            if file_master_id.is_none() && gx_master_id.is_none() {
                return Err(ParseError::InvalidValue {
                    arg: "retry".to_string(),
                    reason: "exactly one of --file-master-id or --gx-master-id is required".to_string(),
                });
            }
            ValidatedCommand::Retry { file_master_id, gx_master_id }
        }
        Commands::Terminate { job_id } => {
            if job_id <= 0 {
                return Err(ParseError::InvalidValue { arg: "job-id".to_string(), reason: "must be positive".to_string() });
            }
            ValidatedCommand::Terminate { job_id }
        }
        Commands::TerminateAll => ValidatedCommand::TerminateAll,
    };

    Ok(ValidatedCli { command, verbose: cli.verbose, config })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_requires_exactly_one_target() {
        let cli = Cli { command: Commands::Retry { file_master_id: None, gx_master_id: None }, config: None, verbose: false };
        assert!(validate_cli(cli).is_err());
    }

    #[test]
    fn retry_accepts_file_master_id() {
        let cli = Cli { command: Commands::Retry { file_master_id: Some(1), gx_master_id: None }, config: None, verbose: false };
        assert!(validate_cli(cli).is_ok());
    }

    #[test]
    fn terminate_rejects_non_positive_job_id() {
        let cli = Cli { command: Commands::Terminate { job_id: 0 }, config: None, verbose: false };
        assert!(validate_cli(cli).is_err());
    }
}
