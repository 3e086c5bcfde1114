// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Codes
//!
//! Maps application results to Unix sysexits-style exit codes so shell
//! scripts and process supervisors can distinguish failure classes without
//! parsing log output.

use crate::cli::ParseError;
use std::process::ExitCode as ProcessExitCode;

/// Exit codes following the BSD `sysexits.h` convention where applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    /// Generic failure not covered by a more specific code.
    Failure = 1,
    /// `EX_USAGE` — CLI arguments were malformed or failed validation.
    Usage = 64,
    /// `EX_DATAERR` — input data was invalid.
    DataError = 65,
    /// `EX_UNAVAILABLE` — a required external service (storage, queue, GX,
    /// database) could not be reached.
    Unavailable = 69,
    /// `EX_SOFTWARE` — an internal invariant was violated.
    Software = 70,
    /// `EX_CONFIG` — configuration could not be loaded or was invalid.
    ConfigError = 78,
}

impl From<ExitCode> for ProcessExitCode {
    fn from(code: ExitCode) -> Self {
        ProcessExitCode::from(code as u8)
    }
}

/// Map a CLI parse/validation error to an exit code.
pub fn map_error_to_exit_code(error: &ParseError) -> ExitCode {
    match error {
        ParseError::InvalidValue { .. } | ParseError::UnsafeArgument(_) | ParseError::UnsafePath(_) => ExitCode::Usage,
        ParseError::PathNotFound(_) => ExitCode::DataError,
        ParseError::Clap(_) => ExitCode::Usage,
    }
}

/// Map the outcome of running the application to a process exit code.
pub fn result_to_exit_code<E: std::fmt::Display>(result: Result<(), E>) -> ProcessExitCode {
    match result {
        Ok(()) => ExitCode::Success.into(),
        Err(err) => {
            tracing::error!("application exited with error: {err}");
            ExitCode::Software.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_maps_to_usage() {
        let error = ParseError::InvalidValue { arg: "x".into(), reason: "bad".into() };
        assert_eq!(map_error_to_exit_code(&error), ExitCode::Usage);
    }

    #[test]
    fn path_not_found_maps_to_data_error() {
        let error = ParseError::PathNotFound("/nope".into());
        assert_eq!(map_error_to_exit_code(&error), ExitCode::DataError);
    }
}
