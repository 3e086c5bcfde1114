// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Security Validation Layer
//!
//! Validates CLI arguments before they reach application logic: path
//! canonicalization, rejection of shell-metacharacter and path-traversal
//! patterns in free-form strings, and numeric range checks.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid value for --{arg}: {reason}")]
    InvalidValue { arg: String, reason: String },

    #[error("path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("path contains disallowed characters: {0}")]
    UnsafePath(String),

    #[error("argument contains disallowed characters: {0}")]
    UnsafeArgument(String),

    #[error("clap error: {0}")]
    Clap(#[from] clap::error::Error),
}

/// Characters that have no legitimate reason to appear in a config-file
/// path, bucket id, or similar free-form CLI argument in this system, and
/// that commonly appear in shell-injection or path-traversal payloads.
const DISALLOWED_CHARS: &[char] = &[';', '|', '&', '$', '`', '\n', '\r', '\0'];

pub struct SecureArgParser;

impl SecureArgParser {
    /// Validate a free-form string argument (bucket id, queue name, etc.):
    /// reject shell metacharacters and NUL bytes.
    pub fn validate_argument(value: &str) -> Result<(), ParseError> {
        if value.chars().any(|c| DISALLOWED_CHARS.contains(&c)) {
            return Err(ParseError::UnsafeArgument(value.to_string()));
        }
        Ok(())
    }

    /// Validate and canonicalize a path that is expected to already exist
    /// (e.g. a config file passed on the command line).
    pub fn validate_path(raw: &str) -> Result<PathBuf, ParseError> {
        Self::validate_argument(raw)?;
        let path = Path::new(raw);
        path.canonicalize().map_err(|_| ParseError::PathNotFound(path.to_path_buf()))
    }

    /// Validate a numeric argument against an inclusive range.
    pub fn validate_range(arg: &str, value: u64, min: u64, max: u64) -> Result<(), ParseError> {
        if value < min || value > max {
            return Err(ParseError::InvalidValue {
                arg: arg.to_string(),
                reason: format!("must be between {min} and {max}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_shell_metacharacters() {
        assert!(SecureArgParser::validate_argument("bucket; rm -rf /").is_err());
        assert!(SecureArgParser::validate_argument("bucket$(whoami)").is_err());
    }

    #[test]
    fn accepts_ordinary_identifiers() {
        assert!(SecureArgParser::validate_argument("bucket-42").is_ok());
    }

    #[test]
    fn range_validation_rejects_out_of_bounds() {
        assert!(SecureArgParser::validate_range("concurrency", 0, 1, 16).is_err());
        assert!(SecureArgParser::validate_range("concurrency", 8, 1, 16).is_ok());
    }
}
