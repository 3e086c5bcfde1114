// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Errors
//!
//! `DocFlowError` is the single error type surfaced by the domain layer and
//! its ports. Variants mirror the error taxonomy: validation/duplicate
//! outcomes recovered locally, terminal zip/file errors that end a child
//! entity's lifecycle, and transient/downstream errors a consumer should let
//! the broker redeliver.

use thiserror::Error;

/// Errors produced by domain logic and infrastructure ports.
#[derive(Debug, Error, Clone)]
pub enum DocFlowError {
    /// Input failed admissibility rules (size, name, unsupported type).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A `(bucket, hash)` slot was already occupied; recovered via
    /// `find_winner`. Should never escape to a caller that doesn't expect it.
    #[error("duplicate content for bucket/hash")]
    Duplicate,

    /// ZIP extraction hit an unrecoverable structural problem.
    #[error("zip extraction failed: {0}")]
    TerminalZip(String),

    /// File processing hit an unrecoverable handler or conversion error.
    #[error("file processing failed: {0}")]
    TerminalFile(String),

    /// Transient failure (I/O, 5xx). Caller should let the broker redeliver.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Downstream collaborator unavailable or timed out (bad gateway,
    /// service unavailable, gateway timeout).
    #[error("downstream failure: {0}")]
    Downstream(String),

    /// Requested transition is not legal from the current state (retry of a
    /// non-failed task, termination of an already-terminal job).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Object storage adapter error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Queue adapter error.
    #[error("queue error: {0}")]
    Queue(String),

    /// Persistence error not otherwise categorized.
    #[error("database error: {0}")]
    Database(String),

    /// Local I/O error (temp files, streams).
    #[error("io error: {0}")]
    Io(String),

    /// Requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl DocFlowError {
    /// Whether a consumer should let the broker redeliver this message
    /// rather than recording a terminal failure on the entity.
    pub fn retryable(&self) -> bool {
        matches!(self, DocFlowError::Transient(_) | DocFlowError::Downstream(_))
    }
}

impl From<std::io::Error> for DocFlowError {
    fn from(err: std::io::Error) -> Self {
        DocFlowError::Io(err.to_string())
    }
}

pub type DocFlowResult<T> = Result<T, DocFlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_and_downstream_are_retryable() {
        assert!(DocFlowError::Transient("x".into()).retryable());
        assert!(DocFlowError::Downstream("x".into()).retryable());
    }

    #[test]
    fn other_kinds_are_not_retryable() {
        assert!(!DocFlowError::Validation("x".into()).retryable());
        assert!(!DocFlowError::Duplicate.retryable());
        assert!(!DocFlowError::TerminalZip("x".into()).retryable());
        assert!(!DocFlowError::Conflict("x".into()).retryable());
    }
}
