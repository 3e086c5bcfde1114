// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ZipMaster
//!
//! One per zip-shaped upload, 1:1 with its [`crate::entities::job::ProcessingJob`].
//! Transitions are forward-only through the order declared in [`ZipProcessingStatus`];
//! `EXTRACTION_FAILED` and `TERMINATED` are terminal.

use crate::value_objects::ids::{GxBucketId, JobId, ZipId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZipProcessingStatus {
    QueuedForExtraction,
    ExtractionInProgress,
    ExtractionSuccess,
    ExtractionFailed,
    Terminated,
}

impl ZipProcessingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ExtractionFailed | Self::Terminated)
    }

    /// Child sub-states the lifecycle scheduler (C11) treats as "work
    /// pending" for the parent job.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::QueuedForExtraction | Self::ExtractionInProgress)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::QueuedForExtraction => "QUEUED_FOR_EXTRACTION",
            Self::ExtractionInProgress => "EXTRACTION_IN_PROGRESS",
            Self::ExtractionSuccess => "EXTRACTION_SUCCESS",
            Self::ExtractionFailed => "EXTRACTION_FAILED",
            Self::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for ZipProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZipMaster {
    pub id: ZipId,
    pub processing_job_id: JobId,
    pub gx_bucket_id: Option<GxBucketId>,
    pub original_file_path: String,
    pub original_file_name: String,
    pub file_size: u64,
    pub zip_processing_status: ZipProcessingStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ZipMaster {
    pub fn new_queued(
        id: ZipId,
        processing_job_id: JobId,
        gx_bucket_id: Option<GxBucketId>,
        original_file_path: impl Into<String>,
        original_file_name: impl Into<String>,
        file_size: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            processing_job_id,
            gx_bucket_id,
            original_file_path: original_file_path.into(),
            original_file_name: original_file_name.into(),
            file_size,
            zip_processing_status: ZipProcessingStatus::QueuedForExtraction,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_failed_and_terminated_are_terminal() {
        assert!(ZipProcessingStatus::ExtractionFailed.is_terminal());
        assert!(ZipProcessingStatus::Terminated.is_terminal());
        assert!(!ZipProcessingStatus::ExtractionSuccess.is_terminal());
    }

    #[test]
    fn in_progress_substates_are_pending() {
        assert!(ZipProcessingStatus::QueuedForExtraction.is_pending());
        assert!(ZipProcessingStatus::ExtractionInProgress.is_pending());
        assert!(!ZipProcessingStatus::ExtractionSuccess.is_pending());
    }
}
