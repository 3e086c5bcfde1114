// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ProcessingJob
//!
//! Root entity of one upload. A job owns zero-or-one [`crate::entities::zip::ZipMaster`]
//! and one-or-more [`crate::entities::file::FileMaster`] rows. Its status is monotonic
//! only across the terminal set; once terminal it never changes again (see
//! [`JobStatus::is_terminal`]).

use crate::value_objects::ids::{GxBucketId, JobId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a [`ProcessingJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    PendingUpload,
    UploadComplete,
    Queued,
    Processing,
    Completed,
    PartialSuccess,
    Failed,
    Terminated,
}

impl JobStatus {
    /// Terminal states never transition further (§3 invariant).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::PartialSuccess | Self::Failed | Self::Terminated)
    }

    /// States from which admin termination is permitted (§4.10).
    pub fn is_terminable(self) -> bool {
        matches!(self, Self::PendingUpload | Self::UploadComplete | Self::Queued | Self::Processing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PendingUpload => "PENDING_UPLOAD",
            Self::UploadComplete => "UPLOAD_COMPLETE",
            Self::Queued => "QUEUED",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::PartialSuccess => "PARTIAL_SUCCESS",
            Self::Failed => "FAILED",
            Self::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Root entity of one user upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingJob {
    pub id: JobId,
    pub original_filename: String,
    pub file_location: String,
    pub status: JobStatus,
    pub current_stage: Option<String>,
    pub error_message: Option<String>,
    pub remark: Option<String>,
    /// `None` marks this job bulk: the bucket is resolved per-entry during
    /// ZIP extraction instead of being fixed at the job level.
    pub gx_bucket_id: Option<GxBucketId>,
    pub skip_gx_process: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessingJob {
    /// Construct a new job in `PENDING_UPLOAD`, as `createJobAndPresignedUrl`
    /// does in §4.9. The id is assigned by the repository on insert.
    pub fn new_pending(
        id: JobId,
        original_filename: impl Into<String>,
        file_location: impl Into<String>,
        gx_bucket_id: Option<GxBucketId>,
        skip_gx_process: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            original_filename: original_filename.into(),
            file_location: file_location.into(),
            status: JobStatus::PendingUpload,
            current_stage: None,
            error_message: None,
            remark: None,
            gx_bucket_id,
            skip_gx_process,
            created_at: now,
            updated_at: now,
        }
    }

    /// A job with no fixed bucket routes per-entry bucket resolution during
    /// bulk ZIP extraction (§4.6 step 5).
    pub fn is_bulk(&self) -> bool {
        self.gx_bucket_id.is_none()
    }

    /// Whether the `.zip` extension (or bulk routing) should send this job
    /// through ZIP extraction rather than the single-file pipeline (§9 open
    /// question, resolved: any `.zip` extension routes to ZIP regardless of
    /// bucket).
    pub fn routes_to_zip_pipeline(&self) -> bool {
        self.is_bulk() || self.original_filename.to_ascii_lowercase().ends_with(".zip")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(0, 0).unwrap()
    }

    #[test]
    fn new_pending_job_starts_in_pending_upload() {
        let job = ProcessingJob::new_pending(JobId::new(1), "a.pdf", "bulk/source/1/a.pdf", None, false, now());
        assert_eq!(job.status, JobStatus::PendingUpload);
        assert!(job.is_bulk());
    }

    #[test]
    fn zip_extension_routes_to_zip_pipeline_even_with_bucket() {
        let job = ProcessingJob::new_pending(
            JobId::new(1),
            "archive.zip",
            "42/source/1/archive.zip",
            Some(GxBucketId::new(42)),
            false,
            now(),
        );
        assert!(job.routes_to_zip_pipeline());
    }

    #[test]
    fn terminal_states_are_stable() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::PartialSuccess.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Terminated.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
    }

    #[test]
    fn only_non_terminal_states_are_terminable_by_admin() {
        assert!(JobStatus::Queued.is_terminable());
        assert!(!JobStatus::Completed.is_terminable());
    }
}
