// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # FileMaster
//!
//! One row per file to process: uploaded directly, extracted from a ZIP, or
//! transformed from a container format. `(gx_bucket_id, file_hash)` is
//! unique among non-`FAILED`, non-`IGNORED` rows — the contract §4.4's
//! `find_winner`/`attempt_to_create` pair depends on.

use crate::value_objects::content_hash::ContentHash;
use crate::value_objects::ids::{FileId, GxBucketId, JobId, ZipId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileProcessingStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    /// a.k.a. `SKIPPED_DUPLICATE` in some source shapes; the canonical name
    /// used throughout this implementation is `Duplicate`.
    Duplicate,
    Ignored,
    Terminated,
}

impl FileProcessingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Duplicate | Self::Ignored | Self::Terminated)
    }

    pub fn is_pending(self) -> bool {
        matches!(self, Self::Queued | Self::InProgress)
    }

    /// Excluded from the `(bucket, hash)` uniqueness invariant (§3, §4.4).
    pub fn excluded_from_uniqueness(self) -> bool {
        matches!(self, Self::Failed | Self::Ignored)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Duplicate => "DUPLICATE",
            Self::Ignored => "IGNORED",
            Self::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for FileProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileSourceType {
    Uploaded,
    Extracted,
    Transformed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMaster {
    pub id: FileId,
    pub processing_job_id: JobId,
    pub zip_master_id: Option<ZipId>,
    pub gx_bucket_id: GxBucketId,
    /// Object key, or the `"N/A"` sentinel for ignored entries.
    pub file_location: String,
    pub file_name: String,
    pub file_size: u64,
    pub extension: Option<String>,
    pub file_hash: Option<ContentHash>,
    pub original_content_hash: Option<ContentHash>,
    pub source_type: FileSourceType,
    pub duplicate_of_file_id: Option<FileId>,
    pub file_processing_status: FileProcessingStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileMaster {
    /// Direct-upload path (§4.9): hash is unknown until the document
    /// pipeline streams and digests the object.
    #[allow(clippy::too_many_arguments)]
    pub fn new_uploaded(
        id: FileId,
        processing_job_id: JobId,
        gx_bucket_id: GxBucketId,
        file_location: impl Into<String>,
        file_name: impl Into<String>,
        file_size: u64,
        extension: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            processing_job_id,
            zip_master_id: None,
            gx_bucket_id,
            file_location: file_location.into(),
            file_name: file_name.into(),
            file_size,
            extension,
            file_hash: None,
            original_content_hash: None,
            source_type: FileSourceType::Uploaded,
            duplicate_of_file_id: None,
            file_processing_status: FileProcessingStatus::Queued,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Zip-child path (§4.6 step 5): hash is already known from the
    /// streaming extractor's inline digest.
    #[allow(clippy::too_many_arguments)]
    pub fn new_extracted(
        id: FileId,
        processing_job_id: JobId,
        zip_master_id: ZipId,
        gx_bucket_id: GxBucketId,
        file_location: impl Into<String>,
        file_name: impl Into<String>,
        file_size: u64,
        extension: Option<String>,
        file_hash: ContentHash,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            processing_job_id,
            zip_master_id: Some(zip_master_id),
            gx_bucket_id,
            file_location: file_location.into(),
            file_name: file_name.into(),
            file_size,
            extension,
            original_content_hash: Some(file_hash.clone()),
            file_hash: Some(file_hash),
            source_type: FileSourceType::Extracted,
            duplicate_of_file_id: None,
            file_processing_status: FileProcessingStatus::Queued,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A row recording that this file lost the race for its `(bucket,
    /// hash)` slot (§4.6 step 5, §4.7 step 4).
    pub fn is_duplicate(&self) -> bool {
        self.file_processing_status == FileProcessingStatus::Duplicate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(0, 0).unwrap()
    }

    #[test]
    fn uploaded_file_has_no_hash_yet() {
        let file = FileMaster::new_uploaded(
            FileId::new(1),
            JobId::new(1),
            GxBucketId::new(7),
            "7/source/1/a.pdf",
            "a.pdf",
            2048,
            Some("pdf".into()),
            now(),
        );
        assert!(file.file_hash.is_none());
        assert_eq!(file.source_type, FileSourceType::Uploaded);
    }

    #[test]
    fn extracted_file_carries_known_hash() {
        let hash = ContentHash::of_bytes(b"content");
        let file = FileMaster::new_extracted(
            FileId::new(2),
            JobId::new(1),
            ZipId::new(1),
            GxBucketId::new(7),
            "7/files/1/report.pdf",
            "report.pdf",
            10,
            Some("pdf".into()),
            hash.clone(),
            now(),
        );
        assert_eq!(file.file_hash, Some(hash));
        assert_eq!(file.source_type, FileSourceType::Extracted);
    }

    #[test]
    fn failed_and_ignored_are_excluded_from_uniqueness() {
        assert!(FileProcessingStatus::Failed.excluded_from_uniqueness());
        assert!(FileProcessingStatus::Ignored.excluded_from_uniqueness());
        assert!(!FileProcessingStatus::Duplicate.excluded_from_uniqueness());
        assert!(!FileProcessingStatus::Queued.excluded_from_uniqueness());
    }
}
