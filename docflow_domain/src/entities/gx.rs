// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # GxMaster
//!
//! Final-artifact row produced downstream of processing and handed off to
//! the external GX ingestion service. Many `GxMaster` rows may reference one
//! `FileMaster` (PDF split, §4.7 step 7).

use crate::value_objects::ids::{FileId, GxBucketId, GxId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GxStatus {
    QueuedForUpload,
    Reading,
    Queued,
    Processing,
    Complete,
    Error,
    Cancelled,
    Skipped,
    Ignored,
    Terminated,
    Duplicate,
    Active,
    Inactive,
}

impl GxStatus {
    pub fn is_terminal_success(self) -> bool {
        matches!(self, Self::Complete | Self::Skipped)
    }

    /// Sub-states the GX poller (C12) watches.
    pub fn is_polled(self) -> bool {
        matches!(self, Self::Queued | Self::Processing)
    }

    /// Sub-states the lifecycle scheduler treats as "work pending".
    pub fn is_pending_for_scheduler(self) -> bool {
        matches!(self, Self::QueuedForUpload | Self::Processing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::QueuedForUpload => "QUEUED_FOR_UPLOAD",
            Self::Reading => "READING",
            Self::Queued => "QUEUED",
            Self::Processing => "PROCESSING",
            Self::Complete => "COMPLETE",
            Self::Error => "ERROR",
            Self::Cancelled => "CANCELLED",
            Self::Skipped => "SKIPPED",
            Self::Ignored => "IGNORED",
            Self::Terminated => "TERMINATED",
            Self::Duplicate => "DUPLICATE",
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }

    /// Case-insensitive parse of the status string GX's `ingestStatus`
    /// response returns (§4.12).
    pub fn parse_from_gx(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        Some(match normalized.as_str() {
            "QUEUED_FOR_UPLOAD" => Self::QueuedForUpload,
            "READING" => Self::Reading,
            "QUEUED" => Self::Queued,
            "PROCESSING" => Self::Processing,
            "COMPLETE" | "COMPLETED" => Self::Complete,
            "ERROR" | "ERRORS" | "FAILED" => Self::Error,
            "CANCELLED" | "CANCELED" => Self::Cancelled,
            "SKIPPED" => Self::Skipped,
            "IGNORED" => Self::Ignored,
            "TERMINATED" => Self::Terminated,
            "DUPLICATE" => Self::Duplicate,
            "ACTIVE" => Self::Active,
            "INACTIVE" => Self::Inactive,
            _ => return None,
        })
    }
}

impl fmt::Display for GxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Nil placeholder used when GX processing is skipped for a row.
pub const NIL_GX_PROCESS_ID: &str = "00000000-0000-0000-0000-000000000000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GxMaster {
    pub id: GxId,
    pub source_file_id: FileId,
    pub gx_bucket_id: GxBucketId,
    pub file_location: String,
    pub processed_file_name: String,
    pub file_size: u64,
    pub extension: Option<String>,
    pub gx_status: GxStatus,
    pub gx_process_id: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GxMaster {
    #[allow(clippy::too_many_arguments)]
    pub fn new_queued_for_upload(
        id: GxId,
        source_file_id: FileId,
        gx_bucket_id: GxBucketId,
        file_location: impl Into<String>,
        processed_file_name: impl Into<String>,
        file_size: u64,
        extension: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            source_file_id,
            gx_bucket_id,
            file_location: file_location.into(),
            processed_file_name: processed_file_name.into(),
            file_size,
            extension,
            gx_status: GxStatus::QueuedForUpload,
            gx_process_id: NIL_GX_PROCESS_ID.to_string(),
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
    fn complete_and_skipped_are_terminal_success() {
        assert!(GxStatus::Complete.is_terminal_success());
        assert!(GxStatus::Skipped.is_terminal_success());
        assert!(!GxStatus::Error.is_terminal_success());
    }

    #[test]
    fn parse_from_gx_is_case_insensitive() {
        assert_eq!(GxStatus::parse_from_gx("complete"), Some(GxStatus::Complete));
        assert_eq!(GxStatus::parse_from_gx("Processing"), Some(GxStatus::Processing));
        assert_eq!(GxStatus::parse_from_gx("bogus"), None);
    }

    #[test]
    fn new_row_starts_queued_for_upload_with_nil_process_id() {
        let now = DateTime::from_timestamp(0, 0).unwrap();
        let gx = GxMaster::new_queued_for_upload(
            GxId::new(1),
            FileId::new(1),
            GxBucketId::new(7),
            "7/files/1/a.pdf",
            "a.pdf",
            100,
            Some("pdf".into()),
            now,
        );
        assert_eq!(gx.gx_status, GxStatus::QueuedForUpload);
        assert_eq!(gx.gx_process_id, NIL_GX_PROCESS_ID);
    }
}
