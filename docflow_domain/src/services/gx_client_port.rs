// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # GX Client Port (C12)
//!
//! The downstream ingestion service ("GX"): bucket creation, ingest submit,
//! and ingest status polling. The concrete adapter is an HTTP client built
//! on `reqwest`, guarded by the configured `gx.timeout_seconds` (§5).

use crate::error::DocFlowResult;
use crate::value_objects::ids::GxBucketId;
use async_trait::async_trait;

/// Result of polling `ingestStatus`: the raw status string (translated by
/// [`crate::entities::gx::GxStatus::parse_from_gx`]) plus an optional
/// human-readable message.
#[derive(Debug, Clone)]
pub struct GxIngestStatus {
    pub raw_status: String,
    pub status_message: Option<String>,
}

#[async_trait]
pub trait GxClientPort: Send + Sync {
    /// Resolves (creating if necessary) the bucket for a bulk-upload path
    /// segment (§4.6 step 5).
    async fn create_gx_bucket(&self, name: &str) -> DocFlowResult<GxBucketId>;

    /// Polls ingestion progress for a previously-submitted `gx_process_id`.
    /// GX may report multiple categories of progress; callers extract the
    /// first found in finality order `{complete, errors, cancelled,
    /// processing}` (§4.12).
    async fn ingest_status(&self, gx_process_id: &str) -> DocFlowResult<GxIngestStatus>;
}
