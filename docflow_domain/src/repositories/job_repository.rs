// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence contract for [`ProcessingJob`](crate::entities::job::ProcessingJob).

use crate::entities::job::{JobStatus, ProcessingJob};
use crate::error::DocFlowResult;
use crate::value_objects::ids::JobId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository port for jobs (C9/C10/C11 depend on this).
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new job and return it with its assigned id.
    async fn insert(&self, job: ProcessingJob) -> DocFlowResult<ProcessingJob>;

    async fn find_by_id(&self, id: JobId) -> DocFlowResult<Option<ProcessingJob>>;

    /// Unconditional update used for fields outside the status CAS path
    /// (e.g. `file_location`, `current_stage`).
    async fn update(&self, job: &ProcessingJob) -> DocFlowResult<()>;

    /// Compare-and-set: transition succeeds only if the row's current
    /// status is in `expected`. Returns `true` iff exactly one row changed.
    async fn cas_status(
        &self,
        id: JobId,
        expected: &[JobStatus],
        new_status: JobStatus,
        error_message: Option<&str>,
        remark: Option<&str>,
    ) -> DocFlowResult<bool>;

    /// Bulk transition used by `terminateAllActiveJobs` (§4.10): affects
    /// only rows whose current status is in `expected`. Returns the number
    /// of rows changed.
    async fn bulk_cas_status(&self, expected: &[JobStatus], new_status: JobStatus) -> DocFlowResult<u64>;

    /// All jobs currently in one of `statuses`, for the lifecycle scheduler
    /// (C11) and the stale-job sweeper (C12).
    async fn find_by_statuses(&self, statuses: &[JobStatus]) -> DocFlowResult<Vec<ProcessingJob>>;

    /// Jobs in `PENDING_UPLOAD` older than `older_than`, for the stale-job
    /// sweeper (§4.12).
    async fn find_stale_pending_uploads(&self, older_than: DateTime<Utc>) -> DocFlowResult<Vec<ProcessingJob>>;
}
