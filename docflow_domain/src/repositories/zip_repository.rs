// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence contract for [`ZipMaster`](crate::entities::zip::ZipMaster).

use crate::entities::zip::{ZipMaster, ZipProcessingStatus};
use crate::error::DocFlowResult;
use crate::value_objects::ids::{JobId, ZipId};
use async_trait::async_trait;

#[async_trait]
pub trait ZipRepository: Send + Sync {
    /// Upsert-by-job used by `triggerProcessing` (§4.9): idempotent, so
    /// re-triggering a job does not create a second `ZipMaster`.
    async fn upsert_for_job(&self, zip: ZipMaster) -> DocFlowResult<ZipMaster>;

    async fn find_by_id(&self, id: ZipId) -> DocFlowResult<Option<ZipMaster>>;

    async fn find_by_job_id(&self, job_id: JobId) -> DocFlowResult<Option<ZipMaster>>;

    async fn find_by_job_ids(&self, job_ids: &[JobId]) -> DocFlowResult<Vec<ZipMaster>>;

    async fn cas_status(
        &self,
        id: ZipId,
        expected: &[ZipProcessingStatus],
        new_status: ZipProcessingStatus,
        error_message: Option<&str>,
    ) -> DocFlowResult<bool>;

    /// Bulk transition used by `terminateJob`/`terminateAllActiveJobs`.
    async fn bulk_cas_status_for_jobs(
        &self,
        job_ids: &[JobId],
        expected: &[ZipProcessingStatus],
        new_status: ZipProcessingStatus,
    ) -> DocFlowResult<u64>;

    async fn bulk_cas_status(&self, expected: &[ZipProcessingStatus], new_status: ZipProcessingStatus)
        -> DocFlowResult<u64>;
}
