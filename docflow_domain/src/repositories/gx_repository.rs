// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence contract for [`GxMaster`](crate::entities::gx::GxMaster).

use crate::entities::gx::{GxMaster, GxStatus};
use crate::error::DocFlowResult;
use crate::value_objects::ids::{FileId, GxId, JobId};
use async_trait::async_trait;

#[async_trait]
pub trait GxRepository: Send + Sync {
    async fn insert(&self, gx: GxMaster) -> DocFlowResult<GxMaster>;

    async fn find_by_id(&self, id: GxId) -> DocFlowResult<Option<GxMaster>>;

    async fn find_by_source_file_id(&self, file_id: FileId) -> DocFlowResult<Vec<GxMaster>>;

    async fn find_by_job_ids(&self, job_ids: &[JobId]) -> DocFlowResult<Vec<GxMaster>>;

    /// Rows in `{QUEUED, PROCESSING}`, polled by C12's poller.
    async fn find_by_statuses(&self, statuses: &[GxStatus]) -> DocFlowResult<Vec<GxMaster>>;

    async fn cas_status(
        &self,
        id: GxId,
        expected: &[GxStatus],
        new_status: GxStatus,
        gx_process_id: Option<&str>,
        error_message: Option<&str>,
    ) -> DocFlowResult<bool>;

    async fn update_after_upload(&self, gx: &GxMaster) -> DocFlowResult<bool>;

    async fn bulk_cas_status_for_jobs(
        &self,
        job_ids: &[JobId],
        expected: &[GxStatus],
        new_status: GxStatus,
    ) -> DocFlowResult<u64>;

    async fn bulk_cas_status(&self, expected: &[GxStatus], new_status: GxStatus) -> DocFlowResult<u64>;
}
