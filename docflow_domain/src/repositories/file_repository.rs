// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence contract for [`FileMaster`](crate::entities::file::FileMaster).
//!
//! The lock/atomic service (C4) is this trait's `acquire_lock`,
//! `find_winner`, and `attempt_to_create` methods: the sole contended
//! invariant, `(gx_bucket_id, file_hash)` uniqueness, is enforced by the
//! database's unique index and recovered from here rather than guarded by
//! an application-level lock (§5).

use crate::entities::file::{FileMaster, FileProcessingStatus};
use crate::error::DocFlowResult;
use crate::value_objects::content_hash::ContentHash;
use crate::value_objects::ids::{FileId, GxBucketId, JobId, ZipId};
use async_trait::async_trait;

/// Raised by [`FileRepository::attempt_to_create`] when the `(bucket,
/// hash)` unique index rejects the insert; the caller recovers via
/// [`FileRepository::find_winner`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("unique (gx_bucket_id, file_hash) violation")]
pub struct UniqueHashViolation;

#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Atomic `UPDATE ... WHERE id = ? AND status = QUEUED SET status =
    /// IN_PROGRESS`; `true` iff exactly one row changed (§4.4).
    async fn acquire_lock(&self, id: FileId) -> DocFlowResult<bool>;

    /// Lowest-id row for `(bucket, hash)` whose status is not `FAILED` or
    /// `IGNORED`; the winner of the race for that slot (§4.4, §4.7).
    async fn find_winner(&self, bucket: GxBucketId, hash: &ContentHash) -> DocFlowResult<Option<FileMaster>>;

    /// Insert that flushes immediately; returns [`UniqueHashViolation`] as a
    /// `DocFlowError::Duplicate` if the `(bucket, hash)` index rejects it.
    async fn attempt_to_create(&self, file: FileMaster) -> DocFlowResult<FileMaster>;

    async fn find_by_id(&self, id: FileId) -> DocFlowResult<Option<FileMaster>>;

    async fn find_by_job_id(&self, job_id: JobId) -> DocFlowResult<Vec<FileMaster>>;

    async fn find_by_job_ids(&self, job_ids: &[JobId]) -> DocFlowResult<Vec<FileMaster>>;

    async fn find_by_zip_id(&self, zip_id: ZipId) -> DocFlowResult<Vec<FileMaster>>;

    /// Persist a hash/size/status update recovered from the direct-upload
    /// digest path (§4.7 step 4), itself CAS'd against the file still being
    /// `IN_PROGRESS`.
    async fn update_after_hashing(&self, file: &FileMaster) -> DocFlowResult<bool>;

    async fn cas_status(
        &self,
        id: FileId,
        expected: &[FileProcessingStatus],
        new_status: FileProcessingStatus,
        error_message: Option<&str>,
    ) -> DocFlowResult<bool>;

    /// Bulk transition used by termination (§4.4, §4.10).
    async fn update_status_for_ids(
        &self,
        ids: &[FileId],
        new_status: FileProcessingStatus,
        expected: &[FileProcessingStatus],
    ) -> DocFlowResult<u64>;

    async fn bulk_cas_status_for_jobs(
        &self,
        job_ids: &[JobId],
        expected: &[FileProcessingStatus],
        new_status: FileProcessingStatus,
    ) -> DocFlowResult<u64>;

    async fn bulk_cas_status(
        &self,
        expected: &[FileProcessingStatus],
        new_status: FileProcessingStatus,
    ) -> DocFlowResult<u64>;
}
