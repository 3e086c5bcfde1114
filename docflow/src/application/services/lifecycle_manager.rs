// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Lifecycle Manager (C10)
//!
//! Admin-facing job termination, and the per-child failure delegation
//! every worker (C6, C7) calls into. None of these transitions ever
//! overwrite a prior terminal state (§4.10) — each is expressed as a CAS
//! against the entity's current non-terminal statuses.

use docflow_domain::entities::file::FileProcessingStatus;
use docflow_domain::entities::gx::GxStatus;
use docflow_domain::entities::job::JobStatus;
use docflow_domain::entities::zip::ZipProcessingStatus;
use docflow_domain::error::DocFlowResult;
use docflow_domain::repositories::file_repository::FileRepository;
use docflow_domain::repositories::gx_repository::GxRepository;
use docflow_domain::repositories::job_repository::JobRepository;
use docflow_domain::repositories::zip_repository::ZipRepository;
use docflow_domain::services::queue_port::{QueuePort, QueueName};
use docflow_domain::value_objects::ids::{FileId, GxId, JobId, ZipId};
use std::sync::Arc;

const TERMINABLE_JOB_STATUSES: &[JobStatus] =
    &[JobStatus::PendingUpload, JobStatus::UploadComplete, JobStatus::Queued, JobStatus::Processing];

const TERMINABLE_ZIP_STATUSES: &[ZipProcessingStatus] =
    &[ZipProcessingStatus::QueuedForExtraction, ZipProcessingStatus::ExtractionInProgress];

const TERMINABLE_FILE_STATUSES: &[FileProcessingStatus] = &[FileProcessingStatus::Queued, FileProcessingStatus::InProgress];

const TERMINABLE_GX_STATUSES: &[GxStatus] = &[GxStatus::QueuedForUpload];

pub struct LifecycleManager {
    jobs: Arc<dyn JobRepository>,
    zips: Arc<dyn ZipRepository>,
    files: Arc<dyn FileRepository>,
    gx: Arc<dyn GxRepository>,
    queue: Arc<dyn QueuePort>,
}

impl LifecycleManager {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        zips: Arc<dyn ZipRepository>,
        files: Arc<dyn FileRepository>,
        gx: Arc<dyn GxRepository>,
        queue: Arc<dyn QueuePort>,
    ) -> Self {
        Self { jobs, zips, files, gx, queue }
    }

    /// `terminateJob` (§4.10): no-op if the job is not in a terminable
    /// state, else cascades to every pending child.
    pub async fn terminate_job(&self, job_id: JobId) -> DocFlowResult<bool> {
        let Some(job) = self.jobs.find_by_id(job_id).await? else { return Ok(false) };
        if !job.status.is_terminable() {
            return Ok(false);
        }

        let ok = self
            .jobs
            .cas_status(job_id, TERMINABLE_JOB_STATUSES, JobStatus::Terminated, None, None)
            .await?;
        if !ok {
            return Ok(false);
        }

        self.zips
            .bulk_cas_status_for_jobs(&[job_id], TERMINABLE_ZIP_STATUSES, ZipProcessingStatus::Terminated)
            .await?;
        self.files
            .bulk_cas_status_for_jobs(&[job_id], TERMINABLE_FILE_STATUSES, FileProcessingStatus::Terminated)
            .await?;
        self.gx.bulk_cas_status_for_jobs(&[job_id], TERMINABLE_GX_STATUSES, GxStatus::Terminated).await?;

        Ok(true)
    }

    /// `terminateAllActiveJobs` (§4.10): one bulk update per entity table
    /// plus a queue purge, returning the number of jobs terminated.
    pub async fn terminate_all_active_jobs(&self) -> DocFlowResult<u64> {
        let terminated = self.jobs.bulk_cas_status(TERMINABLE_JOB_STATUSES, JobStatus::Terminated).await?;
        self.zips.bulk_cas_status(TERMINABLE_ZIP_STATUSES, ZipProcessingStatus::Terminated).await?;
        self.files.bulk_cas_status(TERMINABLE_FILE_STATUSES, FileProcessingStatus::Terminated).await?;
        self.gx.bulk_cas_status(TERMINABLE_GX_STATUSES, GxStatus::Terminated).await?;
        self.queue.purge_all(&[QueueName::Zip, QueueName::File]).await?;
        Ok(terminated)
    }

    /// Zip hit a terminal error (§4.6 step 7): fold the zip to
    /// `EXTRACTION_FAILED` and, unless the job is already terminal, fail
    /// the job with the same message.
    pub async fn fail_job_for_zip_extraction(&self, zip_id: ZipId, job_id: JobId, error: &str) -> DocFlowResult<()> {
        self.zips
            .cas_status(
                zip_id,
                &[ZipProcessingStatus::QueuedForExtraction, ZipProcessingStatus::ExtractionInProgress],
                ZipProcessingStatus::ExtractionFailed,
                Some(error),
            )
            .await?;
        self.fail_job_if_not_terminal(job_id, error).await
    }

    /// File processing hit a terminal error (§4.7 step 10): fold the file
    /// to `FAILED` and delegate job-level failure the same way.
    pub async fn fail_job_for_file_processing(&self, file_id: FileId, job_id: JobId, error: &str) -> DocFlowResult<()> {
        self.files
            .cas_status(
                file_id,
                &[FileProcessingStatus::Queued, FileProcessingStatus::InProgress],
                FileProcessingStatus::Failed,
                Some(error),
            )
            .await?;
        self.fail_job_if_not_terminal(job_id, error).await
    }

    /// `failGxMasterUpload` (§4.10): a Gx artifact upload failed. Sets
    /// `Gx=ERROR`; never touches the Job (a Gx failure is folded into the
    /// job's outcome later by the lifecycle scheduler, via
    /// `reconcile`'s "errored Gx counts its File as failed" rule).
    pub async fn fail_gx_master_upload(&self, gx_id: GxId, error: &str) -> DocFlowResult<()> {
        self.gx
            .cas_status(
                gx_id,
                &[GxStatus::QueuedForUpload, GxStatus::Reading, GxStatus::Processing, GxStatus::Queued],
                GxStatus::Error,
                None,
                Some(error),
            )
            .await?;
        Ok(())
    }

    async fn fail_job_if_not_terminal(&self, job_id: JobId, error: &str) -> DocFlowResult<()> {
        let Some(job) = self.jobs.find_by_id(job_id).await? else { return Ok(()) };
        if job.status.is_terminal() {
            return Ok(());
        }
        // `is_terminal` above ruled out the terminal set, so CAS against
        // the full terminable set catches whatever non-terminal status the
        // job is actually in, racing other writers safely either way.
        self.jobs.cas_status(job_id, TERMINABLE_JOB_STATUSES, JobStatus::Failed, Some(error), None).await?;
        Ok(())
    }

    /// `completeJob` (§4.11): guarded so a prior terminal state is never
    /// overwritten.
    pub async fn complete_job(&self, job_id: JobId) -> DocFlowResult<bool> {
        self.jobs
            .cas_status(
                job_id,
                &[JobStatus::Queued, JobStatus::Processing, JobStatus::UploadComplete],
                JobStatus::Completed,
                None,
                None,
            )
            .await
    }

    pub async fn partially_complete_job(&self, job_id: JobId, remark: &str) -> DocFlowResult<bool> {
        self.jobs
            .cas_status(
                job_id,
                &[JobStatus::Queued, JobStatus::Processing, JobStatus::UploadComplete],
                JobStatus::PartialSuccess,
                None,
                Some(remark),
            )
            .await
    }

    pub async fn fail_job(&self, job_id: JobId, reason: &str) -> DocFlowResult<bool> {
        self.jobs
            .cas_status(
                job_id,
                &[JobStatus::Queued, JobStatus::Processing, JobStatus::UploadComplete],
                JobStatus::Failed,
                Some(reason),
                None,
            )
            .await
    }
}
