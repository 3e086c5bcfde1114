// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Lifecycle Scheduler (C11)
//!
//! Runs on `scheduler.jobCompletionCron` (§4.11). All the actual decision
//! logic lives in [`docflow_domain::aggregates::job_aggregate::reconcile`];
//! this service is the I/O shell that gathers each job's children, calls
//! it, and applies the result through the lifecycle manager.

use docflow_domain::aggregates::job_aggregate::{reconcile, FileOutcomeInput, JobReconciliation};
use docflow_domain::entities::gx::GxStatus;
use docflow_domain::entities::job::{JobStatus, ProcessingJob};
use docflow_domain::error::DocFlowResult;
use docflow_domain::repositories::file_repository::FileRepository;
use docflow_domain::repositories::gx_repository::GxRepository;
use docflow_domain::repositories::job_repository::JobRepository;
use docflow_domain::repositories::zip_repository::ZipRepository;
use std::sync::Arc;
use tracing::{info, warn};

use super::lifecycle_manager::LifecycleManager;

const ACTIVE_JOB_STATUSES: &[JobStatus] = &[JobStatus::Queued, JobStatus::Processing, JobStatus::UploadComplete];

pub struct LifecycleScheduler {
    jobs: Arc<dyn JobRepository>,
    zips: Arc<dyn ZipRepository>,
    files: Arc<dyn FileRepository>,
    gx: Arc<dyn GxRepository>,
    lifecycle: Arc<LifecycleManager>,
}

impl LifecycleScheduler {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        zips: Arc<dyn ZipRepository>,
        files: Arc<dyn FileRepository>,
        gx: Arc<dyn GxRepository>,
        lifecycle: Arc<LifecycleManager>,
    ) -> Self {
        Self { jobs, zips, files, gx, lifecycle }
    }

    /// One reconciliation pass over every active job. Errors reconciling
    /// one job are logged and do not abort the rest of the batch.
    pub async fn run_once(&self) -> DocFlowResult<()> {
        let jobs = self.jobs.find_by_statuses(ACTIVE_JOB_STATUSES).await?;
        for job in jobs {
            if let Err(err) = self.reconcile_job(&job).await {
                warn!(job_id = %job.id, error = %err, "job reconciliation failed, retrying next run");
            }
        }
        Ok(())
    }

    async fn reconcile_job(&self, job: &ProcessingJob) -> DocFlowResult<()> {
        let zips = self.zips.find_by_job_ids(&[job.id]).await?;
        let files = self.files.find_by_job_ids(&[job.id]).await?;
        let gx_rows = self.gx.find_by_job_ids(&[job.id]).await?;

        let zip_statuses: Vec<_> = zips.iter().map(|z| z.zip_processing_status).collect();
        let zip_failure_message = zips.iter().find(|z| z.zip_processing_status.is_terminal()).and_then(|z| z.error_message.as_deref());
        let gx_statuses: Vec<GxStatus> = gx_rows.iter().map(|g| g.gx_status).collect();

        let mut first_failure_message = None;
        let file_inputs: Vec<FileOutcomeInput> = files
            .iter()
            .map(|file| {
                let has_errored_gx = gx_rows.iter().any(|g| g.source_file_id == file.id && g.gx_status == GxStatus::Error);
                if first_failure_message.is_none() && (file.file_processing_status == docflow_domain::entities::file::FileProcessingStatus::Failed || has_errored_gx) {
                    first_failure_message = file.error_message.clone();
                }
                FileOutcomeInput { status: file.file_processing_status, has_errored_gx }
            })
            .collect();

        let outcome = reconcile(&zip_statuses, &file_inputs, &gx_statuses, zip_failure_message, first_failure_message.as_deref());

        match outcome {
            JobReconciliation::Pending | JobReconciliation::AwaitingChildren => Ok(()),
            JobReconciliation::FailFromZip(message) => self.lifecycle.fail_job(job.id, &message).await.map(|_| ()),
            JobReconciliation::Completed => {
                self.lifecycle.complete_job(job.id).await?;
                info!(job_id = %job.id, "job completed");
                Ok(())
            }
            JobReconciliation::PartialSuccess { remark } => {
                self.lifecycle.partially_complete_job(job.id, &remark).await?;
                info!(job_id = %job.id, remark = %remark, "job partially succeeded");
                Ok(())
            }
            JobReconciliation::Failed { error_message } => {
                self.lifecycle.fail_job(job.id, &error_message).await?;
                info!(job_id = %job.id, error = %error_message, "job failed");
                Ok(())
            }
        }
    }
}
