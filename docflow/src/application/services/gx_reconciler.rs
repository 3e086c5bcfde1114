// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # GX Status Poller, Stale Sweeper, Retry (C12)
//!
//! Three independent cron-driven jobs plus the user-facing `retry` action,
//! all grouped here since they share the same repositories and fixed
//! reason strings (§4.12).

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use docflow_domain::entities::file::FileProcessingStatus;
use docflow_domain::entities::gx::GxStatus;
use docflow_domain::entities::job::JobStatus;
use docflow_domain::error::{DocFlowError, DocFlowResult};
use docflow_domain::repositories::file_repository::FileRepository;
use docflow_domain::repositories::gx_repository::GxRepository;
use docflow_domain::repositories::job_repository::JobRepository;
use docflow_domain::services::gx_client_port::GxClientPort;
use docflow_domain::services::queue_port::{file_queue_group_id, QueueName, QueuePort};
use docflow_domain::value_objects::ids::{FileId, GxId};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const STALE_UPLOAD_REASON: &str = "Upload never completed within the configured time window";

/// Statuses the poller watches, in the finality order GX reports progress
/// by (§4.12): complete, errors, cancelled, processing.
const POLLED_GX_STATUSES: &[GxStatus] = &[GxStatus::Queued, GxStatus::Processing];

pub struct GxStatusPoller {
    gx: Arc<dyn GxRepository>,
    client: Arc<dyn GxClientPort>,
}

impl GxStatusPoller {
    pub fn new(gx: Arc<dyn GxRepository>, client: Arc<dyn GxClientPort>) -> Self {
        Self { gx, client }
    }

    pub async fn run_once(&self) -> DocFlowResult<()> {
        let rows = self.gx.find_by_statuses(POLLED_GX_STATUSES).await?;
        for row in rows {
            if let Err(err) = self.poll_one(row.id, &row.gx_process_id).await {
                warn!(gx_id = %row.id, error = %err, "gx status poll failed, will retry next run");
                self.gx
                    .cas_status(row.id, POLLED_GX_STATUSES, GxStatus::Error, None, Some(&err.to_string()))
                    .await?;
            }
        }
        Ok(())
    }

    async fn poll_one(&self, gx_id: GxId, gx_process_id: &str) -> DocFlowResult<()> {
        let status = self.client.ingest_status(gx_process_id).await?;
        let Some(new_status) = GxStatus::parse_from_gx(&status.raw_status) else {
            warn!(%gx_id, raw = %status.raw_status, "unrecognized gx status, leaving row untouched");
            return Ok(());
        };
        self.gx
            .cas_status(gx_id, POLLED_GX_STATUSES, new_status, None, status.status_message.as_deref())
            .await?;
        Ok(())
    }
}

pub struct StaleJobSweeper {
    jobs: Arc<dyn JobRepository>,
    stale_threshold: ChronoDuration,
}

impl StaleJobSweeper {
    pub fn new(jobs: Arc<dyn JobRepository>, stale_threshold_hours: i64) -> Self {
        Self { jobs, stale_threshold: ChronoDuration::hours(stale_threshold_hours) }
    }

    pub async fn run_once(&self) -> DocFlowResult<()> {
        self.run_once_at(Utc::now()).await
    }

    async fn run_once_at(&self, now: DateTime<Utc>) -> DocFlowResult<()> {
        let cutoff = now - self.stale_threshold;
        let stale = self.jobs.find_stale_pending_uploads(cutoff).await?;
        for job in stale {
            let changed = self
                .jobs
                .cas_status(job.id, &[JobStatus::PendingUpload], JobStatus::Failed, Some(STALE_UPLOAD_REASON), None)
                .await?;
            if changed {
                info!(job_id = %job.id, "stale pending upload failed");
            }
        }
        Ok(())
    }
}

pub struct RetryService {
    jobs: Arc<dyn JobRepository>,
    files: Arc<dyn FileRepository>,
    gx: Arc<dyn GxRepository>,
    queue: Arc<dyn QueuePort>,
}

impl RetryService {
    pub fn new(jobs: Arc<dyn JobRepository>, files: Arc<dyn FileRepository>, gx: Arc<dyn GxRepository>, queue: Arc<dyn QueuePort>) -> Self {
        Self { jobs, files, gx, queue }
    }

    /// `retry({fileMasterId})` (§4.12): requires File=FAILED and Job not
    /// terminal. Never mutates Job.status.
    pub async fn retry_file(&self, file_id: FileId) -> DocFlowResult<()> {
        let file = self
            .files
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| DocFlowError::NotFound(format!("file master {file_id}")))?;
        let job = self
            .jobs
            .find_by_id(file.processing_job_id)
            .await?
            .ok_or_else(|| DocFlowError::NotFound(format!("job {}", file.processing_job_id)))?;
        if job.status.is_terminal() {
            return Err(DocFlowError::Conflict("job is already terminal".to_string()));
        }

        let changed = self
            .files
            .cas_status(file_id, &[FileProcessingStatus::Failed], FileProcessingStatus::Queued, None)
            .await?;
        if !changed {
            return Err(DocFlowError::Conflict("file is not in a retryable state".to_string()));
        }

        let payload = serde_json::json!({ "fileMasterId": file_id.get() }).to_string();
        let group_id = file_queue_group_id(file.gx_bucket_id);
        let dedup_id = format!("file-master-{}-{}", file_id.get(), Uuid::new_v4());
        self.queue.send(QueueName::File, &payload, &group_id, &dedup_id).await
    }

    /// `retry({gxMasterId})`: requires Gx=ERROR and Job not terminal. Sets
    /// Gx back to `QUEUED_FOR_UPLOAD` for the poller to pick up; no
    /// re-enqueue since the poller, not the queue, drives Gx status.
    pub async fn retry_gx(&self, gx_id: GxId) -> DocFlowResult<()> {
        let gx = self
            .gx
            .find_by_id(gx_id)
            .await?
            .ok_or_else(|| DocFlowError::NotFound(format!("gx master {gx_id}")))?;
        let file = self
            .files
            .find_by_id(gx.source_file_id)
            .await?
            .ok_or_else(|| DocFlowError::NotFound(format!("file master {}", gx.source_file_id)))?;
        let job = self
            .jobs
            .find_by_id(file.processing_job_id)
            .await?
            .ok_or_else(|| DocFlowError::NotFound(format!("job {}", file.processing_job_id)))?;
        if job.status.is_terminal() {
            return Err(DocFlowError::Conflict("job is already terminal".to_string()));
        }

        let changed = self.gx.cas_status(gx_id, &[GxStatus::Error], GxStatus::QueuedForUpload, None, None).await?;
        if !changed {
            return Err(DocFlowError::Conflict("gx artifact is not in a retryable state".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docflow_domain::entities::job::ProcessingJob;
    use docflow_domain::value_objects::ids::JobId;
    use std::sync::Mutex;

    struct FakeJobRepo {
        jobs: Mutex<Vec<ProcessingJob>>,
    }

    #[async_trait]
    impl JobRepository for FakeJobRepo {
        async fn insert(&self, job: ProcessingJob) -> DocFlowResult<ProcessingJob> {
            Ok(job)
        }
        async fn find_by_id(&self, id: JobId) -> DocFlowResult<Option<ProcessingJob>> {
            Ok(self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned())
        }
        async fn update(&self, _job: &ProcessingJob) -> DocFlowResult<()> {
            Ok(())
        }
        async fn cas_status(
            &self,
            id: JobId,
            expected: &[JobStatus],
            new_status: JobStatus,
            error_message: Option<&str>,
            _remark: Option<&str>,
        ) -> DocFlowResult<bool> {
            let mut jobs = self.jobs.lock().unwrap();
            if let Some(job) = jobs.iter_mut().find(|j| j.id == id) {
                if expected.contains(&job.status) {
                    job.status = new_status;
                    job.error_message = error_message.map(str::to_string);
                    return Ok(true);
                }
            }
            Ok(false)
        }
        async fn bulk_cas_status(&self, _expected: &[JobStatus], _new_status: JobStatus) -> DocFlowResult<u64> {
            Ok(0)
        }
        async fn find_by_statuses(&self, _statuses: &[JobStatus]) -> DocFlowResult<Vec<ProcessingJob>> {
            Ok(vec![])
        }
        async fn find_stale_pending_uploads(&self, older_than: DateTime<Utc>) -> DocFlowResult<Vec<ProcessingJob>> {
            Ok(self
                .jobs
                .lock()
                .unwrap()
                .iter()
                .filter(|j| j.status == JobStatus::PendingUpload && j.created_at < older_than)
                .cloned()
                .collect())
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(0, 0).unwrap()
    }

    #[tokio::test]
    async fn stale_sweeper_fails_old_pending_uploads_only() {
        let old_job = ProcessingJob::new_pending(JobId::new(1), "a.pdf", "x", None, false, now());
        let fresh_job = ProcessingJob::new_pending(JobId::new(2), "b.pdf", "y", None, false, Utc::now());
        let repo = Arc::new(FakeJobRepo { jobs: Mutex::new(vec![old_job, fresh_job]) });
        let sweeper = StaleJobSweeper::new(repo.clone(), 24);

        sweeper.run_once_at(Utc::now()).await.unwrap();

        let jobs = repo.jobs.lock().unwrap();
        assert_eq!(jobs[0].status, JobStatus::Failed);
        assert_eq!(jobs[0].error_message.as_deref(), Some(STALE_UPLOAD_REASON));
        assert_eq!(jobs[1].status, JobStatus::PendingUpload);
    }
}
