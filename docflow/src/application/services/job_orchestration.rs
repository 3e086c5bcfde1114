// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Job Orchestration (C9)
//!
//! The API-facing half of the pipeline: create a job and hand the client a
//! presigned URL (direct or multipart), then route it to the zip or file
//! queue once the upload completes.

use chrono::Utc;
use docflow_domain::entities::file::FileMaster;
use docflow_domain::entities::job::{JobStatus, ProcessingJob};
use docflow_domain::entities::zip::ZipMaster;
use docflow_domain::error::{DocFlowError, DocFlowResult};
use docflow_domain::repositories::file_repository::FileRepository;
use docflow_domain::repositories::job_repository::JobRepository;
use docflow_domain::repositories::zip_repository::ZipRepository;
use docflow_domain::services::queue_port::{zip_queue_group_id, QueueName, QueuePort};
use docflow_domain::services::storage_port::{CompletedPart, StoragePort};
use docflow_domain::value_objects::ids::{FileId, GxBucketId, JobId, ZipId};
use docflow_domain::value_objects::object_key::ObjectKey;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

pub struct CreatedUpload {
    pub job_id: JobId,
    pub upload_url: String,
}

pub struct CreatedMultipartUpload {
    pub job_id: JobId,
    pub upload_id: String,
}

pub struct JobOrchestrationService {
    jobs: Arc<dyn JobRepository>,
    zips: Arc<dyn ZipRepository>,
    files: Arc<dyn FileRepository>,
    storage: Arc<dyn StoragePort>,
    queue: Arc<dyn QueuePort>,
    presign_ttl: Duration,
}

impl JobOrchestrationService {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        zips: Arc<dyn ZipRepository>,
        files: Arc<dyn FileRepository>,
        storage: Arc<dyn StoragePort>,
        queue: Arc<dyn QueuePort>,
        presign_ttl: Duration,
    ) -> Self {
        Self { jobs, zips, files, storage, queue, presign_ttl }
    }

    /// `createJobAndPresignedUrl` (§4.9): insert the job with a placeholder
    /// location to obtain an id, then compute and persist the real
    /// `source` key before presigning.
    pub async fn create_job_and_presigned_url(
        &self,
        file_name: &str,
        gx_bucket_id: Option<GxBucketId>,
        skip_gx_process: bool,
    ) -> DocFlowResult<CreatedUpload> {
        let (job, key) = self.insert_pending_job(file_name, gx_bucket_id, skip_gx_process).await?;
        let upload_url = self.storage.presign_upload(&key, self.presign_ttl).await?;
        Ok(CreatedUpload { job_id: job.id, upload_url })
    }

    /// `createJobAndInitiateMultipartUpload` (§4.9).
    pub async fn create_job_and_initiate_multipart_upload(
        &self,
        file_name: &str,
        gx_bucket_id: Option<GxBucketId>,
        skip_gx_process: bool,
    ) -> DocFlowResult<CreatedMultipartUpload> {
        let (job, key) = self.insert_pending_job(file_name, gx_bucket_id, skip_gx_process).await?;
        let upload_id = self.storage.initiate_multipart(&key).await?;
        Ok(CreatedMultipartUpload { job_id: job.id, upload_id })
    }

    async fn insert_pending_job(
        &self,
        file_name: &str,
        gx_bucket_id: Option<GxBucketId>,
        skip_gx_process: bool,
    ) -> DocFlowResult<(ProcessingJob, ObjectKey)> {
        let now = Utc::now();
        let placeholder = ProcessingJob::new_pending(JobId::new(0), file_name, "", gx_bucket_id, skip_gx_process, now);
        let inserted = self.jobs.insert(placeholder).await?;

        let key = ObjectKey::source(gx_bucket_id, inserted.id, file_name);
        let job = ProcessingJob { file_location: key.as_str().to_string(), ..inserted };
        self.jobs.update(&job).await?;
        Ok((job, key))
    }

    /// `presignPart` (§4.9): `partNumber` must be in `[1, 10000]`.
    pub async fn presign_part(&self, job_id: JobId, part_number: u32, upload_id: &str) -> DocFlowResult<String> {
        if !(1..=10_000).contains(&part_number) {
            return Err(DocFlowError::Validation(format!("partNumber {part_number} out of range [1, 10000]")));
        }
        let job = self.require_job(job_id).await?;
        let key = ObjectKey::from(job.file_location);
        self.storage.presign_part(&key, upload_id, part_number, self.presign_ttl).await
    }

    pub async fn complete_multipart_upload(
        &self,
        job_id: JobId,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> DocFlowResult<()> {
        let job = self.require_job(job_id).await?;
        let key = ObjectKey::from(job.file_location);
        self.storage.complete_multipart(&key, upload_id, parts).await
    }

    /// `triggerProcessing` (§4.9): routes to the zip or file pipeline by
    /// extension, ensures the relevant child row exists idempotently, and
    /// enqueues it only after the Job's own status transition commits.
    pub async fn trigger_processing(&self, job_id: JobId) -> DocFlowResult<()> {
        let job = self.require_job(job_id).await?;
        if !matches!(job.status, JobStatus::PendingUpload | JobStatus::UploadComplete) {
            return Err(DocFlowError::Conflict(format!("job {job_id} is not awaiting trigger (status={})", job.status)));
        }

        if job.routes_to_zip_pipeline() {
            if job.is_bulk() && extension_of(&job.original_filename).as_deref() != Some("zip") {
                self.jobs
                    .cas_status(
                        job_id,
                        &[JobStatus::PendingUpload, JobStatus::UploadComplete],
                        JobStatus::Failed,
                        Some("Bulk uploads must be a .zip archive"),
                        None,
                    )
                    .await?;
                return Err(DocFlowError::Validation("bulk job's source file is not a .zip archive".to_string()));
            }
            self.route_to_zip(&job).await?;
        } else {
            self.route_to_file(&job).await?;
        }

        self.jobs
            .cas_status(job_id, &[JobStatus::PendingUpload, JobStatus::UploadComplete], JobStatus::Queued, None, None)
            .await?;
        Ok(())
    }

    async fn route_to_zip(&self, job: &ProcessingJob) -> DocFlowResult<()> {
        let now = Utc::now();
        let zip = ZipMaster::new_queued(
            ZipId::new(0),
            job.id,
            job.gx_bucket_id,
            &job.file_location,
            &job.original_filename,
            0,
            now,
        );
        let zip = self.zips.upsert_for_job(zip).await?;
        let payload = serde_json::json!({ "zipMasterId": zip.id.get() }).to_string();
        self.queue
            .send(QueueName::Zip, &payload, &zip_queue_group_id(job.id), &format!("zip-master-{}", zip.id))
            .await
    }

    async fn route_to_file(&self, job: &ProcessingJob) -> DocFlowResult<()> {
        let existing = self.files.find_by_job_id(job.id).await?;
        let file = if let Some(existing) = existing.into_iter().next() {
            existing
        } else {
            let bucket = job.gx_bucket_id.unwrap_or_else(|| GxBucketId::new(0));
            let now = Utc::now();
            let new_file = FileMaster::new_uploaded(
                FileId::new(0),
                job.id,
                bucket,
                &job.file_location,
                &job.original_filename,
                0,
                extension_of(&job.original_filename),
                now,
            );
            self.files.attempt_to_create(new_file).await?
        };

        let payload = serde_json::json!({ "fileMasterId": file.id.get() }).to_string();
        let group_id = file.gx_bucket_id.to_string();
        let dedup_id = format!("file-master-{}-{}", file.id, Uuid::new_v4());
        self.queue.send(QueueName::File, &payload, &group_id, &dedup_id).await
    }

    async fn require_job(&self, job_id: JobId) -> DocFlowResult<ProcessingJob> {
        self.jobs.find_by_id(job_id).await?.ok_or_else(|| DocFlowError::NotFound(format!("job {job_id}")))
    }
}
