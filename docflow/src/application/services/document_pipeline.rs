// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Document Pipeline (C7)
//!
//! Consumes `{fileMasterId}` off the file queue (§4.7). The single most
//! branchy consumer in the system: direct uploads still need hashing and
//! dedup here (the same flow C6 already ran for zip children), handler
//! output shape decides between in-place update, PDF split, and
//! container extraction, and every exit path funnels through the lifecycle
//! manager on failure.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use docflow_domain::entities::file::{FileMaster, FileProcessingStatus, FileSourceType};
use docflow_domain::entities::gx::{GxMaster, GxStatus};
use docflow_domain::entities::job::JobStatus;
use docflow_domain::error::{DocFlowError, DocFlowResult};
use docflow_domain::repositories::file_repository::FileRepository;
use docflow_domain::repositories::gx_repository::GxRepository;
use docflow_domain::repositories::job_repository::JobRepository;
use docflow_domain::services::file_handler_port::HandlerItem;
use docflow_domain::services::queue_port::{QueueName, QueuePort};
use docflow_domain::services::storage_port::StoragePort;
use docflow_domain::services::upload_action::UploadAction;
use docflow_domain::value_objects::content_hash::ContentHash;
use docflow_domain::value_objects::ids::{FileId, GxId, ZipId};
use docflow_domain::value_objects::object_key::ObjectKey;
use futures::TryStreamExt;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::infrastructure::services::FileHandlerRegistry;

use super::artifact_uploader::ArtifactUploader;
use super::lifecycle_manager::LifecycleManager;

pub struct DocumentPipelineService {
    files: Arc<dyn FileRepository>,
    jobs: Arc<dyn JobRepository>,
    gx: Arc<dyn GxRepository>,
    storage: Arc<dyn StoragePort>,
    queue: Arc<dyn QueuePort>,
    handlers: Arc<FileHandlerRegistry>,
    uploader: Arc<ArtifactUploader>,
    lifecycle: Arc<LifecycleManager>,
}

impl DocumentPipelineService {
    pub fn new(
        files: Arc<dyn FileRepository>,
        jobs: Arc<dyn JobRepository>,
        gx: Arc<dyn GxRepository>,
        storage: Arc<dyn StoragePort>,
        queue: Arc<dyn QueuePort>,
        handlers: Arc<FileHandlerRegistry>,
        uploader: Arc<ArtifactUploader>,
        lifecycle: Arc<LifecycleManager>,
    ) -> Self {
        Self { files, jobs, gx, storage, queue, handlers, uploader, lifecycle }
    }

    pub async fn handle_message(&self, file_id: FileId) -> DocFlowResult<()> {
        let acquired = self.files.acquire_lock(file_id).await?;
        if !acquired {
            return Ok(());
        }

        match self.process_locked_file(file_id).await {
            Ok(()) => {
                self.uploader.run_pending().await;
                Ok(())
            }
            Err(err @ (DocFlowError::TerminalFile(_) | DocFlowError::Validation(_))) => {
                if let Some(file) = self.files.find_by_id(file_id).await? {
                    self.lifecycle.fail_job_for_file_processing(file_id, file.processing_job_id, &err.to_string()).await?;
                }
                self.uploader.run_pending().await;
                Ok(())
            }
            Err(err) => {
                if let Some(file) = self.files.find_by_id(file_id).await? {
                    self.lifecycle.fail_job_for_file_processing(file_id, file.processing_job_id, &err.to_string()).await?;
                }
                error!(%file_id, error = %err, "document pipeline failed transiently, will redeliver");
                Err(err)
            }
        }
    }

    async fn process_locked_file(&self, file_id: FileId) -> DocFlowResult<()> {
        let file = self.files.find_by_id(file_id).await?.ok_or_else(|| DocFlowError::NotFound(format!("file {file_id}")))?;

        let job = self.jobs.find_by_id(file.processing_job_id).await?;
        if job.as_ref().map(|j| j.status) == Some(JobStatus::Terminated) {
            self.files
                .cas_status(file_id, &[FileProcessingStatus::InProgress], FileProcessingStatus::Terminated, None)
                .await?;
            return Ok(());
        }

        let file = match file.file_hash.clone() {
            None => match self.hash_and_dedup(file).await? {
                Some(hashed) => hashed,
                None => return Ok(()),
            },
            Some(_) => file,
        };

        let key = ObjectKey::from(file.file_location.clone());
        let content = self.download_fully(&key).await?;

        let Some(extension) = file.extension.clone() else {
            self.files
                .cas_status(file_id, &[FileProcessingStatus::InProgress], FileProcessingStatus::Ignored, Some("no file extension"))
                .await?;
            return Ok(());
        };

        let handler = self.handlers.resolve(&extension);
        let items = handler.handle(content.clone()).await.map_err(|err| DocFlowError::TerminalFile(err.to_string()))?;

        self.dispatch_handler_output(&file, &extension, &key, content, items).await?;

        self.files
            .cas_status(file_id, &[FileProcessingStatus::InProgress], FileProcessingStatus::Completed, None)
            .await?;
        Ok(())
    }

    /// Direct-upload path (§4.7 step 4): stream-digest, then run the same
    /// validation/dedup flow C6 runs per zip entry.
    async fn hash_and_dedup(&self, file: FileMaster) -> DocFlowResult<Option<FileMaster>> {
        let key = ObjectKey::from(file.file_location.clone());
        let content = self.download_fully(&key).await?;
        let hash = ContentHash::of_bytes(&content);

        if let Some(winner) = self.files.find_winner(file.gx_bucket_id, &hash).await? {
            self.files
                .cas_status(file.id, &[FileProcessingStatus::InProgress], FileProcessingStatus::Duplicate, None)
                .await?;
            let mut duplicate = file;
            duplicate.duplicate_of_file_id = Some(winner.id);
            duplicate.file_processing_status = FileProcessingStatus::Duplicate;
            self.files.update_after_hashing(&duplicate).await?;
            return Ok(None);
        }

        let mut hashed = file;
        hashed.file_hash = Some(hash.clone());
        hashed.original_content_hash = Some(hash);
        hashed.file_size = content.len() as u64;
        let updated = self.files.update_after_hashing(&hashed).await?;
        if !updated {
            // Lost the race after the winner check above; recover the
            // same way C6 does on a unique-violation.
            if let Some(winner) = self.files.find_winner(hashed.gx_bucket_id, hashed.file_hash.as_ref().unwrap()).await? {
                hashed.duplicate_of_file_id = Some(winner.id);
                hashed.file_processing_status = FileProcessingStatus::Duplicate;
                self.files.update_after_hashing(&hashed).await?;
                return Ok(None);
            }
        }
        Ok(Some(hashed))
    }

    async fn download_fully(&self, key: &ObjectKey) -> DocFlowResult<Bytes> {
        let mut stream = self.storage.download_stream(key).await?;
        let mut buffer = Vec::new();
        while let Some(chunk) = stream.try_next().await? {
            buffer.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(buffer))
    }

    /// Interprets the handler's output per §4.7 step 7.
    async fn dispatch_handler_output(
        &self,
        file: &FileMaster,
        extension: &str,
        source_key: &ObjectKey,
        source_content: Bytes,
        items: Vec<HandlerItem>,
    ) -> DocFlowResult<()> {
        match items.as_slice() {
            [] => {
                let dest = ObjectKey::files(Some(file.gx_bucket_id), file.processing_job_id, &file.file_name);
                self.storage.copy(source_key, &dest).await?;
                self.create_or_replace_gx(file, &dest, &file.file_name, source_content.len() as u64, Some(extension.to_string()))
                    .await
            }
            [single] if single.filename == file.file_name => {
                let dest = ObjectKey::files(Some(file.gx_bucket_id), file.processing_job_id, &single.filename);
                self.upload_gx_artifact(file, &dest, &single.filename, single.content.clone(), Some(extension.to_string())).await
            }
            _ if extension == "pdf" => {
                for item in items {
                    let dest = ObjectKey::files(Some(file.gx_bucket_id), file.processing_job_id, &item.filename);
                    self.upload_gx_artifact(file, &dest, &item.filename, item.content.clone(), Some("pdf".to_string())).await?;
                }
                Ok(())
            }
            _ => {
                for item in items {
                    self.enqueue_extracted_child(file, item).await?;
                }
                Ok(())
            }
        }
    }

    async fn create_or_replace_gx(
        &self,
        file: &FileMaster,
        dest: &ObjectKey,
        processed_name: &str,
        size: u64,
        extension: Option<String>,
    ) -> DocFlowResult<()> {
        let now = Utc::now();
        let existing = self.gx.find_by_source_file_id(file.id).await?;
        let gx = if let Some(mut existing) = existing.into_iter().next() {
            existing.file_location = dest.as_str().to_string();
            existing.processed_file_name = processed_name.to_string();
            existing.file_size = size;
            existing.extension = extension;
            existing.updated_at = now;
            self.gx.update_after_upload(&existing).await?;
            existing
        } else {
            let gx = GxMaster::new_queued_for_upload(GxId::new(0), file.id, file.gx_bucket_id, dest.as_str(), processed_name, size, extension, now);
            self.gx.insert(gx).await?
        };
        // The copy case is synchronous and server-side: the row is already
        // `QUEUED_FOR_UPLOAD`, so nothing further to schedule.
        let _ = gx.id;
        Ok(())
    }

    async fn upload_gx_artifact(
        &self,
        file: &FileMaster,
        dest: &ObjectKey,
        processed_name: &str,
        content: Bytes,
        extension: Option<String>,
    ) -> DocFlowResult<()> {
        let now = Utc::now();
        let gx = GxMaster::new_queued_for_upload(
            GxId::new(0),
            file.id,
            file.gx_bucket_id,
            dest.as_str(),
            processed_name,
            content.len() as u64,
            extension,
            now,
        );
        let gx = self.gx.insert(gx).await?;

        let action: Arc<dyn UploadAction> = Arc::new(GxUploadAction { gx: self.gx.clone(), gx_id: gx.id });
        self.uploader.schedule_upload_after_commit(dest.clone(), content, action).await;
        Ok(())
    }

    async fn enqueue_extracted_child(&self, file: &FileMaster, item: HandlerItem) -> DocFlowResult<()> {
        let now = Utc::now();
        let dest = ObjectKey::files(Some(file.gx_bucket_id), file.processing_job_id, &item.filename);
        let extension = item.filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
        let hash = ContentHash::of_bytes(&item.content);

        let mut child = FileMaster::new_extracted(
            FileId::new(0),
            file.processing_job_id,
            file.zip_master_id.unwrap_or_else(|| ZipId::new(0)),
            file.gx_bucket_id,
            dest.as_str(),
            &item.filename,
            item.content.len() as u64,
            extension,
            hash,
            now,
        );
        child.source_type = FileSourceType::Extracted;
        child.zip_master_id = file.zip_master_id;

        let created = match self.files.attempt_to_create(child.clone()).await {
            Ok(created) => created,
            Err(DocFlowError::Duplicate) => {
                if let Some(winner) = self.files.find_winner(file.gx_bucket_id, child.file_hash.as_ref().unwrap()).await? {
                    child.duplicate_of_file_id = Some(winner.id);
                    child.file_processing_status = FileProcessingStatus::Duplicate;
                    self.files.attempt_to_create(child).await.ok();
                }
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        self.storage.upload(&dest, item.content).await?;

        let payload = serde_json::json!({ "fileMasterId": created.id.get() }).to_string();
        let dedup_id = format!("file-master-{}-{}", created.id, Uuid::new_v4());
        self.queue.send(QueueName::File, &payload, &file.gx_bucket_id.to_string(), &dedup_id).await
    }
}

/// `UploadAction` for one `GxMaster` row (§4.8): the post-commit hook that
/// set `gxStatus=QUEUED_FOR_UPLOAD`/`ERROR` independently of the parent
/// File's own status.
struct GxUploadAction {
    gx: Arc<dyn GxRepository>,
    gx_id: GxId,
}

#[async_trait]
impl UploadAction for GxUploadAction {
    async fn on_success(&self) -> DocFlowResult<()> {
        self.gx
            .cas_status(self.gx_id, &[GxStatus::QueuedForUpload], GxStatus::QueuedForUpload, None, None)
            .await?;
        Ok(())
    }

    async fn on_failure(&self, error_message: &str) -> DocFlowResult<()> {
        warn!(gx_id = %self.gx_id, error = error_message, "gx artifact upload failed");
        self.gx
            .cas_status(self.gx_id, &[GxStatus::QueuedForUpload], GxStatus::Error, None, Some(error_message))
            .await?;
        Ok(())
    }
}
