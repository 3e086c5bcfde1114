// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ZIP Ingestion Service (C6)
//!
//! Consumes `{zipMasterId}` off the zip queue (§4.6). Per-entry work fans
//! out over a semaphore-bounded pool so one slow/huge entry never blocks
//! the rest of the archive.

use chrono::Utc;
use docflow_domain::entities::file::FileMaster;
use docflow_domain::entities::zip::{ZipMaster, ZipProcessingStatus};
use docflow_domain::error::{DocFlowError, DocFlowResult};
use docflow_domain::repositories::file_repository::FileRepository;
use docflow_domain::repositories::zip_repository::ZipRepository;
use docflow_domain::services::gx_client_port::GxClientPort;
use docflow_domain::services::queue_port::{QueueName, QueuePort};
use docflow_domain::services::storage_port::StoragePort;
use docflow_domain::services::validation::FileValidator;
use docflow_domain::value_objects::ids::{FileId, GxBucketId, ZipId};
use docflow_domain::value_objects::object_key::ObjectKey;
use docflow_domain::value_objects::zip_entry::ExtractedEntry;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::infrastructure::adapters::zip_stream::ZipStreamProcessor;

use super::lifecycle_manager::LifecycleManager;

/// Per-run cache mapping a bulk archive's first path segment to the GX
/// bucket id it resolves to, so `createGXBucket` is called at most once per
/// distinct name within a single zip (§4.6 step 5).
type BucketCache = Arc<Mutex<HashMap<String, GxBucketId>>>;

pub struct ZipIngestionService {
    zips: Arc<dyn ZipRepository>,
    files: Arc<dyn FileRepository>,
    storage: Arc<dyn StoragePort>,
    queue: Arc<dyn QueuePort>,
    gx_client: Arc<dyn GxClientPort>,
    lifecycle: Arc<LifecycleManager>,
    zip_stream: Arc<ZipStreamProcessor>,
    validator: Arc<FileValidator>,
    concurrency_limit: usize,
}

impl ZipIngestionService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        zips: Arc<dyn ZipRepository>,
        files: Arc<dyn FileRepository>,
        storage: Arc<dyn StoragePort>,
        queue: Arc<dyn QueuePort>,
        gx_client: Arc<dyn GxClientPort>,
        lifecycle: Arc<LifecycleManager>,
        zip_stream: Arc<ZipStreamProcessor>,
        validator: Arc<FileValidator>,
        concurrency_limit: usize,
    ) -> Self {
        Self { zips, files, storage, queue, gx_client, lifecycle, zip_stream, validator, concurrency_limit }
    }

    /// Handles one `{zipMasterId}` delivery. Returns `Ok(())` on clean exit
    /// (including the idempotent early returns); a `DocFlowError` whose
    /// `retryable()` is true should cause the caller to leave the message
    /// unacknowledged for broker redelivery (§4.6 step 7).
    pub async fn handle_message(&self, zip_id: ZipId) -> DocFlowResult<()> {
        let Some(zip) = self.zips.find_by_id(zip_id).await? else {
            warn!(%zip_id, "zip message references unknown ZipMaster, dropping");
            return Ok(());
        };
        if zip.zip_processing_status != ZipProcessingStatus::QueuedForExtraction {
            return Ok(());
        }

        let cased = self
            .zips
            .cas_status(
                zip_id,
                &[ZipProcessingStatus::QueuedForExtraction],
                ZipProcessingStatus::ExtractionInProgress,
                None,
            )
            .await?;
        if !cased {
            return Ok(());
        }

        match self.extract_and_dispatch(&zip).await {
            Ok(()) => {
                self.zips
                    .cas_status(zip_id, &[ZipProcessingStatus::ExtractionInProgress], ZipProcessingStatus::ExtractionSuccess, None)
                    .await?;
                Ok(())
            }
            Err(err @ (DocFlowError::TerminalZip(_) | DocFlowError::Validation(_))) => {
                self.lifecycle.fail_job_for_zip_extraction(zip_id, zip.processing_job_id, &err.to_string()).await?;
                Ok(())
            }
            Err(err) => {
                error!(%zip_id, error = %err, "zip extraction failed transiently, will redeliver");
                Err(err)
            }
        }
    }

    async fn extract_and_dispatch(&self, zip: &ZipMaster) -> DocFlowResult<()> {
        let source_key = ObjectKey::from(zip.original_file_path.clone());
        let download = self.storage.download_stream(&source_key).await?;
        let reader = tokio_util::io::StreamReader::new(futures::TryStreamExt::map_err(download, std::io::Error::other));
        let entries = self.zip_stream.extract(reader).await?;

        let bucket_cache: BucketCache = Arc::new(Mutex::new(HashMap::new()));
        let any_valid_bucket_entry = zip.gx_bucket_id.is_some() || entries.iter().any(|e| e.first_path_segment().is_some());

        futures::stream::iter(entries)
            .for_each_concurrent(Some(self.concurrency_limit.max(1)), |entry| {
                let bucket_cache = bucket_cache.clone();
                async move {
                    if let Err(err) = self.process_entry(zip, entry, &bucket_cache).await {
                        warn!(error = %err, "zip entry processing failed, isolated from the rest of the archive");
                    }
                }
            })
            .await;

        if zip.gx_bucket_id.is_none() && !any_valid_bucket_entry {
            return Err(DocFlowError::TerminalZip("Bulk ZIP has an invalid structure".to_string()));
        }
        Ok(())
    }

    async fn process_entry(&self, zip: &ZipMaster, entry: ExtractedEntry, bucket_cache: &BucketCache) -> DocFlowResult<()> {
        let guard = EntryTempFileGuard(entry.temp_file.clone());

        let bucket = match self.resolve_bucket(zip, &entry, bucket_cache).await? {
            Some(bucket) => bucket,
            None => return Ok(()),
        };

        let file_name = entry.file_name().to_string();
        let extension = entry.extension();

        if let Err(validation_error) = self.validator.validate_fully(&file_name, entry.size, extension.as_deref()) {
            self.persist_ignored(zip, bucket, &entry, &validation_error.to_string()).await?;
            return Ok(());
        }

        if let Some(winner) = self.files.find_winner(bucket, &entry.sha256).await? {
            self.persist_duplicate(zip, bucket, &entry, winner.id).await?;
            return Ok(());
        }

        let key = ObjectKey::files(Some(bucket), zip.processing_job_id, &file_name);
        let now = Utc::now();
        let new_file = FileMaster::new_extracted(
            FileId::new(0),
            zip.processing_job_id,
            zip.id,
            bucket,
            key.as_str(),
            &file_name,
            entry.size,
            extension,
            entry.sha256.clone(),
            now,
        );

        let created = match self.files.attempt_to_create(new_file).await {
            Ok(created) => created,
            Err(DocFlowError::Duplicate) => {
                let winner = self
                    .files
                    .find_winner(bucket, &entry.sha256)
                    .await?
                    .ok_or_else(|| DocFlowError::Database("unique violation but no winner found".to_string()))?;
                self.persist_duplicate(zip, bucket, &entry, winner.id).await?;
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let bytes = tokio::fs::read(&entry.temp_file).await.map_err(DocFlowError::from)?;
        drop(guard);
        self.storage.upload(&key, bytes.into()).await?;

        let payload = serde_json::json!({ "fileMasterId": created.id.get() }).to_string();
        let dedup_id = format!("{}-{}", bucket, entry.sha256.as_str());
        self.queue.send(QueueName::File, &payload, &bucket.to_string(), &dedup_id).await
    }

    async fn resolve_bucket(
        &self,
        zip: &ZipMaster,
        entry: &ExtractedEntry,
        bucket_cache: &BucketCache,
    ) -> DocFlowResult<Option<GxBucketId>> {
        if let Some(bucket) = zip.gx_bucket_id {
            return Ok(Some(bucket));
        }
        let Some(segment) = entry.first_path_segment() else { return Ok(None) };
        let name = segment.trim();
        if name.is_empty() || name.starts_with('.') {
            return Ok(None);
        }

        if let Some(bucket) = bucket_cache.lock().await.get(name) {
            return Ok(Some(*bucket));
        }
        let bucket = self.gx_client.create_gx_bucket(name).await?;
        bucket_cache.lock().await.insert(name.to_string(), bucket);
        Ok(Some(bucket))
    }

    async fn persist_ignored(
        &self,
        zip: &ZipMaster,
        bucket: GxBucketId,
        entry: &ExtractedEntry,
        reason: &str,
    ) -> DocFlowResult<()> {
        let now = Utc::now();
        let mut file = FileMaster::new_extracted(
            FileId::new(0),
            zip.processing_job_id,
            zip.id,
            bucket,
            ObjectKey::not_applicable().as_str(),
            entry.file_name(),
            entry.size,
            entry.extension(),
            entry.sha256.clone(),
            now,
        );
        file.file_processing_status = docflow_domain::entities::file::FileProcessingStatus::Ignored;
        file.error_message = Some(reason.to_string());
        self.files.attempt_to_create(file).await.map(|_| ()).or_else(|err| match err {
            DocFlowError::Duplicate => Ok(()),
            other => Err(other),
        })
    }

    async fn persist_duplicate(
        &self,
        zip: &ZipMaster,
        bucket: GxBucketId,
        entry: &ExtractedEntry,
        winner_id: FileId,
    ) -> DocFlowResult<()> {
        let now = Utc::now();
        let key = ObjectKey::files(Some(bucket), zip.processing_job_id, entry.file_name());
        let mut file = FileMaster::new_extracted(
            FileId::new(0),
            zip.processing_job_id,
            zip.id,
            bucket,
            key.as_str(),
            entry.file_name(),
            entry.size,
            entry.extension(),
            entry.sha256.clone(),
            now,
        );
        file.file_processing_status = docflow_domain::entities::file::FileProcessingStatus::Duplicate;
        file.duplicate_of_file_id = Some(winner_id);
        self.files.attempt_to_create(file).await.map(|_| ()).or_else(|err| match err {
            DocFlowError::Duplicate => Ok(()),
            other => Err(other),
        })
    }
}

/// Deletes the entry's temp file if it's still there when dropped — the
/// happy path removes it explicitly once uploaded, this is the safety net
/// for every early-return branch above (ignored, duplicate, validation
/// failure, upload error).
struct EntryTempFileGuard(std::path::PathBuf);

impl Drop for EntryTempFileGuard {
    fn drop(&mut self) {
        let path = self.0.clone();
        tokio::spawn(async move {
            let _ = tokio::fs::remove_file(&path).await;
        });
    }
}
