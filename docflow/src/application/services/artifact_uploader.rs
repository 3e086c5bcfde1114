// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Async Artifact Uploader (C8)
//!
//! `scheduleUploadAfterCommit` (§4.8) is modeled here as a queue of deferred
//! futures rather than a real database-transaction hook, since this crate
//! has no ORM-level commit callback to attach to. Callers push a closure
//! via [`ArtifactUploader::schedule`] once their own write has succeeded,
//! then call [`ArtifactUploader::run_pending`] immediately after — which is
//! the same ordering guarantee §4.8 asks for ("only after the surrounding
//! transaction commits"), just made explicit instead of implicit.

use bytes::Bytes;
use docflow_domain::error::DocFlowResult;
use docflow_domain::services::storage_port::StoragePort;
use docflow_domain::services::upload_action::UploadAction;
use docflow_domain::value_objects::object_key::ObjectKey;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

type PostCommitHook = BoxFuture<'static, ()>;

/// Queue of post-commit upload hooks. One instance is shared across a
/// consumer's lifetime; each unit of work schedules zero or more hooks and
/// drains them once its own write is durable.
#[derive(Default)]
pub struct PostCommitHooks {
    pending: Mutex<Vec<PostCommitHook>>,
}

impl PostCommitHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, hook: PostCommitHook) {
        self.pending.lock().await.push(hook);
    }

    /// Runs and clears every hook queued so far. Hooks run sequentially in
    /// enqueue order; a panicking hook would poison the batch, so hooks
    /// themselves must not panic (they only call fallible async code and
    /// log their own errors).
    pub async fn run_pending(&self) {
        let hooks = std::mem::take(&mut *self.pending.lock().await);
        for hook in hooks {
            hook.await;
        }
    }
}

/// Uploads bytes to object storage off the critical path of the triggering
/// write, then invokes the caller's [`UploadAction`] continuation.
pub struct ArtifactUploader {
    storage: Arc<dyn StoragePort>,
    hooks: Arc<PostCommitHooks>,
}

impl ArtifactUploader {
    pub fn new(storage: Arc<dyn StoragePort>, hooks: Arc<PostCommitHooks>) -> Self {
        Self { storage, hooks }
    }

    /// Registers a post-commit hook that uploads `bytes` to `key`, then
    /// calls `action.on_success()`/`on_failure(error)` in its own unit of
    /// work (§4.8). The hook itself never panics: storage and action
    /// errors are logged and swallowed, since by construction this runs
    /// after the caller has already returned.
    pub async fn schedule_upload_after_commit(
        &self,
        key: ObjectKey,
        bytes: Bytes,
        action: Arc<dyn UploadAction>,
    ) {
        let storage = self.storage.clone();
        self.hooks
            .push(Box::pin(async move {
                let result = storage.upload_async(&key, bytes).await;
                let outcome = match result {
                    Ok(()) => action.on_success().await,
                    Err(err) => action.on_failure(&err.to_string()).await,
                };
                if let Err(err) = outcome {
                    warn!(key = key.as_str(), error = %err, "post-commit upload action failed");
                }
            }))
            .await;
    }

    pub async fn run_pending(&self) {
        self.hooks.run_pending().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docflow_domain::services::storage_port::{ByteStream, CompletedPart};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct NullStorage {
        uploaded: Arc<AtomicBool>,
    }

    #[async_trait]
    impl StoragePort for NullStorage {
        async fn presign_upload(&self, _key: &ObjectKey, _ttl: Duration) -> DocFlowResult<String> {
            unimplemented!()
        }
        async fn presign_download(&self, _key: &ObjectKey, _ttl: Duration) -> DocFlowResult<String> {
            unimplemented!()
        }
        async fn initiate_multipart(&self, _key: &ObjectKey) -> DocFlowResult<String> {
            unimplemented!()
        }
        async fn presign_part(
            &self,
            _key: &ObjectKey,
            _upload_id: &str,
            _part_number: u32,
            _ttl: Duration,
        ) -> DocFlowResult<String> {
            unimplemented!()
        }
        async fn complete_multipart(
            &self,
            _key: &ObjectKey,
            _upload_id: &str,
            _parts: Vec<CompletedPart>,
        ) -> DocFlowResult<()> {
            unimplemented!()
        }
        async fn download_stream(&self, _key: &ObjectKey) -> DocFlowResult<ByteStream> {
            unimplemented!()
        }
        async fn upload(&self, _key: &ObjectKey, _bytes: Bytes) -> DocFlowResult<()> {
            unimplemented!()
        }
        async fn upload_async(&self, _key: &ObjectKey, _bytes: Bytes) -> DocFlowResult<()> {
            self.uploaded.store(true, Ordering::SeqCst);
            Ok(())
        }
        async fn copy(&self, _src: &ObjectKey, _dst: &ObjectKey) -> DocFlowResult<()> {
            unimplemented!()
        }
    }

    struct RecordingAction {
        succeeded: Arc<AtomicBool>,
    }

    #[async_trait]
    impl UploadAction for RecordingAction {
        async fn on_success(&self) -> DocFlowResult<()> {
            self.succeeded.store(true, Ordering::SeqCst);
            Ok(())
        }
        async fn on_failure(&self, _error_message: &str) -> DocFlowResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn scheduled_upload_runs_only_after_run_pending_is_called() {
        let uploaded = Arc::new(AtomicBool::new(false));
        let succeeded = Arc::new(AtomicBool::new(false));
        let storage = Arc::new(NullStorage { uploaded: uploaded.clone() });
        let hooks = Arc::new(PostCommitHooks::new());
        let uploader = ArtifactUploader::new(storage, hooks);

        let action = Arc::new(RecordingAction { succeeded: succeeded.clone() });
        uploader
            .schedule_upload_after_commit(ObjectKey::not_applicable(), Bytes::from_static(b"x"), action)
            .await;

        assert!(!uploaded.load(Ordering::SeqCst));
        uploader.run_pending().await;
        assert!(uploaded.load(Ordering::SeqCst));
        assert!(succeeded.load(Ordering::SeqCst));
    }
}
