// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Storage Port (C1)
//!
//! The object storage collaborator is treated as a content-addressable blob
//! store: presigned URL generation, streaming get/put, server-side copy,
//! and multipart upload. The concrete adapter
//! (`docflow::infrastructure::adapters::s3_storage::S3StorageAdapter`) wraps
//! `aws-sdk-s3`; this port lets the application layer and tests stay
//! decoupled from that SDK.

use crate::error::DocFlowResult;
use crate::value_objects::object_key::ObjectKey;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::time::Duration;

/// One completed part of a multipart upload, reported back by the client
/// after it PUTs to a part-scoped presigned URL.
#[derive(Debug, Clone)]
pub struct CompletedPart {
    pub part_number: u32,
    pub e_tag: String,
}

/// A chunk of bytes read from [`StoragePort::download_stream`].
pub type ByteStream = BoxStream<'static, DocFlowResult<Bytes>>;

#[async_trait]
pub trait StoragePort: Send + Sync {
    async fn presign_upload(&self, key: &ObjectKey, ttl: Duration) -> DocFlowResult<String>;

    async fn presign_download(&self, key: &ObjectKey, ttl: Duration) -> DocFlowResult<String>;

    /// `partNumber` is caller-validated to be in `[1, 10000]` (§4.1, §8).
    async fn initiate_multipart(&self, key: &ObjectKey) -> DocFlowResult<String>;

    async fn presign_part(&self, key: &ObjectKey, upload_id: &str, part_number: u32, ttl: Duration)
        -> DocFlowResult<String>;

    async fn complete_multipart(&self, key: &ObjectKey, upload_id: &str, parts: Vec<CompletedPart>)
        -> DocFlowResult<()>;

    /// Caller is responsible for consuming/closing the returned stream.
    async fn download_stream(&self, key: &ObjectKey) -> DocFlowResult<ByteStream>;

    /// Blocking upload: spills `bytes` to a temp file then performs a
    /// multipart-capable put (§4.1 — "mandatory when length may exceed
    /// single-PUT limits").
    async fn upload(&self, key: &ObjectKey, bytes: Bytes) -> DocFlowResult<()>;

    /// Non-blocking upload used by the async artifact uploader (C8); the
    /// caller registers success/failure continuations as post-commit hooks
    /// rather than awaiting this directly inside a transaction.
    async fn upload_async(&self, key: &ObjectKey, bytes: Bytes) -> DocFlowResult<()>;

    /// Server-side copy, O(1) to the caller (§4.7 step 7's "Empty list"
    /// case: the source file becomes the final artifact via copy, not
    /// re-upload).
    async fn copy(&self, src: &ObjectKey, dst: &ObjectKey) -> DocFlowResult<()>;
}
