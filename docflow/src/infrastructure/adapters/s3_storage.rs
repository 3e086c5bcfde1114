// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! [`StoragePort`] adapter over `aws-sdk-s3`.

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart as S3CompletedPart};
use aws_sdk_s3::Client;
use bytes::Bytes;
use docflow_domain::error::{DocFlowError, DocFlowResult};
use docflow_domain::services::storage_port::{ByteStream as PortByteStream, CompletedPart, StoragePort};
use docflow_domain::value_objects::object_key::ObjectKey;
use futures::StreamExt;
use std::time::Duration;

fn s3_err(context: &str, err: impl std::fmt::Display) -> DocFlowError {
    DocFlowError::Storage(format!("{context}: {err}"))
}

pub struct S3StorageAdapter {
    client: Client,
    bucket: String,
}

impl S3StorageAdapter {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self { client, bucket: bucket.into() }
    }
}

#[async_trait]
impl StoragePort for S3StorageAdapter {
    async fn presign_upload(&self, key: &ObjectKey, ttl: Duration) -> DocFlowResult<String> {
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .presigned(PresigningConfig::expires_in(ttl).map_err(|e| s3_err("presign config", e))?)
            .await
            .map_err(|e| s3_err("presign upload", e))?;
        Ok(presigned.uri().to_string())
    }

    async fn presign_download(&self, key: &ObjectKey, ttl: Duration) -> DocFlowResult<String> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .presigned(PresigningConfig::expires_in(ttl).map_err(|e| s3_err("presign config", e))?)
            .await
            .map_err(|e| s3_err("presign download", e))?;
        Ok(presigned.uri().to_string())
    }

    async fn initiate_multipart(&self, key: &ObjectKey) -> DocFlowResult<String> {
        let response = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|e| s3_err("create multipart upload", e))?;
        response
            .upload_id()
            .map(str::to_string)
            .ok_or_else(|| DocFlowError::Storage("S3 returned no upload_id".to_string()))
    }

    async fn presign_part(
        &self,
        key: &ObjectKey,
        upload_id: &str,
        part_number: u32,
        ttl: Duration,
    ) -> DocFlowResult<String> {
        let presigned = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key.as_str())
            .upload_id(upload_id)
            .part_number(part_number as i32)
            .presigned(PresigningConfig::expires_in(ttl).map_err(|e| s3_err("presign config", e))?)
            .await
            .map_err(|e| s3_err("presign part", e))?;
        Ok(presigned.uri().to_string())
    }

    async fn complete_multipart(
        &self,
        key: &ObjectKey,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> DocFlowResult<()> {
        let parts = parts
            .into_iter()
            .map(|p| S3CompletedPart::builder().part_number(p.part_number as i32).e_tag(p.e_tag).build())
            .collect();
        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key.as_str())
            .upload_id(upload_id)
            .multipart_upload(CompletedMultipartUpload::builder().set_parts(Some(parts)).build())
            .send()
            .await
            .map_err(|e| s3_err("complete multipart upload", e))?;
        Ok(())
    }

    async fn download_stream(&self, key: &ObjectKey) -> DocFlowResult<PortByteStream> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|e| s3_err("get object", e))?;

        let stream = response
            .body
            .map(|chunk| chunk.map(Bytes::from).map_err(|e| s3_err("read object body", e)));
        Ok(Box::pin(stream))
    }

    async fn upload(&self, key: &ObjectKey, bytes: Bytes) -> DocFlowResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| s3_err("put object", e))?;
        Ok(())
    }

    async fn upload_async(&self, key: &ObjectKey, bytes: Bytes) -> DocFlowResult<()> {
        self.upload(key, bytes).await
    }

    async fn copy(&self, src: &ObjectKey, dst: &ObjectKey) -> DocFlowResult<()> {
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(format!("{}/{}", self.bucket, src.as_str()))
            .key(dst.as_str())
            .send()
            .await
            .map_err(|e| s3_err("copy object", e))?;
        Ok(())
    }
}
