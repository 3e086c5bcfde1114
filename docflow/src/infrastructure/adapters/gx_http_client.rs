// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! [`GxClientPort`] adapter over `reqwest`, guarded by `gx.timeout_seconds`.

use async_trait::async_trait;
use docflow_domain::error::{DocFlowError, DocFlowResult};
use docflow_domain::services::gx_client_port::{GxClientPort, GxIngestStatus};
use docflow_domain::value_objects::ids::GxBucketId;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

fn gx_err(context: &str, err: impl std::fmt::Display) -> DocFlowError {
    DocFlowError::Downstream(format!("{context}: {err}"))
}

#[derive(Deserialize)]
struct CreateBucketResponse {
    bucket_id: i64,
}

#[derive(Deserialize)]
struct IngestStatusResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

pub struct GxHttpClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GxHttpClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> DocFlowResult<Self> {
        let http = Client::builder().timeout(timeout).build().map_err(|e| gx_err("build http client", e))?;
        Ok(Self { http, base_url: base_url.into(), api_key: api_key.into() })
    }
}

#[async_trait]
impl GxClientPort for GxHttpClient {
    async fn create_gx_bucket(&self, name: &str) -> DocFlowResult<GxBucketId> {
        let response = self
            .http
            .post(format!("{}/buckets", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .map_err(|e| classify(e))?;

        let response = ensure_success(response).await?;
        let body: CreateBucketResponse = response.json().await.map_err(|e| gx_err("decode create_gx_bucket", e))?;
        Ok(GxBucketId::new(body.bucket_id))
    }

    async fn ingest_status(&self, gx_process_id: &str) -> DocFlowResult<GxIngestStatus> {
        let response = self
            .http
            .get(format!("{}/ingest/{}/status", self.base_url, gx_process_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| classify(e))?;

        let response = ensure_success(response).await?;
        let body: IngestStatusResponse = response.json().await.map_err(|e| gx_err("decode ingest_status", e))?;
        Ok(GxIngestStatus { raw_status: body.status, status_message: body.message })
    }
}

fn classify(err: reqwest::Error) -> DocFlowError {
    if err.is_timeout() || err.is_connect() {
        DocFlowError::Transient(err.to_string())
    } else {
        DocFlowError::Downstream(err.to_string())
    }
}

async fn ensure_success(response: reqwest::Response) -> DocFlowResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status.is_server_error() || status == StatusCode::GATEWAY_TIMEOUT {
        Err(DocFlowError::Transient(format!("GX returned {status}: {body}")))
    } else {
        Err(DocFlowError::Downstream(format!("GX returned {status}: {body}")))
    }
}
