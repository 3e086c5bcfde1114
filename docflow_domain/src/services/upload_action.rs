// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Upload Action Port (C8)
//!
//! The success/failure continuation the async artifact uploader invokes,
//! in its own transaction, after `StoragePort::upload_async` settles
//! (§4.8). File- and Gx-specific implementations update only their own
//! child row; neither mutates the parent Job.

use crate::error::DocFlowResult;
use async_trait::async_trait;

#[async_trait]
pub trait UploadAction: Send + Sync {
    async fn on_success(&self) -> DocFlowResult<()>;

    async fn on_failure(&self, error_message: &str) -> DocFlowResult<()>;
}
