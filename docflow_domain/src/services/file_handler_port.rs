// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Handler Port (§4.7 step 6)
//!
//! Per-extension conversion/extraction is explicitly out of scope
//! ("Implementing individual file-format handlers", `spec.md` Non-goals);
//! this port is the extension point a deployment plugs LibreOffice,
//! Ghostscript, or email-extractor subprocess handlers into.

use crate::error::DocFlowResult;
use async_trait::async_trait;
use bytes::Bytes;

/// One output produced by a handler: either the untouched/transformed
/// source (`filename == file.file_name`), a split artifact (different
/// name, same `pdf` extension), or an extracted child document.
#[derive(Debug, Clone)]
pub struct HandlerItem {
    pub filename: String,
    pub content: Bytes,
}

#[async_trait]
pub trait FileHandlerPort: Send + Sync {
    /// The extension this handler claims, e.g. `"pdf"`, `"msg"`.
    fn extension(&self) -> &str;

    /// Process `content`; semantics of the returned list are interpreted by
    /// the document pipeline per §4.7 step 7 (empty ⇒ passthrough, single
    /// same-name ⇒ in-place transform, multiple/renamed ⇒ split or
    /// extraction depending on the source extension).
    async fn handle(&self, content: Bytes) -> DocFlowResult<Vec<HandlerItem>>;
}
