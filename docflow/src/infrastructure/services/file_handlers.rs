// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Built-in [`FileHandlerPort`] implementations and the registry the
//! document pipeline (C7) dispatches through.
//!
//! Per-format conversion (LibreOffice, email extraction, etc.) is out of
//! scope ("Implementing individual file-format handlers", non-goal);
//! `PdfPassthroughHandler` and `NullHandler` are the two handlers this crate
//! ships, and `FileHandlerRegistry` is the plug point a deployment adds more
//! to.

use async_trait::async_trait;
use bytes::Bytes;
use docflow_domain::error::DocFlowResult;
use docflow_domain::services::file_handler_port::{FileHandlerPort, HandlerItem};
use std::collections::HashMap;
use std::sync::Arc;

/// Leaves PDF content untouched: an empty output list, which the document
/// pipeline's dispatch (§4.7 step 7) treats as "no conversion needed" and
/// hands off to GX via a server-side copy of the source object rather than
/// a re-upload.
pub struct PdfPassthroughHandler;

#[async_trait]
impl FileHandlerPort for PdfPassthroughHandler {
    fn extension(&self) -> &str {
        "pdf"
    }

    async fn handle(&self, _content: Bytes) -> DocFlowResult<Vec<HandlerItem>> {
        Ok(Vec::new())
    }
}

/// Claims no extension; used as the registry's fallback when a file's
/// extension has no registered handler. Produces no output items, which
/// the document pipeline interprets as an unconditional passthrough of the
/// original source file.
pub struct NullHandler;

#[async_trait]
impl FileHandlerPort for NullHandler {
    fn extension(&self) -> &str {
        ""
    }

    async fn handle(&self, _content: Bytes) -> DocFlowResult<Vec<HandlerItem>> {
        Ok(Vec::new())
    }
}

/// Dispatches to a registered handler by extension, falling back to
/// [`NullHandler`] for anything unregistered.
pub struct FileHandlerRegistry {
    handlers: HashMap<String, Arc<dyn FileHandlerPort>>,
    fallback: Arc<dyn FileHandlerPort>,
}

impl FileHandlerRegistry {
    pub fn new() -> Self {
        Self { handlers: HashMap::new(), fallback: Arc::new(NullHandler) }
    }

    pub fn register(&mut self, handler: Arc<dyn FileHandlerPort>) {
        self.handlers.insert(handler.extension().to_string(), handler);
    }

    pub fn resolve(&self, extension: &str) -> Arc<dyn FileHandlerPort> {
        self.handlers.get(extension).cloned().unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for FileHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pdf_handler_produces_no_output_items() {
        let handler = PdfPassthroughHandler;
        let items = handler.handle(Bytes::from_static(b"%PDF-1.7")).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn registry_falls_back_to_null_handler_for_unregistered_extensions() {
        let mut registry = FileHandlerRegistry::new();
        registry.register(Arc::new(PdfPassthroughHandler));

        let resolved = registry.resolve("docx");
        let items = resolved.handle(Bytes::from_static(b"ignored")).await.unwrap();
        assert!(items.is_empty());

        let resolved = registry.resolve("pdf");
        assert_eq!(resolved.extension(), "pdf");
    }
}
