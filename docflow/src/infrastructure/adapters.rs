// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Concrete adapters for the external-interface ports in
//! `docflow_domain::services` (C1, C2, C5, C12).

pub mod gx_http_client;
pub mod s3_storage;
pub mod sqs_queue;
pub mod zip_stream;

pub use gx_http_client::GxHttpClient;
pub use s3_storage::S3StorageAdapter;
pub use sqs_queue::SqsQueueAdapter;
pub use zip_stream::ZipStreamProcessor;
