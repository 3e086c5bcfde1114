// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # docflow_domain
//!
//! Pure domain layer for the document ingestion and processing core: the
//! four persistent entities (Job, Zip, File, Gx), their value objects,
//! the repository and service *ports* the application layer depends on,
//! and the one pure cross-entity fold, job reconciliation.
//!
//! No module in this crate performs I/O itself; repository and service
//! traits here are `async-trait` signatures only, implemented against real
//! infrastructure in the `docflow` crate.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     docflow_domain                       │
//! │                                                           │
//! │  entities/        job, zip, file, gx — state machines     │
//! │  value_objects/   ids, content_hash, object_key, zip_entry │
//! │  aggregates/       job_aggregate — pure reconciliation     │
//! │  repositories/     *_repository ports (CAS persistence)    │
//! │  services/         storage/queue/gx_client/file_handler    │
//! │                     ports + validation (concrete, pure)    │
//! │  error.rs          DocFlowError                            │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use error::{DocFlowError, DocFlowResult};
