// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed implementations of the `docflow_domain` repository ports.

pub mod schema;
pub mod sqlite_file_repository;
pub mod sqlite_gx_repository;
pub mod sqlite_job_repository;
pub mod sqlite_zip_repository;

pub use sqlite_file_repository::SqliteFileRepository;
pub use sqlite_gx_repository::SqliteGxRepository;
pub use sqlite_job_repository::SqliteJobRepository;
pub use sqlite_zip_repository::SqliteZipRepository;
