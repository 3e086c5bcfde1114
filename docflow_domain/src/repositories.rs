// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Repositories
//!
//! Repository ports define the persistence contracts the application layer
//! depends on. Every mutating method here is a compare-and-set against an
//! expected prior state (§4.4, §5): "never read-modify-write". Concrete
//! implementations live in `docflow::infrastructure::repositories` against
//! SQLite via `sqlx`.

pub mod file_repository;
pub mod gx_repository;
pub mod job_repository;
pub mod zip_repository;
