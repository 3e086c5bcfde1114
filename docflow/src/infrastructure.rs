// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Layer
//!
//! Adapters for the external interfaces named in the component mapping
//! (object storage, queue, GX HTTP client, zip streaming), the SQLite
//! repository implementations, and the process-wide config/logging/metrics
//! plumbing.

pub mod adapters;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod repositories;
pub mod scheduling;
pub mod services;
