// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Configuration
//!
//! Layered TOML + environment configuration for every knob enumerated in
//! the external interfaces contract: storage, queue, scheduler, zip,
//! subprocess handlers, GX client, database, and logging.

pub mod docflow_config;

pub use docflow_config::{
    DatabaseConfig, DocFlowConfig, GxConfig, LoggingConfig, QueueConfig, SchedulerConfig, StorageConfig,
    SubprocessConfig, ZipConfig,
};
