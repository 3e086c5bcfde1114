// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Layered application configuration, one section per external interface
//! knob group (spec §6). Loaded from an optional TOML file, then overridden
//! by `DOCFLOW__SECTION__KEY` environment variables, in that order.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub presign_ttl_minutes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    pub zip_queue_name: String,
    pub file_queue_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    pub fetch_doc_status_cron: String,
    pub job_completion_cron: String,
    pub stale_job_cron: String,
    pub stale_job_hours: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZipConfig {
    pub concurrency_limit: usize,
    pub temp_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubprocessConfig {
    pub libreoffice_path: String,
    pub handler_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GxConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocFlowConfig {
    pub storage: StorageConfig,
    pub queue: QueueConfig,
    pub scheduler: SchedulerConfig,
    pub zip: ZipConfig,
    pub subprocess: SubprocessConfig,
    pub gx: GxConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub metrics_port: u16,
}

impl DocFlowConfig {
    /// Loads configuration from `path` if given, then `docflow.toml` in the
    /// working directory if present, with `DOCFLOW__SECTION__KEY`
    /// environment overrides applied last.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("storage.presign_ttl_minutes", 15)?
            .set_default("queue.zip_queue_name", "docflow-zip")?
            .set_default("queue.file_queue_name", "docflow-file")?
            .set_default("scheduler.fetch_doc_status_cron", "0 */1 * * * *")?
            .set_default("scheduler.job_completion_cron", "0 */2 * * * *")?
            .set_default("scheduler.stale_job_cron", "0 0 * * * *")?
            .set_default("scheduler.stale_job_hours", 24)?
            .set_default("zip.concurrency_limit", 4)?
            .set_default("zip.temp_dir", "/tmp/docflow")?
            .set_default("subprocess.handler_timeout_seconds", 120)?
            .set_default("gx.timeout_seconds", 30)?
            .set_default("database.url", "sqlite://./docflow.db")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("metrics_port", 9090)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::with_name("docflow").required(false));
        }

        builder = builder.add_source(config::Environment::with_prefix("DOCFLOW").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_wins_over_default() {
        std::env::set_var("DOCFLOW__STORAGE__BUCKET", "test-bucket");
        std::env::set_var("DOCFLOW__STORAGE__PRESIGN_TTL_MINUTES", "30");
        std::env::set_var("DOCFLOW__QUEUE__ZIP_QUEUE_NAME", "zq");
        std::env::set_var("DOCFLOW__QUEUE__FILE_QUEUE_NAME", "fq");
        std::env::set_var("DOCFLOW__GX__BASE_URL", "https://gx.example.test");
        std::env::set_var("DOCFLOW__GX__API_KEY", "secret");

        let cfg = DocFlowConfig::load(None).unwrap();
        assert_eq!(cfg.storage.bucket, "test-bucket");
        assert_eq!(cfg.storage.presign_ttl_minutes, 30);
    }
}
