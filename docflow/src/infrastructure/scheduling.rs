// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cron Scheduling
//!
//! Wires the lifecycle scheduler (C11) and the GX poller/stale sweeper
//! (C12) onto `tokio-cron-scheduler` jobs, driven by the cron expressions
//! in [`crate::infrastructure::config::docflow_config::SchedulerConfig`].

use crate::application::services::{GxStatusPoller, LifecycleScheduler, StaleJobSweeper};
use crate::infrastructure::config::docflow_config::SchedulerConfig;
use docflow_domain::error::{DocFlowError, DocFlowResult};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::error;

/// Builds and starts the cron scheduler. The returned [`JobScheduler`]
/// must be kept alive (its `shutdown` dropped or called explicitly) for
/// as long as the jobs should keep firing.
pub async fn start(
    config: &SchedulerConfig,
    lifecycle_scheduler: Arc<LifecycleScheduler>,
    gx_poller: Arc<GxStatusPoller>,
    stale_sweeper: Arc<StaleJobSweeper>,
) -> DocFlowResult<JobScheduler> {
    let scheduler = JobScheduler::new().await.map_err(|err| DocFlowError::Database(err.to_string()))?;

    let completion_job = Job::new_async(config.job_completion_cron.as_str(), move |_uuid, _lock| {
        let lifecycle_scheduler = lifecycle_scheduler.clone();
        Box::pin(async move {
            if let Err(err) = lifecycle_scheduler.run_once().await {
                error!(error = %err, "lifecycle scheduler pass failed");
            }
        })
    })
    .map_err(|err| DocFlowError::Database(err.to_string()))?;

    let poller_job = Job::new_async(config.fetch_doc_status_cron.as_str(), move |_uuid, _lock| {
        let gx_poller = gx_poller.clone();
        Box::pin(async move {
            if let Err(err) = gx_poller.run_once().await {
                error!(error = %err, "gx status poll pass failed");
            }
        })
    })
    .map_err(|err| DocFlowError::Database(err.to_string()))?;

    let sweeper_job = Job::new_async(config.stale_job_cron.as_str(), move |_uuid, _lock| {
        let stale_sweeper = stale_sweeper.clone();
        Box::pin(async move {
            if let Err(err) = stale_sweeper.run_once().await {
                error!(error = %err, "stale job sweep pass failed");
            }
        })
    })
    .map_err(|err| DocFlowError::Database(err.to_string()))?;

    scheduler.add(completion_job).await.map_err(|err| DocFlowError::Database(err.to_string()))?;
    scheduler.add(poller_job).await.map_err(|err| DocFlowError::Database(err.to_string()))?;
    scheduler.add(sweeper_job).await.map_err(|err| DocFlowError::Database(err.to_string()))?;

    scheduler.start().await.map_err(|err| DocFlowError::Database(err.to_string()))?;
    Ok(scheduler)
}
