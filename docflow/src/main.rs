// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # DocFlow Process Entry Point
//!
//! Composition root: loads configuration, wires every adapter and
//! application service, then either runs the long-lived `serve` loop or
//! dispatches a one-shot admin subcommand (§6's admin-only HTTP endpoints,
//! exposed here since this crate has no routing layer of its own).

use docflow::application::services::{
    ArtifactUploader, DocumentPipelineService, GxStatusPoller, JobOrchestrationService, LifecycleManager,
    LifecycleScheduler, PostCommitHooks, RetryService, StaleJobSweeper, ZipIngestionService,
};
use docflow::infrastructure::adapters::{GxHttpClient, S3StorageAdapter, SqsQueueAdapter, ZipStreamProcessor};
use docflow::infrastructure::config::DocFlowConfig;
use docflow::infrastructure::metrics::{MetricsEndpoint, MetricsService};
use docflow::infrastructure::repositories::schema::initialize_database;
use docflow::infrastructure::repositories::{SqliteFileRepository, SqliteGxRepository, SqliteJobRepository, SqliteZipRepository};
use docflow::infrastructure::services::{FileHandlerRegistry, PdfPassthroughHandler};
use docflow::infrastructure::{logging, scheduling};
use docflow_bootstrap::cli::{parse_and_validate, ValidatedCommand};
use docflow_bootstrap::exit_code::result_to_exit_code;
use docflow_bootstrap::shutdown::ShutdownCoordinator;
use docflow_bootstrap::signals::wait_for_shutdown_signal;
use docflow_domain::error::{DocFlowError, DocFlowResult};
use docflow_domain::services::queue_port::QueueName;
use docflow_domain::services::validation::FileValidator;
use docflow_domain::value_objects::ids::{FileId, GxId, JobId, ZipId};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match parse_and_validate() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("invalid arguments: {err}");
            return ExitCode::from(docflow_bootstrap::exit_code::map_error_to_exit_code(&err) as u8);
        }
    };

    let config = match DocFlowConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            return ExitCode::from(78u8);
        }
    };

    logging::init_tracing(&config.logging);

    result_to_exit_code(run(cli.command, config).await)
}

async fn run(command: ValidatedCommand, config: DocFlowConfig) -> DocFlowResult<()> {
    match command {
        ValidatedCommand::Migrate => {
            initialize_database(&config.database.url).await.map_err(|e| DocFlowError::Database(e.to_string()))?;
            info!("migrations applied");
            Ok(())
        }
        ValidatedCommand::Serve => serve(config).await,
        ValidatedCommand::Retry { file_master_id, gx_master_id } => retry(config, file_master_id, gx_master_id).await,
        ValidatedCommand::Terminate { job_id } => terminate(config, job_id).await,
        ValidatedCommand::TerminateAll => terminate_all(config).await,
    }
}

struct Repositories {
    jobs: Arc<SqliteJobRepository>,
    zips: Arc<SqliteZipRepository>,
    files: Arc<SqliteFileRepository>,
    gx: Arc<SqliteGxRepository>,
}

async fn build_repositories(config: &DocFlowConfig) -> DocFlowResult<Repositories> {
    let pool = initialize_database(&config.database.url).await.map_err(|e| DocFlowError::Database(e.to_string()))?;
    Ok(Repositories {
        jobs: Arc::new(SqliteJobRepository::new(pool.clone())),
        zips: Arc::new(SqliteZipRepository::new(pool.clone())),
        files: Arc::new(SqliteFileRepository::new(pool.clone())),
        gx: Arc::new(SqliteGxRepository::new(pool)),
    })
}

async fn build_queue(config: &DocFlowConfig) -> DocFlowResult<Arc<SqsQueueAdapter>> {
    let aws = aws_config::defaults(aws_config::BehaviorVersion::latest()).load().await;
    let client = aws_sdk_sqs::Client::new(&aws);
    Ok(Arc::new(SqsQueueAdapter::new(client, config.queue.zip_queue_name.as_str(), config.queue.file_queue_name.as_str())))
}

async fn build_storage(config: &DocFlowConfig) -> DocFlowResult<Arc<S3StorageAdapter>> {
    let aws = aws_config::defaults(aws_config::BehaviorVersion::latest()).load().await;
    let client = aws_sdk_s3::Client::new(&aws);
    Ok(Arc::new(S3StorageAdapter::new(client, config.storage.bucket.as_str())))
}

fn build_gx_client(config: &DocFlowConfig) -> DocFlowResult<Arc<GxHttpClient>> {
    let client =
        GxHttpClient::new(config.gx.base_url.as_str(), config.gx.api_key.as_str(), Duration::from_secs(config.gx.timeout_seconds))?;
    Ok(Arc::new(client))
}

async fn serve(config: DocFlowConfig) -> DocFlowResult<()> {
    let metrics = Arc::new(MetricsService::new().map_err(|e| DocFlowError::Database(e.to_string()))?);
    let metrics_endpoint = MetricsEndpoint::new(metrics, config.metrics_port);
    tokio::spawn(async move {
        if let Err(err) = metrics_endpoint.start().await {
            error!(error = %err, "metrics endpoint stopped");
        }
    });

    let repos = build_repositories(&config).await?;
    let queue = build_queue(&config).await?;
    let storage = build_storage(&config).await?;
    let gx_client = build_gx_client(&config)?;

    let hooks = Arc::new(PostCommitHooks::new());
    let uploader = Arc::new(ArtifactUploader::new(storage.clone(), hooks));
    let lifecycle = Arc::new(LifecycleManager::new(
        repos.jobs.clone(),
        repos.zips.clone(),
        repos.files.clone(),
        repos.gx.clone(),
        queue.clone(),
    ));

    let mut handlers = FileHandlerRegistry::new();
    handlers.register(Arc::new(PdfPassthroughHandler));
    let handlers = Arc::new(handlers);

    let validator = Arc::new(FileValidator::with_defaults());
    let zip_stream = Arc::new(ZipStreamProcessor::new(config.zip.temp_dir.clone()));

    let job_orchestration = Arc::new(JobOrchestrationService::new(
        repos.jobs.clone(),
        repos.zips.clone(),
        repos.files.clone(),
        storage.clone(),
        queue.clone(),
        Duration::from_secs(config.storage.presign_ttl_minutes * 60),
    ));

    let zip_ingestion = Arc::new(ZipIngestionService::new(
        repos.zips.clone(),
        repos.files.clone(),
        storage.clone(),
        queue.clone(),
        gx_client.clone(),
        lifecycle.clone(),
        zip_stream,
        validator,
        config.zip.concurrency_limit,
    ));

    let document_pipeline = Arc::new(DocumentPipelineService::new(
        repos.files.clone(),
        repos.jobs.clone(),
        repos.gx.clone(),
        storage.clone(),
        queue.clone(),
        handlers,
        uploader,
        lifecycle.clone(),
    ));

    let lifecycle_scheduler =
        Arc::new(LifecycleScheduler::new(repos.jobs.clone(), repos.zips.clone(), repos.files.clone(), repos.gx.clone(), lifecycle.clone()));
    let gx_poller = Arc::new(GxStatusPoller::new(repos.gx.clone(), gx_client.clone()));
    let stale_sweeper = Arc::new(StaleJobSweeper::new(repos.jobs.clone(), config.scheduler.stale_job_hours as i64));

    let cron = scheduling::start(&config.scheduler, lifecycle_scheduler, gx_poller, stale_sweeper).await?;

    // `job_orchestration` (C9) backs the upload/trigger-processing admin
    // surface (§6). HTTP routing is out of scope for this crate, so it has
    // no caller here; it's wired through the composition root regardless,
    // ready for whatever process embeds a routing layer on top.
    let _job_orchestration = job_orchestration;

    let coordinator = ShutdownCoordinator::new(Duration::from_secs(30));
    let signal_task = tokio::spawn(wait_for_shutdown_signal(coordinator.clone()));
    let token = coordinator.token();

    tokio::select! {
        _ = run_zip_consumer(queue.clone(), zip_ingestion, &coordinator) => {}
        _ = run_file_consumer(queue.clone(), document_pipeline, &coordinator) => {}
        _ = token.cancelled() => {}
    }

    let _ = signal_task.await;
    let mut cron = cron;
    let _ = cron.shutdown().await;
    info!("docflow shut down");
    Ok(())
}

/// Long-poll the zip queue and dispatch each delivery through C6.
async fn run_zip_consumer(queue: Arc<SqsQueueAdapter>, zip_ingestion: Arc<ZipIngestionService>, coordinator: &ShutdownCoordinator) {
    while !coordinator.is_shutting_down() {
        let messages = match queue.receive(QueueName::Zip, 10).await {
            Ok(messages) => messages,
            Err(err) => {
                error!(error = %err, "zip queue receive failed");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };
        for message in messages {
            let Some(zip_id) = parse_id_field(&message.body, "zipMasterId").map(ZipId::new) else { continue };
            match zip_ingestion.handle_message(zip_id).await {
                Ok(()) => {
                    if let Err(err) = queue.acknowledge(QueueName::Zip, &message.receipt).await {
                        error!(error = %err, "failed to acknowledge zip message");
                    }
                }
                Err(err) if err.retryable() => {
                    error!(error = %err, "zip message processing failed transiently, leaving for redelivery");
                }
                Err(err) => {
                    error!(error = %err, "zip message processing failed terminally");
                    if let Err(ack_err) = queue.acknowledge(QueueName::Zip, &message.receipt).await {
                        error!(error = %ack_err, "failed to acknowledge terminally-failed zip message");
                    }
                }
            }
        }
    }
}

async fn run_file_consumer(queue: Arc<SqsQueueAdapter>, document_pipeline: Arc<DocumentPipelineService>, coordinator: &ShutdownCoordinator) {
    while !coordinator.is_shutting_down() {
        let messages = match queue.receive(QueueName::File, 10).await {
            Ok(messages) => messages,
            Err(err) => {
                error!(error = %err, "file queue receive failed");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };
        for message in messages {
            let Some(file_id) = parse_id_field(&message.body, "fileMasterId").map(FileId::new) else { continue };
            match document_pipeline.handle_message(file_id).await {
                Ok(()) => {
                    if let Err(err) = queue.acknowledge(QueueName::File, &message.receipt).await {
                        error!(error = %err, "failed to acknowledge file message");
                    }
                }
                Err(err) if err.retryable() => {
                    error!(error = %err, "file message processing failed transiently, leaving for redelivery");
                }
                Err(err) => {
                    error!(error = %err, "file message processing failed terminally");
                    if let Err(ack_err) = queue.acknowledge(QueueName::File, &message.receipt).await {
                        error!(error = %ack_err, "failed to acknowledge terminally-failed file message");
                    }
                }
            }
        }
    }
}

fn parse_id_field(body: &str, field: &str) -> Option<i64> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get(field)?.as_i64()
}

async fn retry(config: DocFlowConfig, file_master_id: Option<i64>, gx_master_id: Option<i64>) -> DocFlowResult<()> {
    let repos = build_repositories(&config).await?;
    let queue = build_queue(&config).await?;
    let retry_service = RetryService::new(repos.jobs, repos.files, repos.gx, queue);

    if let Some(id) = file_master_id {
        retry_service.retry_file(FileId::new(id)).await?;
        info!(file_master_id = id, "file retry queued");
    } else if let Some(id) = gx_master_id {
        retry_service.retry_gx(GxId::new(id)).await?;
        info!(gx_master_id = id, "gx retry queued");
    }
    Ok(())
}

async fn terminate(config: DocFlowConfig, job_id: i64) -> DocFlowResult<()> {
    let repos = build_repositories(&config).await?;
    let queue = build_queue(&config).await?;
    let lifecycle = LifecycleManager::new(repos.jobs, repos.zips, repos.files, repos.gx, queue);
    let terminated = lifecycle.terminate_job(JobId::new(job_id)).await?;
    info!(job_id, terminated, "terminate requested");
    Ok(())
}

async fn terminate_all(config: DocFlowConfig) -> DocFlowResult<()> {
    let repos = build_repositories(&config).await?;
    let queue = build_queue(&config).await?;
    let lifecycle = LifecycleManager::new(repos.jobs, repos.zips, repos.files, repos.gx, queue);
    let count = lifecycle.terminate_all_active_jobs().await?;
    info!(jobs_terminated = count, "terminate-all-active requested");
    Ok(())
}
