// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Queue Port (C2)
//!
//! FIFO message broker collaborator: send with a group/dedup key, a
//! consumer loop with at-least-once delivery, and a purge primitive. The
//! concrete adapter wraps `aws-sdk-sqs` against FIFO queues.

use crate::error::DocFlowResult;
use async_trait::async_trait;

/// The two logical queues named throughout §4 and §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueName {
    Zip,
    File,
}

/// A message received from the broker. `receipt` is the handle the consumer
/// hands back to acknowledge (delete) or let expire for redelivery.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub body: String,
    pub receipt: String,
}

#[async_trait]
pub trait QueuePort: Send + Sync {
    /// `group_id` governs in-order, single-consumer delivery for the group
    /// (tenant bucket for the file queue, `"zip-job-{jobId}"` for the zip
    /// queue); `dedup_id` collisions within the broker's dedup window
    /// deduplicate (§4.2). Callers MUST mint a fresh `dedup_id` on retry.
    async fn send(&self, queue: QueueName, payload: &str, group_id: &str, dedup_id: &str) -> DocFlowResult<()>;

    /// Long-poll receive; returns an empty vec on timeout with no message
    /// available.
    async fn receive(&self, queue: QueueName, max_messages: u32) -> DocFlowResult<Vec<ReceivedMessage>>;

    async fn acknowledge(&self, queue: QueueName, receipt: &str) -> DocFlowResult<()>;

    /// Drops all in-flight messages on the named queues. Eventually
    /// consistent: callers must tolerate up to 60s of residual delivery
    /// after this returns (§4.2).
    async fn purge_all(&self, queues: &[QueueName]) -> DocFlowResult<()>;
}

/// `groupId` for the file queue: the string form of the tenant bucket
/// (§4.2).
pub fn file_queue_group_id(bucket: impl std::fmt::Display) -> String {
    bucket.to_string()
}

/// `groupId` for the zip queue.
pub fn zip_queue_group_id(job_id: impl std::fmt::Display) -> String {
    format!("zip-job-{job_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_group_id_matches_spec_format() {
        assert_eq!(zip_queue_group_id(42), "zip-job-42");
    }
}
