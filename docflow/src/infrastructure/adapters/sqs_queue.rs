// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! [`QueuePort`] adapter over `aws-sdk-sqs` FIFO queues.

use async_trait::async_trait;
use aws_sdk_sqs::Client;
use docflow_domain::error::{DocFlowError, DocFlowResult};
use docflow_domain::services::queue_port::{QueueName, QueuePort, ReceivedMessage};

fn sqs_err(context: &str, err: impl std::fmt::Display) -> DocFlowError {
    DocFlowError::Queue(format!("{context}: {err}"))
}

/// Long-poll wait time, in seconds, used by [`receive`](SqsQueueAdapter::receive).
const WAIT_TIME_SECONDS: i32 = 20;

pub struct SqsQueueAdapter {
    client: Client,
    zip_queue_url: String,
    file_queue_url: String,
}

impl SqsQueueAdapter {
    pub fn new(client: Client, zip_queue_url: impl Into<String>, file_queue_url: impl Into<String>) -> Self {
        Self { client, zip_queue_url: zip_queue_url.into(), file_queue_url: file_queue_url.into() }
    }

    fn url_for(&self, queue: QueueName) -> &str {
        match queue {
            QueueName::Zip => &self.zip_queue_url,
            QueueName::File => &self.file_queue_url,
        }
    }
}

#[async_trait]
impl QueuePort for SqsQueueAdapter {
    async fn send(&self, queue: QueueName, payload: &str, group_id: &str, dedup_id: &str) -> DocFlowResult<()> {
        self.client
            .send_message()
            .queue_url(self.url_for(queue))
            .message_body(payload)
            .message_group_id(group_id)
            .message_deduplication_id(dedup_id)
            .send()
            .await
            .map_err(|e| sqs_err("send_message", e))?;
        Ok(())
    }

    async fn receive(&self, queue: QueueName, max_messages: u32) -> DocFlowResult<Vec<ReceivedMessage>> {
        let response = self
            .client
            .receive_message()
            .queue_url(self.url_for(queue))
            .max_number_of_messages(max_messages.min(10) as i32)
            .wait_time_seconds(WAIT_TIME_SECONDS)
            .send()
            .await
            .map_err(|e| sqs_err("receive_message", e))?;

        Ok(response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| {
                let body = m.body?;
                let receipt = m.receipt_handle?;
                Some(ReceivedMessage { body, receipt })
            })
            .collect())
    }

    async fn acknowledge(&self, queue: QueueName, receipt: &str) -> DocFlowResult<()> {
        self.client
            .delete_message()
            .queue_url(self.url_for(queue))
            .receipt_handle(receipt)
            .send()
            .await
            .map_err(|e| sqs_err("delete_message", e))?;
        Ok(())
    }

    async fn purge_all(&self, queues: &[QueueName]) -> DocFlowResult<()> {
        for queue in queues {
            self.client
                .purge_queue()
                .queue_url(self.url_for(*queue))
                .send()
                .await
                .map_err(|e| sqs_err("purge_queue", e))?;
        }
        Ok(())
    }
}
