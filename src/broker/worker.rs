// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::broker::tasks::{ApiCallTask, ApiResultTask, Task, TaskKind};
use crate::broker::{Router, TaskQueue};
use crate::event::EventDispatcher;
use crate::observability::messages::broker::{ApiResultDispatched, ApiTaskDropped, ApiTaskRetried};
use crate::observability::messages::StructuredLog;

/// Why a task could not be processed. Fatal errors drop the task (decode and
/// marshal failures can never succeed on retry); retryable errors go back on
/// the queue with exponential backoff.
enum TaskError {
    Fatal(String),
    Retryable(String),
}

/// Drains the broker queue: serves `api_call` tasks through the router and
/// re-enters the dispatcher for `api_result` tasks.
pub struct BrokerWorker {
    queue: Arc<dyn TaskQueue>,
    router: Arc<Router>,
    dispatcher: Arc<EventDispatcher>,
    max_attempts: u32,
    cancel: CancellationToken,
}

impl BrokerWorker {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        router: Arc<Router>,
        dispatcher: Arc<EventDispatcher>,
        max_attempts: u32,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            queue,
            router,
            dispatcher,
            max_attempts: max_attempts.max(1),
            cancel,
        }
    }

    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    pub async fn run(&self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                task = self.queue.dequeue() => {
                    match task {
                        Some(task) => self.handle(task).await,
                        None => break,
                    }
                }
            }
        }
    }

    async fn handle(&self, task: Task) {
        let retry = task.clone();
        match self.process(task).await {
            Ok(()) => {}
            Err(TaskError::Fatal(error)) => {
                ApiTaskDropped {
                    kind: &retry.kind.to_string(),
                    attempt: retry.attempt,
                    error: &error,
                }
                .log();
            }
            Err(TaskError::Retryable(error)) => {
                let next_attempt = retry.attempt + 1;
                if next_attempt >= self.max_attempts {
                    ApiTaskDropped {
                        kind: &retry.kind.to_string(),
                        attempt: retry.attempt,
                        error: &error,
                    }
                    .log();
                    return;
                }

                ApiTaskRetried {
                    kind: &retry.kind.to_string(),
                    attempt: next_attempt,
                    error: &error,
                }
                .log();

                tokio::time::sleep(backoff(retry.attempt)).await;
                let _ = self.queue.enqueue(Task {
                    attempt: next_attempt,
                    ..retry
                });
            }
        }
    }

    async fn process(&self, task: Task) -> Result<(), TaskError> {
        match task.kind {
            TaskKind::ApiCall => self.process_api_call(&task.payload),
            TaskKind::ApiResult => self.process_api_result(&task.payload).await,
        }
    }

    fn process_api_call(&self, payload: &[u8]) -> Result<(), TaskError> {
        let call: ApiCallTask =
            serde_json::from_slice(payload).map_err(|e| TaskError::Fatal(e.to_string()))?;

        // Without the eventType header the response has nowhere to go.
        let event_type = call
            .request
            .event_type()
            .ok_or_else(|| TaskError::Fatal("missing eventType header".to_string()))?;

        let mut response = self.router.serve(&call.request);
        for (name, values) in &call.request.header {
            if name == "Content-Type" {
                continue;
            }
            response.header.insert(name.clone(), values.clone());
        }

        let data =
            serde_json::to_vec(&response).map_err(|e| TaskError::Fatal(e.to_string()))?;
        let result = Task::api_result(&call.project_name, event_type, data)
            .map_err(|e| TaskError::Fatal(e.to_string()))?;
        self.queue
            .enqueue(result)
            .map_err(|e| TaskError::Fatal(e.to_string()))
    }

    async fn process_api_result(&self, payload: &[u8]) -> Result<(), TaskError> {
        let result: ApiResultTask =
            serde_json::from_slice(payload).map_err(|e| TaskError::Fatal(e.to_string()))?;

        self.dispatcher
            .on_internal_event(&result.project_name, result.event_type, &result.data)
            .await
            .map_err(|e| TaskError::Retryable(e.to_string()))?;

        ApiResultDispatched {
            project_name: &result.project_name,
            event_type: result.event_type,
        }
        .log();
        Ok(())
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(100 * 2u64.pow(attempt.min(6)))
}
