// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Async api-call broker.
//!
//! Guest handlers reach external HTTP services without blocking the
//! event-dispatch path: `ws_api_call` hands an envelope to [`ApiBroker`],
//! which either answers inline through the in-process [`Router`] or, when
//! the caller flags `async`, enqueues an `api_call` task. The request worker
//! later serves the request and enqueues an `api_result`; the result worker
//! re-enters the dispatcher with a synthetic event carrying the response.

mod queue;
mod router;
mod tasks;
mod worker;

pub use queue::{MemoryTaskQueue, QueueError, TaskQueue};
pub use router::{RouteHandler, Router};
pub use tasks::{
    ApiCallTask, ApiResultTask, HttpRequest, HttpResponse, Task, TaskKind, EVENT_TYPE_HEADER,
};
pub use worker::BrokerWorker;

use std::sync::Arc;

use crate::observability::messages::broker::ApiCallEnqueued;
use crate::observability::messages::StructuredLog;

/// Synchronous entry used by the host ABI.
pub trait ApiServer: Send + Sync {
    /// Handle a raw `ws_api_call` envelope and produce the response envelope
    /// copied back into the guest.
    fn call(&self, project_name: &str, raw: &[u8]) -> HttpResponse;
}

pub struct ApiBroker {
    queue: Arc<dyn TaskQueue>,
    router: Arc<Router>,
}

impl ApiBroker {
    pub fn new(queue: Arc<dyn TaskQueue>, router: Arc<Router>) -> Self {
        Self { queue, router }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn queue(&self) -> &Arc<dyn TaskQueue> {
        &self.queue
    }
}

impl ApiServer for ApiBroker {
    fn call(&self, project_name: &str, raw: &[u8]) -> HttpResponse {
        let request: HttpRequest = match serde_json::from_slice(raw) {
            Ok(r) => r,
            Err(e) => return HttpResponse::bad_request(&format!("invalid request envelope: {}", e)),
        };

        if !request.asynchronous {
            return self.router.serve(&request);
        }

        let task = match Task::api_call(project_name, &request) {
            Ok(t) => t,
            Err(e) => return HttpResponse::internal_error(&format!("encode task: {}", e)),
        };
        match self.queue.enqueue(task) {
            Ok(()) => {
                ApiCallEnqueued {
                    project_name,
                    url: &request.url,
                }
                .log();
                HttpResponse::accepted()
            }
            Err(e) => HttpResponse::internal_error(&format!("enqueue: {}", e)),
        }
    }
}
