// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Top-level event dispatch: authenticate, resolve, fan out, join.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::errors::DispatchError;
use crate::event::{auth, Event, HandleEventResult, WasmHandleResult};
use crate::model::{ProjectStore, PublisherStore};
use crate::observability::messages::dispatch::{
    EventAuthFailed, EventDispatched, StrategiesMatched,
};
use crate::observability::messages::StructuredLog;
use crate::strategy::{InstanceHandler, StrategyResolver};
use crate::vm::InstanceRegistry;

/// Dispatches authenticated events across every matched handler.
///
/// One dispatcher serves the whole process; per-event work runs on its own
/// tasks. The dispatcher never panics and never fails the caller on partial
/// handler failure: every error is folded into the returned result.
pub struct EventDispatcher {
    projects: Arc<dyn ProjectStore>,
    publishers: Arc<dyn PublisherStore>,
    resolver: Arc<StrategyResolver>,
    registry: Arc<InstanceRegistry>,
}

impl EventDispatcher {
    pub fn new(
        projects: Arc<dyn ProjectStore>,
        publishers: Arc<dyn PublisherStore>,
        resolver: Arc<StrategyResolver>,
        registry: Arc<InstanceRegistry>,
    ) -> Self {
        Self {
            projects,
            publishers,
            resolver,
            registry,
        }
    }

    /// Handle one authenticated ingress event.
    pub async fn on_event(&self, project_name: &str, event: &Event) -> HandleEventResult {
        let event_id = if event.header.event_id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            event.header.event_id.clone()
        };

        let mut ret = HandleEventResult {
            project_name: project_name.to_string(),
            pub_id: None,
            pub_name: None,
            event_id,
            err_msg: None,
            wasm_results: Vec::new(),
        };

        let project = match self.projects.get_by_name(project_name) {
            Some(p) => p,
            None => {
                ret.err_msg = Some(DispatchError::ProjectNotFound(project_name.to_string()).to_string());
                return ret;
            }
        };

        if let Err(e) = self.verify_publisher(&project, event) {
            EventAuthFailed {
                project_name,
                reason: &e.to_string(),
            }
            .log();
            ret.err_msg = Some(e.to_string());
            return ret;
        }

        if !event.header.pub_id.is_empty() {
            match self
                .publishers
                .get_by_pub_key(&event.header.pub_id, project_name)
            {
                Some(publisher) => {
                    ret.pub_id = Some(publisher.publisher_id.to_string());
                    ret.pub_name = Some(publisher.name);
                }
                None => {
                    ret.err_msg = Some(
                        DispatchError::PublisherNotFound {
                            pub_id: event.header.pub_id.clone(),
                            project_name: project_name.to_string(),
                        }
                        .to_string(),
                    );
                    return ret;
                }
            }
        }

        let event_type = event.header.effective_type();
        let handlers = self.resolver.resolve(project_name, event_type);
        StrategiesMatched {
            project_name,
            event_type,
            matched: handlers.len(),
        }
        .log();

        ret.wasm_results = self.fan_out(&handlers, event_type, event.payload.as_bytes()).await;
        EventDispatched {
            project_name,
            event_id: &ret.event_id,
            handlers: ret.wasm_results.len(),
        }
        .log();
        ret
    }

    /// Broker re-entry: dispatch a synthetic event with no publisher checks.
    pub async fn on_internal_event(
        &self,
        project_name: &str,
        event_type: u32,
        payload: &[u8],
    ) -> Result<HandleEventResult, DispatchError> {
        if self.projects.get_by_name(project_name).is_none() {
            return Err(DispatchError::ProjectNotFound(project_name.to_string()));
        }

        let handlers = self.resolver.resolve(project_name, event_type);
        StrategiesMatched {
            project_name,
            event_type,
            matched: handlers.len(),
        }
        .log();

        Ok(HandleEventResult {
            project_name: project_name.to_string(),
            pub_id: None,
            pub_name: None,
            event_id: uuid::Uuid::new_v4().to_string(),
            err_msg: None,
            wasm_results: self.fan_out(&handlers, event_type, payload).await,
        })
    }

    fn verify_publisher(
        &self,
        project: &crate::model::ProjectView,
        event: &Event,
    ) -> Result<(), DispatchError> {
        let token_project = auth::verify_token(project, &event.header.token)?;
        if token_project != project.project_id {
            return Err(DispatchError::NoProjectPermission);
        }
        Ok(())
    }

    /// Run every matched handler on its own task and collect results in
    /// completion order. A handler failure never cancels its siblings.
    async fn fan_out(
        &self,
        handlers: &[InstanceHandler],
        event_type: u32,
        payload: &[u8],
    ) -> Vec<WasmHandleResult> {
        let mut results = Vec::with_capacity(handlers.len());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut pending = 0usize;

        for handler in handlers {
            let instance = match self.registry.get(handler.instance_id) {
                Some(i) => i,
                None => {
                    results.push(WasmHandleResult {
                        instance_id: handler.instance_id.to_string(),
                        code: -1,
                        err_msg: Some("instance not found".to_string()),
                    });
                    continue;
                }
            };

            pending += 1;
            let tx = tx.clone();
            let instance_id = handler.instance_id;
            let handler_name = handler.handler.clone();
            let payload = payload.to_vec();
            tokio::spawn(async move {
                let outcome = instance
                    .handle_event(&handler_name, event_type, &payload)
                    .await;
                let _ = tx.send(WasmHandleResult {
                    instance_id: instance_id.to_string(),
                    code: outcome.code,
                    err_msg: outcome.err_msg,
                });
            });
        }
        drop(tx);

        for _ in 0..pending {
            match rx.recv().await {
                Some(result) => results.push(result),
                None => break,
            }
        }
        results
    }
}
