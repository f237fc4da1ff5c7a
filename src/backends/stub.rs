// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::LifecycleError;
use crate::services::HostContext;
use crate::traits::{HandleOutcome, WasmInstance, WasmRuntime};
use crate::vm::{InstanceState, StateCell};

/// A handler invocation as seen by a stub instance.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub handler: String,
    pub event_type: u32,
    pub payload: Vec<u8>,
}

/// A stub instance implementation for testing and placeholder purposes.
pub struct StubInstance {
    state: StateCell,
    outcome: HandleOutcome,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubInstance {
    pub fn new() -> Self {
        Self {
            state: StateCell::new(),
            outcome: HandleOutcome::ok(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A stub already in `Started`, ready to take events.
    pub fn started() -> Self {
        let stub = Self::new();
        stub.state.start().expect("fresh stub starts");
        stub
    }

    pub fn with_outcome(mut self, outcome: HandleOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

impl Default for StubInstance {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl WasmInstance for StubInstance {
    fn state(&self) -> InstanceState {
        self.state.get()
    }

    fn start(&self) -> Result<(), LifecycleError> {
        self.state.start()
    }

    fn stop(&self) -> Result<(), LifecycleError> {
        self.state.stop()
    }

    fn destroy(&self) -> Result<(), LifecycleError> {
        self.state.destroy()
    }

    async fn handle_event(&self, handler: &str, event_type: u32, payload: &[u8]) -> HandleOutcome {
        if self.state.get() != InstanceState::Started {
            return HandleOutcome::failed(-1, "instance not started");
        }
        self.calls.lock().push(RecordedCall {
            handler: handler.to_string(),
            event_type,
            payload: payload.to_vec(),
        });
        self.outcome.clone()
    }
}

/// An instance whose handlers always fail, for failure-path tests.
pub struct FailingInstance {
    state: StateCell,
}

impl FailingInstance {
    pub fn started() -> Self {
        let instance = Self {
            state: StateCell::new(),
        };
        instance.state.start().expect("fresh instance starts");
        instance
    }
}

#[async_trait::async_trait]
impl WasmInstance for FailingInstance {
    fn state(&self) -> InstanceState {
        self.state.get()
    }

    fn start(&self) -> Result<(), LifecycleError> {
        self.state.start()
    }

    fn stop(&self) -> Result<(), LifecycleError> {
        self.state.stop()
    }

    fn destroy(&self) -> Result<(), LifecycleError> {
        self.state.destroy()
    }

    async fn handle_event(
        &self,
        _handler: &str,
        _event_type: u32,
        _payload: &[u8],
    ) -> HandleOutcome {
        HandleOutcome::failed(-1, "simulated handler failure")
    }
}

/// Runtime variant that fabricates stub instances regardless of the module
/// bytes. Useful in tests and dry-run deployments.
pub struct StubRuntime;

impl StubRuntime {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StubRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl WasmRuntime for StubRuntime {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn instantiate(
        &self,
        _wasm_bytes: &[u8],
        _ctx: HostContext,
    ) -> anyhow::Result<Arc<dyn WasmInstance>> {
        Ok(Arc::new(StubInstance::new()))
    }
}
