// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::LifecycleError;
use crate::vm::InstanceState;

/// Outcome of a single handler invocation.
///
/// `code` follows the guest contract: 0 is success, negative values are
/// host-side failures, positive values are passed through from the guest
/// untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleOutcome {
    pub code: i32,
    pub err_msg: Option<String>,
}

impl HandleOutcome {
    pub fn ok(code: i32) -> Self {
        Self {
            code,
            err_msg: None,
        }
    }

    pub fn failed(code: i32, msg: impl Into<String>) -> Self {
        Self {
            code,
            err_msg: Some(msg.into()),
        }
    }
}

/// A live WASM execution context.
///
/// Implementations own their linear memory and must serialize `handle_event`
/// invocations internally: two concurrent calls on the same instance never
/// interleave memory access.
#[async_trait]
pub trait WasmInstance: Send + Sync {
    fn state(&self) -> InstanceState;

    fn start(&self) -> Result<(), LifecycleError>;

    fn stop(&self) -> Result<(), LifecycleError>;

    /// Release the execution context. From `Started` this stops first.
    fn destroy(&self) -> Result<(), LifecycleError>;

    /// Invoke the named exported handler with the event payload.
    ///
    /// Legal only in `Started`; any other state yields a failure outcome,
    /// never a panic. A guest trap is reported in the outcome and leaves the
    /// instance usable.
    async fn handle_event(&self, handler: &str, event_type: u32, payload: &[u8]) -> HandleOutcome;
}
