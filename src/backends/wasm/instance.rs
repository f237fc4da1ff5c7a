// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use wasmtime::{Instance, Store};

use crate::errors::LifecycleError;
use crate::services::{HostContext, LogLevel, WasmLogEntry};
use crate::traits::{HandleOutcome, WasmInstance};
use crate::vm::{InstanceState, StateCell};

/// Small-integer resource table private to one instance.
///
/// Event payloads are parked here for the duration of a handler call; the
/// guest addresses them through `ws_get_data`/`ws_set_data` by rid. Rids are
/// minted from 0 upward per instance.
pub struct ResourceTable {
    entries: Mutex<HashMap<u32, Vec<u8>>>,
    next: AtomicU32,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next: AtomicU32::new(0),
        }
    }

    pub fn load(&self, rid: u32) -> Option<Vec<u8>> {
        self.entries.lock().get(&rid).cloned()
    }

    /// Replace-or-create under an explicit rid.
    pub fn store(&self, rid: u32, bytes: Vec<u8>) {
        self.entries.lock().insert(rid, bytes);
    }

    /// Park `bytes` under a freshly minted rid.
    pub fn put(&self, bytes: Vec<u8>) -> u32 {
        let rid = self.next.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().insert(rid, bytes);
        rid
    }

    pub fn remove(&self, rid: u32) {
        self.entries.lock().remove(&rid);
    }
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Store data visible to every host ABI function via `Caller::data`.
pub(crate) struct HostState {
    pub ctx: HostContext,
    pub res: Arc<ResourceTable>,
    pub evs: Arc<ResourceTable>,
}

impl HostState {
    /// Persist a log record through the project log store and mirror it to
    /// the process tracing sink.
    pub fn log(&self, level: LogLevel, src: &str, body: impl Into<String>) {
        let body = body.into();
        match level {
            LogLevel::Trace => tracing::trace!(src, "{}", body),
            LogLevel::Debug => tracing::debug!(src, "{}", body),
            LogLevel::Info => tracing::info!(src, "{}", body),
            LogLevel::Warn => tracing::warn!(src, "{}", body),
            LogLevel::Error => tracing::error!(src, "{}", body),
        }
        let _ = self.ctx.wasm_logs.append(WasmLogEntry {
            project_name: self.ctx.project.name.clone(),
            instance_id: self.ctx.instance_id,
            level,
            src: src.to_string(),
            body,
        });
    }
}

struct StoreCtx {
    store: Store<HostState>,
    instance: Instance,
}

/// A live wasmtime execution context.
///
/// The store mutex serializes handler invocations: one instance's linear
/// memory is never entered concurrently. The mutex is held only across the
/// synchronous guest call, never across an await point.
pub struct WasmtimeInstance {
    state: StateCell,
    res: Arc<ResourceTable>,
    evs: Arc<ResourceTable>,
    inner: Mutex<StoreCtx>,
    fuel_per_call: u64,
}

impl WasmtimeInstance {
    pub(crate) fn new(
        store: Store<HostState>,
        instance: Instance,
        res: Arc<ResourceTable>,
        evs: Arc<ResourceTable>,
        fuel_per_call: u64,
    ) -> Self {
        Self {
            state: StateCell::new(),
            res,
            evs,
            inner: Mutex::new(StoreCtx { store, instance }),
            fuel_per_call,
        }
    }
}

#[async_trait::async_trait]
impl WasmInstance for WasmtimeInstance {
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

        let rid = self.res.put(payload.to_vec());
        self.evs.store(rid, event_type.to_string().into_bytes());

        let outcome = {
            let mut inner = self.inner.lock();
            let StoreCtx { store, instance } = &mut *inner;

            if let Err(e) = store.set_fuel(self.fuel_per_call) {
                HandleOutcome::failed(-1, format!("fuel reset failed: {}", e))
            } else {
                match instance.get_typed_func::<i32, i32>(&mut *store, handler) {
                    Err(_) => {
                        HandleOutcome::failed(-1, format!("handler '{}' not exported", handler))
                    }
                    Ok(func) => match func.call(&mut *store, rid as i32) {
                        Ok(code) => {
                            let consumed =
                                self.fuel_per_call - store.get_fuel().unwrap_or(0);
                            tracing::debug!(
                                handler,
                                rid,
                                fuel_consumed = consumed,
                                "handler returned {}",
                                code
                            );
                            HandleOutcome::ok(code)
                        }
                        // A trap poisons the call, not the instance.
                        Err(e) => HandleOutcome::failed(-1, format!("{:#}", e)),
                    },
                }
            }
        };

        self.res.remove(rid);
        self.evs.remove(rid);
        outcome
    }
}
