// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use wasmtime::{Config, Engine, Linker, Module, Store};

use crate::services::HostContext;
use crate::traits::{WasmInstance, WasmRuntime};

use super::error::{WasmError, WasmResult};
use super::host;
use super::instance::{HostState, ResourceTable, WasmtimeInstance};

pub const MAX_WASM_MODULE_SIZE: usize = 16 * 1024 * 1024;

/// The wasmtime engine variant.
///
/// One engine is shared by every instance; each instantiation gets its own
/// store, linker, and resource tables. Fuel metering bounds runaway guests:
/// the per-call budget is restored before every handler invocation.
pub struct WasmtimeRuntime {
    engine: Engine,
    fuel_per_call: u64,
}

impl WasmtimeRuntime {
    pub fn new(fuel_per_call: u64) -> WasmResult<Self> {
        Ok(Self {
            engine: Self::create_engine()?,
            fuel_per_call,
        })
    }

    fn create_engine() -> WasmResult<Engine> {
        let mut config = Config::new();

        config.wasm_threads(false);
        config.wasm_simd(false);
        config.wasm_relaxed_simd(false);
        config.wasm_multi_memory(false);
        config.wasm_memory64(false);
        config.consume_fuel(true);
        config.epoch_interruption(false);

        Engine::new(&config).map_err(|e| WasmError::EngineError(e.to_string()))
    }
}

impl WasmRuntime for WasmtimeRuntime {
    fn name(&self) -> &'static str {
        "wasmtime"
    }

    fn instantiate(
        &self,
        wasm_bytes: &[u8],
        ctx: HostContext,
    ) -> anyhow::Result<Arc<dyn WasmInstance>> {
        if wasm_bytes.len() > MAX_WASM_MODULE_SIZE {
            return Err(WasmError::ValidationError(format!(
                "WASM module too large: {} bytes (max: {} bytes)",
                wasm_bytes.len(),
                MAX_WASM_MODULE_SIZE
            ))
            .into());
        }

        let module = Module::new(&self.engine, wasm_bytes)
            .map_err(|e| WasmError::ModuleError(e.to_string()))?;

        let res = Arc::new(ResourceTable::new());
        let evs = Arc::new(ResourceTable::new());
        let state = HostState {
            ctx,
            res: res.clone(),
            evs: evs.clone(),
        };

        let mut store = Store::new(&self.engine, state);
        store
            .set_fuel(self.fuel_per_call)
            .map_err(WasmError::ExecutionError)?;

        let mut linker: Linker<HostState> = Linker::new(&self.engine);
        host::link_host_abi(&mut linker)?;

        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(WasmError::ExecutionError)?;

        Ok(Arc::new(WasmtimeInstance::new(
            store,
            instance,
            res,
            evs,
            self.fuel_per_call,
        )))
    }
}
