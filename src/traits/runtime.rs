// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::services::HostContext;
use crate::traits::WasmInstance;

/// A WASM engine variant.
///
/// The core stays agnostic to the concrete engine: a runtime is the
/// capability to turn module bytes plus a host context into a live instance.
/// Variants are selected once at startup by the backend factory.
pub trait WasmRuntime: Send + Sync {
    fn name(&self) -> &'static str;

    /// Compile `wasm_bytes`, link the host ABI against `ctx`, and produce an
    /// instance in the `Created` state.
    fn instantiate(
        &self,
        wasm_bytes: &[u8],
        ctx: HostContext,
    ) -> anyhow::Result<Arc<dyn WasmInstance>>;
}
