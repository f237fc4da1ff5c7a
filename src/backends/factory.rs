// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::backends::stub::StubRuntime;
use crate::backends::wasm::WasmtimeRuntime;
use crate::config::RuntimeConfig;
use crate::traits::WasmRuntime;

/// Build the configured runtime variant. Selected once at startup; every
/// deploy goes through the returned handle.
pub fn build_runtime(cfg: &RuntimeConfig) -> anyhow::Result<Arc<dyn WasmRuntime>> {
    let fuel = cfg.fuel.validate_and_clamp(cfg.fuel.get_default());
    match cfg.backend {
        crate::config::RuntimeKind::Wasmtime => Ok(Arc::new(WasmtimeRuntime::new(fuel)?)),
        crate::config::RuntimeKind::Stub => Ok(Arc::new(StubRuntime::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeKind;

    #[test]
    fn builds_the_configured_variant() {
        let mut cfg = RuntimeConfig::default();
        assert_eq!(build_runtime(&cfg).unwrap().name(), "wasmtime");

        cfg.backend = RuntimeKind::Stub;
        assert_eq!(build_runtime(&cfg).unwrap().name(), "stub");
    }
}
