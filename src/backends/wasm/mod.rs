// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wasmtime-backed runtime variant.
//!
//! Modules are core WASM with C-style exports: a `memory`, an `alloc`
//! function for host-to-guest transfers, and one exported function per
//! handler taking the resource id of the event payload. Host imports live
//! under the `env` module (plus `stat` for metrics), as enumerated in
//! [`host`].

mod error;
mod host;
mod instance;
mod runtime;

pub use error::{WasmError, WasmResult};
pub use instance::{ResourceTable, WasmtimeInstance};
pub use runtime::{WasmtimeRuntime, MAX_WASM_MODULE_SIZE};
