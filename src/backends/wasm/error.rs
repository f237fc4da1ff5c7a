// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WasmError {
    #[error("Engine error: {0}")]
    EngineError(String),

    #[error("WASM module error: {0}")]
    ModuleError(String),

    #[error("Memory error: {0}")]
    MemoryError(String),

    #[error("Missing export: {0}")]
    MissingExport(String),

    #[error("Invalid input: {0}")]
    ValidationError(String),

    #[error("WASM execution error: {0}")]
    ExecutionError(#[from] wasmtime::Error),
}

pub type WasmResult<T> = Result<T, WasmError>;
