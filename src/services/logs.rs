// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::Mutex;

use crate::services::ServiceError;

/// Severity carried by `ws_log`. Unknown values map to `Trace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn from_i32(v: i32) -> Self {
        match v {
            1 => LogLevel::Debug,
            2 => LogLevel::Info,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            _ => LogLevel::Trace,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// One persisted guest log record.
#[derive(Debug, Clone)]
pub struct WasmLogEntry {
    pub project_name: String,
    pub instance_id: u64,
    pub level: LogLevel,
    /// Origin of the record: guest code or a host ABI function.
    pub src: String,
    pub body: String,
}

/// Persistence seam for guest log records. Records are also forwarded to the
/// process tracing sink by the ABI layer.
pub trait WasmLogStore: Send + Sync {
    fn append(&self, entry: WasmLogEntry) -> Result<(), ServiceError>;
}

pub struct MemoryWasmLogStore {
    entries: Mutex<Vec<WasmLogEntry>>,
}

impl MemoryWasmLogStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<WasmLogEntry> {
        self.entries.lock().clone()
    }
}

impl Default for MemoryWasmLogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WasmLogStore for MemoryWasmLogStore {
    fn append(&self, entry: WasmLogEntry) -> Result<(), ServiceError> {
        self.entries.lock().push(entry);
        Ok(())
    }
}
