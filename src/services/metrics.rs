// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::Mutex;

use crate::services::ServiceError;

/// Custom-metrics collector seam for `ws_submit_metrics`. Validation of the
/// submitted JSON happens at the ABI boundary; the sink receives parsed
/// objects only.
pub trait MetricsSink: Send + Sync {
    fn submit(&self, project_name: &str, object: &serde_json::Value) -> Result<(), ServiceError>;
}

pub struct MemoryMetricsSink {
    submitted: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MemoryMetricsSink {
    pub fn new() -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn submitted(&self) -> Vec<(String, serde_json::Value)> {
        self.submitted.lock().clone()
    }
}

impl Default for MemoryMetricsSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink for MemoryMetricsSink {
    fn submit(&self, project_name: &str, object: &serde_json::Value) -> Result<(), ServiceError> {
        self.submitted
            .lock()
            .push((project_name.to_string(), object.clone()));
        Ok(())
    }
}
