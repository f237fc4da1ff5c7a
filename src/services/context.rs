// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::broker::ApiServer;
use crate::model::ProjectView;
use crate::services::{
    ChainClient, EnvStore, KvStore, MetricsSink, MqttPublisher, OperatorPool, SeedSource,
    SqlStore, WasmLogStore,
};

/// Everything a host ABI call may touch, bundled explicitly.
///
/// One context is built per instance at deploy time and rides in the
/// instance's store; there is no hidden thread-local state. Optional fields
/// mirror project provisioning: a project without a database gets
/// `NoDbContext` from the SQL imports, one without a chain client gets
/// `Failed` from the tx imports, and so on.
#[derive(Clone)]
pub struct HostContext {
    pub project: ProjectView,
    /// Registry id of the owning instance; assigned during deploy.
    pub instance_id: u64,
    pub env: Arc<EnvStore>,
    pub kv: Arc<dyn KvStore>,
    pub sql: Option<Arc<SqlStore>>,
    pub chain: Option<Arc<dyn ChainClient>>,
    pub operators: Arc<OperatorPool>,
    pub mqtt: Option<Arc<dyn MqttPublisher>>,
    pub metrics: Arc<dyn MetricsSink>,
    pub wasm_logs: Arc<dyn WasmLogStore>,
    pub api: Arc<dyn ApiServer>,
    pub seed: Arc<SeedSource>,
    pub cancel: CancellationToken,
}

#[cfg(test)]
impl HostContext {
    /// Minimal context over in-memory services.
    pub fn for_tests(project_name: &str) -> Self {
        use crate::broker::{ApiBroker, MemoryTaskQueue, Router};
        use crate::services::{MemoryKvStore, MemoryMetricsSink, MemoryWasmLogStore};

        Self {
            project: ProjectView {
                project_id: 1,
                name: project_name.to_string(),
                issuer: "wasmgate".to_string(),
                exp_in: 3600,
                sign_key: "test-sign-key".to_string(),
                database: None,
            },
            instance_id: 0,
            env: Arc::new(EnvStore::empty()),
            kv: Arc::new(MemoryKvStore::new()),
            sql: None,
            chain: None,
            operators: Arc::new(OperatorPool::new()),
            mqtt: None,
            metrics: Arc::new(MemoryMetricsSink::new()),
            wasm_logs: Arc::new(MemoryWasmLogStore::new()),
            api: Arc::new(ApiBroker::new(
                Arc::new(MemoryTaskQueue::new()),
                Arc::new(Router::new()),
            )),
            seed: Arc::new(SeedSource::with_seed(42)),
            cancel: CancellationToken::new(),
        }
    }
}
