// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Host-side collaborators exposed to guest code through the ABI.
//!
//! Each service is shared across all instances of a project and owns its
//! internal locking. The chain client, MQTT client, and metrics collector
//! are external systems; they appear here as seams with recording in-process
//! implementations.

mod chain;
mod context;
mod env;
mod kv;
mod logs;
mod metrics;
mod mqtt;
mod seed;
mod sql;

pub use chain::{ChainClient, OperatorPool, RecordingChainClient, SentTx, TxRequest};
pub use context::HostContext;
pub use env::EnvStore;
pub use kv::{KvStore, MemoryKvStore};
pub use logs::{LogLevel, MemoryWasmLogStore, WasmLogEntry, WasmLogStore};
pub use metrics::{MemoryMetricsSink, MetricsSink};
pub use mqtt::{MqttPublisher, RecordingMqttPublisher};
pub use seed::SeedSource;
pub use sql::{QueryEnvelope, SqlStore};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("sql error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("malformed envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("unsupported parameter: {0}")]
    UnsupportedParam(String),

    #[error("chain error: {0}")]
    Chain(String),

    #[error("mqtt error: {0}")]
    Mqtt(String),

    #[error("metrics error: {0}")]
    Metrics(String),
}
