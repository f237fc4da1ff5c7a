// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::services::ServiceError;

/// Transaction request parsed from the `ws_send_tx` guest buffer.
#[derive(Debug, Clone, Deserialize)]
pub struct TxRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub data: String,
    #[serde(default, rename = "operatorName")]
    pub operator_name: Option<String>,
}

/// Blockchain client seam. The real client lives outside the core; the
/// contract is: submit returns a tx hash, call returns raw response bytes.
pub trait ChainClient: Send + Sync {
    fn send_tx(
        &self,
        chain_id: u32,
        tx: &TxRequest,
        operator: Option<&str>,
    ) -> Result<String, ServiceError>;

    fn call_contract(&self, chain_id: u32, to: &str, data: &str) -> Result<Vec<u8>, ServiceError>;
}

/// Named signing keys available to `ws_send_tx_with_operator`.
pub struct OperatorPool {
    keys: HashMap<String, String>,
}

pub const DEFAULT_OPERATOR: &str = "default";

impl OperatorPool {
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    pub fn with_operator(mut self, name: &str, key: &str) -> Self {
        self.keys.insert(name.to_string(), key.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.keys.get(name).map(String::as_str)
    }
}

impl Default for OperatorPool {
    fn default() -> Self {
        Self::new()
    }
}

/// A submitted transaction as seen by the recording client.
#[derive(Debug, Clone)]
pub struct SentTx {
    pub chain_id: u32,
    pub to: String,
    pub value: String,
    pub data: String,
    pub operator: Option<String>,
}

/// In-process chain client: records submissions and answers with a
/// content-derived pseudo hash. Used by tests and the demo gateway.
pub struct RecordingChainClient {
    sent: Mutex<Vec<SentTx>>,
}

impl RecordingChainClient {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.sent.lock().clone()
    }
}

impl Default for RecordingChainClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainClient for RecordingChainClient {
    fn send_tx(
        &self,
        chain_id: u32,
        tx: &TxRequest,
        operator: Option<&str>,
    ) -> Result<String, ServiceError> {
        if tx.to.is_empty() {
            return Err(ServiceError::Chain("missing 'to' address".to_string()));
        }

        self.sent.lock().push(SentTx {
            chain_id,
            to: tx.to.clone(),
            value: tx.value.clone(),
            data: tx.data.clone(),
            operator: operator.map(str::to_string),
        });

        let mut hasher = Sha256::new();
        hasher.update(chain_id.to_le_bytes());
        hasher.update(tx.to.as_bytes());
        hasher.update(tx.value.as_bytes());
        hasher.update(tx.data.as_bytes());
        let digest = hasher.finalize();

        let mut hash = String::with_capacity(2 + 64);
        hash.push_str("0x");
        for byte in digest {
            hash.push_str(&format!("{:02x}", byte));
        }
        Ok(hash)
    }

    fn call_contract(&self, _chain_id: u32, to: &str, data: &str) -> Result<Vec<u8>, ServiceError> {
        if to.is_empty() {
            return Err(ServiceError::Chain("missing 'to' address".to_string()));
        }
        Ok(data.as_bytes().to_vec())
    }
}
