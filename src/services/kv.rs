// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::services::ServiceError;

/// Project-scoped key/value store. Values are opaque bytes.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), ServiceError>;
}

/// In-process KV store backing tests and the demo gateway.
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), ServiceError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let store = MemoryKvStore::new();
        store.set("k", b"v".to_vec()).unwrap();
        assert_eq!(store.get("k"), Some(b"v".to_vec()));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn set_replaces_existing_value() {
        let store = MemoryKvStore::new();
        store.set("k", b"one".to_vec()).unwrap();
        store.set("k", b"two".to_vec()).unwrap();
        assert_eq!(store.get("k"), Some(b"two".to_vec()));
    }
}
