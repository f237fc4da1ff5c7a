// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::traits::WasmInstance;
use crate::vm::InstanceState;

/// Process-wide table of live WASM instances.
///
/// Constructed once during bring-up and shared by handle; there is no
/// ambient global. Id minting is serialized, reads take only the read lock.
pub struct InstanceRegistry {
    instances: RwLock<HashMap<u64, Arc<dyn WasmInstance>>>,
    next_id: AtomicU64,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a fresh instance and mint its id.
    pub fn add(&self, instance: Arc<dyn WasmInstance>) -> u64 {
        let id = self.reserve_id();
        self.instances.write().insert(id, instance);
        id
    }

    /// Mint an id without registering anything yet. Used by deploy so the
    /// instance's host context can carry its own id.
    pub fn reserve_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Register an instance under a persisted id (reconciliation path).
    ///
    /// The mint counter is bumped past `id` so later `add` calls stay unique.
    pub fn restore(&self, id: u64, instance: Arc<dyn WasmInstance>) {
        self.next_id.fetch_max(id + 1, Ordering::SeqCst);
        self.instances.write().insert(id, instance);
    }

    pub fn get(&self, id: u64) -> Option<Arc<dyn WasmInstance>> {
        self.instances.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }

    /// Remove an instance, driving a started instance through
    /// `Stopped -> Destroyed` first. After this returns the instance is no
    /// longer observable through the registry.
    pub fn remove(&self, id: u64) {
        let removed = self.instances.write().remove(&id);
        if let Some(instance) = removed {
            if instance.state() == InstanceState::Started {
                let _ = instance.stop();
            }
            let _ = instance.destroy();
        }
    }
}

impl Default for InstanceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
