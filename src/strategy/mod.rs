// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Mapping from `(project, event_type)` to the handlers that should run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::event::EVENT_TYPE_ANY;

/// One resolved routing target: which instance, which exported handler.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceHandler {
    pub project_name: String,
    pub applet_id: u64,
    pub applet_name: String,
    pub instance_id: u64,
    pub handler: String,
    pub event_type: u32,
}

/// Registered strategy rows, grouped by project.
///
/// Every write bumps the generation counter, which invalidates resolver
/// caches built against older generations.
pub struct StrategyStore {
    rows: RwLock<HashMap<String, Vec<InstanceHandler>>>,
    generation: AtomicU64,
}

impl StrategyStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn add(&self, row: InstanceHandler) {
        self.rows
            .write()
            .entry(row.project_name.clone())
            .or_default()
            .push(row);
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Drop every strategy routing to `instance_id` (instance destroyed).
    pub fn remove_instance(&self, instance_id: u64) {
        let mut rows = self.rows.write();
        for handlers in rows.values_mut() {
            handlers.retain(|h| h.instance_id != instance_id);
        }
        self.generation.fetch_add(1, Ordering::Release);
    }

    fn matching(&self, project_name: &str, event_type: u32) -> Vec<InstanceHandler> {
        self.rows
            .read()
            .get(project_name)
            .map(|handlers| {
                handlers
                    .iter()
                    .filter(|h| h.event_type == event_type || h.event_type == EVENT_TYPE_ANY)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for StrategyStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Side-effect-free strategy lookup with a generation-stamped cache.
pub struct StrategyResolver {
    store: Arc<StrategyStore>,
    cache: Mutex<HashMap<(String, u32), (u64, Arc<Vec<InstanceHandler>>)>>,
}

impl StrategyResolver {
    pub fn new(store: Arc<StrategyStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn resolve(&self, project_name: &str, event_type: u32) -> Arc<Vec<InstanceHandler>> {
        let generation = self.store.generation();
        let key = (project_name.to_string(), event_type);

        {
            let cache = self.cache.lock();
            if let Some((cached_gen, handlers)) = cache.get(&key) {
                if *cached_gen == generation {
                    return handlers.clone();
                }
            }
        }

        let handlers = Arc::new(self.store.matching(project_name, event_type));
        self.cache
            .lock()
            .insert(key, (generation, handlers.clone()));
        handlers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(project: &str, event_type: u32, instance_id: u64, handler: &str) -> InstanceHandler {
        InstanceHandler {
            project_name: project.to_string(),
            applet_id: 1,
            applet_name: "applet".to_string(),
            instance_id,
            handler: handler.to_string(),
            event_type,
        }
    }

    #[test]
    fn exact_type_matches_only_itself() {
        let store = Arc::new(StrategyStore::new());
        store.add(row("p", 7, 1, "on_seven"));
        let resolver = StrategyResolver::new(store);

        assert_eq!(resolver.resolve("p", 7).len(), 1);
        assert!(resolver.resolve("p", 9).is_empty());
        assert!(resolver.resolve("other", 7).is_empty());
    }

    #[test]
    fn any_strategy_matches_every_type()  {
        let store = Arc::new(StrategyStore::new());
        store.add(row("p", EVENT_TYPE_ANY, 1, "start"));
        let resolver = StrategyResolver::new(store);

        assert_eq!(resolver.resolve("p", 7).len(), 1);
        assert_eq!(resolver.resolve("p", EVENT_TYPE_ANY).len(), 1);
        assert_eq!(resolver.resolve("p", 0).len(), 1);
    }

    #[test]
    fn writes_invalidate_cached_results() {
        let store = Arc::new(StrategyStore::new());
        store.add(row("p", 7, 1, "first"));
        let resolver = StrategyResolver::new(store.clone());

        assert_eq!(resolver.resolve("p", 7).len(), 1);

        store.add(row("p", 7, 2, "second"));
        assert_eq!(resolver.resolve("p", 7).len(), 2);

        store.remove_instance(1);
        assert_eq!(resolver.resolve("p", 7).len(), 1);
    }

    #[test]
    fn both_exact_and_any_strategies_match() {
        let store = Arc::new(StrategyStore::new());
        store.add(row("p", 7, 1, "on_seven"));
        store.add(row("p", EVENT_TYPE_ANY, 2, "catch_all"));
        let resolver = StrategyResolver::new(store);

        let matched = resolver.resolve("p", 7);
        assert_eq!(matched.len(), 2);
        let matched = resolver.resolve("p", 8);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].handler, "catch_all");
    }
}
