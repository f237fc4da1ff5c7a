// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Read views over the persisted stores the core consumes.
//!
//! Projects, applets, publishers, and desired instance state are owned by an
//! external relational store; the core only ever sees these typed views.
//! The in-memory implementations back the demo loader and the test suites.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Read view of a project, the tenant boundary.
#[derive(Debug, Clone)]
pub struct ProjectView {
    pub project_id: u64,
    pub name: String,
    pub issuer: String,
    /// Token lifetime in seconds.
    pub exp_in: u64,
    pub sign_key: String,
    /// Per-project SQL database name, when one is provisioned.
    pub database: Option<String>,
}

/// Read view of a credentialed event publisher.
#[derive(Debug, Clone)]
pub struct PublisherView {
    pub publisher_id: u64,
    pub project_id: u64,
    /// The key carried in the event header's `pub_id` field.
    pub pub_key: String,
    pub name: String,
}

/// Read view of a WASM module bound to a project.
#[derive(Debug, Clone)]
pub struct AppletView {
    pub applet_id: u64,
    pub project_id: u64,
    pub name: String,
    pub wasm_bytes: Arc<Vec<u8>>,
}

/// Desired lifecycle state persisted for an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesiredState {
    Started,
    Stopped,
}

/// Persisted `{instance, applet, desired_state}` row consumed at bring-up.
#[derive(Debug, Clone)]
pub struct DesiredInstanceRow {
    pub instance_id: u64,
    pub applet_id: u64,
    pub desired: DesiredState,
}

pub trait ProjectStore: Send + Sync {
    fn get_by_name(&self, name: &str) -> Option<ProjectView>;
}

pub trait PublisherStore: Send + Sync {
    fn get_by_pub_key(&self, pub_key: &str, project_name: &str) -> Option<PublisherView>;
}

pub trait AppletStore: Send + Sync {
    fn get(&self, applet_id: u64) -> Option<AppletView>;
}

pub trait InstanceStateStore: Send + Sync {
    fn desired(&self) -> Vec<DesiredInstanceRow>;
}

/// In-memory project table.
pub struct MemoryProjectStore {
    by_name: RwLock<HashMap<String, ProjectView>>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self {
            by_name: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, project: ProjectView) {
        self.by_name.write().insert(project.name.clone(), project);
    }
}

impl Default for MemoryProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectStore for MemoryProjectStore {
    fn get_by_name(&self, name: &str) -> Option<ProjectView> {
        self.by_name.read().get(name).cloned()
    }
}

/// In-memory publisher table keyed by `(pub_key, project_name)`.
pub struct MemoryPublisherStore {
    rows: RwLock<HashMap<(String, String), PublisherView>>,
}

impl MemoryPublisherStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, project_name: &str, publisher: PublisherView) {
        self.rows.write().insert(
            (publisher.pub_key.clone(), project_name.to_string()),
            publisher,
        );
    }
}

impl Default for MemoryPublisherStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PublisherStore for MemoryPublisherStore {
    fn get_by_pub_key(&self, pub_key: &str, project_name: &str) -> Option<PublisherView> {
        self.rows
            .read()
            .get(&(pub_key.to_string(), project_name.to_string()))
            .cloned()
    }
}

/// In-memory applet table.
pub struct MemoryAppletStore {
    rows: RwLock<HashMap<u64, AppletView>>,
}

impl MemoryAppletStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, applet: AppletView) {
        self.rows.write().insert(applet.applet_id, applet);
    }
}

impl Default for MemoryAppletStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AppletStore for MemoryAppletStore {
    fn get(&self, applet_id: u64) -> Option<AppletView> {
        self.rows.read().get(&applet_id).cloned()
    }
}

/// In-memory desired-state table.
pub struct MemoryInstanceStateStore {
    rows: RwLock<Vec<DesiredInstanceRow>>,
}

impl MemoryInstanceStateStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }

    pub fn insert(&self, row: DesiredInstanceRow) {
        self.rows.write().push(row);
    }
}

impl Default for MemoryInstanceStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceStateStore for MemoryInstanceStateStore {
    fn desired(&self) -> Vec<DesiredInstanceRow> {
        self.rows.read().clone()
    }
}
