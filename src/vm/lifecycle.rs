// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Deploy / start / stop / destroy of WASM instances, and reconciliation of
//! the registry against persisted desired state at bring-up.

use std::sync::Arc;

use crate::errors::LifecycleError;
use crate::model::{AppletStore, AppletView, DesiredState, InstanceStateStore};
use crate::observability::messages::vm::{InstanceDeployed, InstanceRemoved, ReconcileCompleted};
use crate::observability::messages::StructuredLog;
use crate::services::HostContext;
use crate::traits::WasmRuntime;
use crate::vm::InstanceRegistry;

/// Management entry points for instance lifecycle.
///
/// Fatal conditions (unknown applet, compile failure) surface here as
/// `LifecycleError`; the event dispatcher never sees them.
pub struct LifecycleController {
    registry: Arc<InstanceRegistry>,
    runtime: Arc<dyn WasmRuntime>,
    applets: Arc<dyn AppletStore>,
}

impl LifecycleController {
    pub fn new(
        registry: Arc<InstanceRegistry>,
        runtime: Arc<dyn WasmRuntime>,
        applets: Arc<dyn AppletStore>,
    ) -> Self {
        Self {
            registry,
            runtime,
            applets,
        }
    }

    /// Instantiate the applet's module and register it in `Created`.
    pub fn deploy(&self, applet_id: u64, mut ctx: HostContext) -> Result<u64, LifecycleError> {
        let applet = self
            .applets
            .get(applet_id)
            .ok_or(LifecycleError::AppletNotFound(applet_id))?;

        let instance_id = self.registry.reserve_id();
        ctx.instance_id = instance_id;
        let instance = self.instantiate(&applet, ctx)?;
        self.registry.restore(instance_id, instance);

        InstanceDeployed {
            instance_id,
            applet_id,
            runtime: self.runtime.name(),
        }
        .log();

        Ok(instance_id)
    }

    pub fn start(&self, instance_id: u64) -> Result<(), LifecycleError> {
        self.registry
            .get(instance_id)
            .ok_or(LifecycleError::InstanceNotFound(instance_id))?
            .start()
    }

    pub fn stop(&self, instance_id: u64) -> Result<(), LifecycleError> {
        self.registry
            .get(instance_id)
            .ok_or(LifecycleError::InstanceNotFound(instance_id))?
            .stop()
    }

    /// Unregister the instance and release its runtime handle. A started
    /// instance is stopped first.
    pub fn destroy(&self, instance_id: u64) -> Result<(), LifecycleError> {
        if self.registry.get(instance_id).is_none() {
            return Err(LifecycleError::InstanceNotFound(instance_id));
        }
        self.registry.remove(instance_id);
        InstanceRemoved { instance_id }.log();
        Ok(())
    }

    /// Drive every persisted `{instance, applet, desired_state}` row to its
    /// desired state. Failures are collected per row, not fatal to the rest.
    pub fn reconcile<F>(
        &self,
        desired: &dyn InstanceStateStore,
        make_ctx: F,
    ) -> Vec<(u64, Result<(), LifecycleError>)>
    where
        F: Fn(&AppletView) -> HostContext,
    {
        let rows = desired.desired();
        let mut results = Vec::with_capacity(rows.len());
        let mut started = 0usize;

        for row in rows {
            let outcome = self.reconcile_row(row.instance_id, row.applet_id, row.desired, &make_ctx);
            if outcome.is_ok() && row.desired == DesiredState::Started {
                started += 1;
            }
            results.push((row.instance_id, outcome));
        }

        ReconcileCompleted {
            total: results.len(),
            started,
        }
        .log();

        results
    }

    fn reconcile_row<F>(
        &self,
        instance_id: u64,
        applet_id: u64,
        desired: DesiredState,
        make_ctx: &F,
    ) -> Result<(), LifecycleError>
    where
        F: Fn(&AppletView) -> HostContext,
    {
        if self.registry.get(instance_id).is_none() {
            let applet = self
                .applets
                .get(applet_id)
                .ok_or(LifecycleError::AppletNotFound(applet_id))?;
            let mut ctx = make_ctx(&applet);
            ctx.instance_id = instance_id;
            let instance = self.instantiate(&applet, ctx)?;
            self.registry.restore(instance_id, instance);
        }

        match desired {
            DesiredState::Started => self.start(instance_id),
            DesiredState::Stopped => {
                // A freshly restored instance is Created; Created is already
                // "not running", so only a started instance needs the stop.
                let instance = self
                    .registry
                    .get(instance_id)
                    .ok_or(LifecycleError::InstanceNotFound(instance_id))?;
                if instance.state() == crate::vm::InstanceState::Started {
                    instance.stop()
                } else {
                    Ok(())
                }
            }
        }
    }

    fn instantiate(
        &self,
        applet: &AppletView,
        ctx: HostContext,
    ) -> Result<Arc<dyn crate::traits::WasmInstance>, LifecycleError> {
        self.runtime
            .instantiate(&applet.wasm_bytes, ctx)
            .map_err(|e| LifecycleError::RuntimeFailed {
                applet_id: applet.applet_id,
                error: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubRuntime;
    use crate::model::{DesiredInstanceRow, MemoryAppletStore, MemoryInstanceStateStore};
    use crate::services::HostContext;
    use crate::vm::InstanceState;

    fn fixture() -> (LifecycleController, Arc<InstanceRegistry>, Arc<MemoryAppletStore>) {
        let registry = Arc::new(InstanceRegistry::new());
        let applets = Arc::new(MemoryAppletStore::new());
        applets.insert(AppletView {
            applet_id: 7,
            project_id: 1,
            name: "demo".to_string(),
            wasm_bytes: Arc::new(vec![]),
        });
        let controller = LifecycleController::new(
            registry.clone(),
            Arc::new(StubRuntime::new()),
            applets.clone(),
        );
        (controller, registry, applets)
    }

    #[test]
    fn deploy_registers_created_instance() {
        let (controller, registry, _) = fixture();
        let id = controller.deploy(7, HostContext::for_tests("proj")).unwrap();
        let instance = registry.get(id).unwrap();
        assert_eq!(instance.state(), InstanceState::Created);
    }

    #[test]
    fn deploy_unknown_applet_fails() {
        let (controller, _, _) = fixture();
        assert!(matches!(
            controller.deploy(999, HostContext::for_tests("proj")),
            Err(LifecycleError::AppletNotFound(999))
        ));
    }

    #[test]
    fn full_lifecycle_round_trip() {
        let (controller, registry, _) = fixture();
        let id = controller.deploy(7, HostContext::for_tests("proj")).unwrap();

        controller.start(id).unwrap();
        assert_eq!(registry.get(id).unwrap().state(), InstanceState::Started);

        controller.stop(id).unwrap();
        assert_eq!(registry.get(id).unwrap().state(), InstanceState::Stopped);

        controller.destroy(id).unwrap();
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn destroy_from_started_stops_first() {
        let (controller, registry, _) = fixture();
        let id = controller.deploy(7, HostContext::for_tests("proj")).unwrap();
        controller.start(id).unwrap();
        let instance = registry.get(id).unwrap();

        controller.destroy(id).unwrap();
        assert_eq!(instance.state(), InstanceState::Destroyed);
    }

    #[test]
    fn reconcile_restores_persisted_instances() {
        let (controller, registry, _) = fixture();
        let desired = MemoryInstanceStateStore::new();
        desired.insert(DesiredInstanceRow {
            instance_id: 100,
            applet_id: 7,
            desired: DesiredState::Started,
        });
        desired.insert(DesiredInstanceRow {
            instance_id: 101,
            applet_id: 7,
            desired: DesiredState::Stopped,
        });

        let results = controller.reconcile(&desired, |_| HostContext::for_tests("proj"));

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        assert_eq!(registry.get(100).unwrap().state(), InstanceState::Started);
        assert_eq!(registry.get(101).unwrap().state(), InstanceState::Created);
    }

    #[test]
    fn reconcile_reports_missing_applets() {
        let (controller, _, _) = fixture();
        let desired = MemoryInstanceStateStore::new();
        desired.insert(DesiredInstanceRow {
            instance_id: 100,
            applet_id: 999,
            desired: DesiredState::Started,
        });

        let results = controller.reconcile(&desired, |_| HostContext::for_tests("proj"));
        assert!(matches!(
            results[0].1,
            Err(LifecycleError::AppletNotFound(999))
        ));
    }
}
