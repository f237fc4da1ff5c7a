// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for instance lifecycle events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Instance deployed and registered.
///
/// # Log Level
/// `info!` - important operational event
pub struct InstanceDeployed<'a> {
    pub instance_id: u64,
    pub applet_id: u64,
    pub runtime: &'a str,
}

impl Display for InstanceDeployed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Deployed instance {} for applet {} on {} runtime",
            self.instance_id, self.applet_id, self.runtime
        )
    }
}

impl StructuredLog for InstanceDeployed<'_> {
    fn log(&self) {
        tracing::info!(
            instance_id = self.instance_id,
            applet_id = self.applet_id,
            runtime = self.runtime,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            instance_id = self.instance_id,
            applet_id = self.applet_id,
            runtime = self.runtime,
        )
    }
}

/// Instance destroyed and unregistered.
///
/// # Log Level
/// `info!` - important operational event
pub struct InstanceRemoved {
    pub instance_id: u64,
}

impl Display for InstanceRemoved {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Removed instance {}", self.instance_id)
    }
}

impl StructuredLog for InstanceRemoved {
    fn log(&self) {
        tracing::info!(instance_id = self.instance_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            instance_id = self.instance_id,
        )
    }
}

/// Bring-up reconciliation against persisted desired state finished.
///
/// # Log Level
/// `info!` - important operational event
pub struct ReconcileCompleted {
    pub total: usize,
    pub started: usize,
}

impl Display for ReconcileCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Reconciled {} persisted instances ({} started)",
            self.total, self.started
        )
    }
}

impl StructuredLog for ReconcileCompleted {
    fn log(&self) {
        tracing::info!(total = self.total, started = self.started, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            total = self.total,
            started = self.started,
        )
    }
}
