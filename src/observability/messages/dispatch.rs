// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for event authentication and dispatch.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Event rejected before any handler ran.
///
/// # Log Level
/// `warn!` - expected under misconfigured or hostile publishers
pub struct EventAuthFailed<'a> {
    pub project_name: &'a str,
    pub reason: &'a str,
}

impl Display for EventAuthFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Rejected event on project '{}': {}",
            self.project_name, self.reason
        )
    }
}

impl StructuredLog for EventAuthFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            project_name = self.project_name,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::WARN,
            "span_name",
            name = name,
            project_name = self.project_name,
            reason = self.reason,
        )
    }
}

/// Strategy resolution finished for an event.
///
/// # Log Level
/// `debug!` - per-event detail
pub struct StrategiesMatched<'a> {
    pub project_name: &'a str,
    pub event_type: u32,
    pub matched: usize,
}

impl Display for StrategiesMatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Matched {} strategies for ({}, {})",
            self.matched, self.project_name, self.event_type
        )
    }
}

impl StructuredLog for StrategiesMatched<'_> {
    fn log(&self) {
        tracing::debug!(
            project_name = self.project_name,
            event_type = self.event_type,
            matched = self.matched,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::DEBUG,
            "span_name",
            name = name,
            project_name = self.project_name,
            event_type = self.event_type,
            matched = self.matched,
        )
    }
}

/// All handler tasks for an event joined.
///
/// # Log Level
/// `info!` - important operational event
pub struct EventDispatched<'a> {
    pub project_name: &'a str,
    pub event_id: &'a str,
    pub handlers: usize,
}

impl Display for EventDispatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dispatched event '{}' on '{}' to {} handlers",
            self.event_id, self.project_name, self.handlers
        )
    }
}

impl StructuredLog for EventDispatched<'_> {
    fn log(&self) {
        tracing::info!(
            project_name = self.project_name,
            event_id = self.event_id,
            handlers = self.handlers,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            project_name = self.project_name,
            event_id = self.event_id,
            handlers = self.handlers,
        )
    }
}
