// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for api-call broker queue processing.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Async api-call accepted onto the work queue.
///
/// # Log Level
/// `debug!` - per-call detail
pub struct ApiCallEnqueued<'a> {
    pub project_name: &'a str,
    pub url: &'a str,
}

impl Display for ApiCallEnqueued<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Enqueued api call for '{}': {}",
            self.project_name, self.url
        )
    }
}

impl StructuredLog for ApiCallEnqueued<'_> {
    fn log(&self) {
        tracing::debug!(
            project_name = self.project_name,
            url = self.url,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::DEBUG,
            "span_name",
            name = name,
            project_name = self.project_name,
            url = self.url,
        )
    }
}

/// Task abandoned: decode failure, marshal failure, or retry budget spent.
///
/// # Log Level
/// `error!` - the response is lost
pub struct ApiTaskDropped<'a> {
    pub kind: &'a str,
    pub attempt: u32,
    pub error: &'a str,
}

impl Display for ApiTaskDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dropped {} task after attempt {}: {}",
            self.kind, self.attempt, self.error
        )
    }
}

impl StructuredLog for ApiTaskDropped<'_> {
    fn log(&self) {
        tracing::error!(
            kind = self.kind,
            attempt = self.attempt,
            error = self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            kind = self.kind,
            attempt = self.attempt,
            error = self.error,
        )
    }
}

/// Transient failure; the task goes back on the queue with backoff.
///
/// # Log Level
/// `warn!` - will be retried
pub struct ApiTaskRetried<'a> {
    pub kind: &'a str,
    pub attempt: u32,
    pub error: &'a str,
}

impl Display for ApiTaskRetried<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Retrying {} task (attempt {}): {}",
            self.kind, self.attempt, self.error
        )
    }
}

impl StructuredLog for ApiTaskRetried<'_> {
    fn log(&self) {
        tracing::warn!(
            kind = self.kind,
            attempt = self.attempt,
            error = self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::WARN,
            "span_name",
            name = name,
            kind = self.kind,
            attempt = self.attempt,
            error = self.error,
        )
    }
}

/// Captured HTTP response re-entered the dispatcher as a synthetic event.
///
/// # Log Level
/// `info!` - completes the async api-call round trip
pub struct ApiResultDispatched<'a> {
    pub project_name: &'a str,
    pub event_type: u32,
}

impl Display for ApiResultDispatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dispatched api result on '{}' as event type {}",
            self.project_name, self.event_type
        )
    }
}

impl StructuredLog for ApiResultDispatched<'_> {
    fn log(&self) {
        tracing::info!(
            project_name = self.project_name,
            event_type = self.event_type,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            project_name = self.project_name,
            event_type = self.event_type,
        )
    }
}
