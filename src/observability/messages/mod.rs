// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging and tracing.
//!
//! Each message type implements:
//!
//! * `Display` - human-readable output
//! * [`StructuredLog`] - machine-readable fields + span creation
//!
//! Call sites build the message struct and either format it into an ad-hoc
//! event (`tracing::info!("{}", msg)`) or emit it with fields attached
//! (`msg.log()`).

pub mod broker;
pub mod dispatch;
pub mod vm;

use tracing::Span;

/// Messages that support structured logging and span creation.
pub trait StructuredLog {
    /// Emit a log event carrying both the `Display` text and the message's
    /// fields. The level is fixed by the message type's meaning.
    fn log(&self);

    /// Create a span with this message's fields as attributes.
    fn span(&self, name: &str) -> Span;
}
