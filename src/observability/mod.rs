// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Message types follow a struct-based pattern with `Display` plus a
//! `StructuredLog` implementation, keeping log text out of the call sites
//! and fields machine-readable. Messages are organized by subsystem:
//!
//! * `messages::dispatch` - event authentication and fan-out
//! * `messages::vm` - instance lifecycle and reconciliation
//! * `messages::broker` - api-call queue processing

pub mod messages;
