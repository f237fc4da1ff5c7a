// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default per-call fuel budget (100M instructions).
pub const DEFAULT_FUEL_LEVEL: u64 = 100_000_000;

/// Smallest configurable fuel budget.
pub const MIN_FUEL_LEVEL: u64 = 1_000_000;

/// Hard ceiling on the fuel budget.
pub const MAX_FUEL_LEVEL: u64 = 500_000_000;

/// Default number of broker worker tasks.
pub const DEFAULT_BROKER_WORKERS: usize = 2;

/// Default delivery attempts before a retryable broker task is dropped.
pub const DEFAULT_BROKER_MAX_ATTEMPTS: u32 = 5;
