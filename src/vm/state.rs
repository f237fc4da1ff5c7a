// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::Mutex;

use crate::errors::LifecycleError;

/// Lifecycle states of a WASM instance.
///
/// Transitions: `Created -> Started`, `Started -> Stopped`,
/// `Stopped -> Started`, `{Created, Stopped} -> Destroyed`. A destroyed
/// instance admits no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Created,
    Started,
    Stopped,
    Destroyed,
}

/// Shared state-machine cell used by every instance backend.
///
/// `start` and `stop` are idempotent in their target state; anything outside
/// the transition table is an `InvalidTransition`.
pub struct StateCell {
    state: Mutex<InstanceState>,
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InstanceState::Created),
        }
    }

    pub fn get(&self) -> InstanceState {
        *self.state.lock()
    }

    pub fn start(&self) -> Result<(), LifecycleError> {
        let mut state = self.state.lock();
        match *state {
            InstanceState::Created | InstanceState::Stopped => {
                *state = InstanceState::Started;
                Ok(())
            }
            InstanceState::Started => Ok(()),
            InstanceState::Destroyed => Err(LifecycleError::InvalidTransition {
                from: InstanceState::Destroyed,
                to: InstanceState::Started,
            }),
        }
    }

    pub fn stop(&self) -> Result<(), LifecycleError> {
        let mut state = self.state.lock();
        match *state {
            InstanceState::Started => {
                *state = InstanceState::Stopped;
                Ok(())
            }
            InstanceState::Stopped => Ok(()),
            from => Err(LifecycleError::InvalidTransition {
                from,
                to: InstanceState::Stopped,
            }),
        }
    }

    /// Drive to `Destroyed`, stopping first when currently `Started`.
    pub fn destroy(&self) -> Result<(), LifecycleError> {
        let mut state = self.state.lock();
        match *state {
            InstanceState::Created | InstanceState::Stopped | InstanceState::Started => {
                *state = InstanceState::Destroyed;
                Ok(())
            }
            InstanceState::Destroyed => Err(LifecycleError::InvalidTransition {
                from: InstanceState::Destroyed,
                to: InstanceState::Destroyed,
            }),
        }
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_starts_and_stops() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), InstanceState::Created);
        cell.start().unwrap();
        assert_eq!(cell.get(), InstanceState::Started);
        cell.stop().unwrap();
        assert_eq!(cell.get(), InstanceState::Stopped);
        cell.start().unwrap();
        assert_eq!(cell.get(), InstanceState::Started);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let cell = StateCell::new();
        cell.start().unwrap();
        cell.start().unwrap();
        assert_eq!(cell.get(), InstanceState::Started);
        cell.stop().unwrap();
        cell.stop().unwrap();
        assert_eq!(cell.get(), InstanceState::Stopped);
    }

    #[test]
    fn destroy_from_started_implies_stop() {
        let cell = StateCell::new();
        cell.start().unwrap();
        cell.destroy().unwrap();
        assert_eq!(cell.get(), InstanceState::Destroyed);
    }

    #[test]
    fn destroyed_admits_no_transitions() {
        let cell = StateCell::new();
        cell.destroy().unwrap();
        assert!(cell.start().is_err());
        assert!(cell.stop().is_err());
        assert!(cell.destroy().is_err());
    }

    #[test]
    fn stop_from_created_is_invalid() {
        let cell = StateCell::new();
        assert!(matches!(
            cell.stop(),
            Err(LifecycleError::InvalidTransition { .. })
        ));
    }
}
