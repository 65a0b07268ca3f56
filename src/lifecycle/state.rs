//! Process lifecycle state machine.
//!
//! # States
//! ```text
//! Starting → Running → Stopping → Stopped
//!     └──────────────────↗
//! ```
//! A signal that arrives before startup completes moves straight from
//! `Starting` to `Stopping`. There are no backward transitions.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle states.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl From<u8> for LifecycleState {
    fn from(val: u8) -> Self {
        match val {
            0 => LifecycleState::Starting,
            1 => LifecycleState::Running,
            2 => LifecycleState::Stopping,
            _ => LifecycleState::Stopped,
        }
    }
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, lock-free holder of the current state.
///
/// Every transition is a compare-exchange from one expected state, so of
/// several concurrent callers attempting the same transition exactly one wins.
#[derive(Debug)]
pub struct StateCell {
    state: AtomicU8,
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Starting as u8),
        }
    }

    /// Current state.
    pub fn get(&self) -> LifecycleState {
        LifecycleState::from(self.state.load(Ordering::SeqCst))
    }

    /// Move `from → to`. On failure returns the state actually observed.
    pub fn transition(
        &self,
        from: LifecycleState,
        to: LifecycleState,
    ) -> Result<(), LifecycleState> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(LifecycleState::from)
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
    use std::sync::Arc;

    #[test]
    fn forward_path() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), LifecycleState::Starting);
        cell.transition(LifecycleState::Starting, LifecycleState::Running).unwrap();
        cell.transition(LifecycleState::Running, LifecycleState::Stopping).unwrap();
        cell.transition(LifecycleState::Stopping, LifecycleState::Stopped).unwrap();
        assert_eq!(cell.get(), LifecycleState::Stopped);
    }

    #[test]
    fn no_reverse_transitions() {
        let cell = StateCell::new();
        cell.transition(LifecycleState::Starting, LifecycleState::Running).unwrap();
        assert_eq!(
            cell.transition(LifecycleState::Starting, LifecycleState::Running),
            Err(LifecycleState::Running)
        );
        cell.transition(LifecycleState::Running, LifecycleState::Stopping).unwrap();
        assert_eq!(
            cell.transition(LifecycleState::Running, LifecycleState::Stopping),
            Err(LifecycleState::Stopping)
        );
    }

    #[test]
    fn single_winner_under_contention() {
        let cell = Arc::new(StateCell::new());
        cell.transition(LifecycleState::Starting, LifecycleState::Running).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || {
                    cell.transition(LifecycleState::Running, LifecycleState::Stopping).is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
