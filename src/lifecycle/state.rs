//! Server lifecycle state machine.
//!
//! # State Transitions
//! ```text
//! Init     → Starting: start() claims the server
//! Starting → Started:  engine is accepting connections
//! Starting → Stopped:  engine failed to start
//! Started  → Stopping: stop() hands off to the engine
//! Starting → Stopping: stop() while the engine is still binding
//! Stopping → Stopped:  engine finished draining
//! any      → Disposed: dispose()
//! ```
//!
//! # Design Decisions
//! - Single `AtomicU8`, every transition is a compare-and-set
//! - A failed transition reports the state that blocked it
//! - Disposed is terminal; nothing transitions out of it

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Server lifecycle state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerState {
    Init = 0,
    Starting = 1,
    Started = 2,
    Stopping = 3,
    Stopped = 4,
    Disposed = 5,
}

impl From<u8> for ServerState {
    fn from(val: u8) -> Self {
        match val {
            0 => ServerState::Init,
            1 => ServerState::Starting,
            2 => ServerState::Started,
            3 => ServerState::Stopping,
            4 => ServerState::Stopped,
            _ => ServerState::Disposed,
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::Init => "init",
            ServerState::Starting => "starting",
            ServerState::Started => "started",
            ServerState::Stopping => "stopping",
            ServerState::Stopped => "stopped",
            ServerState::Disposed => "disposed",
        };
        f.write_str(name)
    }
}

/// Shared lifecycle cell.
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    /// Create a lifecycle in `Init`.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ServerState::Init as u8),
        }
    }

    /// Current state.
    pub fn current(&self) -> ServerState {
        self.state.load(Ordering::Acquire).into()
    }

    /// Move `from → to` only if the state is still `from`.
    ///
    /// On failure returns the state actually observed.
    pub fn transition(&self, from: ServerState, to: ServerState) -> Result<(), ServerState> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(ServerState::from)
    }

    /// Move to `to` from any of `from`. Returns the state that was left.
    pub fn transition_from_any(
        &self,
        from: &[ServerState],
        to: ServerState,
    ) -> Result<ServerState, ServerState> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let observed = ServerState::from(current);
            if !from.contains(&observed) {
                return Err(observed);
            }
            match self.state.compare_exchange_weak(
                current,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(observed),
                Err(x) => current = x,
            }
        }
    }

    /// Enter `Disposed` unconditionally, returning the previous state.
    pub fn dispose(&self) -> ServerState {
        self.state
            .swap(ServerState::Disposed as u8, Ordering::AcqRel)
            .into()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn starts_in_init() {
        assert_eq!(Lifecycle::new().current(), ServerState::Init);
    }

    #[test]
    fn transition_requires_expected_state() {
        let lifecycle = Lifecycle::new();
        assert_eq!(
            lifecycle.transition(ServerState::Init, ServerState::Starting),
            Ok(())
        );
        assert_eq!(
            lifecycle.transition(ServerState::Init, ServerState::Starting),
            Err(ServerState::Starting)
        );
        assert_eq!(lifecycle.current(), ServerState::Starting);
    }

    #[test]
    fn transition_from_any_reports_previous() {
        let lifecycle = Lifecycle::new();
        let guard = [ServerState::Started, ServerState::Starting];

        assert_eq!(
            lifecycle.transition_from_any(&guard, ServerState::Stopping),
            Err(ServerState::Init)
        );

        lifecycle
            .transition(ServerState::Init, ServerState::Starting)
            .unwrap();
        assert_eq!(
            lifecycle.transition_from_any(&guard, ServerState::Stopping),
            Ok(ServerState::Starting)
        );
        assert_eq!(lifecycle.current(), ServerState::Stopping);
    }

    #[test]
    fn dispose_is_terminal() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.dispose(), ServerState::Init);
        assert_eq!(lifecycle.dispose(), ServerState::Disposed);
        assert_eq!(
            lifecycle.transition(ServerState::Init, ServerState::Starting),
            Err(ServerState::Disposed)
        );
    }

    #[test]
    fn only_one_concurrent_claim_wins() {
        let lifecycle = Arc::new(Lifecycle::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lifecycle = Arc::clone(&lifecycle);
                std::thread::spawn(move || {
                    lifecycle
                        .transition(ServerState::Init, ServerState::Starting)
                        .is_ok()
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

    #[test]
    fn unknown_raw_value_maps_to_disposed() {
        assert_eq!(ServerState::from(42), ServerState::Disposed);
        assert_eq!(ServerState::from(2), ServerState::Started);
    }
}
