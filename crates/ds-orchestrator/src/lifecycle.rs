//! Orchestrator lifecycle state machine
//!
//! `Running -> ShuttingDown -> Exited`. Shutdown is entered only when a
//! termination signal arrives; a run whose children all exit goes straight
//! from `Running` to `Exited`. Nothing ever returns to `Running`.

use std::fmt;

use tokio::sync::watch;

/// Where the orchestrator is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Starting up or supervising children
    Running,
    /// A termination signal arrived; children are being killed
    ShuttingDown,
    /// Terminal state
    Exited,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Running => write!(f, "running"),
            LifecycleState::ShuttingDown => write!(f, "shutting down"),
            LifecycleState::Exited => write!(f, "exited"),
        }
    }
}

/// Observable lifecycle of one orchestrator
#[derive(Debug)]
pub struct Lifecycle {
    tx: watch::Sender<LifecycleState>,
}

impl Lifecycle {
    /// Create a lifecycle in the `Running` state
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LifecycleState::Running);
        Self { tx }
    }

    /// Current state
    pub fn state(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    /// `Running -> ShuttingDown`
    ///
    /// Returns false (and changes nothing) from any other state.
    pub fn begin_shutdown(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if *state == LifecycleState::Running {
                *state = LifecycleState::ShuttingDown;
                true
            } else {
                false
            }
        })
    }

    /// Move to the terminal `Exited` state
    pub fn mark_exited(&self) {
        self.tx.send_if_modified(|state| {
            if *state == LifecycleState::Exited {
                false
            } else {
                *state = LifecycleState::Exited;
                true
            }
        });
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
