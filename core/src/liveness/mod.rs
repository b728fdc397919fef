//! Connection liveness
//!
//! Tracks the connection status shown to the user:
//!
//! ```text
//!              begin_reconnect()
//!  ┌───────────┐ ───────────────► ┌──────────────┐
//!  │ Connected │                  │ Reconnecting │
//!  └───────────┘ ◄─────────────── └──────┬───────┘
//!        ▲          reconnected()        │
//!        │                        disconnected()
//!        │ reconnected()                 ▼
//!        │                        ┌──────────────┐
//!        └─────────────────────── │ Disconnected │
//!                                 └──────────────┘
//! ```
//!
//! The status is driven by a [`ConnectionHealthSource`]: the transport-backed
//! [`TransportHealthSource`] in production, or [`SimulatedFaultSource`] in
//! tests and demos. Only the transport source can reach `Disconnected`.

mod simulated;
mod source;

pub use simulated::{
    sanitize_probability, AlwaysFault, FaultTrigger, NeverFault, RandomFault,
    SimulatedFaultSource, DEFAULT_FAULT_PROBABILITY,
};
pub use source::{ConnectionHealthSource, StatusPublisher, TransportHealthSource};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Connected,
    Reconnecting,
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Reconnecting => write!(f, "reconnecting"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StateTransitionError {
    #[error("Invalid connection status transition from {from} to {to}")]
    InvalidTransition {
        from: ConnectionStatus,
        to: ConnectionStatus,
    },
}

/// Connection status with transition bookkeeping
#[derive(Debug)]
pub struct ConnectionStateMachine {
    status: ConnectionStatus,
    changed_at: Instant,
    transition_count: u32,
}

impl Default for ConnectionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionStateMachine {
    pub fn new() -> Self {
        Self {
            status: ConnectionStatus::Connected,
            changed_at: Instant::now(),
            transition_count: 0,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn time_in_state(&self) -> std::time::Duration {
        self.changed_at.elapsed()
    }

    pub fn transition_count(&self) -> u32 {
        self.transition_count
    }

    pub fn begin_reconnect(&mut self) -> Result<(), StateTransitionError> {
        match self.status {
            ConnectionStatus::Connected => {
                self.transition_to(ConnectionStatus::Reconnecting);
                Ok(())
            }
            from => Err(StateTransitionError::InvalidTransition {
                from,
                to: ConnectionStatus::Reconnecting,
            }),
        }
    }

    pub fn reconnected(&mut self) -> Result<(), StateTransitionError> {
        match self.status {
            ConnectionStatus::Reconnecting | ConnectionStatus::Disconnected => {
                self.transition_to(ConnectionStatus::Connected);
                Ok(())
            }
            from => Err(StateTransitionError::InvalidTransition {
                from,
                to: ConnectionStatus::Connected,
            }),
        }
    }

    pub fn disconnected(&mut self) -> Result<(), StateTransitionError> {
        match self.status {
            ConnectionStatus::Connected | ConnectionStatus::Reconnecting => {
                self.transition_to(ConnectionStatus::Disconnected);
                Ok(())
            }
            from => Err(StateTransitionError::InvalidTransition {
                from,
                to: ConnectionStatus::Disconnected,
            }),
        }
    }

    fn transition_to(&mut self, next: ConnectionStatus) {
        debug!(
            target: "liveness",
            "Connection status transition: {} -> {} (count: {})",
            self.status,
            next,
            self.transition_count + 1
        );
        self.status = next;
        self.changed_at = Instant::now();
        self.transition_count += 1;
    }
}

const TRANSITION_BUFFER: usize = 64;

/// Runs a health source on its own task and publishes the status.
///
/// The task owns every timer the source uses; `shutdown` or dropping the
/// monitor cancels it, after which no further transition is published.
pub struct LivenessMonitor {
    status_rx: watch::Receiver<ConnectionStatus>,
    transitions_tx: broadcast::Sender<ConnectionStatus>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    source_name: &'static str,
}

impl LivenessMonitor {
    pub fn spawn<S>(mut source: S) -> Self
    where
        S: ConnectionHealthSource + 'static,
    {
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connected);
        let (transitions_tx, _) = broadcast::channel(TRANSITION_BUFFER);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let source_name = source.name();

        let transitions = transitions_tx.clone();
        let handle = tokio::spawn(async move {
            let mut publisher = StatusPublisher::new(status_tx).with_transitions(transitions);
            info!(target: "liveness", source = source_name, "Liveness monitor started");
            tokio::select! {
                _ = source.run(&mut publisher) => {
                    info!(target: "liveness", source = source_name, "Health source finished");
                }
                _ = shutdown_rx => {
                    info!(target: "liveness", source = source_name, "Liveness monitor stopped");
                }
            }
        });

        Self {
            status_rx,
            transitions_tx,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
            source_name,
        }
    }

    /// Latest published status
    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Every status change from now on, in order
    pub fn transitions(&self) -> broadcast::Receiver<ConnectionStatus> {
        self.transitions_tx.subscribe()
    }

    pub fn source_name(&self) -> &'static str {
        self.source_name
    }

    /// Stop the source and wait for its task to exit
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    error!(
                        target: "liveness",
                        source = self.source_name,
                        error = %e,
                        "Health source panicked"
                    );
                }
            }
        }
    }
}

impl Drop for LivenessMonitor {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
