use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use super::{ConnectionStateMachine, ConnectionStatus, StateTransitionError};
use crate::transport::{RetryPolicy, TransportSignal};

/// Something that knows whether the real-time connection is healthy
#[async_trait]
pub trait ConnectionHealthSource: Send {
    fn name(&self) -> &'static str;

    /// Drive `publisher` until the source has nothing more to report
    async fn run(&mut self, publisher: &mut StatusPublisher);
}

/// State machine whose every transition is published to watchers
pub struct StatusPublisher {
    machine: ConnectionStateMachine,
    tx: watch::Sender<ConnectionStatus>,
    transitions: Option<broadcast::Sender<ConnectionStatus>>,
}

impl StatusPublisher {
    pub fn new(tx: watch::Sender<ConnectionStatus>) -> Self {
        Self {
            machine: ConnectionStateMachine::new(),
            tx,
            transitions: None,
        }
    }

    /// Also send each new status, in order, on `transitions`.
    /// The watch channel keeps only the latest value.
    pub fn with_transitions(mut self, transitions: broadcast::Sender<ConnectionStatus>) -> Self {
        self.transitions = Some(transitions);
        self
    }

    pub fn status(&self) -> ConnectionStatus {
        self.machine.status()
    }

    pub fn machine(&self) -> &ConnectionStateMachine {
        &self.machine
    }

    pub fn begin_reconnect(&mut self) -> Result<(), StateTransitionError> {
        self.machine.begin_reconnect()?;
        self.publish();
        Ok(())
    }

    pub fn reconnected(&mut self) -> Result<(), StateTransitionError> {
        self.machine.reconnected()?;
        self.publish();
        Ok(())
    }

    pub fn disconnected(&mut self) -> Result<(), StateTransitionError> {
        self.machine.disconnected()?;
        self.publish();
        Ok(())
    }

    fn publish(&self) {
        // Receivers may all be gone; the status is still tracked locally
        let status = self.machine.status();
        self.tx.send_replace(status);
        if let Some(transitions) = &self.transitions {
            let _ = transitions.send(status);
        }
    }
}

/// Follows the transport's open / close / retry signals
pub struct TransportHealthSource {
    signals: mpsc::Receiver<TransportSignal>,
    policy: RetryPolicy,
}

impl TransportHealthSource {
    pub fn new(signals: mpsc::Receiver<TransportSignal>, policy: RetryPolicy) -> Self {
        Self { signals, policy }
    }

    fn apply(&self, signal: TransportSignal, publisher: &mut StatusPublisher) {
        let status = publisher.status();
        let result = match signal {
            TransportSignal::Opened => match status {
                ConnectionStatus::Connected => Ok(()),
                _ => publisher.reconnected(),
            },
            TransportSignal::Closed => match status {
                ConnectionStatus::Connected => publisher.begin_reconnect(),
                _ => Ok(()),
            },
            TransportSignal::Retrying { attempt } => {
                if !self.policy.should_retry(attempt) {
                    warn!(target: "liveness", attempt, "Retry budget exhausted");
                    match status {
                        ConnectionStatus::Disconnected => Ok(()),
                        _ => publisher.disconnected(),
                    }
                } else {
                    debug!(
                        target: "liveness",
                        attempt,
                        delay_ms = self.policy.delay_for(attempt).as_millis() as u64,
                        "Transport retrying"
                    );
                    match status {
                        ConnectionStatus::Connected => publisher.begin_reconnect(),
                        _ => Ok(()),
                    }
                }
            }
            TransportSignal::GaveUp => match status {
                ConnectionStatus::Disconnected => Ok(()),
                _ => publisher.disconnected(),
            },
        };
        if let Err(e) = result {
            warn!(target: "liveness", signal = ?signal, error = %e, "Ignoring transport signal");
        }
    }
}

#[async_trait]
impl ConnectionHealthSource for TransportHealthSource {
    fn name(&self) -> &'static str {
        "transport"
    }

    async fn run(&mut self, publisher: &mut StatusPublisher) {
        while let Some(signal) = self.signals.recv().await {
            self.apply(signal, publisher);
        }
        info!(target: "liveness", "Transport signal channel closed");
        if publisher.status() != ConnectionStatus::Disconnected {
            let _ = publisher.disconnected();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publisher() -> (StatusPublisher, watch::Receiver<ConnectionStatus>) {
        let (tx, rx) = watch::channel(ConnectionStatus::Connected);
        (StatusPublisher::new(tx), rx)
    }

    #[test]
    fn close_then_open_round_trips() {
        let (_tx, rx) = mpsc::channel(1);
        let source = TransportHealthSource::new(rx, RetryPolicy::default());
        let (mut p, watch_rx) = publisher();

        source.apply(TransportSignal::Closed, &mut p);
        assert_eq!(*watch_rx.borrow(), ConnectionStatus::Reconnecting);
        source.apply(TransportSignal::Retrying { attempt: 1 }, &mut p);
        assert_eq!(p.status(), ConnectionStatus::Reconnecting);
        source.apply(TransportSignal::Opened, &mut p);
        assert_eq!(*watch_rx.borrow(), ConnectionStatus::Connected);
    }

    #[test]
    fn exhausted_retries_disconnect() {
        let (_tx, rx) = mpsc::channel(1);
        let policy = RetryPolicy::default();
        let source = TransportHealthSource::new(rx, policy.clone());
        let (mut p, _watch_rx) = publisher();

        source.apply(TransportSignal::Closed, &mut p);
        source.apply(
            TransportSignal::Retrying {
                attempt: policy.max_attempts,
            },
            &mut p,
        );
        assert_eq!(p.status(), ConnectionStatus::Disconnected);

        source.apply(TransportSignal::Opened, &mut p);
        assert_eq!(p.status(), ConnectionStatus::Connected);
    }

    #[test]
    fn transitions_are_not_coalesced() {
        let (_tx, rx) = mpsc::channel(1);
        let source = TransportHealthSource::new(rx, RetryPolicy::default());
        let (status_tx, watch_rx) = watch::channel(ConnectionStatus::Connected);
        let (trans_tx, mut trans_rx) = broadcast::channel(8);
        let mut p = StatusPublisher::new(status_tx).with_transitions(trans_tx);

        source.apply(TransportSignal::Closed, &mut p);
        source.apply(TransportSignal::Opened, &mut p);
        source.apply(TransportSignal::GaveUp, &mut p);

        assert_eq!(*watch_rx.borrow(), ConnectionStatus::Disconnected);
        assert_eq!(trans_rx.try_recv().unwrap(), ConnectionStatus::Reconnecting);
        assert_eq!(trans_rx.try_recv().unwrap(), ConnectionStatus::Connected);
        assert_eq!(trans_rx.try_recv().unwrap(), ConnectionStatus::Disconnected);
        assert!(trans_rx.try_recv().is_err());
    }
}
