// Tidewatch Core Library
// Connection liveness and real-time event indicator for the tsunami monitoring dashboard

pub mod config;
pub mod event;
pub mod guard;
pub mod liveness;
pub mod notify;
pub mod presenter;
pub mod stream;
pub mod transport;

// Export core types
pub use config::{MonitorConfig, SimulationConfig};
pub use event::{Channel, ChannelEvent};
pub use liveness::{
    ConnectionHealthSource, ConnectionStatus, LivenessMonitor, SimulatedFaultSource,
    TransportHealthSource,
};
pub use notify::{Dispatcher, Notification, NotificationSink};
pub use presenter::{ConnectionBadge, DetailedStatus};
pub use stream::{EventStreamClient, LastEventRecord, SharedStreamClient};
pub use transport::{RetryPolicy, TransportSignal};

use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TidewatchError {
    #[error("State transition error: {0}")]
    StateTransition(#[from] liveness::StateTransitionError),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Runtime already started")]
    AlreadyStarted,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
pub type Result<T> = std::result::Result<T, TidewatchError>;

/// Core runtime: event stream, dispatcher and liveness monitor wired together
pub struct Tidewatch {
    config: MonitorConfig,
    client: SharedStreamClient,
    dispatcher: Arc<Dispatcher>,
    monitor: Option<LivenessMonitor>,
    pump: Option<JoinHandle<()>>,
}

impl Tidewatch {
    pub fn new(config: MonitorConfig, sink: Arc<dyn NotificationSink>) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(config.dispatcher.clone(), sink));
        Self {
            config,
            client: Arc::new(RwLock::new(EventStreamClient::new())),
            dispatcher,
            monitor: None,
            pump: None,
        }
    }

    /// Start consuming transport events with the given health source
    pub fn start<S>(&mut self, events: mpsc::Receiver<ChannelEvent>, health: S) -> Result<()>
    where
        S: ConnectionHealthSource + 'static,
    {
        if self.pump.is_some() {
            return Err(TidewatchError::AlreadyStarted);
        }
        tracing::info!("Starting Tidewatch...");

        self.pump = Some(stream::spawn_pump(
            events,
            Arc::clone(&self.client),
            Arc::clone(&self.dispatcher),
        ));
        self.monitor = Some(LivenessMonitor::spawn(health));

        tracing::info!("Tidewatch started successfully");
        Ok(())
    }

    /// Start with the transport's connection signals driving the status
    pub fn start_with_transport(
        &mut self,
        events: mpsc::Receiver<ChannelEvent>,
        signals: mpsc::Receiver<TransportSignal>,
    ) -> Result<()> {
        let source = TransportHealthSource::new(signals, self.config.retry.clone());
        self.start(events, source)
    }

    /// Start with simulated faults (demo/testing only)
    pub fn start_simulated(&mut self, events: mpsc::Receiver<ChannelEvent>) -> Result<()> {
        let sim = &self.config.simulation;
        let source = SimulatedFaultSource::new(
            sim.tick_interval(),
            sim.recovery_delay(),
            liveness::RandomFault::new(sim.fault_probability),
        );
        self.start(events, source)
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn client(&self) -> SharedStreamClient {
        Arc::clone(&self.client)
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Current connection status; `Connected` before start
    pub fn status(&self) -> ConnectionStatus {
        self.monitor
            .as_ref()
            .map(|m| m.status())
            .unwrap_or_default()
    }

    pub fn compact(&self) -> ConnectionBadge {
        presenter::render_compact(self.status())
    }

    pub async fn snapshot(&self) -> DetailedStatus {
        let client = self.client.read().await;
        presenter::render_detailed(self.status(), &client, chrono::Utc::now())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down Tidewatch...");

        if let Some(monitor) = self.monitor.take() {
            monitor.shutdown().await;
        }
        if let Some(pump) = self.pump.take() {
            pump.abort();
            let _ = pump.await;
        }

        tracing::info!("Tidewatch shut down successfully");
        Ok(())
    }
}
