// Event stream client
//
// Keeps the most recent payload seen on each real-time channel.
use crate::event::{
    AlertStatus, Channel, ChannelEvent, DetectionResult, GpsReading, SatelliteData, SystemHealth,
};
use crate::notify::Dispatcher;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Latest value seen on a channel together with its arrival time.
///
/// `received_at` is set iff `value` is set; the fields are private so the
/// pair can only be built through [`LastEventRecord::empty`] and
/// [`LastEventRecord::record`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastEventRecord<T> {
    value: Option<T>,
    received_at: Option<DateTime<Utc>>,
}

impl<T> LastEventRecord<T> {
    pub fn empty() -> Self {
        Self {
            value: None,
            received_at: None,
        }
    }

    pub fn record(value: T, received_at: DateTime<Utc>) -> Self {
        Self {
            value: Some(value),
            received_at: Some(received_at),
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}

impl<T> Default for LastEventRecord<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Last-seen state for all five channels
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventStreamClient {
    alert_status: LastEventRecord<AlertStatus>,
    detection_result: LastEventRecord<DetectionResult>,
    gps_reading: LastEventRecord<GpsReading>,
    satellite_data: LastEventRecord<SatelliteData>,
    system_health: LastEventRecord<SystemHealth>,
}

impl EventStreamClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the record for the event's channel, stamped with the current time
    pub fn on_channel_event(&mut self, event: ChannelEvent) {
        self.on_channel_event_at(event, Utc::now());
    }

    /// Overwrite the record for the event's channel with an explicit arrival time
    pub fn on_channel_event_at(&mut self, event: ChannelEvent, at: DateTime<Utc>) {
        debug!(channel = %event.channel(), id = %event.id(), "Channel event received");
        match event {
            ChannelEvent::AlertStatus(p) => self.alert_status = LastEventRecord::record(p, at),
            ChannelEvent::DetectionResult(p) => {
                self.detection_result = LastEventRecord::record(p, at)
            }
            ChannelEvent::GpsReading(p) => self.gps_reading = LastEventRecord::record(p, at),
            ChannelEvent::SatelliteData(p) => self.satellite_data = LastEventRecord::record(p, at),
            ChannelEvent::SystemHealth(p) => self.system_health = LastEventRecord::record(p, at),
        }
    }

    pub fn latest_alert_status(&self) -> &LastEventRecord<AlertStatus> {
        &self.alert_status
    }

    pub fn latest_detection_result(&self) -> &LastEventRecord<DetectionResult> {
        &self.detection_result
    }

    pub fn latest_gps_reading(&self) -> &LastEventRecord<GpsReading> {
        &self.gps_reading
    }

    pub fn latest_satellite_data(&self) -> &LastEventRecord<SatelliteData> {
        &self.satellite_data
    }

    pub fn latest_system_health(&self) -> &LastEventRecord<SystemHealth> {
        &self.system_health
    }

    /// Arrival time of the latest event on `channel`
    pub fn received_at(&self, channel: Channel) -> Option<DateTime<Utc>> {
        match channel {
            Channel::AlertStatus => self.alert_status.received_at(),
            Channel::DetectionResult => self.detection_result.received_at(),
            Channel::GpsReading => self.gps_reading.received_at(),
            Channel::SatelliteData => self.satellite_data.received_at(),
            Channel::SystemHealth => self.system_health.received_at(),
        }
    }

    /// Most recent arrival across all channels
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        Channel::ALL
            .iter()
            .filter_map(|c| self.received_at(*c))
            .max()
    }
}

/// Shared handle used by the pump task and readers
pub type SharedStreamClient = Arc<RwLock<EventStreamClient>>;

/// Drain transport events into the shared client and the dispatcher.
///
/// The task ends when the transport drops its sender. Abort the returned
/// handle to stop it earlier.
pub fn spawn_pump(
    mut rx: mpsc::Receiver<ChannelEvent>,
    client: SharedStreamClient,
    dispatcher: Arc<Dispatcher>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(target: "stream", "Event stream pump started");
        let mut delivered: u64 = 0;
        while let Some(event) = rx.recv().await {
            dispatcher.dispatch(&event);
            client.write().await.on_channel_event(event);
            delivered += 1;
        }
        info!(target: "stream", delivered, "Transport closed; event stream pump stopped");
    })
}
