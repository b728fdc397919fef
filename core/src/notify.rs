// Notification dispatcher
//
// Decides which channel events are significant enough for a transient
// user-facing notice and hands the notice to a sink. Emission is
// fire-and-forget: the dispatcher keeps no reference to what it emitted.
use crate::event::{
    AlertLevel, AlertStatus, Channel, ChannelEvent, DetectionResult, GpsQuality, GpsReading,
    HealthState, SatelliteData, SystemHealth,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Display duration for every notice except critical alerts
pub const DEFAULT_DURATION_MS: u64 = 5000;

/// Alert-status notices below this confidence are suppressed for SAFE status
pub const SAFE_CONFIDENCE_THRESHOLD: f64 = 30.0;
pub const DETECTION_CONFIDENCE_THRESHOLD: f64 = 0.50;
/// Millimeters of displacement
pub const GPS_MAGNITUDE_THRESHOLD_MM: f64 = 15.0;
pub const SATELLITE_ANOMALY_THRESHOLD: f64 = 0.70;

/// A transient notice handed to the rendering sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub severity_class: String,
    /// 0 means the notice persists until dismissed
    pub duration_ms: u64,
}

impl Notification {
    pub fn is_persistent(&self) -> bool {
        self.duration_ms == 0
    }
}

// =============================================================================
// Significance rules
// =============================================================================

pub fn alert_is_significant(alert: &AlertStatus) -> bool {
    alert.status != AlertLevel::Safe || alert.confidence > SAFE_CONFIDENCE_THRESHOLD
}

pub fn detection_is_significant(detection: &DetectionResult) -> bool {
    detection.anomaly_detected || detection.confidence > DETECTION_CONFIDENCE_THRESHOLD
}

pub fn gps_is_significant(reading: &GpsReading) -> bool {
    reading.quality == GpsQuality::Anomalous || reading.magnitude > GPS_MAGNITUDE_THRESHOLD_MM
}

pub fn satellite_is_significant(data: &SatelliteData) -> bool {
    data.anomaly_score > SATELLITE_ANOMALY_THRESHOLD
}

pub fn health_is_significant(health: &SystemHealth) -> bool {
    health.overall_status != HealthState::Healthy
}

fn alert_border(status: AlertLevel) -> &'static str {
    match status {
        AlertLevel::Safe => "border-green-500",
        AlertLevel::Watch => "border-yellow-500",
        AlertLevel::Warning => "border-orange-500",
        AlertLevel::Alert => "border-red-500",
    }
}

/// Build the notice for a significant event, or `None` if it does not qualify
pub fn notification_for(event: &ChannelEvent) -> Option<Notification> {
    match event {
        ChannelEvent::AlertStatus(alert) => alert_is_significant(alert).then(|| Notification {
            title: "Alert Status Updated".into(),
            body: alert.message.clone(),
            severity_class: format!("{} border-l-4", alert_border(alert.status)),
            duration_ms: if alert.status == AlertLevel::Alert {
                0
            } else {
                DEFAULT_DURATION_MS
            },
        }),
        ChannelEvent::DetectionResult(d) => detection_is_significant(d).then(|| Notification {
            title: "New Detection Result".into(),
            body: format!(
                "{} in {} - Confidence: {:.1}%",
                if d.anomaly_detected {
                    "Anomaly detected"
                } else {
                    "Analysis complete"
                },
                d.region,
                d.confidence * 100.0
            ),
            severity_class: if d.anomaly_detected {
                "border-orange-500 border-l-4".into()
            } else {
                "border-blue-500 border-l-4".into()
            },
            duration_ms: DEFAULT_DURATION_MS,
        }),
        ChannelEvent::GpsReading(r) => gps_is_significant(r).then(|| Notification {
            title: "GPS Anomaly Detected".into(),
            body: format!(
                "Station {} ({}) reporting {:.1}mm displacement",
                r.station_id, r.station.name, r.magnitude
            ),
            severity_class: "border-orange-500 border-l-4".into(),
            duration_ms: DEFAULT_DURATION_MS,
        }),
        ChannelEvent::SatelliteData(s) => satellite_is_significant(s).then(|| Notification {
            title: "Satellite Anomaly Detected".into(),
            body: format!(
                "High anomaly score ({:.1}%) detected in {}",
                s.anomaly_score * 100.0,
                s.region
            ),
            severity_class: "border-red-500 border-l-4".into(),
            duration_ms: DEFAULT_DURATION_MS,
        }),
        ChannelEvent::SystemHealth(h) => health_is_significant(h).then(|| Notification {
            title: "System Health Alert".into(),
            body: format!("System status changed to {}", h.overall_status),
            severity_class: "border-yellow-500 border-l-4".into(),
            duration_ms: DEFAULT_DURATION_MS,
        }),
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// Receiver of emitted notices (toast renderer, log, test recorder)
pub trait NotificationSink: Send + Sync {
    fn emit(&self, notification: Notification);
}

/// Fans notices out to any number of listeners over a broadcast channel
#[derive(Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(256)
    }
}

impl NotificationSink for BroadcastSink {
    fn emit(&self, notification: Notification) {
        // No listeners is fine: notices are fire-and-forget
        let _ = self.sender.send(notification);
    }
}

/// Writes notices to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn emit(&self, n: Notification) {
        if n.is_persistent() {
            warn!(target: "notify", title = %n.title, class = %n.severity_class, "{}", n.body);
        } else {
            info!(
                target: "notify",
                title = %n.title,
                class = %n.severity_class,
                duration_ms = n.duration_ms,
                "{}",
                n.body
            );
        }
    }
}

/// Keeps every emitted notice in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notification> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().map(|n| n.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for RecordingSink {
    fn emit(&self, notification: Notification) {
        if let Ok(mut n) = self.notices.lock() {
            n.push(notification);
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Flood control between notices of the same channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThrottlePolicy {
    /// Every significant event produces a notice
    #[default]
    None,
    /// At most one notice per channel within the interval
    MinInterval(Duration),
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub throttle: ThrottlePolicy,
    /// Evaluate GPS, satellite and system-health events
    pub data_notifications: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            throttle: ThrottlePolicy::None,
            data_notifications: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub evaluated: u64,
    pub emitted: u64,
    pub suppressed: u64,
}

pub struct Dispatcher {
    cfg: DispatcherConfig,
    sink: Arc<dyn NotificationSink>,
    last_emitted: DashMap<Channel, Instant>,
    evaluated: AtomicU64,
    emitted: AtomicU64,
    suppressed: AtomicU64,
}

impl Dispatcher {
    pub fn new(cfg: DispatcherConfig, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            cfg,
            sink,
            last_emitted: DashMap::new(),
            evaluated: AtomicU64::new(0),
            emitted: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.cfg
    }

    /// Evaluate one event; returns the notice if one was emitted
    pub fn dispatch(&self, event: &ChannelEvent) -> Option<Notification> {
        let channel = event.channel();
        if !self.cfg.data_notifications
            && matches!(
                channel,
                Channel::GpsReading | Channel::SatelliteData | Channel::SystemHealth
            )
        {
            return None;
        }

        self.evaluated.fetch_add(1, Ordering::Relaxed);
        let notification = notification_for(event)?;

        if let ThrottlePolicy::MinInterval(min) = self.cfg.throttle {
            let now = Instant::now();
            let mut throttled = false;
            self.last_emitted
                .entry(channel)
                .and_modify(|last| {
                    if now.duration_since(*last) < min {
                        throttled = true;
                    } else {
                        *last = now;
                    }
                })
                .or_insert(now);
            if throttled {
                self.suppressed.fetch_add(1, Ordering::Relaxed);
                debug!(target: "notify", channel = %channel, title = %notification.title, "Notice suppressed by throttle");
                return None;
            }
        }

        self.emitted.fetch_add(1, Ordering::Relaxed);
        self.sink.emit(notification.clone());
        Some(notification)
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            evaluated: self.evaluated.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
        }
    }
}
