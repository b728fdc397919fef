// Real-time channel events
//
// Typed payloads for the five GraphQL subscription topics. Field names follow
// the wire shape (camelCase fields, SCREAMING_CASE enum values).
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription field names as delivered by the transport
pub mod topics {
    pub const ALERT_STATUS: &str = "alertStatusUpdated";
    pub const DETECTION_RESULT: &str = "detectionResultUpdated";
    pub const GPS_READING: &str = "newGPSReading";
    pub const SATELLITE_DATA: &str = "newSatelliteData";
    pub const SYSTEM_HEALTH: &str = "systemHealthUpdated";
}

/// One of the five independent real-time channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    AlertStatus,
    DetectionResult,
    GpsReading,
    SatelliteData,
    SystemHealth,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::AlertStatus,
        Channel::DetectionResult,
        Channel::GpsReading,
        Channel::SatelliteData,
        Channel::SystemHealth,
    ];

    /// Wire topic for this channel
    pub fn topic(&self) -> &'static str {
        match self {
            Channel::AlertStatus => topics::ALERT_STATUS,
            Channel::DetectionResult => topics::DETECTION_RESULT,
            Channel::GpsReading => topics::GPS_READING,
            Channel::SatelliteData => topics::SATELLITE_DATA,
            Channel::SystemHealth => topics::SYSTEM_HEALTH,
        }
    }

    pub fn from_topic(topic: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.topic() == topic)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.topic())
    }
}

// =============================================================================
// Alert status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Safe,
    Watch,
    Warning,
    Alert,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "SAFE"),
            Self::Watch => write!(f, "WATCH"),
            Self::Warning => write!(f, "WARNING"),
            Self::Alert => write!(f, "ALERT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDetails {
    pub anomaly_detected: bool,
    pub gps_triggered: bool,
    pub satellite_triggered: bool,
    #[serde(default)]
    pub triggered_stations: Vec<String>,
    pub recommendation: Option<String>,
    pub estimated_impact_time: Option<String>,
    #[serde(default)]
    pub affected_areas: Vec<String>,
    #[serde(default)]
    pub evacuation_zones: Vec<String>,
}

/// Payload of `alertStatusUpdated`. `confidence` is a percentage (0..=100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStatus {
    pub id: String,
    pub status: AlertLevel,
    #[serde(default)]
    pub level: u8,
    pub confidence: f64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub region: String,
    pub last_updated: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    pub details: Option<AlertDetails>,
}

// =============================================================================
// Detection result
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsAnalysis {
    pub max_displacement: f64,
    pub triggered_stations_count: u32,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SatelliteAnalysis {
    pub anomaly_detected: bool,
    pub anomaly_score: f64,
    pub confidence: f64,
}

/// Payload of `detectionResultUpdated`. `confidence` is a ratio (0..=1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub id: String,
    pub anomaly_detected: bool,
    pub confidence: f64,
    pub alert_level: Option<AlertLevel>,
    pub timestamp: Option<String>,
    #[serde(default)]
    pub region: String,
    pub gps_analysis: Option<GpsAnalysis>,
    pub satellite_analysis: Option<SatelliteAnalysis>,
}

// =============================================================================
// GPS reading
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GpsQuality {
    Good,
    Fair,
    Poor,
    Anomalous,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    #[serde(default)]
    pub network: String,
}

/// Payload of `newGPSReading`. `magnitude` is displacement in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsReading {
    pub id: String,
    pub station_id: String,
    pub station: Station,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub displacement_x: f64,
    #[serde(default)]
    pub displacement_y: f64,
    #[serde(default)]
    pub displacement_z: f64,
    pub magnitude: f64,
    pub quality: GpsQuality,
    pub timestamp: Option<String>,
}

impl GpsReading {
    /// Euclidean norm of the three displacement components
    pub fn displacement_magnitude(&self) -> f64 {
        (self.displacement_x.powi(2) + self.displacement_y.powi(2) + self.displacement_z.powi(2))
            .sqrt()
    }
}

// =============================================================================
// Satellite data
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteMetadata {
    pub satellite: String,
    pub resolution: Option<String>,
}

/// Payload of `newSatelliteData`. `anomaly_score` is a ratio (0..=1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SatelliteData {
    pub id: String,
    pub image_url: Option<String>,
    pub timestamp: Option<String>,
    #[serde(default)]
    pub region: String,
    pub anomaly_score: f64,
    pub metadata: Option<SatelliteMetadata>,
}

// =============================================================================
// System health
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "HEALTHY"),
            Self::Degraded => write!(f, "DEGRADED"),
            Self::Unhealthy => write!(f, "UNHEALTHY"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthState,
    pub response_time: Option<f64>,
    pub error_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub network: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    pub uptime: f64,
    pub response_time: f64,
    pub error_rate: f64,
    pub resource_usage: Option<ResourceUsage>,
}

/// Payload of `systemHealthUpdated`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub id: String,
    pub overall_status: HealthState,
    #[serde(default)]
    pub components: Vec<ComponentHealth>,
    pub metrics: Option<HealthMetrics>,
    pub timestamp: Option<String>,
}

// =============================================================================
// Tagged channel event
// =============================================================================

/// An incoming push event, one variant per channel.
///
/// Serialized as `{"channel": "<topic>", "data": {...}}` so a transport can
/// forward the subscription field name and payload verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "data")]
pub enum ChannelEvent {
    #[serde(rename = "alertStatusUpdated")]
    AlertStatus(AlertStatus),
    #[serde(rename = "detectionResultUpdated")]
    DetectionResult(DetectionResult),
    #[serde(rename = "newGPSReading")]
    GpsReading(GpsReading),
    #[serde(rename = "newSatelliteData")]
    SatelliteData(SatelliteData),
    #[serde(rename = "systemHealthUpdated")]
    SystemHealth(SystemHealth),
}

impl ChannelEvent {
    pub fn channel(&self) -> Channel {
        match self {
            ChannelEvent::AlertStatus(_) => Channel::AlertStatus,
            ChannelEvent::DetectionResult(_) => Channel::DetectionResult,
            ChannelEvent::GpsReading(_) => Channel::GpsReading,
            ChannelEvent::SatelliteData(_) => Channel::SatelliteData,
            ChannelEvent::SystemHealth(_) => Channel::SystemHealth,
        }
    }

    /// Payload id, for logging
    pub fn id(&self) -> &str {
        match self {
            ChannelEvent::AlertStatus(p) => &p.id,
            ChannelEvent::DetectionResult(p) => &p.id,
            ChannelEvent::GpsReading(p) => &p.id,
            ChannelEvent::SatelliteData(p) => &p.id,
            ChannelEvent::SystemHealth(p) => &p.id,
        }
    }
}
