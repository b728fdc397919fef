// Shared event builders for integration tests
#![allow(dead_code)]

use tidewatch_core::event::{
    AlertLevel, AlertStatus, ChannelEvent, DetectionResult, GpsQuality, GpsReading, HealthState,
    SatelliteData, Station, SystemHealth,
};

pub fn alert(id: &str, status: AlertLevel, confidence: f64) -> ChannelEvent {
    ChannelEvent::AlertStatus(AlertStatus {
        id: id.to_string(),
        status,
        level: 0,
        confidence,
        message: format!("{} for Pacific coast", status),
        region: "Pacific".to_string(),
        last_updated: None,
        is_active: status != AlertLevel::Safe,
        details: None,
    })
}

pub fn detection(id: &str, anomaly: bool, confidence: f64) -> ChannelEvent {
    ChannelEvent::DetectionResult(DetectionResult {
        id: id.to_string(),
        anomaly_detected: anomaly,
        confidence,
        alert_level: None,
        timestamp: None,
        region: "Tohoku".to_string(),
        gps_analysis: None,
        satellite_analysis: None,
    })
}

pub fn gps(id: &str, quality: GpsQuality, magnitude: f64) -> ChannelEvent {
    ChannelEvent::GpsReading(GpsReading {
        id: id.to_string(),
        station_id: "G-0550".to_string(),
        station: Station {
            name: "Ojika".to_string(),
            network: "GEONET".to_string(),
        },
        latitude: 38.3,
        longitude: 141.5,
        displacement_x: 0.0,
        displacement_y: 0.0,
        displacement_z: magnitude,
        magnitude,
        quality,
        timestamp: None,
    })
}

pub fn satellite(id: &str, score: f64) -> ChannelEvent {
    ChannelEvent::SatelliteData(SatelliteData {
        id: id.to_string(),
        image_url: Some("https://imagery.example/tile.png".to_string()),
        timestamp: None,
        region: "Sumatra".to_string(),
        anomaly_score: score,
        metadata: None,
    })
}

pub fn health(id: &str, status: HealthState) -> ChannelEvent {
    ChannelEvent::SystemHealth(SystemHealth {
        id: id.to_string(),
        overall_status: status,
        components: vec![],
        metrics: None,
        timestamp: None,
    })
}
