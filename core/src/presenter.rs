// Status presenter
//
// Pure views over the connection status and the latest channel values.
use crate::event::{AlertLevel, HealthState};
use crate::liveness::ConnectionStatus;
use crate::stream::EventStreamClient;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

pub const NEVER: &str = "Never";

/// Human-readable age of the last event
pub fn format_freshness(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        "Just now".to_string()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86400)
    }
}

/// Freshness label for an optional arrival time; future times count as zero
pub fn freshness_label(received_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match received_at {
        None => NEVER.to_string(),
        Some(at) => format_freshness((now - at).to_std().unwrap_or(Duration::ZERO)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Green,
    Yellow,
    Orange,
    Red,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Green => write!(f, "green"),
            Self::Yellow => write!(f, "yellow"),
            Self::Orange => write!(f, "orange"),
            Self::Red => write!(f, "red"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeIcon {
    Wifi,
    Activity,
    WifiOff,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionBadge {
    pub icon: BadgeIcon,
    pub label: &'static str,
    pub tone: Tone,
    /// Pulsing indicator while reconnecting
    pub animated: bool,
}

impl fmt::Display for ConnectionBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.label)
    }
}

/// Dot + label pair for the alert and system-health summaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Indicator {
    pub tone: Tone,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailedStatus {
    pub badge: ConnectionBadge,
    pub last_update: String,
    pub alert: Option<Indicator>,
    pub system_health: Option<Indicator>,
}

impl fmt::Display for DetailedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Last update: {}", self.badge, self.last_update)?;
        if let Some(alert) = &self.alert {
            write!(f, " | ({}) {}", alert.tone, alert.label)?;
        }
        if let Some(health) = &self.system_health {
            write!(f, " | ({}) {}", health.tone, health.label)?;
        }
        Ok(())
    }
}

pub fn render_compact(status: ConnectionStatus) -> ConnectionBadge {
    match status {
        ConnectionStatus::Connected => ConnectionBadge {
            icon: BadgeIcon::Wifi,
            label: "Live",
            tone: Tone::Green,
            animated: false,
        },
        ConnectionStatus::Reconnecting => ConnectionBadge {
            icon: BadgeIcon::Activity,
            label: "Reconnecting",
            tone: Tone::Yellow,
            animated: true,
        },
        ConnectionStatus::Disconnected => ConnectionBadge {
            icon: BadgeIcon::WifiOff,
            label: "Offline",
            tone: Tone::Red,
            animated: false,
        },
    }
}

fn alert_tone(level: AlertLevel) -> Tone {
    match level {
        AlertLevel::Safe => Tone::Green,
        AlertLevel::Watch => Tone::Yellow,
        AlertLevel::Warning => Tone::Orange,
        AlertLevel::Alert => Tone::Red,
    }
}

fn health_tone(state: HealthState) -> Tone {
    match state {
        HealthState::Healthy => Tone::Green,
        HealthState::Degraded => Tone::Yellow,
        HealthState::Unhealthy => Tone::Red,
    }
}

pub fn render_detailed(
    status: ConnectionStatus,
    client: &EventStreamClient,
    now: DateTime<Utc>,
) -> DetailedStatus {
    let alert = client.latest_alert_status().value().map(|a| Indicator {
        tone: alert_tone(a.status),
        label: a.status.to_string(),
    });
    let system_health = client.latest_system_health().value().map(|h| Indicator {
        tone: health_tone(h.overall_status),
        label: format!(
            "System {}",
            h.overall_status.to_string().to_lowercase()
        ),
    });

    DetailedStatus {
        badge: render_compact(status),
        last_update: freshness_label(client.last_update(), now),
        alert,
        system_health,
    }
}
