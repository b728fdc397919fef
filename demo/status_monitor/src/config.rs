use std::fs;
use std::path::Path;
use std::time::Duration;

use tidewatch_core::notify::ThrottlePolicy;
use tidewatch_core::{MonitorConfig, TidewatchError};

/// Where the connection status comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthMode {
    /// Transport signals read from stdin
    Transport,
    /// Random faults (demo only)
    Simulated,
}

impl HealthMode {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transport" => Some(Self::Transport),
            "simulated" | "simulation" => Some(Self::Simulated),
            _ => None,
        }
    }
}

/// High-level configuration for the status monitor demo
#[derive(Clone, Debug)]
pub struct StatusMonitorConfig {
    pub monitor: MonitorConfig,
    pub health_mode: HealthMode,
    /// How often the detailed status line is rendered
    pub render_interval_ms: u64,
    /// Print status snapshots as JSON on stdout instead of log lines
    pub json_output: bool,
}

impl Default for StatusMonitorConfig {
    fn default() -> Self {
        let monitor = MonitorConfig::default();
        let health_mode = std::env::var("STATUS_MONITOR_HEALTH")
            .ok()
            .and_then(|v| HealthMode::parse(&v))
            .unwrap_or(if monitor.simulation.enabled {
                HealthMode::Simulated
            } else {
                HealthMode::Transport
            });
        Self {
            monitor,
            health_mode,
            render_interval_ms: std::env::var("STATUS_MONITOR_RENDER_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|&v| v > 0)
                .unwrap_or(5_000),
            json_output: std::env::var("STATUS_MONITOR_JSON")
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(false),
        }
    }
}

impl StatusMonitorConfig {
    /// Load configuration from a TOML file (path via STATUS_MONITOR_CONFIG or ./status_monitor.toml),
    /// overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let default = Self::default();
        let path =
            std::env::var("STATUS_MONITOR_CONFIG").unwrap_or_else(|_| "status_monitor.toml".into());
        let p = Path::new(&path);
        if !p.exists() {
            tracing::info!(target: "status_monitor", path = %path, "No TOML config found; using defaults/env");
            return default;
        }
        match fs::read_to_string(p) {
            Ok(s) => match Self::from_toml_str(&s, default.clone()) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(target: "status_monitor", error = %e, "Failed to parse TOML; using defaults");
                    default
                }
            },
            Err(e) => {
                tracing::warn!(target: "status_monitor", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }

    pub fn from_toml_str(s: &str, base: Self) -> Result<Self, TidewatchError> {
        let t = toml::from_str::<StatusMonitorToml>(s)
            .map_err(|e| TidewatchError::ConfigError(e.to_string()))?;
        t.overlay(base)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct StatusMonitorToml {
    pub health_mode: Option<String>,
    pub render_interval_ms: Option<u64>,
    pub json_output: Option<bool>,
    pub event_buffer: Option<usize>,
    pub simulation: Option<SimulationToml>,
    pub notifications: Option<NotificationsToml>,
    pub retry: Option<RetryToml>,
}

impl StatusMonitorToml {
    fn overlay(self, mut base: StatusMonitorConfig) -> Result<StatusMonitorConfig, TidewatchError> {
        if let Some(m) = self.health_mode {
            base.health_mode = HealthMode::parse(&m)
                .ok_or_else(|| TidewatchError::ConfigError(format!("unknown health_mode: {}", m)))?;
        }
        if let Some(v) = self.render_interval_ms.filter(|&v| v > 0) {
            base.render_interval_ms = v;
        }
        if let Some(v) = self.json_output {
            base.json_output = v;
        }
        if let Some(v) = self.event_buffer.filter(|&v| v > 0) {
            base.monitor.event_buffer = v;
        }
        if let Some(s) = self.simulation {
            s.apply(&mut base)?;
        }
        if let Some(n) = self.notifications {
            n.apply(&mut base.monitor);
        }
        if let Some(r) = self.retry {
            r.apply(&mut base.monitor);
        }
        Ok(base)
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct SimulationToml {
    pub tick_interval_ms: Option<u64>,
    pub fault_probability: Option<f64>,
    pub recovery_delay_ms: Option<u64>,
}
impl SimulationToml {
    fn apply(self, c: &mut StatusMonitorConfig) -> Result<(), TidewatchError> {
        let sim = &mut c.monitor.simulation;
        if let Some(x) = self.tick_interval_ms {
            sim.tick_interval_ms = x;
        }
        if let Some(x) = self.fault_probability {
            if !x.is_finite() {
                return Err(TidewatchError::ConfigError(format!(
                    "fault_probability must be a finite number, got {}",
                    x
                )));
            }
            sim.fault_probability = x.clamp(0.0, 1.0);
        }
        if let Some(x) = self.recovery_delay_ms {
            sim.recovery_delay_ms = x;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct NotificationsToml {
    pub min_interval_ms: Option<u64>,
    pub data_notifications: Option<bool>,
}
impl NotificationsToml {
    fn apply(self, m: &mut MonitorConfig) {
        if let Some(x) = self.min_interval_ms {
            m.dispatcher.throttle = if x == 0 {
                ThrottlePolicy::None
            } else {
                ThrottlePolicy::MinInterval(Duration::from_millis(x))
            };
        }
        if let Some(x) = self.data_notifications {
            m.dispatcher.data_notifications = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct RetryToml {
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}
impl RetryToml {
    fn apply(self, m: &mut MonitorConfig) {
        if let Some(x) = self.max_attempts {
            m.retry.max_attempts = x;
        }
        if let Some(x) = self.base_delay_ms {
            m.retry.base_delay = Duration::from_millis(x);
        }
        if let Some(x) = self.max_delay_ms {
            m.retry.max_delay = Duration::from_millis(x);
        }
    }
}
