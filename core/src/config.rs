// Monitor configuration
//
// Defaults come from the environment, falling back to the stock timings.
use crate::liveness::{sanitize_probability, DEFAULT_FAULT_PROBABILITY};
use crate::notify::{DispatcherConfig, ThrottlePolicy};
use crate::transport::RetryPolicy;
use std::time::Duration;

/// Settings for the simulated fault source
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    pub enabled: bool,
    pub tick_interval_ms: u64,
    /// Chance of a fault per tick, 0..=1
    pub fault_probability: f64,
    pub recovery_delay_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: env_parse("TIDEWATCH_SIMULATE_FAULTS").unwrap_or(false),
            tick_interval_ms: env_parse("TIDEWATCH_TICK_MS")
                .filter(|&v: &u64| v > 0)
                .unwrap_or(10_000),
            fault_probability: env_parse::<f64>("TIDEWATCH_FAULT_PROBABILITY")
                .map(sanitize_probability)
                .unwrap_or(DEFAULT_FAULT_PROBABILITY),
            recovery_delay_ms: env_parse("TIDEWATCH_RECOVERY_MS").unwrap_or(2_000),
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn recovery_delay(&self) -> Duration {
        Duration::from_millis(self.recovery_delay_ms)
    }
}

#[derive(Clone, Debug)]
pub struct MonitorConfig {
    pub simulation: SimulationConfig,
    pub dispatcher: DispatcherConfig,
    pub retry: RetryPolicy,
    /// Capacity of the transport event queue
    pub event_buffer: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let throttle = match env_parse::<u64>("TIDEWATCH_NOTICE_MIN_INTERVAL_MS") {
            Some(ms) if ms > 0 => ThrottlePolicy::MinInterval(Duration::from_millis(ms)),
            _ => ThrottlePolicy::None,
        };
        Self {
            simulation: SimulationConfig::default(),
            dispatcher: DispatcherConfig {
                throttle,
                data_notifications: env_parse("TIDEWATCH_DATA_NOTIFICATIONS").unwrap_or(true),
            },
            retry: RetryPolicy::default(),
            event_buffer: env_parse("TIDEWATCH_EVENT_BUFFER")
                .filter(|&v: &usize| v > 0)
                .unwrap_or(256),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
