// Simulated connection faults
//
// Stands in for a real transport health signal in tests and demos. Never
// enters Disconnected.
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::{ConnectionHealthSource, ConnectionStatus, StatusPublisher};

/// Decides, once per tick, whether to inject a fault
pub trait FaultTrigger: Send {
    fn should_fault(&mut self) -> bool;
}

/// Fault chance per tick when none is configured
pub const DEFAULT_FAULT_PROBABILITY: f64 = 0.05;

/// Clamp to `0..=1`; non-finite values fall back to the default
pub fn sanitize_probability(probability: f64) -> f64 {
    if probability.is_finite() {
        probability.clamp(0.0, 1.0)
    } else {
        warn!(target: "liveness", probability, "Invalid fault probability, using default");
        DEFAULT_FAULT_PROBABILITY
    }
}

/// Faults with a fixed independent probability per tick
pub struct RandomFault {
    probability: f64,
    rng: StdRng,
}

impl RandomFault {
    pub fn new(probability: f64) -> Self {
        Self {
            probability: sanitize_probability(probability),
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for a given seed
    pub fn seeded(probability: f64, seed: u64) -> Self {
        Self {
            probability: sanitize_probability(probability),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl FaultTrigger for RandomFault {
    fn should_fault(&mut self) -> bool {
        self.rng.gen_bool(self.probability)
    }
}

/// Faults on every tick
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysFault;

impl FaultTrigger for AlwaysFault {
    fn should_fault(&mut self) -> bool {
        true
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NeverFault;

impl FaultTrigger for NeverFault {
    fn should_fault(&mut self) -> bool {
        false
    }
}

pub struct SimulatedFaultSource<T: FaultTrigger = RandomFault> {
    tick_interval: Duration,
    recovery_delay: Duration,
    trigger: T,
}

impl SimulatedFaultSource<RandomFault> {
    /// 5% chance per 10 s tick, 2 s recovery
    pub fn standard() -> Self {
        Self::new(
            Duration::from_secs(10),
            Duration::from_secs(2),
            RandomFault::new(DEFAULT_FAULT_PROBABILITY),
        )
    }
}

impl<T: FaultTrigger> SimulatedFaultSource<T> {
    pub fn new(tick_interval: Duration, recovery_delay: Duration, trigger: T) -> Self {
        Self {
            tick_interval,
            recovery_delay,
            trigger,
        }
    }
}

#[async_trait]
impl<T: FaultTrigger> ConnectionHealthSource for SimulatedFaultSource<T> {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn run(&mut self, publisher: &mut StatusPublisher) {
        let mut ticker = time::interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let recovery = time::sleep(self.recovery_delay);
        tokio::pin!(recovery);
        let mut recovering = false;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if publisher.status() == ConnectionStatus::Connected
                        && self.trigger.should_fault()
                    {
                        debug!(target: "liveness", "Injecting simulated connection fault");
                        if let Err(e) = publisher.begin_reconnect() {
                            warn!(target: "liveness", error = %e, "Simulated fault rejected");
                            continue;
                        }
                        recovery.as_mut().reset(Instant::now() + self.recovery_delay);
                        recovering = true;
                        ticker.reset();
                    }
                }
                _ = &mut recovery, if recovering => {
                    recovering = false;
                    if let Err(e) = publisher.reconnected() {
                        warn!(target: "liveness", error = %e, "Simulated recovery rejected");
                    }
                    // Next fault chance is a full interval after recovery
                    ticker.reset();
                }
            }
        }
    }
}
