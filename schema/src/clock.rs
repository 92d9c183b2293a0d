use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::Speed;

/// Source of the "current flight time". When running against canned data
/// this differs from the wall clock so that the data stays consistent.
pub trait FlightClock: Send + Sync {
    fn current_flight_time(&self) -> DateTime<Utc>;

    /// Real wall-clock time
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Flight time is wall-clock time
#[derive(Default, Clone, Copy, Debug)]
pub struct SystemClock;

impl FlightClock for SystemClock {
    fn current_flight_time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Flight time starts at a fixed instant and advances at the given `Speed`
#[derive(Clone, Debug)]
pub struct SimulatedClock {
    start: DateTime<Utc>,
    started_at: Instant,
    speed: Speed,
}

impl SimulatedClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            started_at: Instant::now(),
            speed: Default::default(),
        }
    }

    /// Run with the provided `Speed`
    pub fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    fn simulated_elapsed(&self) -> chrono::Duration {
        let elapsed = self.speed.scale_elapsed(self.started_at.elapsed());
        chrono::Duration::from_std(elapsed)
            .unwrap_or_else(|_| chrono::Duration::seconds(i64::from(u32::MAX)))
    }
}

impl FlightClock for SimulatedClock {
    fn current_flight_time(&self) -> DateTime<Utc> {
        self.start + self.simulated_elapsed()
    }
}
