//! Wall-clock tick source backed by a tokio interval

use std::time::Duration;

use tokio::time::{self, Interval, MissedTickBehavior};

use super::TickSource;

/// Fires once per period; a late tick delays the following ones instead of bursting
pub struct IntervalTicks {
    interval: Interval,
}

impl IntervalTicks {
    pub const PERIOD: Duration = Duration::from_secs(1);

    /// One tick per second, the first one a full period from now
    pub fn every_second() -> Self {
        Self::with_period(Self::PERIOD)
    }

    pub fn with_period(period: Duration) -> Self {
        let mut interval = time::interval_at(time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    #[cfg(test)]
    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

impl TickSource for IntervalTicks {
    async fn next_tick(&mut self) {
        self.interval.tick().await;
    }
}
