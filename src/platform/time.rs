//! Tick pacing
//!
//! Simulation time always advances by one fixed `dt` per tick. Clocks only
//! decide how long the host waits between ticks.

use std::time::{Duration, Instant};

/// Maximum lag before the realtime clock stops trying to catch up
const MAX_LAG_TICKS: u32 = 8;

pub trait TickClock {
    /// Block until the next tick is due; returns the logical timestep in seconds
    fn wait_for_tick(&mut self) -> f64;
}

/// Runs ticks back to back (headless runs, tests)
#[derive(Debug, Clone, Copy)]
pub struct UnpacedClock {
    dt: f64,
}

impl UnpacedClock {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            dt: 1.0 / tick_rate as f64,
        }
    }
}

impl TickClock for UnpacedClock {
    fn wait_for_tick(&mut self) -> f64 {
        self.dt
    }
}

/// Paces ticks to the wall clock at a fixed rate
#[derive(Debug, Clone)]
pub struct RealtimeClock {
    dt: f64,
    period: Duration,
    next_deadline: Option<Instant>,
    /// Ticks that started late enough to drop the backlog
    pub overruns: u64,
}

impl RealtimeClock {
    pub fn new(tick_rate: u32) -> Self {
        let dt = 1.0 / tick_rate as f64;
        Self {
            dt,
            period: Duration::from_secs_f64(dt),
            next_deadline: None,
            overruns: 0,
        }
    }
}

impl TickClock for RealtimeClock {
    fn wait_for_tick(&mut self) -> f64 {
        let now = Instant::now();
        let deadline = *self.next_deadline.get_or_insert(now);

        if deadline > now {
            std::thread::sleep(deadline - now);
            self.next_deadline = Some(deadline + self.period);
        } else if now - deadline > self.period * MAX_LAG_TICKS {
            // Too far behind to catch up; restart the schedule
            self.overruns += 1;
            log::warn!("Tick overrun by {:?}", now - deadline);
            self.next_deadline = Some(now + self.period);
        } else {
            self.next_deadline = Some(deadline + self.period);
        }

        self.dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpaced_dt() {
        let mut clock = UnpacedClock::new(144);
        assert!((clock.wait_for_tick() - 1.0 / 144.0).abs() < 1e-12);
    }

    #[test]
    fn test_realtime_paces_ticks() {
        let mut clock = RealtimeClock::new(200);
        let start = Instant::now();
        for _ in 0..5 {
            assert!((clock.wait_for_tick() - 0.005).abs() < 1e-12);
        }
        // First tick is immediate, the remaining four wait one period each
        assert!(start.elapsed() >= Duration::from_millis(19));
    }
}
