//! Cooperative per-question countdown.
use serde::{Deserialize, Serialize};

/// What a single [`CountdownTimer::tick`] observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TimerTick {
    /// Not started, or already expired and reported.
    Idle,
    /// Frozen; remaining time is unchanged.
    Paused { remaining: f64 },
    Running { remaining: f64 },
    /// Reached zero on this tick. Reported exactly once per start.
    Expired,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountdownTimer {
    limit: f64,
    remaining: f64,
    running: bool,
    paused: bool,
}

impl CountdownTimer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            limit: 0.0,
            remaining: 0.0,
            running: false,
            paused: false,
        }
    }

    /// Restart the countdown from `limit_secs`, clearing any pause.
    pub const fn start(&mut self, limit_secs: f64) {
        let limit = if limit_secs > 0.0 { limit_secs } else { 0.0 };
        self.limit = limit;
        self.remaining = limit;
        self.running = true;
        self.paused = false;
    }

    /// Stop without reporting expiry.
    pub const fn stop(&mut self) {
        self.running = false;
        self.paused = false;
    }

    pub fn tick(&mut self, dt_secs: f64) -> TimerTick {
        if !self.running {
            return TimerTick::Idle;
        }
        if self.paused {
            return TimerTick::Paused {
                remaining: self.remaining,
            };
        }
        if dt_secs.is_finite() && dt_secs > 0.0 {
            self.remaining = (self.remaining - dt_secs).max(0.0);
        }
        if self.remaining <= 0.0 {
            self.running = false;
            log::debug!("countdown of {:.1}s expired", self.limit);
            return TimerTick::Expired;
        }
        TimerTick::Running {
            remaining: self.remaining,
        }
    }

    pub const fn pause(&mut self) {
        if self.running {
            self.paused = true;
        }
    }

    pub const fn resume(&mut self) {
        self.paused = false;
    }

    #[must_use]
    pub const fn remaining(&self) -> f64 {
        self.remaining
    }

    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.limit - self.remaining
    }

    #[must_use]
    pub const fn limit(&self) -> f64 {
        self.limit
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.running && self.paused
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        !self.running && self.limit > 0.0 && self.remaining <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_and_expires_once() {
        let mut timer = CountdownTimer::new();
        assert_eq!(timer.tick(1.0), TimerTick::Idle);
        timer.start(2.0);
        assert_eq!(timer.tick(0.5), TimerTick::Running { remaining: 1.5 });
        assert_eq!(timer.tick(1.5), TimerTick::Expired);
        assert!(timer.is_expired());
        assert_eq!(timer.tick(1.0), TimerTick::Idle);
        assert!((timer.elapsed() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn pause_keeps_remaining_time() {
        let mut timer = CountdownTimer::new();
        timer.start(10.0);
        let _ = timer.tick(4.0);
        timer.pause();
        assert!(timer.is_paused());
        for _ in 0..20 {
            assert_eq!(timer.tick(1.0), TimerTick::Paused { remaining: 6.0 });
        }
        timer.resume();
        assert_eq!(timer.tick(1.0), TimerTick::Running { remaining: 5.0 });
    }

    #[test]
    fn restart_clears_pause_and_expiry() {
        let mut timer = CountdownTimer::new();
        timer.start(1.0);
        let _ = timer.tick(5.0);
        timer.start(3.0);
        assert!(!timer.is_expired());
        timer.pause();
        timer.start(3.0);
        assert!(!timer.is_paused());
        assert!((timer.remaining() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stop_does_not_report_expiry() {
        let mut timer = CountdownTimer::new();
        timer.start(5.0);
        timer.stop();
        assert_eq!(timer.tick(10.0), TimerTick::Idle);
        assert!(!timer.is_expired());
    }
}
