//! Lightweight tick timing.
//!
//! Every periodic task keeps a [`TickStats`] so alive time, loop latency and
//! overruns can be logged after each tick.

use std::time::{Duration, Instant};

/// A simple timer that measures elapsed time.
pub struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    /// Create and start a new timer with the given label.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return elapsed time in seconds.
    pub fn stop(self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Running statistics for a periodic loop.
#[derive(Clone, Debug)]
pub struct TickStats {
    started: Instant,
    period: Duration,
    pub ticks: u64,
    pub failed_ticks: u64,
    pub overruns: u64,
    pub last_latency: Duration,
    pub max_latency: Duration,
    total_latency: Duration,
}

impl TickStats {
    pub fn new(period: Duration) -> Self {
        Self {
            started: Instant::now(),
            period,
            ticks: 0,
            failed_ticks: 0,
            overruns: 0,
            last_latency: Duration::ZERO,
            max_latency: Duration::ZERO,
            total_latency: Duration::ZERO,
        }
    }

    /// Record one tick that took `latency` to run.
    pub fn record(&mut self, latency: Duration, ok: bool) {
        self.ticks += 1;
        if !ok {
            self.failed_ticks += 1;
        }
        if latency > self.period {
            self.overruns += 1;
        }
        self.last_latency = latency;
        self.max_latency = self.max_latency.max(latency);
        self.total_latency += latency;
    }

    /// Wall time since the loop started.
    pub fn alive_time(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn average_latency(&self) -> Duration {
        if self.ticks == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(self.total_latency.as_secs_f64() / self.ticks as f64)
        }
    }
}
