//! Sampled execution for controller ticks.
//!
//! Controllers run at a fixed period. Between samples the actuator state is
//! held where the last decision left it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Sample configuration for a controller or the process loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Sample period in seconds.
    pub dt: f64,
}

impl SampleConfig {
    /// # Errors
    ///
    /// `InvalidArg` if `dt` is not finite and positive.
    pub fn new(dt: f64) -> ControlResult<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "sample period must be finite and positive",
            });
        }
        Ok(Self { dt })
    }

    pub fn from_frequency(freq_hz: f64) -> ControlResult<Self> {
        if !(freq_hz.is_finite() && freq_hz > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "sample frequency must be finite and positive",
            });
        }
        Self::new(1.0 / freq_hz)
    }

    pub fn frequency(&self) -> f64 {
        1.0 / self.dt
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(self.dt)
    }
}

/// Tracks when the next sample is due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleClock {
    pub config: SampleConfig,
    /// Time of next scheduled sample.
    pub next_sample_time: f64,
}

impl SampleClock {
    pub fn new(config: SampleConfig, initial_time: f64) -> Self {
        Self {
            config,
            next_sample_time: initial_time + config.dt,
        }
    }

    pub fn should_sample(&self, current_time: f64) -> bool {
        current_time >= self.next_sample_time
    }

    /// Move to the next sample. Skips samples already missed so a stalled
    /// caller does not get a burst of back-to-back ticks.
    pub fn advance(&mut self, current_time: f64) {
        self.next_sample_time += self.config.dt;
        if self.next_sample_time <= current_time {
            let missed = ((current_time - self.next_sample_time) / self.config.dt).floor() + 1.0;
            self.next_sample_time += missed * self.config.dt;
        }
    }

    pub fn reset(&mut self, current_time: f64) {
        self.next_sample_time = current_time + self.config.dt;
    }

    pub fn time_until_sample(&self, current_time: f64) -> f64 {
        (self.next_sample_time - current_time).max(0.0)
    }
}
