//! Fixed-period tick loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use bp_controls::{SampleClock, SampleConfig};
use bp_core::{TickStats, Timer};
use tracing::{debug, error, info};

use crate::mode::ModeSource;
use crate::roles::{TickContext, TickRole, log_report};

/// Runs a [`TickRole`] once per sample period until told to stop.
///
/// A failing tick is logged and skipped; the loop itself never fails.
/// Samples missed during a long tick or an injected stall are dropped,
/// not replayed.
pub struct TickDriver {
    sample: SampleConfig,
    mode: ModeSource,
    max_ticks: Option<u64>,
    shutdown: Arc<AtomicBool>,
}

impl TickDriver {
    pub fn new(sample: SampleConfig, mode: ModeSource) -> Self {
        Self {
            sample,
            mode,
            max_ticks: None,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Flag that stops the loop before its next tick.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn run(&mut self, role: &mut dyn TickRole) -> TickStats {
        let mut stats = TickStats::new(self.sample.period());
        let mut origin: Option<Instant> = None;
        let mut clock = SampleClock::new(self.sample, 0.0);
        let mut last_start: Option<Instant> = None;
        let mut tick: u64 = 0;
        info!(role = role.name(), period_s = self.sample.dt, "tick loop started");

        while !self.shutdown.load(Ordering::Relaxed) {
            if self.max_ticks.is_some_and(|max| tick >= max) {
                break;
            }
            let now = Instant::now();
            let origin = *origin.get_or_insert(now);
            let elapsed = last_start.map_or(Duration::ZERO, |last| now - last);
            last_start = Some(now);

            let ctx = TickContext {
                tick,
                elapsed_s: elapsed.as_secs_f64(),
                mode: self.mode.current(),
            };
            let timer = Timer::start("tick");
            let result = role.tick(&ctx);
            let latency = timer.elapsed();

            let delay = match &result {
                Ok(out) => {
                    log_report(role.name(), out);
                    out.delay()
                }
                Err(e) => {
                    error!(role = role.name(), tick, error = %e, "tick failed, skipped");
                    None
                }
            };
            stats.record(latency, result.is_ok());
            debug!(
                role = role.name(),
                alive_s = stats.alive_time().as_secs_f64(),
                latency_s = latency.as_secs_f64(),
                "Alive time {:.2} sec, loop latency {:.4} sec",
                stats.alive_time().as_secs_f64(),
                latency.as_secs_f64()
            );

            // No lock is held here.
            if let Some(delay) = delay {
                thread::sleep(delay);
            }
            tick += 1;
            let wait = clock.time_until_sample(origin.elapsed().as_secs_f64());
            thread::sleep(Duration::from_secs_f64(wait));
            clock.advance(origin.elapsed().as_secs_f64());
        }

        info!(
            role = role.name(),
            ticks = stats.ticks,
            failed = stats.failed_ticks,
            overruns = stats.overruns,
            "tick loop stopped"
        );
        stats
    }
}
