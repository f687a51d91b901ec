//! Turn gate used by each controller tick.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::record::{CoordinationRecord, Owner};
use crate::store::TurnStore;
use crate::{CoordError, CoordResult};

/// How a gate waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    /// Sleep between two record reads.
    pub poll_interval: Duration,
    /// Give up after this long. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Log a stall warning every this many polls of one wait. 0 disables.
    pub stall_warn_polls: u32,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            timeout: None,
            stall_warn_polls: 50,
        }
    }
}

/// Wait counters for one gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateStats {
    pub waits: u64,
    /// Reads that found the turn held by the other owner.
    pub polls: u64,
    pub total_wait: Duration,
    pub longest_wait: Duration,
    pub read_errors: u64,
    pub timeouts: u64,
}

pub struct CoordinationGate {
    store: Arc<dyn TurnStore>,
    policy: GatePolicy,
    stats: GateStats,
}

impl CoordinationGate {
    pub fn new(store: Arc<dyn TurnStore>, policy: GatePolicy) -> Self {
        Self {
            store,
            policy,
            stats: GateStats::default(),
        }
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    pub fn stats(&self) -> &GateStats {
        &self.stats
    }

    /// Block until it is `owner`'s turn; returns how long that took.
    ///
    /// Read failures count as "no data": they are logged and the wait goes on.
    pub fn wait_for_turn(&mut self, owner: Owner) -> CoordResult<Duration> {
        let started = Instant::now();
        let mut polls: u64 = 0;
        self.stats.waits += 1;

        loop {
            match self.store.read() {
                Ok(record) if record.turn() == owner => break,
                Ok(_) => {}
                Err(e) => {
                    self.stats.read_errors += 1;
                    error!(%owner, error = %e, "reading coordination record failed");
                }
            }

            let waited = started.elapsed();
            if let Some(timeout) = self.policy.timeout
                && waited >= timeout
            {
                self.stats.timeouts += 1;
                self.record_wait(waited);
                return Err(CoordError::Timeout { owner, waited });
            }

            polls += 1;
            self.stats.polls += 1;
            let warn_every = u64::from(self.policy.stall_warn_polls);
            if warn_every > 0 && polls % warn_every == 0 {
                warn!(%owner, polls, waited_ms = waited.as_millis() as u64, "still waiting for turn");
            }
            thread::sleep(self.policy.poll_interval);
        }

        let waited = started.elapsed();
        self.record_wait(waited);
        debug!(%owner, polls, waited_ms = waited.as_millis() as u64, "turn acquired");
        Ok(waited)
    }

    /// Hand the turn to the other owner.
    ///
    /// # Errors
    ///
    /// `OutOfTurn` if it is not `owner`'s turn; the record is left unchanged.
    pub fn signal_done(&mut self, owner: Owner) -> CoordResult<CoordinationRecord> {
        let record = self.store.update(&mut |record| {
            let turn = record.turn();
            if turn != owner {
                return Err(CoordError::OutOfTurn { owner, turn });
            }
            record.mark_done(owner);
            Ok(())
        })?;
        debug!(%owner, next = %record.turn(), "turn handed over");
        Ok(record)
    }

    fn record_wait(&mut self, waited: Duration) {
        self.stats.total_wait += waited;
        self.stats.longest_wait = self.stats.longest_wait.max(waited);
    }
}
