//! Ordered fault application with a cursor.

use std::time::Duration;

use bp_core::{Actuator, ProcessState, Severity, report};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::FaultResult;
use crate::fault::{FaultKind, StickState};

/// What happens once the cursor runs off the end of the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorPolicy {
    /// Every fault once, then nothing.
    #[default]
    OneShot,
    /// Start over from the first fault.
    Cyclic,
}

/// Record of one applied fault.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedFault {
    /// Position in the fault list.
    pub index: usize,
    pub name: &'static str,
    pub severity: Severity,
    pub detail: String,
    /// Time the caller must stall its tick for.
    pub delay: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaultOutcome {
    pub applied: Option<AppliedFault>,
}

impl FaultOutcome {
    pub fn delay(&self) -> Option<Duration> {
        self.applied.as_ref().and_then(|a| a.delay)
    }
}

/// Applies one fault per call, in list order.
///
/// The random source is a type parameter so tests and simulations can pin
/// it; [`FaultSequencer::seeded`] gives the default ChaCha generator.
#[derive(Debug, Clone)]
pub struct FaultSequencer<R: Rng = ChaCha8Rng> {
    faults: Vec<FaultKind>,
    policy: CursorPolicy,
    cursor: usize,
    rng: R,
    overrides: Vec<(Actuator, bool)>,
}

impl FaultSequencer<ChaCha8Rng> {
    pub fn seeded(faults: Vec<FaultKind>, policy: CursorPolicy, seed: u64) -> FaultResult<Self> {
        Self::with_rng(faults, policy, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> FaultSequencer<R> {
    pub fn with_rng(faults: Vec<FaultKind>, policy: CursorPolicy, rng: R) -> FaultResult<Self> {
        for (index, fault) in faults.iter().enumerate() {
            fault.validate(index)?;
        }
        Ok(Self {
            faults,
            policy,
            cursor: 0,
            rng,
            overrides: Vec::new(),
        })
    }

    pub fn faults(&self) -> &[FaultKind] {
        &self.faults
    }

    pub fn policy(&self) -> CursorPolicy {
        self.policy
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// True once a one-shot list has been fully applied, or the list is empty.
    pub fn is_exhausted(&self) -> bool {
        match self.policy {
            CursorPolicy::OneShot => self.cursor >= self.faults.len(),
            CursorPolicy::Cyclic => self.faults.is_empty(),
        }
    }

    /// Actuator states pinned by the last sticking fault.
    pub fn overrides(&self) -> &[(Actuator, bool)] {
        &self.overrides
    }

    /// Apply the fault under the cursor and move the cursor on.
    ///
    /// Clears any sticking override from the previous step. Values written
    /// into `state` are left exactly as the fault produced them, even when
    /// out of range.
    pub fn apply_next(&mut self, state: &mut ProcessState) -> FaultResult<FaultOutcome> {
        self.overrides.clear();
        if self.is_exhausted() {
            tracing::debug!(cursor = self.cursor, "fault list exhausted");
            return Ok(FaultOutcome::default());
        }

        let index = self.cursor;
        let fault = self.faults[index].clone();
        let (detail, delay) = self.apply(&fault, state)?;
        self.cursor = match self.policy {
            CursorPolicy::OneShot => index + 1,
            CursorPolicy::Cyclic => (index + 1) % self.faults.len(),
        };

        let severity = fault.severity();
        let context = format!("fault #{index} ({})", fault.name());
        report(severity, &detail, Some(&context));

        Ok(FaultOutcome {
            applied: Some(AppliedFault {
                index,
                name: fault.name(),
                severity,
                detail,
                delay,
            }),
        })
    }

    /// Re-impose the pinned actuator states, e.g. after decision logic ran.
    pub fn enforce_overrides(&self, state: &mut ProcessState) {
        for &(actuator, on) in &self.overrides {
            state.set_actuator_status(actuator, on);
        }
    }

    fn apply(
        &mut self,
        fault: &FaultKind,
        state: &mut ProcessState,
    ) -> FaultResult<(String, Option<Duration>)> {
        match fault {
            FaultKind::SensorDrift { target, amplitude } => {
                let drift = self.rng.gen_range(-amplitude..=*amplitude);
                let value = state.tag_value(*target) + drift;
                state.set_tag_value(*target, value)?;
                Ok((format!("Sensor drift applied. Drifted {target}: {value:.2}"), None))
            }
            FaultKind::Leak { target, min, max } => {
                let leak = self.rng.gen_range(*min..=*max);
                let value = (state.tag_value(*target) - leak).max(0.0);
                state.set_tag_value(*target, value)?;
                Ok((format!("Leak applied. {target} reduced to: {value:.2}"), None))
            }
            FaultKind::Sticking { actuators, state: stick } => {
                let on = match stick {
                    StickState::Off => false,
                    StickState::On => true,
                    StickState::Random => self.rng.gen_bool(0.5),
                };
                for &actuator in actuators {
                    state.set_actuator_status(actuator, on);
                    self.overrides.push((actuator, on));
                }
                let names = actuators
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                Ok((
                    format!("Sticking applied. {names} set to {}", u8::from(on)),
                    None,
                ))
            }
            FaultKind::Corruption { target, min, max } => {
                let value = self.rng.gen_range(*min..=*max);
                state.set_tag_value(*target, f64::from(value))?;
                Ok((format!("Memory corruption applied. {target} set to {value}"), None))
            }
            FaultKind::Delay { min_s, max_s } => {
                let secs = self.rng.gen_range(*min_s..=*max_s);
                Ok((
                    format!("Overheating applied. Processing delayed by {secs:.2} seconds."),
                    Some(Duration::from_secs_f64(secs)),
                ))
            }
        }
    }
}
