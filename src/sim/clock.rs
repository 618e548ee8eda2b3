//! Fixed-step clock
//!
//! Turns variable frame time into whole simulation ticks. The leftover
//! fraction is exposed as `progress` for the renderer to interpolate with.

use serde::{Deserialize, Serialize};

use super::rewind::Rewindable;
use crate::settings::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridClock {
    step_duration_ms: f64,
    accumulator: f64,
}

/// Rewind capsule for [`GridClock`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridClockCapsule {
    pub step_duration_ms: f64,
    pub accumulator: f64,
}

fn check_step(step_ms: f64) -> Result<f64, ConfigError> {
    if step_ms.is_finite() && step_ms > 0.0 {
        Ok(step_ms)
    } else {
        Err(ConfigError::InvalidStepDuration(step_ms))
    }
}

impl GridClock {
    pub fn new(step_duration_ms: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            step_duration_ms: check_step(step_duration_ms)?,
            accumulator: 0.0,
        })
    }

    pub fn step_duration_ms(&self) -> f64 {
        self.step_duration_ms
    }

    /// Add frame time and return how many ticks elapsed.
    ///
    /// Negative or non-finite deltas are ignored. There is no cap: a long
    /// stall yields every tick it covers, up to `u32::MAX` per call with the
    /// rest left in the accumulator for later calls.
    pub fn advance(&mut self, delta_ms: f64) -> u32 {
        if !delta_ms.is_finite() || delta_ms < 0.0 {
            return 0;
        }
        self.accumulator += delta_ms;
        if self.accumulator < self.step_duration_ms {
            return 0;
        }
        let whole = (self.accumulator / self.step_duration_ms).floor();
        let ticks = whole.min(f64::from(u32::MAX));
        self.accumulator = (self.accumulator - ticks * self.step_duration_ms).max(0.0);
        ticks as u32
    }

    /// Fraction of the current step already elapsed, in [0, 1]
    pub fn progress(&self) -> f64 {
        (self.accumulator / self.step_duration_ms).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    /// Change the step length, keeping the same `progress`
    pub fn set_step_duration(&mut self, step_duration_ms: f64) -> Result<(), ConfigError> {
        let step = check_step(step_duration_ms)?;
        let progress = self.progress();
        self.step_duration_ms = step;
        self.accumulator = progress * step;
        Ok(())
    }
}

impl Rewindable for GridClock {
    type Capsule = GridClockCapsule;

    fn snapshot(&self) -> GridClockCapsule {
        GridClockCapsule {
            step_duration_ms: self.step_duration_ms,
            accumulator: self.accumulator,
        }
    }

    fn restore(&mut self, capsule: &GridClockCapsule) {
        self.step_duration_ms = capsule.step_duration_ms;
        self.accumulator = capsule.accumulator;
    }
}
