//! Per-episode exploration decay

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How epsilon shrinks after each training episode.
///
/// The two modes are alternatives chosen once per run; they never compose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum DecaySchedule {
    /// `ε ← ε · rate`
    Multiplicative { rate: f64 },
    /// `ε ← floor + (ε₀ − floor) · exp(−rate · episode)`
    Exponential { rate: f64, floor: f64 },
}

impl DecaySchedule {
    pub fn rate(&self) -> f64 {
        match self {
            DecaySchedule::Multiplicative { rate } | DecaySchedule::Exponential { rate, .. } => {
                *rate
            }
        }
    }
}

/// Name of a decay mode as written in configuration files.
///
/// Parsing ignores case and surrounding whitespace; `normal` is accepted as
/// another name for `multiplicative`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum DecayMode {
    #[default]
    Multiplicative,
    Exponential,
}

impl fmt::Display for DecayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecayMode::Multiplicative => write!(f, "multiplicative"),
            DecayMode::Exponential => write!(f, "exponential"),
        }
    }
}

impl TryFrom<String> for DecayMode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl FromStr for DecayMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multiplicative" | "normal" => Ok(DecayMode::Multiplicative),
            "exponential" => Ok(DecayMode::Exponential),
            other => Err(Error::config(format!(
                "unknown decay mode '{other}' (expected 'multiplicative' or 'exponential')"
            ))),
        }
    }
}

/// Live exploration rate plus the value the run started from.
///
/// Exponential decay recomputes from the initial epsilon on every call, so
/// the two are tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonScheduler {
    schedule: DecaySchedule,
    initial: f64,
    current: f64,
}

impl EpsilonScheduler {
    /// Create a scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if epsilon is outside [0, 1],
    /// the multiplicative rate is outside (0, 1], the exponential rate is
    /// negative, or the floor is outside [0, ε₀].
    pub fn new(epsilon: f64, schedule: DecaySchedule) -> Result<Self> {
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(Error::config(format!(
                "epsilon must be in [0, 1], got {epsilon}"
            )));
        }
        match schedule {
            DecaySchedule::Multiplicative { rate } => {
                if !(rate > 0.0 && rate <= 1.0) {
                    return Err(Error::config(format!(
                        "multiplicative decay must be in (0, 1], got {rate}"
                    )));
                }
            }
            DecaySchedule::Exponential { rate, floor } => {
                if !(rate >= 0.0 && rate.is_finite()) {
                    return Err(Error::config(format!(
                        "exponential decay rate must be finite and non-negative, got {rate}"
                    )));
                }
                if !(0.0..=epsilon).contains(&floor) {
                    return Err(Error::config(format!(
                        "epsilon floor must be in [0, {epsilon}], got {floor}"
                    )));
                }
            }
        }
        Ok(Self {
            schedule,
            initial: epsilon,
            current: epsilon,
        })
    }

    pub fn schedule(&self) -> DecaySchedule {
        self.schedule
    }

    /// Exploration rate the run started with.
    pub fn initial(&self) -> f64 {
        self.initial
    }

    /// Exploration rate in effect now.
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Advance the schedule after `episode` (1-based) and return the new rate.
    pub fn decay(&mut self, episode: usize) -> f64 {
        self.current = match self.schedule {
            DecaySchedule::Multiplicative { rate } => self.current * rate,
            DecaySchedule::Exponential { rate, floor } => {
                floor + (self.initial - floor) * (-rate * episode as f64).exp()
            }
        };
        self.current
    }
}
