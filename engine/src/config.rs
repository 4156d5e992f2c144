//! Engine configuration: rake parameters and the matching mode

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Rake parameters shared by every hand of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RakeConfig {
    /// Share of the estimated pot taken as rake, in [0, 1]
    pub percentage: f64,
    /// Rake cap expressed in big blinds of the hand's session
    pub cap_in_bb: f64,
}

impl Default for RakeConfig {
    fn default() -> Self {
        RakeConfig { percentage: 0.05, cap_in_bb: 3.0 }
    }
}

impl RakeConfig {
    pub fn new(percentage: f64, cap_in_bb: f64) -> Self {
        RakeConfig { percentage, cap_in_bb }
    }

    /// Reject percentages outside [0, 1] and negative caps (NaN included).
    pub fn validate(&self) -> EngineResult<()> {
        if !(0.0..=1.0).contains(&self.percentage) {
            return Err(EngineError::InvalidConfiguration(format!(
                "rake percentage {} is outside [0, 1]",
                self.percentage
            )));
        }
        if !(self.cap_in_bb >= 0.0 && self.cap_in_bb.is_finite()) {
            return Err(EngineError::InvalidConfiguration(format!(
                "rake cap {} BB must be a finite value >= 0",
                self.cap_in_bb
            )));
        }
        Ok(())
    }
}

/// How a hand that cannot be matched is placed in tolerant mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Session whose window boundary is closest to the hand's timestamp
    NearestInTime,
    /// Session with the largest big blind
    HighestStakes,
}

/// What the matching engine does with hands it cannot place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "fallback")]
pub enum MatchingMode {
    /// Every hand must be placed inside a compatible session with capacity
    #[default]
    Strict,
    /// Unplaceable hands go through the named fallback and are flagged
    Tolerant(FallbackPolicy),
}

/// Full configuration for one engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rake: RakeConfig,
    pub matching: MatchingMode,
}

impl EngineConfig {
    pub fn new(rake: RakeConfig, matching: MatchingMode) -> Self {
        EngineConfig { rake, matching }
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.rake.validate()
    }
}
