//! Rake model: what the house would have withheld from one hand
//!
//! The default model estimates the pot of a winning hand as twice the amount
//! won, charges a percentage of that pot up to a cap in big blinds, and
//! charges the all-in EV in proportion to the estimated equity share. These
//! are domain heuristics, not a derivation: losing and break-even hands are
//! never raked, and a non-positive EV passes through untouched.

use crate::config::RakeConfig;
use crate::records::HandDelta;

/// Result of raking one hand
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RakeOutcome {
    /// Rake charged, in currency units (>= 0)
    pub rake: f64,
    /// Amount after rake
    pub amount: f64,
    /// All-in EV after rake
    pub ev: f64,
}

impl RakeOutcome {
    /// Adjusted delta as a `HandDelta`
    pub fn delta(&self) -> HandDelta {
        HandDelta::new(self.amount, self.ev)
    }
}

/// Rake model trait
///
/// Implementations must be pure: the same delta and big blind always give the
/// same outcome. `Sync` lets the reconstructor rake hands on the rayon pool.
pub trait RakeModel: Sync {
    /// Rake a single hand's delta played at the given big blind
    fn apply(&self, delta: HandDelta, big_blind: f64) -> RakeOutcome;
}

/// Percentage-of-pot rake with a cap in big blinds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CappedPotRake {
    config: RakeConfig,
}

impl CappedPotRake {
    pub fn new(config: RakeConfig) -> Self {
        CappedPotRake { config }
    }

    pub fn config(&self) -> RakeConfig {
        self.config
    }
}

impl Default for CappedPotRake {
    fn default() -> Self {
        Self::new(RakeConfig::default())
    }
}

impl RakeModel for CappedPotRake {
    fn apply(&self, delta: HandDelta, big_blind: f64) -> RakeOutcome {
        if delta.amount <= 0.0 {
            return RakeOutcome { rake: 0.0, amount: delta.amount, ev: delta.ev };
        }

        let pot = 2.0 * delta.amount;
        let rake = (pot * self.config.percentage).min(self.config.cap_in_bb * big_blind);

        let ev = if delta.ev > 0.0 {
            // Our stake in the pot is half of it; equity = (stake + ev) / pot
            let equity = (pot / 2.0 + delta.ev) / pot;
            delta.ev - rake * equity
        } else {
            delta.ev
        };

        RakeOutcome { rake, amount: delta.amount - rake, ev }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_model() -> CappedPotRake {
        CappedPotRake::new(RakeConfig::new(0.05, 3.0))
    }

    #[test]
    fn test_uncapped_rake() {
        // pot 20, 5% = 1.0, cap 3.0
        let out = default_model().apply(HandDelta::new(10.0, 0.0), 1.0);
        assert!((out.rake - 1.0).abs() < 1e-10);
        assert!((out.amount - 9.0).abs() < 1e-10);
    }

    #[test]
    fn test_cap_binds() {
        // pot 200, 5% = 10.0, cap 3.0
        let out = default_model().apply(HandDelta::new(100.0, 0.0), 1.0);
        assert!((out.rake - 3.0).abs() < 1e-10);
        assert!((out.amount - 97.0).abs() < 1e-10);
    }

    #[test]
    fn test_cap_scales_with_big_blind() {
        let out = default_model().apply(HandDelta::new(100.0, 0.0), 0.1);
        assert!((out.rake - 0.3).abs() < 1e-10);
    }

    #[test]
    fn test_no_rake_on_losses() {
        for amount in [-5.0, 0.0] {
            let delta = HandDelta::new(amount, 2.5);
            let out = default_model().apply(delta, 1.0);
            assert_eq!(out.rake, 0.0);
            assert_eq!(out.delta(), delta);
        }
    }

    #[test]
    fn test_positive_ev_charged_by_equity_share() {
        // pot 20, rake 1.0, equity (10 + 10) / 20 = 1.0 -> ev 10 - 1
        let out = default_model().apply(HandDelta::new(10.0, 10.0), 1.0);
        assert!((out.ev - 9.0).abs() < 1e-10);

        // equity (10 + 4) / 20 = 0.7 -> ev 4 - 0.7
        let out = default_model().apply(HandDelta::new(10.0, 4.0), 1.0);
        assert!((out.ev - 3.3).abs() < 1e-10);
    }

    #[test]
    fn test_non_positive_ev_passes_through() {
        let out = default_model().apply(HandDelta::new(10.0, -6.0), 1.0);
        assert_eq!(out.ev, -6.0);
        assert!((out.rake - 1.0).abs() < 1e-10);

        let out = default_model().apply(HandDelta::new(10.0, 0.0), 1.0);
        assert_eq!(out.ev, 0.0);
    }

    #[test]
    fn test_zero_percentage_is_rake_free() {
        let model = CappedPotRake::new(RakeConfig::new(0.0, 3.0));
        let out = model.apply(HandDelta::new(50.0, 20.0), 1.0);
        assert_eq!(out.rake, 0.0);
        assert_eq!(out.amount, 50.0);
        assert_eq!(out.ev, 20.0);
    }
}
