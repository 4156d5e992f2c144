//! Batch transform: hands + sessions in, rake report out

use serde::Serialize;
use tracing::{debug, info_span, warn};

use crate::config::EngineConfig;
use crate::equity::{reconstruct, CurveTotals};
use crate::error::EngineResult;
use crate::interval::IntervalIndex;
use crate::matching::{assign, Assignment};
use crate::rake::{CappedPotRake, RakeModel};
use crate::records::{validate_hands, validate_sessions, AdjustedHandRecord, HandRecord, SessionRecord, StakeAggregate};
use crate::stakes::aggregate;

/// Expected versus matched hand count for one session.
///
/// `matched_hands` counts only hands placed by the matcher; hands the
/// fallback policy pushed into the session are counted in `fallback_hands`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStat {
    pub session: usize,
    pub start_timestamp: i64,
    pub stakes: String,
    pub big_blind: f64,
    pub expected_hands: u32,
    pub matched_hands: u32,
    pub fallback_hands: u32,
}

impl SessionStat {
    /// Matched hands more than 5% and more than 3 hands away from the logged count
    pub fn is_discrepant(&self) -> bool {
        let diff = (self.matched_hands as i64 - self.expected_hands as i64).unsigned_abs();
        let pct = if self.expected_hands > 0 {
            diff as f64 / self.expected_hands as f64 * 100.0
        } else if diff > 0 {
            f64::INFINITY
        } else {
            0.0
        };
        pct > 5.0 && diff > 3
    }
}

/// Everything one run produces
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RakeReport {
    pub adjusted_hands: Vec<AdjustedHandRecord>,
    /// One row per stakes label, big blind descending
    pub stake_aggregates: Vec<StakeAggregate>,
    /// Sum of all stake rows
    pub stake_total: StakeAggregate,
    pub totals: CurveTotals,
    pub session_stats: Vec<SessionStat>,
}

/// Rake engine bound to one validated configuration.
#[derive(Debug, Clone)]
pub struct RakeEngine<M: RakeModel = CappedPotRake> {
    config: EngineConfig,
    model: M,
}

impl RakeEngine<CappedPotRake> {
    /// Validate the configuration and build an engine with the default model
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(RakeEngine { config, model: CappedPotRake::new(config.rake) })
    }
}

impl<M: RakeModel> RakeEngine<M> {
    /// Use a custom rake model; the rake section of `config` is still validated
    pub fn with_model(config: EngineConfig, model: M) -> EngineResult<Self> {
        config.validate()?;
        Ok(RakeEngine { config, model })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Match hands to sessions only
    pub fn assign(&self, hands: &[HandRecord], sessions: &[SessionRecord]) -> EngineResult<Assignment> {
        validate_hands(hands)?;
        validate_sessions(sessions)?;
        let index = IntervalIndex::build(sessions);
        assign(hands, sessions, &index, self.config.matching)
    }

    /// Run the full transform. Either every output is populated and
    /// consistent, or an error is returned.
    pub fn run(&self, hands: &[HandRecord], sessions: &[SessionRecord]) -> EngineResult<RakeReport> {
        let span = info_span!("rake_run", hands = hands.len(), sessions = sessions.len());
        let _guard = span.enter();

        let assignment = self.assign(hands, sessions)?;
        let curve = reconstruct(hands, sessions, &assignment, &self.model);
        let summary = aggregate(&curve, sessions)?;
        let session_stats = session_stats(sessions, &assignment);

        for stat in session_stats.iter().filter(|s| s.is_discrepant()) {
            warn!(
                session = stat.session,
                start = stat.start_timestamp,
                expected = stat.expected_hands,
                matched = stat.matched_hands,
                fallback = stat.fallback_hands,
                "matched hand count differs from session log"
            );
        }
        debug!(rows = summary.rows.len(), "stake aggregation complete");

        Ok(RakeReport {
            adjusted_hands: curve.points,
            stake_aggregates: summary.rows,
            stake_total: summary.total,
            totals: curve.totals,
            session_stats,
        })
    }
}

fn session_stats(sessions: &[SessionRecord], assignment: &Assignment) -> Vec<SessionStat> {
    let mut fallback = vec![0u32; sessions.len()];
    for (pos, &session) in assignment.sessions().iter().enumerate() {
        if assignment.is_fallback(pos) {
            fallback[session] += 1;
        }
    }
    sessions
        .iter()
        .zip(assignment.loads())
        .zip(fallback)
        .enumerate()
        .map(|(id, ((s, &load), fallback_hands))| SessionStat {
            session: id,
            start_timestamp: s.start_timestamp,
            stakes: s.stakes.clone(),
            big_blind: s.big_blind,
            expected_hands: s.expected_hand_count,
            matched_hands: load - fallback_hands,
            fallback_hands,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FallbackPolicy, MatchingMode, RakeConfig};
    use crate::error::EngineError;
    use crate::fixtures::{scenario_a_hands, scenario_a_sessions, scenario_e_hands, scenario_e_sessions, synthetic_run};
    use crate::rake::RakeOutcome;
    use crate::records::HandDelta;

    #[test]
    fn test_rejects_invalid_config_before_running() {
        let config = EngineConfig::new(RakeConfig::new(1.5, 3.0), MatchingMode::Strict);
        assert!(matches!(RakeEngine::new(config), Err(EngineError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_scenario_a_report() {
        let engine = RakeEngine::new(EngineConfig::default()).unwrap();
        let report = engine.run(&scenario_a_hands(), &scenario_a_sessions()).unwrap();
        assert_eq!(report.adjusted_hands.len(), 3);
        let sessions: Vec<usize> = report.adjusted_hands.iter().map(|h| h.session).collect();
        assert_eq!(sessions, vec![0, 0, 1]);
        assert_eq!(report.totals.fallback_hands, 0);
        assert_eq!(report.stake_total.hands, 3);
        assert_eq!(report.session_stats[0].matched_hands, 2);
        assert!(report.session_stats.iter().all(|s| !s.is_discrepant()));
    }

    #[test]
    fn test_scenario_b_strict_and_tolerant() {
        let sessions = scenario_a_sessions();
        let hands = vec![HandRecord::new(1, 1_000, 5.0, 5.0)];

        let strict = RakeEngine::new(EngineConfig::default()).unwrap();
        assert!(matches!(
            strict.run(&hands, &sessions),
            Err(EngineError::NoCompatibleSession { label: 1, timestamp: 1_000, .. })
        ));

        let tolerant = RakeEngine::new(EngineConfig::new(
            RakeConfig::default(),
            MatchingMode::Tolerant(FallbackPolicy::NearestInTime),
        ))
        .unwrap();
        let report = tolerant.run(&hands, &sessions).unwrap();
        assert_eq!(report.adjusted_hands[0].session, 1);
        assert!(report.adjusted_hands[0].fallback);
        assert_eq!(report.totals.fallback_hands, 1);
        assert_eq!(report.session_stats[1].matched_hands, 0);
        assert_eq!(report.session_stats[1].fallback_hands, 1);
    }

    #[test]
    fn test_fallback_hands_not_counted_as_matched() {
        // three hands inside session 0's window, which holds two
        let sessions = scenario_a_sessions();
        let hands = vec![
            HandRecord::new(1, 10, 1.0, 1.0),
            HandRecord::new(2, 20, 2.0, 2.0),
            HandRecord::new(3, 30, 3.0, 3.0),
        ];
        let engine = RakeEngine::new(EngineConfig::new(
            RakeConfig::default(),
            MatchingMode::Tolerant(FallbackPolicy::NearestInTime),
        ))
        .unwrap();
        let report = engine.run(&hands, &sessions).unwrap();
        let stat = &report.session_stats[0];
        assert_eq!(stat.matched_hands, 2);
        assert_eq!(stat.fallback_hands, 1);
        assert!(!stat.is_discrepant());
        assert_eq!(report.totals.fallback_hands, 1);
    }

    #[test]
    fn test_scenario_e_report_uses_higher_big_blind() {
        let engine = RakeEngine::new(EngineConfig::default()).unwrap();
        let report = engine.run(&scenario_e_hands(), &scenario_e_sessions()).unwrap();
        assert_eq!(report.adjusted_hands[0].big_blind, 1.0);
        assert_eq!(report.stake_aggregates[0].stakes, "$0.50/$1");
    }

    #[test]
    fn test_rejects_bad_labels() {
        let engine = RakeEngine::new(EngineConfig::default()).unwrap();
        let hands = vec![HandRecord::new(2, 100, 1.0, 1.0)];
        assert!(matches!(engine.run(&hands, &scenario_a_sessions()), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_run_is_reproducible() {
        let (hands, sessions) = synthetic_run(1_500, 77);
        let engine = RakeEngine::new(EngineConfig::default()).unwrap();
        let first = engine.run(&hands, &sessions).unwrap();
        let second = engine.run(&hands, &sessions).unwrap();
        assert_eq!(first, second);
    }

    struct FlatRake(f64);

    impl RakeModel for FlatRake {
        fn apply(&self, delta: HandDelta, _big_blind: f64) -> RakeOutcome {
            if delta.amount > 0.0 {
                RakeOutcome { rake: self.0, amount: delta.amount - self.0, ev: delta.ev }
            } else {
                RakeOutcome { rake: 0.0, amount: delta.amount, ev: delta.ev }
            }
        }
    }

    #[test]
    fn test_custom_model() {
        let engine = RakeEngine::with_model(EngineConfig::default(), FlatRake(0.5)).unwrap();
        let report = engine.run(&scenario_a_hands(), &scenario_a_sessions()).unwrap();
        // two winning hands
        assert!((report.totals.total_rake - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_discrepancy_threshold() {
        let stat = |expected, matched| SessionStat {
            session: 0,
            start_timestamp: 0,
            stakes: String::new(),
            big_blind: 1.0,
            expected_hands: expected,
            matched_hands: matched,
            fallback_hands: 0,
        };
        assert!(!stat(100, 97).is_discrepant());
        assert!(stat(100, 90).is_discrepant());
        assert!(!stat(10, 7).is_discrepant());
        assert!(stat(0, 4).is_discrepant());
    }
}
