//! Per-stake summary rows over the rake-adjusted series

use std::collections::HashMap;

use serde::Serialize;

use crate::equity::EquityCurve;
use crate::error::{EngineError, EngineResult};
use crate::records::{SessionRecord, StakeAggregate};

/// Label used for the TOTAL row
pub const TOTAL_LABEL: &str = "TOTAL";

/// Stake rows plus their TOTAL row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakeSummary {
    /// One row per stakes label, big blind descending
    pub rows: Vec<StakeAggregate>,
    pub total: StakeAggregate,
}

/// Group the adjusted hands by their session's stakes label.
///
/// BB figures are summed hand by hand with each hand's own big blind, so a
/// label shared by sessions of different sizes still converts correctly. The
/// TOTAL row is checked against the curve's final cumulative values.
///
/// # Panics
///
/// If a point of `curve` names a session outside `sessions`, i.e. the curve
/// was reconstructed against a different session slice.
pub fn aggregate(curve: &EquityCurve, sessions: &[SessionRecord]) -> EngineResult<StakeSummary> {
    let total_hands = curve.points.len();
    let mut rows: Vec<StakeAggregate> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();

    for point in &curve.points {
        let session = &sessions[point.session];
        let i = *slot.entry(session.stakes.as_str()).or_insert_with(|| {
            rows.push(StakeAggregate::empty(session.stakes.clone(), session.big_blind));
            rows.len() - 1
        });
        let row = &mut rows[i];
        row.hands += 1;
        row.winloss += point.delta.amount;
        row.ev += point.delta.ev;
        row.bb_result += point.delta.amount / point.big_blind;
        row.ev_bb_result += point.delta.ev / point.big_blind;
    }

    let mut total = StakeAggregate::empty(TOTAL_LABEL, 0.0);
    for row in rows.iter_mut() {
        row.finish(total_hands);
        total.hands += row.hands;
        total.winloss += row.winloss;
        total.ev += row.ev;
        total.bb_result += row.bb_result;
        total.ev_bb_result += row.ev_bb_result;
    }
    total.finish(total_hands);

    // Stable: first-seen order breaks big blind ties
    rows.sort_by(|a, b| b.big_blind.total_cmp(&a.big_blind));

    check_conservation(curve, &total)?;
    Ok(StakeSummary { rows, total })
}

fn check_conservation(curve: &EquityCurve, total: &StakeAggregate) -> EngineResult<()> {
    let scale: f64 = curve
        .points
        .iter()
        .map(|p| p.delta.amount.abs() + p.delta.ev.abs())
        .sum();
    let tolerance = 1e-9 * scale.max(1.0);

    let checks = [
        ("winloss", total.winloss, curve.totals.adjusted_amount),
        ("ev", total.ev, curve.totals.adjusted_ev),
        ("bb result", total.bb_result, curve.totals.bb_result),
    ];
    for (quantity, aggregated, cumulative) in checks {
        if (aggregated - cumulative).abs() > tolerance {
            return Err(EngineError::ConservationViolated { quantity, aggregated, cumulative });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MatchingMode, RakeConfig};
    use crate::equity::reconstruct;
    use crate::fixtures::{scenario_a_hands, scenario_a_sessions, synthetic_run};
    use crate::interval::IntervalIndex;
    use crate::matching::assign;
    use crate::rake::CappedPotRake;
    use crate::records::HandRecord;

    fn summary_for(hands: &[HandRecord], sessions: &[SessionRecord]) -> (EquityCurve, StakeSummary) {
        let index = IntervalIndex::build(sessions);
        let assignment = assign(hands, sessions, &index, MatchingMode::Strict).unwrap();
        let curve = reconstruct(hands, sessions, &assignment, &CappedPotRake::new(RakeConfig::default()));
        let summary = aggregate(&curve, sessions).unwrap();
        (curve, summary)
    }

    #[test]
    fn test_scenario_a_rows() {
        let (_, summary) = summary_for(&scenario_a_hands(), &scenario_a_sessions());
        assert_eq!(summary.rows.len(), 2);

        // Highest big blind first
        let high = &summary.rows[0];
        assert_eq!(high.stakes, "$1/$2");
        assert_eq!(high.hands, 1);
        assert!((high.winloss - 94.0).abs() < 1e-10);
        assert!((high.bb_result - 47.0).abs() < 1e-10);
        assert!((high.bb_per_100 - 4_700.0).abs() < 1e-8);
        assert!((high.percentage - 100.0 / 3.0).abs() < 1e-10);

        let low = &summary.rows[1];
        assert_eq!(low.hands, 2);
        assert!((low.winloss - 5.0).abs() < 1e-10);
        assert!((low.bb_per_100 - 250.0).abs() < 1e-8);

        let total = &summary.total;
        assert_eq!(total.stakes, TOTAL_LABEL);
        assert_eq!(total.hands, 3);
        assert!((total.winloss - 99.0).abs() < 1e-10);
        assert!((total.bb_result - 52.0).abs() < 1e-10);
        assert!((total.percentage - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_shared_label_converts_per_hand() {
        let sessions = vec![
            SessionRecord::new(0, 100, 0, 1, 1.0, "mixed"),
            SessionRecord::new(200, 100, 0, 1, 2.0, "mixed"),
        ];
        let hands = vec![HandRecord::new(1, 50, -4.0, -4.0), HandRecord::new(2, 250, -8.0, -8.0)];
        let (_, summary) = summary_for(&hands, &sessions);
        assert_eq!(summary.rows.len(), 1);
        // -4/1 + -4/2
        assert!((summary.rows[0].bb_result + 6.0).abs() < 1e-10);
        assert_eq!(summary.rows[0].big_blind, 1.0);
    }

    #[test]
    fn test_totals_conserve_final_cumulative() {
        let (hands, sessions) = synthetic_run(1_000, 2024);
        let (curve, summary) = summary_for(&hands, &sessions);
        let row_sum: f64 = summary.rows.iter().map(|r| r.winloss).sum();
        assert!((row_sum - curve.totals.adjusted_amount).abs() < 1e-6);
        let hand_sum: usize = summary.rows.iter().map(|r| r.hands).sum();
        assert_eq!(hand_sum, hands.len());
        let pct: f64 = summary.rows.iter().map(|r| r.percentage).sum();
        assert!((pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_detects_broken_totals() {
        let (mut curve, _) = summary_for(&scenario_a_hands(), &scenario_a_sessions());
        curve.totals.adjusted_amount += 1.0;
        let err = aggregate(&curve, &scenario_a_sessions()).unwrap_err();
        assert!(matches!(err, EngineError::ConservationViolated { quantity: "winloss", .. }));
    }

    #[test]
    fn test_empty_summary() {
        let (_, summary) = summary_for(&[], &scenario_a_sessions());
        assert!(summary.rows.is_empty());
        assert_eq!(summary.total.hands, 0);
        assert_eq!(summary.total.bb_per_100, 0.0);
        assert_eq!(summary.total.percentage, 0.0);
    }
}
