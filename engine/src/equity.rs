//! Equity reconstruction: cumulative series in, rake-adjusted series out
//!
//! The recorded series is cumulative, so it is first differenced into per-hand
//! deltas. Each delta is raked with its session's big blind (in parallel; the
//! model is pure) and the results are re-accumulated in hand order. Output
//! length always equals input length.

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::matching::Assignment;
use crate::rake::{RakeModel, RakeOutcome};
use crate::records::{AdjustedHandRecord, HandDelta, HandRecord, SessionRecord};

/// Summary of a reconstructed run (the final row plus raw comparisons)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveTotals {
    pub hands: usize,
    /// Final recorded cumulative amount
    pub raw_amount: f64,
    /// Final recorded cumulative EV
    pub raw_ev: f64,
    pub adjusted_amount: f64,
    pub adjusted_ev: f64,
    pub total_rake: f64,
    pub total_rake_bb: f64,
    pub rake_bb_per_100: f64,
    pub bb_result: f64,
    pub fallback_hands: usize,
}

/// Rake-adjusted series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityCurve {
    pub points: Vec<AdjustedHandRecord>,
    pub totals: CurveTotals,
}

/// Per-hand deltas: `delta[0] = cumulative[0]`, then successive differences.
pub fn deltas(hands: &[HandRecord]) -> Vec<HandDelta> {
    let mut prev = HandDelta::default();
    hands
        .iter()
        .map(|h| {
            let d = HandDelta::new(h.cumulative_amount - prev.amount, h.cumulative_ev - prev.ev);
            prev = HandDelta::new(h.cumulative_amount, h.cumulative_ev);
            d
        })
        .collect()
}

/// Rebuild the series with rake removed.
///
/// # Panics
///
/// If `assignment` does not come from matching these `hands` against these
/// `sessions`: it must hold one entry per hand, each a valid index into
/// `sessions`. `RakeEngine::run` always satisfies this.
pub fn reconstruct<M: RakeModel>(
    hands: &[HandRecord],
    sessions: &[SessionRecord],
    assignment: &Assignment,
    model: &M,
) -> EquityCurve {
    debug_assert_eq!(hands.len(), assignment.len());
    let raw = deltas(hands);

    let outcomes: Vec<RakeOutcome> = raw
        .par_iter()
        .enumerate()
        .map(|(pos, &delta)| model.apply(delta, sessions[assignment.session_of(pos)].big_blind))
        .collect();

    let mut points = Vec::with_capacity(hands.len());
    let mut totals = CurveTotals { hands: hands.len(), ..CurveTotals::default() };

    for (pos, (hand, outcome)) in hands.iter().zip(&outcomes).enumerate() {
        let session = assignment.session_of(pos);
        let big_blind = sessions[session].big_blind;

        totals.adjusted_amount += outcome.amount;
        totals.adjusted_ev += outcome.ev;
        totals.total_rake += outcome.rake;
        totals.total_rake_bb += outcome.rake / big_blind;
        totals.bb_result += outcome.amount / big_blind;

        points.push(AdjustedHandRecord {
            label: hand.label,
            timestamp: hand.timestamp,
            session,
            big_blind,
            fallback: assignment.is_fallback(pos),
            raw_delta: raw[pos],
            delta: outcome.delta(),
            rake: outcome.rake,
            cumulative_amount: totals.adjusted_amount,
            cumulative_ev: totals.adjusted_ev,
            total_rake: totals.total_rake,
            total_rake_bb: totals.total_rake_bb,
            bb_result: totals.bb_result,
        });
    }

    if let Some(last) = hands.last() {
        totals.raw_amount = last.cumulative_amount;
        totals.raw_ev = last.cumulative_ev;
        totals.rake_bb_per_100 = totals.total_rake_bb / hands.len() as f64 * 100.0;
    }
    totals.fallback_hands = assignment.fallback_count();

    debug!(
        hands = totals.hands,
        total_rake = totals.total_rake,
        total_rake_bb = totals.total_rake_bb,
        "reconstructed rake-adjusted series"
    );

    EquityCurve { points, totals }
}
