//! Record definitions for hands, sessions and the derived equity rows
//!
//! Input records (`HandRecord`, `SessionRecord`) are immutable snapshots handed
//! in by the caller. Everything else in this module is produced fresh by one
//! engine run and never mutated after it is returned.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Session ID type (index into the caller's session slice)
pub type SessionId = usize;

/// One point of the recorded win/loss and all-in EV series.
///
/// Amounts are cumulative, exactly as the source chart stores them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandRecord {
    /// 1-based hand sequence number
    pub label: u32,
    /// Epoch milliseconds
    pub timestamp: i64,
    /// Running realized win/loss in currency units
    pub cumulative_amount: f64,
    /// Running all-in EV in currency units
    pub cumulative_ev: f64,
}

impl HandRecord {
    /// Create a new hand record
    pub fn new(label: u32, timestamp: i64, cumulative_amount: f64, cumulative_ev: f64) -> Self {
        HandRecord { label, timestamp, cumulative_amount, cumulative_ev }
    }
}

/// One sitting at a table, as listed in the session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Epoch milliseconds of the first hand
    pub start_timestamp: i64,
    /// start + duration + clock-skew buffer
    pub end_timestamp: i64,
    /// Capacity: the most hands this session may absorb
    pub expected_hand_count: u32,
    /// Big blind size in currency units (> 0)
    pub big_blind: f64,
    /// Display key used for stake aggregation
    pub stakes: String,
}

impl SessionRecord {
    /// Build a session from its start, duration and the skew buffer appended
    /// to the end of its window.
    pub fn new(
        start_timestamp: i64,
        duration_ms: i64,
        buffer_ms: i64,
        expected_hand_count: u32,
        big_blind: f64,
        stakes: impl Into<String>,
    ) -> Self {
        SessionRecord {
            start_timestamp,
            end_timestamp: start_timestamp.saturating_add(duration_ms).saturating_add(buffer_ms),
            expected_hand_count,
            big_blind,
            stakes: stakes.into(),
        }
    }

    /// True if `timestamp` lies inside `[start, end]` (both ends inclusive)
    pub fn contains(&self, timestamp: i64) -> bool {
        self.start_timestamp <= timestamp && timestamp <= self.end_timestamp
    }

    /// Distance in milliseconds from `timestamp` to the nearest window
    /// boundary; zero inside the window.
    pub fn distance_to(&self, timestamp: i64) -> i64 {
        if self.contains(timestamp) {
            0
        } else {
            (timestamp - self.start_timestamp)
                .abs()
                .min((timestamp - self.end_timestamp).abs())
        }
    }
}

/// Per-hand change in realized amount and all-in EV
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HandDelta {
    pub amount: f64,
    pub ev: f64,
}

impl HandDelta {
    pub fn new(amount: f64, ev: f64) -> Self {
        HandDelta { amount, ev }
    }
}

/// A hand after rake adjustment, positioned in the re-accumulated series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustedHandRecord {
    pub label: u32,
    pub timestamp: i64,
    /// Session the hand was assigned to
    pub session: SessionId,
    /// Big blind of the assigned session
    pub big_blind: f64,
    /// Set when the hand was placed by the tolerant-mode fallback policy
    pub fallback: bool,
    /// Delta as recorded, before rake
    pub raw_delta: HandDelta,
    /// Delta after rake
    pub delta: HandDelta,
    /// Rake charged on this hand
    pub rake: f64,
    pub cumulative_amount: f64,
    pub cumulative_ev: f64,
    pub total_rake: f64,
    pub total_rake_bb: f64,
    /// Running Σ adjusted amount / big blind
    pub bb_result: f64,
}

/// One row of the per-stake summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeAggregate {
    pub stakes: String,
    /// Big blind of the first session seen with this stakes label
    pub big_blind: f64,
    pub hands: usize,
    /// Σ adjusted amount
    pub winloss: f64,
    /// Σ adjusted EV
    pub ev: f64,
    pub bb_result: f64,
    pub ev_bb_result: f64,
    pub bb_per_100: f64,
    pub ev_bb_per_100: f64,
    /// Share of all hands, in percent
    pub percentage: f64,
}

impl StakeAggregate {
    /// Create an empty row for a stakes label
    pub fn empty(stakes: impl Into<String>, big_blind: f64) -> Self {
        StakeAggregate {
            stakes: stakes.into(),
            big_blind,
            hands: 0,
            winloss: 0.0,
            ev: 0.0,
            bb_result: 0.0,
            ev_bb_result: 0.0,
            bb_per_100: 0.0,
            ev_bb_per_100: 0.0,
            percentage: 0.0,
        }
    }

    /// Fill in the derived BB/100 and percentage columns
    pub(crate) fn finish(&mut self, total_hands: usize) {
        if self.hands > 0 {
            self.bb_per_100 = self.bb_result / self.hands as f64 * 100.0;
            self.ev_bb_per_100 = self.ev_bb_result / self.hands as f64 * 100.0;
        }
        if total_hands > 0 {
            self.percentage = self.hands as f64 / total_hands as f64 * 100.0;
        }
    }
}

/// Check the hand series: labels dense `1..=N` in order, finite values.
pub fn validate_hands(hands: &[HandRecord]) -> EngineResult<()> {
    for (i, hand) in hands.iter().enumerate() {
        let expected = i as u32 + 1;
        if hand.label != expected {
            return Err(EngineError::InvalidInput(format!(
                "hand at position {} has label {}, expected {}",
                i, hand.label, expected
            )));
        }
        if !hand.cumulative_amount.is_finite() || !hand.cumulative_ev.is_finite() {
            return Err(EngineError::InvalidInput(format!(
                "hand {} has a non-finite cumulative value",
                hand.label
            )));
        }
    }
    Ok(())
}

/// Check the session list: positive finite big blinds and ordered windows.
pub fn validate_sessions(sessions: &[SessionRecord]) -> EngineResult<()> {
    for (id, session) in sessions.iter().enumerate() {
        if !(session.big_blind.is_finite() && session.big_blind > 0.0) {
            return Err(EngineError::InvalidInput(format!(
                "session {} ({}) has big blind {}",
                id, session.stakes, session.big_blind
            )));
        }
        if session.end_timestamp < session.start_timestamp {
            return Err(EngineError::InvalidInput(format!(
                "session {} ends at {} before it starts at {}",
                id, session.end_timestamp, session.start_timestamp
            )));
        }
    }
    Ok(())
}
