//! Interval index: which sessions' windows contain a hand's timestamp
//!
//! Sessions are stable-sorted by start time once; a lookup binary-searches the
//! starts for the last session that begins at or before the timestamp and then
//! filters that prefix by end time. Overlapping windows are allowed.

use rayon::prelude::*;

use crate::records::{HandRecord, SessionId, SessionRecord};

/// Reference filter: every session whose `[start, end]` window contains the
/// hand's timestamp, in input order.
pub fn compatible_sessions(hand: &HandRecord, sessions: &[SessionRecord]) -> Vec<SessionId> {
    sessions
        .iter()
        .enumerate()
        .filter(|(_, s)| s.contains(hand.timestamp))
        .map(|(id, _)| id)
        .collect()
}

/// Sessions sorted by start, for repeated containment lookups.
#[derive(Debug, Clone)]
pub struct IntervalIndex {
    /// Session ids ordered by (start, input position)
    order: Vec<SessionId>,
    /// starts[i] == sessions[order[i]].start_timestamp
    starts: Vec<i64>,
    ends: Vec<i64>,
}

impl IntervalIndex {
    /// Build the index over a session slice
    pub fn build(sessions: &[SessionRecord]) -> Self {
        let mut order: Vec<SessionId> = (0..sessions.len()).collect();
        // sort_by_key is stable: ties keep input order
        order.sort_by_key(|&id| sessions[id].start_timestamp);
        let starts = order.iter().map(|&id| sessions[id].start_timestamp).collect();
        let ends = order.iter().map(|&id| sessions[id].end_timestamp).collect();
        IntervalIndex { order, starts, ends }
    }

    /// Number of indexed sessions
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Session ids in start order
    pub fn order(&self) -> &[SessionId] {
        &self.order
    }

    /// Sessions containing `timestamp`, in start order.
    pub fn lookup(&self, timestamp: i64) -> Vec<SessionId> {
        let upper = self.starts.partition_point(|&start| start <= timestamp);
        (0..upper)
            .filter(|&i| self.ends[i] >= timestamp)
            .map(|i| self.order[i])
            .collect()
    }

    /// Candidate sessions for every hand, indexed by hand position.
    ///
    /// Lookups run on the rayon pool; `collect` keeps hand order, so the result
    /// does not depend on scheduling.
    pub fn compatibility(&self, hands: &[HandRecord]) -> Vec<Vec<SessionId>> {
        hands.par_iter().map(|hand| self.lookup(hand.timestamp)).collect()
    }
}
