//! Capacity-respecting assignment of hands to sessions
//!
//! Hands are processed fewest-candidates first. Each hand is placed directly
//! in a compatible session with spare capacity when one exists; otherwise an
//! augmenting path is searched: a chain of already-placed hands that can each
//! shift to another of their compatible sessions, ending in a session with a
//! free slot. The search is an explicit-stack DFS with a visited set over
//! sessions, so deep chains cannot overflow the call stack.
//!
//! Session loads live in a count vector owned by the matcher and are returned
//! with the assignment; input records are never mutated.

use std::cmp::Ordering;

use tracing::{debug, info, warn};

use crate::config::{FallbackPolicy, MatchingMode};
use crate::error::{EngineError, EngineResult};
use crate::interval::IntervalIndex;
use crate::records::{HandRecord, SessionId, SessionRecord};

/// Final hand → session mapping, indexed by hand position.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    sessions: Vec<SessionId>,
    loads: Vec<u32>,
    fallback: Vec<bool>,
}

impl Assignment {
    /// Session assigned to the hand at `position`
    pub fn session_of(&self, position: usize) -> SessionId {
        self.sessions[position]
    }

    /// Per-hand sessions, in hand order
    pub fn sessions(&self) -> &[SessionId] {
        &self.sessions
    }

    /// Hands placed in each session, indexed by session id
    pub fn loads(&self) -> &[u32] {
        &self.loads
    }

    /// True if the hand was placed by the fallback policy
    pub fn is_fallback(&self, position: usize) -> bool {
        self.fallback[position]
    }

    pub fn fallback_count(&self) -> usize {
        self.fallback.iter().filter(|&&f| f).count()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Tolerant-mode placement of a hand the matcher could not place.
///
/// Chooses among `candidates` when the hand has any, otherwise among all
/// sessions. Returns `None` only when there are no sessions at all.
pub fn choose_fallback(
    policy: FallbackPolicy,
    hand: &HandRecord,
    sessions: &[SessionRecord],
    candidates: &[SessionId],
) -> Option<SessionId> {
    let pool: Vec<SessionId> = if candidates.is_empty() {
        (0..sessions.len()).collect()
    } else {
        candidates.to_vec()
    };
    match policy {
        FallbackPolicy::NearestInTime => nearest_in_time(hand.timestamp, sessions, &pool),
        FallbackPolicy::HighestStakes => highest_stakes(sessions, &pool),
    }
}

/// Closest window boundary wins; ties go to the larger big blind, then to the
/// lower session id.
pub fn nearest_in_time(timestamp: i64, sessions: &[SessionRecord], pool: &[SessionId]) -> Option<SessionId> {
    pool.iter().copied().min_by(|&a, &b| {
        let (sa, sb) = (&sessions[a], &sessions[b]);
        sa.distance_to(timestamp)
            .cmp(&sb.distance_to(timestamp))
            .then_with(|| sb.big_blind.total_cmp(&sa.big_blind))
            .then_with(|| a.cmp(&b))
    })
}

/// Largest big blind wins; ties go to the lower session id.
pub fn highest_stakes(sessions: &[SessionRecord], pool: &[SessionId]) -> Option<SessionId> {
    pool.iter().copied().min_by(|&a, &b| {
        sessions[b]
            .big_blind
            .total_cmp(&sessions[a].big_blind)
            .then_with(|| a.cmp(&b))
    })
}

/// DFS frame for the augmenting-path search.
#[derive(Debug, Clone, Copy)]
enum Frame {
    /// Hand looking for a session; `next` indexes its candidate list
    Hand { hand: usize, next: usize },
    /// Full session; `next` indexes its current members
    Session { session: SessionId, next: usize },
}

/// What the top frame yielded this step.
enum Step {
    Exhausted,
    TrySession(SessionId),
    TryHand(usize),
}

/// Mutable matching state for one run.
struct Matcher<'a> {
    sessions: &'a [SessionRecord],
    /// Candidate sessions per hand, big blind descending then start order
    candidates: Vec<Vec<SessionId>>,
    owner: Vec<Option<SessionId>>,
    members: Vec<Vec<usize>>,
    loads: Vec<u32>,
    augmented: usize,
}

impl<'a> Matcher<'a> {
    fn new(sessions: &'a [SessionRecord], mut candidates: Vec<Vec<SessionId>>) -> Self {
        for list in candidates.iter_mut() {
            // Stable: equal big blinds keep start order from the index
            list.sort_by(|&a, &b| sessions[b].big_blind.total_cmp(&sessions[a].big_blind));
        }
        let hands = candidates.len();
        Matcher {
            sessions,
            candidates,
            owner: vec![None; hands],
            members: vec![Vec::new(); sessions.len()],
            loads: vec![0; sessions.len()],
            augmented: 0,
        }
    }

    fn remaining(&self, session: SessionId) -> u32 {
        self.sessions[session]
            .expected_hand_count
            .saturating_sub(self.loads[session])
    }

    fn move_hand(&mut self, hand: usize, to: SessionId) {
        if let Some(from) = self.owner[hand] {
            self.members[from].retain(|&h| h != hand);
            self.loads[from] -= 1;
        }
        self.members[to].push(hand);
        self.loads[to] += 1;
        self.owner[hand] = Some(to);
    }

    /// Place into the best candidate with spare capacity: highest big blind,
    /// then most remaining room, then start order.
    fn place_direct(&mut self, hand: usize) -> bool {
        let mut best: Option<SessionId> = None;
        for &s in &self.candidates[hand] {
            if self.remaining(s) == 0 {
                continue;
            }
            match best {
                None => best = Some(s),
                Some(b) => match self.sessions[s].big_blind.total_cmp(&self.sessions[b].big_blind) {
                    Ordering::Less => break,
                    Ordering::Equal if self.remaining(s) > self.remaining(b) => best = Some(s),
                    _ => {}
                },
            }
        }
        match best {
            Some(s) => {
                self.move_hand(hand, s);
                true
            }
            None => false,
        }
    }

    /// Search for an augmenting path starting at an unplaced hand.
    fn augment(&mut self, root: usize) -> bool {
        let mut visited = vec![false; self.sessions.len()];
        let mut stack = vec![Frame::Hand { hand: root, next: 0 }];

        while let Some(frame) = stack.last_mut() {
            let step = match frame {
                Frame::Hand { hand, next } => {
                    let cursor = *next;
                    *next += 1;
                    match self.candidates[*hand].get(cursor) {
                        Some(&s) => Step::TrySession(s),
                        None => Step::Exhausted,
                    }
                }
                Frame::Session { session, next } => {
                    let cursor = *next;
                    *next += 1;
                    match self.members[*session].get(cursor) {
                        Some(&h) => Step::TryHand(h),
                        None => Step::Exhausted,
                    }
                }
            };

            match step {
                Step::Exhausted => {
                    stack.pop();
                }
                Step::TrySession(s) => {
                    if visited[s] {
                        continue;
                    }
                    visited[s] = true;
                    if self.remaining(s) > 0 {
                        self.apply_path(&stack, s);
                        self.augmented += 1;
                        return true;
                    }
                    stack.push(Frame::Session { session: s, next: 0 });
                }
                Step::TryHand(h) => stack.push(Frame::Hand { hand: h, next: 0 }),
            }
        }
        false
    }

    /// Shift every hand on the path one session along, ending in `free`.
    fn apply_path(&mut self, stack: &[Frame], free: SessionId) {
        let mut target = free;
        for frame in stack.iter().rev() {
            match *frame {
                Frame::Hand { hand, .. } => self.move_hand(hand, target),
                Frame::Session { session, .. } => target = session,
            }
        }
    }
}

/// Assign every hand to a session.
///
/// Strict mode fails with `NoCompatibleSession` if any hand lies outside all
/// windows, and with `AssignmentCountMismatch` if capacity cannot hold every
/// hand. Tolerant mode places those hands through the fallback policy and
/// flags them.
pub fn assign(
    hands: &[HandRecord],
    sessions: &[SessionRecord],
    index: &IntervalIndex,
    mode: MatchingMode,
) -> EngineResult<Assignment> {
    let compat = index.compatibility(hands);

    let orphan = hands.iter().zip(&compat).find(|(_, c)| c.is_empty());
    if let Some((hand, _)) = orphan {
        if matches!(mode, MatchingMode::Strict) || sessions.is_empty() {
            return Err(EngineError::NoCompatibleSession {
                label: hand.label,
                timestamp: hand.timestamp,
                sessions_considered: sessions.len(),
            });
        }
    }

    let mut order: Vec<usize> = (0..hands.len()).collect();
    order.sort_by_key(|&h| (compat[h].len(), h));

    let mut matcher = Matcher::new(sessions, compat);
    let mut unplaced = Vec::new();
    for h in order {
        if matcher.candidates[h].is_empty() {
            unplaced.push(h);
            continue;
        }
        if !matcher.place_direct(h) && !matcher.augment(h) {
            debug!(label = hands[h].label, "no free slot and no augmenting path");
            unplaced.push(h);
        }
    }
    unplaced.sort_unstable();

    info!(
        matched = hands.len() - unplaced.len(),
        total = hands.len(),
        augmented = matcher.augmented,
        "matched hands to sessions"
    );

    let mut fallback = vec![false; hands.len()];
    match mode {
        MatchingMode::Strict => {
            if !unplaced.is_empty() {
                return Err(EngineError::AssignmentCountMismatch {
                    assigned: hands.len() - unplaced.len(),
                    expected: hands.len(),
                    unplaced: unplaced.iter().map(|&h| hands[h].label).collect(),
                });
            }
        }
        MatchingMode::Tolerant(policy) => {
            for &h in &unplaced {
                let hand = &hands[h];
                let s = choose_fallback(policy, hand, sessions, &matcher.candidates[h]).ok_or_else(|| {
                    EngineError::NoCompatibleSession {
                        label: hand.label,
                        timestamp: hand.timestamp,
                        sessions_considered: sessions.len(),
                    }
                })?;
                debug!(label = hand.label, session = s, ?policy, "fallback assignment");
                matcher.move_hand(h, s);
                fallback[h] = true;
            }
            if !unplaced.is_empty() {
                warn!(count = unplaced.len(), ?policy, "hands placed by fallback policy");
            }
        }
    }

    let assigned: Vec<SessionId> = matcher.owner.iter().filter_map(|o| *o).collect();
    let load_sum: usize = matcher.loads.iter().map(|&l| l as usize).sum();
    if assigned.len() != hands.len() || load_sum != hands.len() {
        return Err(EngineError::AssignmentCountMismatch {
            assigned: load_sum,
            expected: hands.len(),
            unplaced: matcher
                .owner
                .iter()
                .zip(hands)
                .filter(|(o, _)| o.is_none())
                .map(|(_, hand)| hand.label)
                .collect(),
        });
    }

    Ok(Assignment { sessions: assigned, loads: matcher.loads, fallback })
}
