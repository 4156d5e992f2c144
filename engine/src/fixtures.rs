//! Hardcoded scenarios and a deterministic synthetic generator
//!
//! Scenario A: 3 hands at t = 100, 150, 400
//!   session 0: [0, 200]   capacity 2   bb 1.0   "$0.50/$1"
//!   session 1: [300, 500] capacity 1   bb 2.0   "$1/$2"
//!   cumulative amounts 10, 6, 106  (deltas +10, -4, +100)
//!
//! Scenario E: 1 hand at t = 50 inside two identical windows [0, 100],
//!   capacity 5 each, bb 0.5 (session 0) and bb 1.0 (session 1).
//!
//! `synthetic_run` lays out back-to-back sessions whose windows overlap by the
//! clock-skew buffer, so every hand fits its true session and some also fit
//! a neighbour. Capacity always covers the hands actually played, so strict
//! matching succeeds.

use crate::records::{HandRecord, SessionRecord};

/// Window extension appended to synthetic sessions (5 minutes)
pub const SYNTHETIC_BUFFER_MS: i64 = 5 * 60 * 1000;

const STAKES: [(&str, f64); 3] = [("$0.02/$0.05", 0.05), ("$0.05/$0.10", 0.10), ("$0.10/$0.25", 0.25)];

pub fn scenario_a_sessions() -> Vec<SessionRecord> {
    vec![
        SessionRecord::new(0, 200, 0, 2, 1.0, "$0.50/$1"),
        SessionRecord::new(300, 200, 0, 1, 2.0, "$1/$2"),
    ]
}

pub fn scenario_a_hands() -> Vec<HandRecord> {
    vec![
        HandRecord::new(1, 100, 10.0, 8.0),
        HandRecord::new(2, 150, 6.0, 4.0),
        HandRecord::new(3, 400, 106.0, 104.0),
    ]
}

pub fn scenario_e_sessions() -> Vec<SessionRecord> {
    vec![
        SessionRecord::new(0, 100, 0, 5, 0.5, "$0.25/$0.50"),
        SessionRecord::new(0, 100, 0, 5, 1.0, "$0.50/$1"),
    ]
}

pub fn scenario_e_hands() -> Vec<HandRecord> {
    vec![HandRecord::new(1, 50, 3.0, 3.0)]
}

/// Simple LCG for deterministic fixtures
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = (self.state.wrapping_mul(1103515245).wrapping_add(12345)) & 0x7fffffff;
        self.state
    }

    /// Uniform integer in `[lo, hi]`
    pub fn range(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.next_u64() % (hi - lo + 1)
    }

    /// Uniform float in `[-1, 1]`
    pub fn signed_unit(&mut self) -> f64 {
        (self.next_u64() % 2001) as f64 / 1000.0 - 1.0
    }
}

/// Generate `hand_count` hands spread over consecutive sessions.
pub fn synthetic_run(hand_count: usize, seed: u64) -> (Vec<HandRecord>, Vec<SessionRecord>) {
    let mut lcg = Lcg::new(seed);
    let mut hands = Vec::with_capacity(hand_count);
    let mut sessions = Vec::new();

    let mut clock: i64 = 1_700_000_000_000;
    let mut amount = 0.0_f64;
    let mut ev = 0.0_f64;

    while hands.len() < hand_count {
        let (stakes, big_blind) = STAKES[lcg.range(0, STAKES.len() as u64 - 1) as usize];
        let played = (lcg.range(20, 80) as usize).min(hand_count - hands.len());
        let start = clock;

        for _ in 0..played {
            clock += lcg.range(30, 90) as i64 * 1000;
            // Mostly small pots, occasionally a big one so the cap binds
            let size = if lcg.range(0, 19) == 0 { 40.0 } else { 3.0 };
            let delta = lcg.signed_unit() * size * big_blind;
            amount += delta;
            ev += delta + lcg.signed_unit() * 0.5 * big_blind;
            hands.push(HandRecord::new(hands.len() as u32 + 1, clock, amount, ev));
        }

        let slack = lcg.range(0, 3) as u32;
        sessions.push(SessionRecord::new(
            start,
            clock - start,
            SYNTHETIC_BUFFER_MS,
            played as u32 + slack,
            big_blind,
            stakes,
        ));
        // Next session may start inside this one's buffer
        clock += lcg.range(60, 900) as i64 * 1000;
    }

    (hands, sessions)
}
