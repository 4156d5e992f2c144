//! Error types for the rake engine
//!
//! Every failure is reported to the caller; the engine never returns a
//! partially populated result.

use thiserror::Error;

/// Errors produced by one engine run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A hand's timestamp falls inside no session window
    #[error("hand {label} at {timestamp} falls inside none of {sessions_considered} session windows")]
    NoCompatibleSession {
        label: u32,
        timestamp: i64,
        sessions_considered: usize,
    },

    /// Matching placed fewer (or more) hands than were supplied
    #[error("assigned {assigned} of {expected} hands (unplaced: {unplaced:?})")]
    AssignmentCountMismatch {
        assigned: usize,
        expected: usize,
        /// Labels of the hands left without a session
        unplaced: Vec<u32>,
    },

    /// Rejected before any computation starts
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Malformed hand series or session list
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Stake TOTAL row disagrees with the final cumulative value
    #[error("{quantity} total {aggregated} does not match final cumulative {cumulative}")]
    ConservationViolated {
        quantity: &'static str,
        aggregated: f64,
        cumulative: f64,
    },
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
