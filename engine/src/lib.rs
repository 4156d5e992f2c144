//! rakeview Engine - Session matching and rake-adjusted equity reconstruction
//!
//! This crate assigns recorded hands to the sessions they were played in,
//! removes an estimated rake from every winning hand using the big blind of
//! its session, and re-accumulates the win/loss and all-in EV series with
//! per-stake summaries.
//!
//! The engine is a pure batch transform: no I/O, no clock, no shared state
//! between runs. Extraction and rendering live in other crates.

pub mod config;
pub mod equity;
pub mod error;
pub mod fixtures;
pub mod interval;
pub mod matching;
pub mod rake;
pub mod records;
pub mod report;
pub mod stakes;

pub use config::{EngineConfig, FallbackPolicy, MatchingMode, RakeConfig};
pub use error::{EngineError, EngineResult};
pub use rake::{CappedPotRake, RakeModel, RakeOutcome};
pub use records::{AdjustedHandRecord, HandDelta, HandRecord, SessionId, SessionRecord, StakeAggregate};
pub use report::{RakeEngine, RakeReport, SessionStat};
