//! Ingest error types

use thiserror::Error;

/// Errors raised while turning raw rows into engine records.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("chart has two points labelled {0}")]
    DuplicateLabel(u32),

    #[error("session row {row}: cannot read {column} from {value:?}")]
    InvalidCell {
        row: usize,
        column: &'static str,
        value: String,
    },
}
