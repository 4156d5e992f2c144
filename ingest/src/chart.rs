//! EV chart data points
//!
//! The chart stores one point per hand:
//! `{ "label": 12, "y": -3.4, "data": { "amount": -3.4, "ev": -1.2, "timestamp": 1710000000000, "handHistoryId": "..." } }`
//! where `amount` and `ev` are cumulative.

use serde::{Deserialize, Serialize};
use tracing::debug;

use rakeview_engine::HandRecord;

use crate::error::IngestError;

/// Payload of one chart point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointData {
    pub amount: f64,
    pub ev: f64,
    pub timestamp: i64,
    /// Opaque id of the hand history; string or number depending on source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_history_id: Option<serde_json::Value>,
}

/// One chart data point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: u32,
    /// Plotted value; mirrors `data.amount`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    pub data: PointData,
}

/// Parse a JSON array of chart points
pub fn parse_points(json: &str) -> Result<Vec<ChartPoint>, IngestError> {
    let points: Vec<ChartPoint> = serde_json::from_str(json)?;
    debug!(points = points.len(), "parsed chart points");
    Ok(points)
}

/// Convert chart points to hand records ordered by label.
///
/// Gaps in the labels are left for the engine to reject; duplicates are
/// rejected here because their order would be ambiguous.
pub fn hands_from_points(points: &[ChartPoint]) -> Result<Vec<HandRecord>, IngestError> {
    let mut hands: Vec<HandRecord> = points
        .iter()
        .map(|p| HandRecord::new(p.label, p.data.timestamp, p.data.amount, p.data.ev))
        .collect();
    hands.sort_by_key(|h| h.label);
    if let Some(pair) = hands.windows(2).find(|w| w[0].label == w[1].label) {
        return Err(IngestError::DuplicateLabel(pair[0].label));
    }
    Ok(hands)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"[
        {"label": 2, "y": 1.5, "data": {"amount": 1.5, "ev": 0.75, "timestamp": 2000, "handHistoryId": "HD2"}},
        {"label": 1, "y": 2.0, "data": {"amount": 2.0, "ev": 1.0, "timestamp": 1000, "handHistoryId": 991}},
        {"label": 3, "data": {"amount": -1.0, "ev": -0.5, "timestamp": 3000}}
    ]"#;

    #[test]
    fn test_parse_and_order() {
        let points = parse_points(DUMP).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[2].y, None);

        let hands = hands_from_points(&points).unwrap();
        let labels: Vec<u32> = hands.iter().map(|h| h.label).collect();
        assert_eq!(labels, vec![1, 2, 3]);
        assert_eq!(hands[0], HandRecord::new(1, 1000, 2.0, 1.0));
        assert_eq!(hands[2].cumulative_amount, -1.0);
    }

    #[test]
    fn test_duplicate_labels() {
        let json = r#"[
            {"label": 1, "data": {"amount": 1.0, "ev": 1.0, "timestamp": 1}},
            {"label": 1, "data": {"amount": 2.0, "ev": 2.0, "timestamp": 2}}
        ]"#;
        let points = parse_points(json).unwrap();
        assert!(matches!(hands_from_points(&points), Err(IngestError::DuplicateLabel(1))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(parse_points("[{\"label\": 1}]"), Err(IngestError::Json(_))));
    }
}
