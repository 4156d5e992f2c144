//! Session table rows
//!
//! Cells arrive as the text shown in the table:
//!
//! | column   | example                          |
//! |----------|----------------------------------|
//! | start    | `Mar 5, 14:30`                   |
//! | duration | `1:23:45` or `1h 23m`            |
//! | stakes   | `$0.05/$0.10`, `0.25/0.50 BB`    |
//! | hands    | `1,234`                          |
//! | game     | `NLH`, `Tournament`, ...         |
//!
//! The start cell carries no year, so the parser is given one. Every window
//! is extended by a buffer to absorb skew between the session log clock and
//! the hand log clock.

use std::str::FromStr;

use chrono::{Month, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use rakeview_engine::SessionRecord;

use crate::error::IngestError;

/// Default window extension: 5 minutes
pub const DEFAULT_END_BUFFER_MS: i64 = 5 * 60 * 1000;

/// One row of the session table, as raw cell text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    pub start: String,
    pub duration: String,
    pub stakes: String,
    pub hands: String,
    #[serde(default)]
    pub game: Option<String>,
}

/// Converts raw rows to `SessionRecord`s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionParser {
    year: i32,
    utc_offset_minutes: i32,
    end_buffer_ms: i64,
}

impl SessionParser {
    /// Parser for a table whose dates fall in `year`, shown in UTC
    pub fn new(year: i32) -> Self {
        SessionParser { year, utc_offset_minutes: 0, end_buffer_ms: DEFAULT_END_BUFFER_MS }
    }

    /// Offset of the table's local time from UTC, in minutes (UTC+2 = 120)
    pub fn with_utc_offset(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    pub fn with_end_buffer_ms(mut self, ms: i64) -> Self {
        self.end_buffer_ms = ms;
        self
    }

    /// Parse one row; tournament rows yield `None`.
    pub fn parse_row(&self, row_index: usize, row: &SessionRow) -> Result<Option<SessionRecord>, IngestError> {
        if row.game.as_deref().is_some_and(|g| g.trim().eq_ignore_ascii_case("tournament")) {
            debug!(row = row_index, "skipping tournament row");
            return Ok(None);
        }

        let invalid = |column: &'static str, value: &str| IngestError::InvalidCell {
            row: row_index,
            column,
            value: value.to_string(),
        };

        let start = parse_start(&row.start, self.year, self.utc_offset_minutes)
            .ok_or_else(|| invalid("start", &row.start))?;
        let duration = parse_duration_ms(&row.duration).ok_or_else(|| invalid("duration", &row.duration))?;
        let big_blind = parse_big_blind(&row.stakes).ok_or_else(|| invalid("stakes", &row.stakes))?;
        let hands = parse_hand_count(&row.hands).ok_or_else(|| invalid("hands", &row.hands))?;

        Ok(Some(SessionRecord::new(
            start,
            duration,
            self.end_buffer_ms,
            hands,
            big_blind,
            row.stakes.trim(),
        )))
    }

    /// Parse every row, dropping tournaments. Fails on the first bad cell.
    pub fn parse_rows(&self, rows: &[SessionRow]) -> Result<Vec<SessionRecord>, IngestError> {
        let mut sessions = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if let Some(session) = self.parse_row(i, row)? {
                sessions.push(session);
            }
        }
        info!(rows = rows.len(), sessions = sessions.len(), "parsed session table");
        Ok(sessions)
    }
}

/// `"Mar 5, 14:30"` in `year`, local time `utc_offset_minutes` ahead of UTC,
/// to epoch milliseconds.
pub fn parse_start(text: &str, year: i32, utc_offset_minutes: i32) -> Option<i64> {
    let (month_day, time) = text.trim().split_once(',')?;
    let mut parts = month_day.split_whitespace();
    let month = Month::from_str(parts.next()?).ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month.number_from_month(), day)?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M").ok()?;
    let local = NaiveDateTime::new(date, time).and_utc().timestamp_millis();
    Some(local - i64::from(utc_offset_minutes) * 60_000)
}

/// `"H:MM:SS"`, `"H:MM"` or `"1h 23m 4s"` to milliseconds.
///
/// Negative fields and values that overflow are rejected.
pub fn parse_duration_ms(text: &str) -> Option<i64> {
    let text = text.trim();
    let seconds = if text.contains(':') {
        let fields: Vec<i64> = text.split(':').map(non_negative).collect::<Option<_>>()?;
        match fields.as_slice() {
            [h, m, s] => scaled_sum(&[(*h, 3600), (*m, 60), (*s, 1)])?,
            [h, m] => scaled_sum(&[(*h, 3600), (*m, 60)])?,
            _ => return None,
        }
    } else {
        let mut parts = Vec::new();
        for token in text.split_whitespace() {
            let unit = token.chars().last()?;
            let n = non_negative(&token[..token.len() - unit.len_utf8()])?;
            let scale = match unit {
                'h' => 3600,
                'm' => 60,
                's' => 1,
                _ => return None,
            };
            parts.push((n, scale));
        }
        if parts.is_empty() {
            return None;
        }
        scaled_sum(&parts)?
    };
    seconds.checked_mul(1000)
}

fn non_negative(field: &str) -> Option<i64> {
    let field = field.trim();
    if field.starts_with('-') {
        return None;
    }
    field.parse().ok()
}

/// Sum of `value * scale`, `None` on overflow
fn scaled_sum(parts: &[(i64, i64)]) -> Option<i64> {
    parts
        .iter()
        .try_fold(0i64, |acc, &(value, scale)| acc.checked_add(value.checked_mul(scale)?))
}

/// Big blind from a stakes cell: the amount after the last `/`.
pub fn parse_big_blind(text: &str) -> Option<f64> {
    let text = text.trim();
    let text = text.strip_suffix("BB").unwrap_or(text);
    let tail = text.rsplit('/').next()?.trim();
    let amount = tail.split_whitespace().last()?;
    let value: f64 = amount.trim_start_matches('$').replace(',', "").parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// `"1,234"` to 1234
pub fn parse_hand_count(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace() && *c != ',').collect();
    digits.parse().ok()
}
