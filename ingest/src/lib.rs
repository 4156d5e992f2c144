//! rakeview Ingest - Turns scraped session rows and chart points into engine input
//!
//! The page scraping itself happens elsewhere; this crate only knows the shape
//! of what it produces: the session table as raw cell text and the EV chart
//! as the JSON array of data points the chart library holds.
//!
//! Nothing here reads a clock. The year a session table refers to is passed in
//! explicitly.

pub mod chart;
pub mod error;
pub mod sessions;

pub use chart::{hands_from_points, parse_points, ChartPoint, PointData};
pub use error::IngestError;
pub use sessions::{SessionParser, SessionRow, DEFAULT_END_BUFFER_MS};
