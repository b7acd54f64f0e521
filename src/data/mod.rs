//! Display-side data processing.
//!
//! - [`duration`]: parsing and formatting of duration strings (`"2s"`, `"500ms"`)
//! - [`history`]: per-field history for sparklines and rates

pub mod duration;
pub mod history;

pub use history::History;
