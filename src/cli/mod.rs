//! CLI commands for growtrack.
//!
//! This module provides CLI commands for growtrack, organized into:
//! - **Journal commands**: list, show, plant, entry, stage, growbox, import, stats
//! - **Reference commands**: catalog, ask
//! - **Leaf analysis**: analyze, history, feedback

// Journal commands
pub mod entry;
pub mod growbox;
pub mod import;
pub mod list;
pub mod plant;
pub mod show;
pub mod stage;
pub mod stats;

// Reference commands
pub mod ask;
pub mod catalog;

// Leaf analysis
pub mod analyze;
pub mod feedback;
pub mod history;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{GrowError, Result};

pub use analyze::AnalyzeCommand;
pub use ask::AskCommand;
pub use catalog::CatalogCommand;
pub use entry::EntryCommand;
pub use feedback::FeedbackCommand;
pub use growbox::GrowboxCommand;
pub use history::HistoryCommand;
pub use import::ImportCommand;
pub use list::ListCommand;
pub use plant::PlantCommand;
pub use show::ShowCommand;
pub use stage::StageCommand;
pub use stats::StatsCommand;

/// Parse a command-line date.
///
/// Accepts `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            GrowError::invalid_input(format!("invalid date '{}', expected YYYY-MM-DD", value))
        })
}

/// Parse a `HH:MM` clock time into minutes of day.
pub fn parse_clock(value: &str) -> Result<u32> {
    let invalid = || GrowError::invalid_input(format!("invalid time '{}', expected HH:MM", value));
    let (hours, minutes) = value.trim().split_once(':').ok_or_else(invalid)?;
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(hours * 60 + minutes)
}
