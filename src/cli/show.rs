//! Show command for growtrack.
//!
//! Displays one plant with its lifecycle timings and journal counts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::list::PlantInfo;
use crate::core::{
    bloom_days, days_to_harvest, drying_days, expected_harvest_date, fermentation_days, Journal,
    Plant, PlantEntry,
};
use crate::error::Result;
use crate::storage::JournalStore;
use crate::util::now_millis;

/// Options for the show command.
#[derive(Debug, Clone, Default)]
pub struct ShowOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Number of most recent journal entries to include.
    pub entries: Option<usize>,
}

/// Lifecycle timings of a plant.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Timings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bloom_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_to_harvest: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_harvest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drying_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fermentation_days: Option<u32>,
}

impl Timings {
    fn of(plant: &Plant, now: DateTime<Utc>) -> Self {
        Self {
            bloom_days: bloom_days(plant, now),
            days_to_harvest: days_to_harvest(plant, now),
            expected_harvest: expected_harvest_date(plant)
                .map(|d| d.format("%Y-%m-%d").to_string()),
            drying_days: drying_days(plant, now),
            fermentation_days: fermentation_days(plant, now),
        }
    }
}

/// Output format for the show command.
#[derive(Debug, Clone, Serialize)]
pub struct ShowOutput {
    /// Whether the plant was found.
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plant: Option<PlantInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plant_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growbox: Option<String>,
    pub timings: Timings,
    pub entry_count: usize,
    pub photo_count: usize,
    pub fermentation_entry_count: usize,
    /// Most recent entries, newest first.
    pub recent_entries: Vec<PlantEntry>,
    /// Error message if the plant could not be shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ShowOutput {
    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            plant: None,
            plant_type: None,
            pot: None,
            growbox: None,
            timings: Timings::default(),
            entry_count: 0,
            photo_count: 0,
            fermentation_entry_count: 0,
            recent_entries: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The show command implementation.
pub struct ShowCommand<S: JournalStore> {
    journal: Journal<S>,
}

impl<S: JournalStore> ShowCommand<S> {
    /// Create a new show command.
    pub fn new(journal: Journal<S>) -> Self {
        Self { journal }
    }

    /// Run the show command.
    pub fn run(&self, plant_id: &str, options: &ShowOptions) -> ShowOutput {
        self.run_at(plant_id, options, now_millis())
    }

    /// Run the show command with timings computed at `now`.
    pub fn run_at(&self, plant_id: &str, options: &ShowOptions, now: DateTime<Utc>) -> ShowOutput {
        match self.collect(plant_id, options, now) {
            Ok(output) => output,
            Err(e) => ShowOutput::failure(e.to_string()),
        }
    }

    fn collect(
        &self,
        plant_id: &str,
        options: &ShowOptions,
        now: DateTime<Utc>,
    ) -> Result<ShowOutput> {
        let plant = self.journal.plant(plant_id)?;
        let growbox = self.journal.growbox_of(plant_id)?.map(|g| g.name);

        let mut recent_entries = plant.entries.clone();
        recent_entries.sort_by(|a, b| b.date.cmp(&a.date));
        recent_entries.truncate(options.entries.unwrap_or(5));

        Ok(ShowOutput {
            success: true,
            plant: Some(PlantInfo::from_plant(&plant, now)),
            plant_type: Some(plant.plant_type.display_name().to_string()),
            pot: Some(plant.pot_size_label()),
            growbox,
            timings: Timings::of(&plant, now),
            entry_count: plant.entries.len(),
            photo_count: plant.photos.len(),
            fermentation_entry_count: plant.fermentation_entries.len(),
            recent_entries,
            error: None,
        })
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ShowOutput, options: &ShowOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &ShowOutput) -> String {
        let Some(plant) = output.plant.as_ref().filter(|_| output.success) else {
            return format!(
                "Show failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        };

        let mut lines = vec![format!("{} [{}]", plant.name, plant.id)];
        if !plant.strain.is_empty() {
            lines.push(format!("  Strain:   {} ({})", plant.strain, plant.manufacturer));
        }
        if let Some(plant_type) = &output.plant_type {
            lines.push(format!("  Type:     {}", plant_type));
        }
        if !plant.thc.is_empty() || !plant.cbd.is_empty() {
            lines.push(format!("  THC/CBD:  {}% / {}%", plant.thc, plant.cbd));
        }
        if let Some(pot) = &output.pot {
            lines.push(format!("  Pot:      {}", pot));
        }
        lines.push(format!("  Planted:  {} (week {})", plant.planted, plant.week));
        lines.push(format!("  Phase:    {}", plant.phase));
        if let Some(growbox) = &output.growbox {
            lines.push(format!("  Growbox:  {}", growbox));
        }

        let t = &output.timings;
        if let Some(days) = t.bloom_days {
            lines.push(format!("  Bloom:    day {}", days));
        }
        if let (Some(days), Some(date)) = (t.days_to_harvest, &t.expected_harvest) {
            lines.push(format!("  Harvest:  {} ({} days left)", date, days));
        }
        if let Some(days) = t.drying_days {
            lines.push(format!("  Drying:   {} days", days));
        }
        if let Some(days) = t.fermentation_days {
            lines.push(format!("  Curing:   {} days", days));
        }

        lines.push(format!(
            "  Journal:  {} entries, {} photos, {} curing notes",
            output.entry_count, output.photo_count, output.fermentation_entry_count
        ));
        for entry in &output.recent_entries {
            lines.push(format!(
                "    {} {}: {}",
                entry.date.format("%Y-%m-%d"),
                entry.entry_type.display_name(),
                entry.value
            ));
        }

        lines.join("\n") + "\n"
    }
}
