//! Stats command for growtrack.
//!
//! Shows water, fertilizer and power consumption per growbox and in total.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::{GrowboxStats, Journal, OverallStats};
use crate::storage::JournalStore;
use crate::util::now_millis;

/// Options for the stats command.
#[derive(Debug, Clone, Default)]
pub struct StatsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Show only this growbox.
    pub growbox: Option<String>,
}

/// Output format for the stats command.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsOutput {
    /// Whether the statistics were computed.
    pub success: bool,
    pub growboxes: Vec<GrowboxStats>,
    pub overall: OverallStats,
    /// Error message if computing failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatsOutput {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// The stats command implementation.
pub struct StatsCommand<S: JournalStore> {
    journal: Journal<S>,
}

impl<S: JournalStore> StatsCommand<S> {
    /// Create a new stats command.
    pub fn new(journal: Journal<S>) -> Self {
        Self { journal }
    }

    /// Run the stats command.
    pub fn run(&self, options: &StatsOptions) -> StatsOutput {
        self.run_at(options, now_millis())
    }

    /// Run the stats command with active days counted up to `now`.
    pub fn run_at(&self, options: &StatsOptions, now: DateTime<Utc>) -> StatsOutput {
        if let Err(e) = self.journal.initialize() {
            return StatsOutput::failure(e.to_string());
        }

        let stats = match &options.growbox {
            Some(id) => self.journal.growbox_statistics(id, now),
            None => self.journal.statistics(now),
        };
        match stats {
            Ok(stats) => StatsOutput {
                success: true,
                growboxes: stats.growboxes,
                overall: stats.overall,
                error: None,
            },
            Err(e) => StatsOutput::failure(e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &StatsOutput, options: &StatsOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output, options)
        }
    }

    fn format_human_readable(&self, output: &StatsOutput, options: &StatsOptions) -> String {
        if !output.success {
            return format!(
                "Cannot compute statistics: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }
        if output.growboxes.is_empty() {
            return "No growboxes yet. Create one to see statistics.\n".to_string();
        }

        let mut text = String::new();
        for stats in &output.growboxes {
            let status = if stats.is_active { "active" } else { "inactive" };
            text.push_str(&format!(
                "{} ({}, {} plants)\n",
                stats.name, status, stats.plant_count
            ));
            text.push_str(&format!(
                "  Water: {:.0} L  Fertilizer: {:.0} ml\n",
                stats.water_liters, stats.fertilizer_ml
            ));
            text.push_str(&format!(
                "  Power: {:.1} kWh  Cost: {:.2} over {} days\n",
                stats.power.total_kwh, stats.power.total_cost, stats.active_days
            ));
            text.push_str(&format!(
                "  Lighting: {} at {}%, {:.2}/kWh\n",
                stats.light_schedule.display_name(),
                stats.power_level,
                stats.electricity_price
            ));
        }

        if options.growbox.is_none() {
            let overall = &output.overall;
            text.push_str(&format!(
                "Total: {} growboxes ({} active), {} plants\n",
                overall.growbox_count, overall.active_growboxes, overall.plant_count
            ));
            text.push_str(&format!(
                "  Water: {:.0} L  Fertilizer: {:.0} ml  Power: {:.1} kWh  Cost: {:.2}\n",
                overall.water_liters,
                overall.fertilizer_ml,
                overall.power.total_kwh,
                overall.power.total_cost
            ));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StrainCatalog;
    use crate::core::{EntryType, Growbox, Plant, PlantEntry};
    use crate::storage::MemoryJournalStore;
    use chrono::TimeZone;
    use std::sync::Arc;

    type Shared = Arc<MemoryJournalStore>;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 11, 8, 0, 0).unwrap()
    }

    fn setup() -> (StatsCommand<Shared>, String) {
        let store = Arc::new(MemoryJournalStore::new());
        let journal = Journal::new(Arc::clone(&store), StrainCatalog::builtin());
        let mut plant = Plant::new("Widow");
        plant.planting_date = Utc.with_ymd_and_hms(2025, 7, 1, 8, 0, 0).unwrap();
        let plant = journal.add_plant(plant).unwrap();
        journal
            .add_entry(&plant.id, PlantEntry::new(EntryType::Watering, "3 L"))
            .unwrap();
        let mut tent = Growbox::new("Tent");
        tent.light_power = "100 W".to_string();
        let tent = journal.add_growbox(tent).unwrap();
        journal.assign_plant(&tent.id, &plant.id).unwrap();

        let reader = Journal::new(store, StrainCatalog::builtin());
        (StatsCommand::new(reader), tent.id)
    }

    #[test]
    fn test_stats_for_all_growboxes() {
        let (cmd, _) = setup();
        let options = StatsOptions::default();
        let output = cmd.run_at(&options, now());
        assert!(output.success, "{:?}", output.error);
        assert_eq!(output.overall.plant_count, 1);
        assert_eq!(output.overall.water_liters, 3.0);

        let text = cmd.format_output(&output, &options);
        assert!(text.starts_with("Tent (active, 1 plants)\n  Water: 3 L  Fertilizer: 0 ml\n"));
        assert!(text.contains("  Power: 18.0 kWh  Cost: 5.40 over 10 days\n"));
        assert!(text.contains("Total: 1 growboxes (1 active), 1 plants\n"));
    }

    #[test]
    fn test_single_growbox_and_unknown_id() {
        let (cmd, tent) = setup();
        let options = StatsOptions {
            growbox: Some(tent),
            ..Default::default()
        };
        let output = cmd.run_at(&options, now());
        assert_eq!(output.growboxes.len(), 1);
        assert!(!cmd.format_output(&output, &options).contains("Total:"));

        let missing = StatsOptions {
            growbox: Some("ghost".to_string()),
            json: true,
            ..Default::default()
        };
        let output = cmd.run_at(&missing, now());
        assert!(!output.success);
        let parsed: serde_json::Value =
            serde_json::from_str(&cmd.format_output(&output, &missing)).unwrap();
        assert_eq!(parsed["success"], false);
        assert!(parsed["error"].as_str().unwrap().contains("ghost"));
    }

    #[test]
    fn test_empty_journal() {
        let store = Arc::new(MemoryJournalStore::new());
        let cmd = StatsCommand::new(Journal::new(store, StrainCatalog::builtin()));
        let output = cmd.run_at(&StatsOptions::default(), now());
        assert!(output.success);
        assert_eq!(
            cmd.format_output(&output, &StatsOptions::default()),
            "No growboxes yet. Create one to see statistics.\n"
        );
    }
}
