//! List command for growtrack.
//!
//! Lists plants in journal order with their derived phase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{derive_phase, Journal, Plant, PlantPhase};
use crate::storage::JournalStore;
use crate::util::now_millis;

/// Options for the list command.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Show only plants in this phase.
    pub phase: Option<PlantPhase>,
    /// Show only members of this growbox.
    pub growbox: Option<String>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

/// Output format for the list command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOutput {
    /// Whether the list was successful.
    pub success: bool,
    /// Number of plants listed.
    pub count: usize,
    /// The plants.
    pub plants: Vec<PlantInfo>,
    /// Records skipped because they could not be read.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corrupt: Vec<String>,
    /// Error message if listing failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Plant summary shared by the plant commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantInfo {
    pub id: String,
    pub name: String,
    pub strain: String,
    pub manufacturer: String,
    pub thc: String,
    pub cbd: String,
    pub phase: PlantPhase,
    /// Week of life, counting from germination or planting.
    pub week: u32,
    pub planted: String,
}

impl PlantInfo {
    pub fn from_plant(plant: &Plant, now: DateTime<Utc>) -> Self {
        Self {
            id: plant.id.clone(),
            name: plant.name.clone(),
            strain: plant.strain.clone(),
            manufacturer: plant.manufacturer.clone(),
            thc: plant.thc_content.clone(),
            cbd: plant.cbd_content.clone(),
            phase: derive_phase(plant, now),
            week: crate::core::age_week(plant, now),
            planted: plant.planting_date.format("%Y-%m-%d").to_string(),
        }
    }
}

impl ListOutput {
    /// Create a successful output.
    pub fn success(plants: Vec<PlantInfo>, corrupt: Vec<String>) -> Self {
        Self {
            success: true,
            count: plants.len(),
            plants,
            corrupt,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            count: 0,
            plants: Vec::new(),
            corrupt: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The list command implementation.
pub struct ListCommand<S: JournalStore> {
    journal: Journal<S>,
}

impl<S: JournalStore> ListCommand<S> {
    /// Create a new list command.
    pub fn new(journal: Journal<S>) -> Self {
        Self { journal }
    }

    /// Run the list command.
    pub fn run(&self, options: &ListOptions) -> ListOutput {
        self.run_at(options, now_millis())
    }

    /// Run the list command with phases derived at `now`.
    pub fn run_at(&self, options: &ListOptions, now: DateTime<Utc>) -> ListOutput {
        let report = match self.journal.initialize() {
            Ok(report) => report,
            Err(e) => return ListOutput::failure(e.to_string()),
        };

        let plants = match (&options.growbox, options.phase) {
            (Some(growbox_id), _) => self.journal.plants_in(growbox_id),
            (None, Some(phase)) => self.journal.plants_in_phase(phase, now),
            (None, None) => self.journal.plants(),
        };
        let plants = match plants {
            Ok(plants) => plants,
            Err(e) => return ListOutput::failure(e.to_string()),
        };

        let mut infos: Vec<PlantInfo> = plants
            .iter()
            .map(|p| PlantInfo::from_plant(p, now))
            .filter(|info| options.phase.is_none_or(|phase| info.phase == phase))
            .collect();

        if let Some(limit) = options.limit {
            infos.truncate(limit);
        }

        ListOutput::success(infos, report.corrupt)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ListOutput, options: &ListOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    /// Format output as human-readable text.
    fn format_human_readable(&self, output: &ListOutput) -> String {
        if !output.success {
            return format!(
                "Failed to list plants: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut lines = Vec::new();
        for path in &output.corrupt {
            lines.push(format!("Warning: skipped unreadable record {}", path));
        }

        if output.plants.is_empty() {
            lines.push("No plants found.".to_string());
            return lines.join("\n") + "\n";
        }

        lines.push(format!("Plants ({}):", output.count));
        lines.push(String::new());
        for plant in &output.plants {
            let strain = if plant.strain.is_empty() {
                String::new()
            } else {
                format!(" ({})", plant.strain)
            };
            lines.push(format!(
                "  [{}] {}{} - {}, week {}",
                plant.id, plant.name, strain, plant.phase, plant.week
            ));
        }

        lines.join("\n") + "\n"
    }
}
