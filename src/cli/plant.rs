//! Plant commands for growtrack: add, update and remove.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::list::PlantInfo;
use crate::core::{Journal, Plant, PlantType, PotSize};
use crate::storage::JournalStore;
use crate::util::now_millis;

/// Options for the plant commands.
#[derive(Debug, Clone, Default)]
pub struct PlantOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Field values for a plant; `None` leaves a field untouched on update.
#[derive(Debug, Clone, Default)]
pub struct PlantFields {
    pub name: Option<String>,
    pub strain: Option<String>,
    pub manufacturer: Option<String>,
    pub thc: Option<String>,
    pub cbd: Option<String>,
    pub plant_type: Option<PlantType>,
    pub pot_size: Option<PotSize>,
    pub custom_pot_size: Option<String>,
    pub planting_date: Option<DateTime<Utc>>,
    pub germination_date: Option<DateTime<Utc>>,
}

impl PlantFields {
    fn apply(self, plant: &mut Plant) {
        if let Some(name) = self.name {
            plant.name = name;
        }
        if let Some(strain) = self.strain {
            plant.strain = strain;
        }
        if let Some(manufacturer) = self.manufacturer {
            plant.manufacturer = manufacturer;
        }
        if let Some(thc) = self.thc {
            plant.thc_content = thc;
        }
        if let Some(cbd) = self.cbd {
            plant.cbd_content = cbd;
        }
        if let Some(plant_type) = self.plant_type {
            plant.plant_type = plant_type;
        }
        if let Some(pot_size) = self.pot_size {
            plant.pot_size = pot_size;
        }
        if let Some(custom) = self.custom_pot_size {
            plant.custom_pot_size = Some(custom);
        }
        if let Some(date) = self.planting_date {
            plant.planting_date = date;
        }
        if let Some(date) = self.germination_date {
            plant.germination_date = Some(date);
        }
    }
}

/// Output format for the plant commands.
#[derive(Debug, Clone, Serialize)]
pub struct PlantOutput {
    /// Whether the operation was successful.
    pub success: bool,
    /// The action performed.
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plant: Option<PlantInfo>,
    /// Error message if the operation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlantOutput {
    /// Create a successful output.
    pub fn success(action: &str, plant: &Plant) -> Self {
        Self {
            success: true,
            action: action.to_string(),
            plant: Some(PlantInfo::from_plant(plant, now_millis())),
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(action: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            action: action.to_string(),
            plant: None,
            error: Some(error.into()),
        }
    }
}

/// The plant command implementation.
pub struct PlantCommand<S: JournalStore> {
    journal: Journal<S>,
}

impl<S: JournalStore> PlantCommand<S> {
    /// Create a new plant command.
    pub fn new(journal: Journal<S>) -> Self {
        Self { journal }
    }

    /// Add a plant. Blank THC/CBD are filled from the strain catalog.
    pub fn add(&self, fields: PlantFields) -> PlantOutput {
        let name = fields.name.clone().unwrap_or_default();
        if name.trim().is_empty() {
            return PlantOutput::failure("add", "plant name must not be empty");
        }
        let mut plant = Plant::new(name);
        fields.apply(&mut plant);

        match self.journal.add_plant(plant) {
            Ok(stored) => PlantOutput::success("add", &stored),
            Err(e) => PlantOutput::failure("add", e.to_string()),
        }
    }

    /// Update the given fields of a plant.
    pub fn update(&self, plant_id: &str, fields: PlantFields) -> PlantOutput {
        if fields.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return PlantOutput::failure("update", "plant name must not be empty");
        }
        let mut plant = match self.journal.plant(plant_id) {
            Ok(plant) => plant,
            Err(e) => return PlantOutput::failure("update", e.to_string()),
        };
        fields.apply(&mut plant);

        match self.journal.update_plant(plant.clone()) {
            Ok(()) => PlantOutput::success("update", &plant),
            Err(e) => PlantOutput::failure("update", e.to_string()),
        }
    }

    /// Remove a plant and detach it from its growbox.
    pub fn remove(&self, plant_id: &str) -> PlantOutput {
        match self.journal.remove_plant(plant_id) {
            Ok(removed) => PlantOutput::success("remove", &removed),
            Err(e) => PlantOutput::failure("remove", e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &PlantOutput, options: &PlantOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &PlantOutput) -> String {
        match (&output.plant, output.success) {
            (Some(plant), true) => {
                let verb = match output.action.as_str() {
                    "add" => "Added",
                    "remove" => "Removed",
                    _ => "Updated",
                };
                let mut text = format!("{} plant {} [{}]\n", verb, plant.name, plant.id);
                if output.action != "remove" && (!plant.thc.is_empty() || !plant.cbd.is_empty()) {
                    text.push_str(&format!("THC {}% / CBD {}%\n", plant.thc, plant.cbd));
                }
                text
            }
            _ => format!(
                "Plant {} failed: {}\n",
                output.action,
                output.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}
