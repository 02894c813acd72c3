//! Journal record commands for growtrack.
//!
//! Adds, updates and removes the records nested in a plant: journal
//! entries, curing notes, photos and power devices.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::FertilizerCatalog;
use crate::core::{
    EntryType, FermentationEntry, FermentationEntryType, FertilizerEntry, Journal, PlantEntry,
    PlantPhoto, PowerDevice,
};
use crate::error::{GrowError, Result};
use crate::storage::JournalStore;

/// Options for the entry commands.
#[derive(Debug, Clone, Default)]
pub struct EntryOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Kind of nested record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Entry,
    Fermentation,
    Photo,
    Device,
}

impl RecordKind {
    fn label(&self) -> &'static str {
        match self {
            RecordKind::Entry => "entry",
            RecordKind::Fermentation => "curing note",
            RecordKind::Photo => "photo",
            RecordKind::Device => "power device",
        }
    }
}

/// Input for a journal entry.
#[derive(Debug, Clone)]
pub struct EntryInput {
    pub entry_type: EntryType,
    pub value: String,
    pub notes: Option<String>,
    pub date: Option<DateTime<Utc>>,
    /// Products applied; only for fertilizing entries.
    pub fertilizers: Vec<FertilizerInput>,
}

/// A fertilizer reference written as `manufacturer:product:dosage`.
#[derive(Debug, Clone, PartialEq)]
pub struct FertilizerInput {
    pub manufacturer: String,
    pub product: String,
    /// Dosage in ml per liter.
    pub dosage: String,
}

impl FromStr for FertilizerInput {
    type Err = GrowError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.splitn(3, ':').map(str::trim).collect();
        match parts.as_slice() {
            [manufacturer, product, dosage]
                if !manufacturer.is_empty() && !product.is_empty() =>
            {
                Ok(Self {
                    manufacturer: manufacturer.to_string(),
                    product: product.to_string(),
                    dosage: dosage.to_string(),
                })
            }
            _ => Err(GrowError::invalid_input(format!(
                "expected MANUFACTURER:PRODUCT:DOSAGE, got '{}'",
                s
            ))),
        }
    }
}

/// Amount of one product used by a fertilizing entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FertilizerTotal {
    pub product: String,
    /// Millilitres, when water volume and dosage are readable.
    pub total_ml: Option<f64>,
}

/// Input for a curing note.
#[derive(Debug, Clone)]
pub struct FermentationInput {
    pub entry_type: FermentationEntryType,
    pub notes: Option<String>,
    pub humidity: Option<String>,
    pub temperature: Option<String>,
}

/// Output format for the entry commands.
#[derive(Debug, Clone, Serialize)]
pub struct EntryOutput {
    /// Whether the operation was successful.
    pub success: bool,
    /// The action performed.
    pub action: String,
    pub kind: RecordKind,
    pub plant_id: String,
    /// Id of the record added, updated or removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fertilizer_totals: Vec<FertilizerTotal>,
    /// Error message if the operation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EntryOutput {
    fn from_result(action: &str, kind: RecordKind, plant_id: &str, result: Result<String>) -> Self {
        let (record_id, error) = match result {
            Ok(id) => (Some(id), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            success: error.is_none(),
            action: action.to_string(),
            kind,
            plant_id: plant_id.to_string(),
            record_id,
            fertilizer_totals: Vec::new(),
            error,
        }
    }
}

/// Numeric entry types must carry a readable number.
fn validate_entry_value(entry_type: EntryType, value: &str) -> Result<()> {
    if entry_type.needs_numeric_value() && crate::util::parse_decimal(value).is_none() {
        return Err(GrowError::invalid_input(format!(
            "{} needs a numeric value, got '{}'",
            entry_type.display_name(),
            value
        )));
    }
    Ok(())
}

/// The entry command implementation.
pub struct EntryCommand<S: JournalStore> {
    journal: Journal<S>,
    fertilizers: FertilizerCatalog,
}

impl<S: JournalStore> EntryCommand<S> {
    /// Create a new entry command resolving products in the built-in catalog.
    pub fn new(journal: Journal<S>) -> Self {
        Self {
            journal,
            fertilizers: FertilizerCatalog::builtin(),
        }
    }

    pub fn with_fertilizers(mut self, fertilizers: FertilizerCatalog) -> Self {
        self.fertilizers = fertilizers;
        self
    }

    /// Look up each referenced product in the fertilizer catalog.
    fn resolve_fertilizers(&self, inputs: Vec<FertilizerInput>) -> Result<Vec<FertilizerEntry>> {
        inputs
            .into_iter()
            .map(|input| {
                let product = self
                    .fertilizers
                    .lookup(&input.manufacturer, &input.product)
                    .ok_or_else(|| {
                        GrowError::not_found(
                            "fertilizer",
                            format!("{} {}", input.manufacturer, input.product),
                        )
                    })?;
                Ok(FertilizerEntry {
                    product: product.clone(),
                    dosage: input.dosage,
                    manufacturer: input.manufacturer,
                })
            })
            .collect()
    }

    pub fn add_entry(&self, plant_id: &str, input: EntryInput) -> EntryOutput {
        if !input.fertilizers.is_empty() && input.entry_type != EntryType::Fertilizing {
            return EntryOutput::from_result(
                "add",
                RecordKind::Entry,
                plant_id,
                Err(GrowError::invalid_input(
                    "fertilizers can only be attached to fertilizing entries",
                )),
            );
        }
        let result = validate_entry_value(input.entry_type, &input.value)
            .and_then(|()| self.resolve_fertilizers(input.fertilizers))
            .and_then(|fertilizers| {
                let mut entry = PlantEntry::new(input.entry_type, input.value);
                entry.fertilizer_entries = fertilizers;
                if let Some(notes) = input.notes {
                    entry = entry.with_notes(notes);
                }
                if let Some(date) = input.date {
                    entry = entry.with_date(date);
                }
                self.journal.add_entry(plant_id, entry)
            });

        let totals = match &result {
            Ok(entry) => entry
                .fertilizer_totals()
                .into_iter()
                .map(|(product, total_ml)| FertilizerTotal {
                    product: product.to_string(),
                    total_ml,
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        EntryOutput {
            fertilizer_totals: totals,
            ..EntryOutput::from_result("add", RecordKind::Entry, plant_id, result.map(|e| e.id))
        }
    }

    /// Replace an entry's value, notes or date; unset fields are kept.
    pub fn update_entry(
        &self,
        plant_id: &str,
        entry_id: &str,
        value: Option<String>,
        notes: Option<String>,
        date: Option<DateTime<Utc>>,
    ) -> EntryOutput {
        let result = self.journal.plant(plant_id).and_then(|plant| {
            let mut entry = plant
                .entry(entry_id)
                .cloned()
                .ok_or_else(|| GrowError::not_found("entry", entry_id))?;
            if let Some(value) = value {
                validate_entry_value(entry.entry_type, &value)?;
                entry.value = value;
            }
            if let Some(notes) = notes {
                entry.notes = notes;
            }
            if let Some(date) = date {
                entry.date = date;
            }
            self.journal.update_entry(plant_id, entry)?;
            Ok(entry_id.to_string())
        });
        EntryOutput::from_result("update", RecordKind::Entry, plant_id, result)
    }

    pub fn remove_entry(&self, plant_id: &str, entry_id: &str) -> EntryOutput {
        let result = self.journal.remove_entry(plant_id, entry_id).map(|e| e.id);
        EntryOutput::from_result("remove", RecordKind::Entry, plant_id, result)
    }

    pub fn add_fermentation(&self, plant_id: &str, input: FermentationInput) -> EntryOutput {
        let mut entry = FermentationEntry::new(input.entry_type);
        entry.notes = input.notes.unwrap_or_default();
        entry.humidity = input.humidity.unwrap_or_default();
        entry.temperature = input.temperature.unwrap_or_default();
        let result = self
            .journal
            .add_fermentation_entry(plant_id, entry)
            .map(|e| e.id);
        EntryOutput::from_result("add", RecordKind::Fermentation, plant_id, result)
    }

    pub fn remove_fermentation(&self, plant_id: &str, entry_id: &str) -> EntryOutput {
        let result = self
            .journal
            .remove_fermentation_entry(plant_id, entry_id)
            .map(|e| e.id);
        EntryOutput::from_result("remove", RecordKind::Fermentation, plant_id, result)
    }

    pub fn add_photo(&self, plant_id: &str, uri: &str, description: Option<String>) -> EntryOutput {
        let result = if uri.trim().is_empty() {
            Err(GrowError::invalid_input("photo uri must not be empty"))
        } else {
            let mut photo = PlantPhoto::new(uri);
            photo.description = description.unwrap_or_default();
            self.journal.add_photo(plant_id, photo).map(|p| p.id)
        };
        EntryOutput::from_result("add", RecordKind::Photo, plant_id, result)
    }

    pub fn remove_photo(&self, plant_id: &str, photo_id: &str) -> EntryOutput {
        let result = self.journal.remove_photo(plant_id, photo_id).map(|p| p.id);
        EntryOutput::from_result("remove", RecordKind::Photo, plant_id, result)
    }

    pub fn add_device(
        &self,
        plant_id: &str,
        name: &str,
        watts: u32,
        hours_per_day: f64,
    ) -> EntryOutput {
        let device = PowerDevice::new(name, watts, hours_per_day);
        let result = self.journal.add_power_device(plant_id, device).map(|d| d.id);
        EntryOutput::from_result("add", RecordKind::Device, plant_id, result)
    }

    pub fn remove_device(&self, plant_id: &str, device_id: &str) -> EntryOutput {
        let result = self
            .journal
            .remove_power_device(plant_id, device_id)
            .map(|d| d.id);
        EntryOutput::from_result("remove", RecordKind::Device, plant_id, result)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &EntryOutput, options: &EntryOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &EntryOutput) -> String {
        let kind = output.kind.label();
        match (&output.record_id, output.success) {
            (Some(id), true) => {
                let verb = match output.action.as_str() {
                    "add" => "Added",
                    "remove" => "Removed",
                    _ => "Updated",
                };
                let mut text = format!("{} {} {} on plant {}\n", verb, kind, id, output.plant_id);
                for total in &output.fertilizer_totals {
                    match total.total_ml {
                        Some(ml) => text.push_str(&format!("  {}: {:.1} ml\n", total.product, ml)),
                        None => text.push_str(&format!("  {}: amount unknown\n", total.product)),
                    }
                }
                text
            }
            _ => format!(
                "Failed to {} {}: {}\n",
                output.action,
                kind,
                output.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StrainCatalog;
    use crate::core::{FermentationMethod, Plant};
    use crate::storage::MemoryJournalStore;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn setup() -> (Journal<Arc<MemoryJournalStore>>, EntryCommand<Arc<MemoryJournalStore>>) {
        let store = Arc::new(MemoryJournalStore::new());
        let journal = Journal::new(Arc::clone(&store), StrainCatalog::builtin());
        let mut plant = Plant::new("Test");
        plant.id = "p1".to_string();
        journal.add_plant(plant).unwrap();
        let cmd = EntryCommand::new(Journal::new(store, StrainCatalog::builtin()));
        (journal, cmd)
    }

    fn reload(journal: &Journal<Arc<MemoryJournalStore>>) -> Plant {
        Journal::new(Arc::clone(journal.store()), StrainCatalog::builtin())
            .plant("p1")
            .unwrap()
    }

    fn watering(value: &str) -> EntryInput {
        EntryInput {
            entry_type: EntryType::Watering,
            value: value.to_string(),
            notes: None,
            date: None,
            fertilizers: Vec::new(),
        }
    }

    #[test]
    fn test_add_entry_persists() {
        let (journal, cmd) = setup();
        let date = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();
        let output = cmd.add_entry(
            "p1",
            EntryInput {
                date: Some(date),
                notes: Some("runoff ok".to_string()),
                ..watering("2 L")
            },
        );
        assert!(output.success);

        let plant = reload(&journal);
        assert_eq!(plant.entries.len(), 1);
        assert_eq!(plant.entries[0].id, output.record_id.unwrap());
        assert_eq!(plant.entries[0].date, date);
        assert_eq!(plant.entries[0].notes, "runoff ok");
    }

    #[test]
    fn test_numeric_entry_requires_number() {
        let (_, cmd) = setup();
        let output = cmd.add_entry(
            "p1",
            EntryInput {
                entry_type: EntryType::Height,
                value: "tall".to_string(),
                notes: None,
                date: None,
                fertilizers: Vec::new(),
            },
        );
        assert!(!output.success);
        assert!(output.error.unwrap().contains("numeric"));

        let output = cmd.add_entry(
            "p1",
            EntryInput {
                entry_type: EntryType::Height,
                value: "42 cm".to_string(),
                notes: None,
                date: None,
                fertilizers: Vec::new(),
            },
        );
        assert!(output.success);
    }

    #[test]
    fn test_parse_fertilizer_input() {
        let input: FertilizerInput = "BioBizz:Bio-Bloom:2,5 ml/L".parse().unwrap();
        assert_eq!(input.manufacturer, "BioBizz");
        assert_eq!(input.product, "Bio-Bloom");
        assert_eq!(input.dosage, "2,5 ml/L");

        assert!("BioBizz:Bio-Bloom".parse::<FertilizerInput>().is_err());
        assert!(":Bio-Bloom:2".parse::<FertilizerInput>().is_err());
    }

    #[test]
    fn test_fertilizing_entry_resolves_products() {
        let (journal, cmd) = setup();
        let output = cmd.add_entry(
            "p1",
            EntryInput {
                entry_type: EntryType::Fertilizing,
                value: "5 L".to_string(),
                notes: None,
                date: None,
                fertilizers: vec![
                    "biobizz:bio-grow:2 ml/L".parse().unwrap(),
                    "Canna:PK 13/14:x".parse().unwrap(),
                ],
            },
        );
        assert!(output.success);
        assert_eq!(
            output.fertilizer_totals,
            vec![
                FertilizerTotal {
                    product: "Bio-Grow".to_string(),
                    total_ml: Some(10.0),
                },
                FertilizerTotal {
                    product: "PK 13/14".to_string(),
                    total_ml: None,
                },
            ]
        );
        let text = cmd.format_output(&output, &EntryOptions::default());
        assert!(text.contains("  Bio-Grow: 10.0 ml\n"));
        assert!(text.contains("  PK 13/14: amount unknown\n"));

        let stored = &reload(&journal).entries[0];
        assert_eq!(stored.fertilizer_entries[0].product.npk.as_deref(), Some("4-3-6"));
        assert_eq!(stored.fertilizer_entries[0].manufacturer, "biobizz");
    }

    #[test]
    fn test_unknown_or_misplaced_fertilizer_is_rejected() {
        let (journal, cmd) = setup();
        let unknown = EntryInput {
            entry_type: EntryType::Fertilizing,
            fertilizers: vec!["BioBizz:Fish-Mix:1".parse().unwrap()],
            ..watering("5 L")
        };
        let output = cmd.add_entry("p1", unknown);
        assert!(!output.success);
        assert!(output.error.unwrap().contains("fertilizer not found"));

        let misplaced = EntryInput {
            fertilizers: vec!["BioBizz:Bio-Grow:1".parse().unwrap()],
            ..watering("5 L")
        };
        assert!(!cmd.add_entry("p1", misplaced).success);
        assert!(reload(&journal).entries.is_empty());
    }

    #[test]
    fn test_update_entry_keeps_unset_fields() {
        let (journal, cmd) = setup();
        let id = cmd.add_entry("p1", watering("1 L")).record_id.unwrap();

        let output = cmd.update_entry("p1", &id, Some("1,5 L".to_string()), None, None);
        assert!(output.success);

        let plant = reload(&journal);
        assert_eq!(plant.entries[0].value, "1,5 L");
        assert_eq!(plant.entries[0].entry_type, EntryType::Watering);
    }

    #[test]
    fn test_update_unknown_entry() {
        let (_, cmd) = setup();
        let output = cmd.update_entry("p1", "nope", None, None, None);
        assert!(!output.success);
    }

    #[test]
    fn test_remove_entry() {
        let (journal, cmd) = setup();
        let id = cmd.add_entry("p1", watering("1 L")).record_id.unwrap();
        assert!(cmd.remove_entry("p1", &id).success);
        assert!(reload(&journal).entries.is_empty());
        assert!(!cmd.remove_entry("p1", &id).success);
    }

    #[test]
    fn test_fermentation_notes() {
        let (journal, cmd) = setup();
        journal
            .harvest("p1", Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap())
            .unwrap();
        journal
            .start_fermentation(
                "p1",
                FermentationMethod::MasonJar,
                Utc.with_ymd_and_hms(2025, 5, 10, 0, 0, 0).unwrap(),
            )
            .unwrap();

        let output = cmd.add_fermentation(
            "p1",
            FermentationInput {
                entry_type: FermentationEntryType::Ventilation,
                notes: Some("burped 15 min".to_string()),
                humidity: Some("62".to_string()),
                temperature: None,
            },
        );
        assert!(output.success);
        let id = output.record_id.unwrap();

        let plant = reload(&journal);
        assert!(plant.fermentation_entries[0].is_ventilated);
        assert_eq!(plant.fermentation_entries[0].humidity, "62");

        assert!(cmd.remove_fermentation("p1", &id).success);
        assert!(reload(&journal).fermentation_entries.is_empty());
    }

    #[test]
    fn test_photo_add_remove() {
        let (journal, cmd) = setup();
        assert!(!cmd.add_photo("p1", " ", None).success);

        let output = cmd.add_photo("p1", "file:///photos/1.jpg", Some("day 30".to_string()));
        assert!(output.success);
        let plant = reload(&journal);
        assert_eq!(plant.photos[0].description, "day 30");

        assert!(cmd.remove_photo("p1", &output.record_id.unwrap()).success);
        assert!(reload(&journal).photos.is_empty());
    }

    #[test]
    fn test_device_validation() {
        let (journal, cmd) = setup();
        assert!(!cmd.add_device("p1", "Fan", 30, 25.0).success);

        let output = cmd.add_device("p1", "Fan", 30, 24.0);
        assert!(output.success);
        assert_eq!(reload(&journal).power_devices.len(), 1);
        assert!(cmd.remove_device("p1", &output.record_id.unwrap()).success);
    }

    #[test]
    fn test_format_output() {
        let (_, cmd) = setup();
        let output = cmd.add_entry("ghost", watering("1 L"));
        let text = cmd.format_output(&output, &EntryOptions::default());
        assert!(text.starts_with("Failed to add entry:"));

        let output = cmd.remove_photo("p1", "x");
        let json = EntryOptions {
            json: true,
            ..Default::default()
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&cmd.format_output(&output, &json)).unwrap();
        assert_eq!(parsed["kind"], "photo");
        assert_eq!(parsed["success"], false);
    }
}
