//! Journal entry types attached to a plant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::FertilizerProduct;
use crate::util::{new_id, now_millis, parse_decimal};

/// A timestamped journal record of an action or measurement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantEntry {
    #[serde(default)]
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "now_millis")]
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Free-text value; numeric for measurement types.
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, alias = "fertilizerEntries")]
    pub fertilizer_entries: Vec<FertilizerEntry>,
}

impl PlantEntry {
    /// Create an entry dated now with a fresh id.
    pub fn new(entry_type: EntryType, value: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            date: now_millis(),
            entry_type,
            value: value.into(),
            notes: String::new(),
            fertilizer_entries: Vec::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Numeric reading of `value`, for measurement entries.
    pub fn numeric_value(&self) -> Option<f64> {
        parse_decimal(&self.value)
    }

    /// Total fertilizer amount per product, using `value` as the water volume.
    pub fn fertilizer_totals(&self) -> Vec<(&str, Option<f64>)> {
        self.fertilizer_entries
            .iter()
            .map(|f| {
                (
                    f.product.name.as_str(),
                    total_fertilizer_amount(&self.value, &f.dosage),
                )
            })
            .collect()
    }
}

/// Kind of journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    Height,
    Watering,
    Fertilizing,
    Photo,
    Temperature,
    Humidity,
    Light,
    Topping,
    Lollipopping,
    Lst,
    Task,
    Note,
}

impl EntryType {
    pub const ALL: [EntryType; 12] = [
        EntryType::Height,
        EntryType::Watering,
        EntryType::Fertilizing,
        EntryType::Photo,
        EntryType::Temperature,
        EntryType::Humidity,
        EntryType::Light,
        EntryType::Topping,
        EntryType::Lollipopping,
        EntryType::Lst,
        EntryType::Task,
        EntryType::Note,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            EntryType::Height => "Plant height",
            EntryType::Watering => "Watering",
            EntryType::Fertilizing => "Fertilizing",
            EntryType::Photo => "Photo",
            EntryType::Temperature => "Temperature",
            EntryType::Humidity => "Humidity",
            EntryType::Light => "Light",
            EntryType::Topping => "Topping",
            EntryType::Lollipopping => "Lollipopping",
            EntryType::Lst => "Low stress training",
            EntryType::Task => "Task",
            EntryType::Note => "Note",
        }
    }

    /// Whether `value` must parse as a number.
    pub fn needs_numeric_value(&self) -> bool {
        matches!(
            self,
            EntryType::Height | EntryType::Temperature | EntryType::Humidity | EntryType::Light
        )
    }
}

/// One fertilizer applied as part of a fertilizing entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FertilizerEntry {
    pub product: FertilizerProduct,
    /// Dosage in ml per liter of water.
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub manufacturer: String,
}

/// Total fertilizer amount in ml for `water` liters at `dosage` ml/L.
///
/// Both inputs are free text ("5 L", "2,5 ml/L"); `None` if either has no
/// readable number.
pub fn total_fertilizer_amount(water: &str, dosage: &str) -> Option<f64> {
    Some(parse_decimal(water)? * parse_decimal(dosage)?)
}

/// A fermentation (curing) journal record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FermentationEntry {
    #[serde(default)]
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "now_millis")]
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub entry_type: FermentationEntryType,
    #[serde(default)]
    pub notes: String,
    #[serde(default, alias = "isVentilated")]
    pub is_ventilated: bool,
    #[serde(default)]
    pub humidity: String,
    #[serde(default)]
    pub temperature: String,
}

impl FermentationEntry {
    pub fn new(entry_type: FermentationEntryType) -> Self {
        Self {
            id: new_id(),
            date: now_millis(),
            entry_type,
            notes: String::new(),
            is_ventilated: entry_type == FermentationEntryType::Ventilation,
            humidity: String::new(),
            temperature: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FermentationEntryType {
    Ventilation,
    Note,
    Task,
    HumidityCheck,
    TemperatureCheck,
}

impl FermentationEntryType {
    pub fn display_name(&self) -> &'static str {
        match self {
            FermentationEntryType::Ventilation => "Ventilation",
            FermentationEntryType::Note => "Note",
            FermentationEntryType::Task => "Task",
            FermentationEntryType::HumidityCheck => "Humidity check",
            FermentationEntryType::TemperatureCheck => "Temperature check",
        }
    }
}

/// Container used for curing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FermentationMethod {
    #[default]
    MasonJar,
    Humidor,
    TerplocBag,
    VacuumContainer,
}

impl FermentationMethod {
    pub fn display_name(&self) -> &'static str {
        match self {
            FermentationMethod::MasonJar => "Mason jar",
            FermentationMethod::Humidor => "Humidor",
            FermentationMethod::TerplocBag => "TerpLoc bag",
            FermentationMethod::VacuumContainer => "Vacuum container",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_wire_names() {
        assert_eq!(serde_json::to_string(&EntryType::Lst).unwrap(), "\"LST\"");
        assert_eq!(
            serde_json::to_string(&EntryType::Lollipopping).unwrap(),
            "\"LOLLIPOPPING\""
        );
        assert_eq!(
            serde_json::from_str::<FermentationEntryType>("\"HUMIDITY_CHECK\"").unwrap(),
            FermentationEntryType::HumidityCheck
        );
        assert_eq!(
            serde_json::from_str::<FermentationMethod>("\"TERPLOC_BAG\"").unwrap(),
            FermentationMethod::TerplocBag
        );
    }

    #[test]
    fn test_plant_entry_decodes_legacy_record() {
        let json = r#"{
            "id": "e1",
            "date": 1700000000000,
            "type": "FERTILIZING",
            "value": "5L",
            "fertilizerEntries": [
                {
                    "product": {"name": "Bio-Bloom", "category": "Bloom"},
                    "dosage": "2 ml/L",
                    "manufacturer": "BioBizz"
                }
            ],
            "someFutureField": true
        }"#;
        let entry: PlantEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.entry_type, EntryType::Fertilizing);
        assert_eq!(entry.date.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(entry.notes, "");
        assert_eq!(entry.fertilizer_totals(), vec![("Bio-Bloom", Some(10.0))]);
    }

    #[test]
    fn test_needs_numeric_value() {
        let numeric: Vec<EntryType> = EntryType::ALL
            .iter()
            .copied()
            .filter(EntryType::needs_numeric_value)
            .collect();
        assert_eq!(
            numeric,
            vec![
                EntryType::Height,
                EntryType::Temperature,
                EntryType::Humidity,
                EntryType::Light
            ]
        );
    }

    #[test]
    fn test_total_fertilizer_amount() {
        assert_eq!(total_fertilizer_amount("5 L", "2 ml/L"), Some(10.0));
        assert_eq!(total_fertilizer_amount("1,5L", "4ml/L"), Some(6.0));
        assert_eq!(total_fertilizer_amount("", "4ml/L"), None);
        assert_eq!(total_fertilizer_amount("5L", "a bit"), None);
    }

    #[test]
    fn test_numeric_value() {
        let entry = PlantEntry::new(EntryType::Height, "42,5 cm");
        assert_eq!(entry.numeric_value(), Some(42.5));
    }

    #[test]
    fn test_ventilation_entry_defaults_ventilated() {
        assert!(FermentationEntry::new(FermentationEntryType::Ventilation).is_ventilated);
        assert!(!FermentationEntry::new(FermentationEntryType::Note).is_ventilated);
    }
}
