//! Plant record and its nested collections.
//!
//! Field names accept the legacy camelCase spelling as aliases so journal
//! blobs exported by older app versions decode without conversion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::StrainInfo;
use crate::core::entry::{FermentationEntry, FermentationMethod, PlantEntry};
use crate::util::{new_id, now_millis};

/// A tracked plant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Plant {
    pub id: String,
    pub name: String,
    pub strain: String,
    pub manufacturer: String,
    #[serde(alias = "thcContent")]
    pub thc_content: String,
    #[serde(alias = "cbdContent")]
    pub cbd_content: String,
    #[serde(rename = "type")]
    pub plant_type: PlantType,
    #[serde(alias = "plantingDate", with = "chrono::serde::ts_milliseconds")]
    pub planting_date: DateTime<Utc>,
    #[serde(
        alias = "germinationDate",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub germination_date: Option<DateTime<Utc>>,
    #[serde(
        alias = "floweringStartDate",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub flowering_start_date: Option<DateTime<Utc>>,
    #[serde(alias = "harvestDate", with = "chrono::serde::ts_milliseconds_option")]
    pub harvest_date: Option<DateTime<Utc>>,
    #[serde(
        alias = "dryingStartDate",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub drying_start_date: Option<DateTime<Utc>>,
    #[serde(alias = "isDrying")]
    pub is_drying: bool,
    #[serde(
        alias = "fermentationStartDate",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub fermentation_start_date: Option<DateTime<Utc>>,
    #[serde(alias = "isFermenting")]
    pub is_fermenting: bool,
    #[serde(alias = "fermentationMethod")]
    pub fermentation_method: FermentationMethod,
    pub entries: Vec<PlantEntry>,
    #[serde(alias = "fermentationEntries")]
    pub fermentation_entries: Vec<FermentationEntry>,
    pub photos: Vec<PlantPhoto>,
    #[serde(alias = "powerDevices")]
    pub power_devices: Vec<PowerDevice>,
    #[serde(alias = "lightType", skip_serializing_if = "Option::is_none")]
    pub light_type: Option<String>,
    #[serde(alias = "lightWatt", skip_serializing_if = "Option::is_none")]
    pub light_watt: Option<u32>,
    #[serde(alias = "potSize")]
    pub pot_size: PotSize,
    #[serde(alias = "customPotSize", skip_serializing_if = "Option::is_none")]
    pub custom_pot_size: Option<String>,
    #[serde(
        alias = "preferredFertilizerManufacturer",
        skip_serializing_if = "Option::is_none"
    )]
    pub preferred_fertilizer_manufacturer: Option<String>,
}

impl Default for Plant {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            strain: String::new(),
            manufacturer: String::new(),
            thc_content: String::new(),
            cbd_content: String::new(),
            plant_type: PlantType::default(),
            planting_date: now_millis(),
            germination_date: None,
            flowering_start_date: None,
            harvest_date: None,
            drying_start_date: None,
            is_drying: false,
            fermentation_start_date: None,
            is_fermenting: false,
            fermentation_method: FermentationMethod::default(),
            entries: Vec::new(),
            fermentation_entries: Vec::new(),
            photos: Vec::new(),
            power_devices: Vec::new(),
            light_type: None,
            light_watt: None,
            pot_size: PotSize::default(),
            custom_pot_size: None,
            preferred_fertilizer_manufacturer: None,
        }
    }
}

impl Plant {
    /// Create a plant with a fresh id, planted now.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set strain and manufacturer.
    pub fn with_strain(
        mut self,
        manufacturer: impl Into<String>,
        strain: impl Into<String>,
    ) -> Self {
        self.manufacturer = manufacturer.into();
        self.strain = strain.into();
        self
    }

    /// Whether THC or CBD content is blank and could be filled from a catalog.
    pub fn needs_potency(&self) -> bool {
        self.thc_content.trim().is_empty() || self.cbd_content.trim().is_empty()
    }

    /// Fill blank THC/CBD content from a catalog strain.
    ///
    /// Non-blank values are kept. Returns whether anything changed.
    pub fn fill_potency_from(&mut self, strain: &StrainInfo) -> bool {
        let mut changed = false;
        if self.thc_content.trim().is_empty() && !strain.thc_content.is_empty() {
            self.thc_content = strain.thc_content.clone();
            changed = true;
        }
        if self.cbd_content.trim().is_empty() && !strain.cbd_content.is_empty() {
            self.cbd_content = strain.cbd_content.clone();
            changed = true;
        }
        changed
    }

    /// Overwrite potency and type from a catalog strain.
    ///
    /// Returns whether anything changed.
    pub fn apply_catalog(&mut self, strain: &StrainInfo) -> bool {
        let changed = self.thc_content != strain.thc_content
            || self.cbd_content != strain.cbd_content
            || self.plant_type != strain.plant_type;
        if changed {
            self.thc_content = strain.thc_content.clone();
            self.cbd_content = strain.cbd_content.clone();
            self.plant_type = strain.plant_type;
        }
        changed
    }

    pub fn entry(&self, entry_id: &str) -> Option<&PlantEntry> {
        self.entries.iter().find(|e| e.id == entry_id)
    }

    /// Date the plant's age is counted from.
    pub fn start_date(&self) -> DateTime<Utc> {
        self.germination_date.unwrap_or(self.planting_date)
    }

    /// Pot size as text, using the custom size when set.
    pub fn pot_size_label(&self) -> String {
        match (&self.pot_size, &self.custom_pot_size) {
            (PotSize::Custom, Some(custom)) if !custom.trim().is_empty() => custom.clone(),
            (size, _) => format!("{} ({})", size.display_name(), size.liters()),
        }
    }
}

/// Seed type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlantType {
    Autoflower,
    #[default]
    FeminizedIndica,
    FeminizedSativa,
    FeminizedHybrid,
}

impl PlantType {
    pub fn display_name(&self) -> &'static str {
        match self {
            PlantType::Autoflower => "Autoflower",
            PlantType::FeminizedIndica => "Feminized indica",
            PlantType::FeminizedSativa => "Feminized sativa",
            PlantType::FeminizedHybrid => "Feminized hybrid",
        }
    }
}

/// Pot size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PotSize {
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
    Custom,
}

impl PotSize {
    pub fn display_name(&self) -> &'static str {
        match self {
            PotSize::Small => "Small",
            PotSize::Medium => "Medium",
            PotSize::Large => "Large",
            PotSize::ExtraLarge => "Extra large",
            PotSize::Custom => "Custom",
        }
    }

    pub fn liters(&self) -> &'static str {
        match self {
            PotSize::Small => "3-5L",
            PotSize::Medium => "7-11L",
            PotSize::Large => "15-20L",
            PotSize::ExtraLarge => "25L+",
            PotSize::Custom => "",
        }
    }
}

/// A photo of the plant; `uri` points at a file managed outside the journal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantPhoto {
    pub id: String,
    pub uri: String,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "now_millis")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    /// Phase label at the time the photo was taken.
    #[serde(default)]
    pub phase: String,
}

impl PlantPhoto {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            uri: uri.into(),
            timestamp: now_millis(),
            description: String::new(),
            phase: String::new(),
        }
    }
}

/// Auxiliary equipment drawing power for a plant (fan, heater, pump).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PowerDevice {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub watts: u32,
    #[serde(default, alias = "hoursPerDay")]
    pub hours_per_day: f64,
}

impl PowerDevice {
    pub fn new(name: impl Into<String>, watts: u32, hours_per_day: f64) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            watts,
            hours_per_day,
        }
    }

    pub fn daily_kwh(&self) -> f64 {
        self.watts as f64 * self.hours_per_day.clamp(0.0, 24.0) / 1000.0
    }
}
