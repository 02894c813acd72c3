//! Core types and logic for growtrack.
//!
//! This module contains the plant and growbox data model, phase derivation,
//! consumption statistics and the journal that keeps them persisted.

pub mod entry;
pub mod growbox;
pub mod journal;
pub mod phase;
pub mod plant;
pub mod stats;

pub use entry::{
    total_fertilizer_amount, EntryType, FermentationEntry, FermentationEntryType,
    FermentationMethod, FertilizerEntry, PlantEntry,
};
pub use growbox::{
    daily_light_minutes, ElectricityCosts, Growbox, LightSchedule, LightingSettings,
    LightingSettingsChange,
};
pub use journal::{ImportReport, Journal, LoadReport};
pub use phase::{
    age_week, bloom_days, days_to_harvest, derive_phase, drying_days, expected_bloom_days,
    expected_harvest_date, fermentation_days, PlantPhase,
};
pub use plant::{Plant, PlantPhoto, PlantType, PotSize, PowerDevice};
pub use stats::{GrowboxStats, OverallStats, PowerConsumption, Statistics};
