//! Consumption statistics per growbox and across the journal.
//!
//! Water comes from watering entries, fertilizer from the dosages of
//! fertilizing entries, power from the lamp and the member plants' power
//! devices over the days the growbox has been in use. Only plants that are
//! members of a growbox are counted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entry::EntryType;
use crate::core::growbox::{Growbox, LightSchedule};
use crate::core::plant::Plant;
use crate::util::parse_decimal;

/// Water volume assumed for a fertilizing entry without a readable amount.
pub const DEFAULT_FERTILIZER_WATER_LITERS: f64 = 1.0;

/// Energy and cost accumulated since the oldest member was planted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerConsumption {
    pub total_kwh: f64,
    pub total_cost: f64,
}

/// Statistics of one growbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowboxStats {
    pub growbox_id: String,
    pub name: String,
    pub is_active: bool,
    pub plant_count: usize,
    pub water_liters: f64,
    pub fertilizer_ml: f64,
    /// Days since the oldest member was planted, at least 1.
    pub active_days: u32,
    pub power: PowerConsumption,
    pub light_schedule: LightSchedule,
    pub power_level: u8,
    pub electricity_price: f64,
}

/// Totals across growboxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub growbox_count: usize,
    pub active_growboxes: usize,
    pub plant_count: usize,
    pub water_liters: f64,
    pub fertilizer_ml: f64,
    pub power: PowerConsumption,
}

/// Per-growbox statistics plus their totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub growboxes: Vec<GrowboxStats>,
    pub overall: OverallStats,
}

/// Liters in a watering value like "2 L", "1,5" or "500 ml".
pub fn watering_liters(value: &str) -> Option<f64> {
    let amount = parse_decimal(value)?;
    if value.trim().to_lowercase().ends_with("ml") {
        Some(amount / 1000.0)
    } else {
        Some(amount)
    }
}

/// Liters of water recorded in watering entries of `plants`.
pub fn water_liters<'a>(plants: impl IntoIterator<Item = &'a Plant>) -> f64 {
    plants
        .into_iter()
        .flat_map(|p| p.entries.iter())
        .filter(|e| e.entry_type == EntryType::Watering)
        .filter_map(|e| watering_liters(&e.value))
        .sum()
}

/// Milliliters of fertilizer applied in fertilizing entries of `plants`.
///
/// Each product's dosage (ml/L) is multiplied by the entry's water volume;
/// unreadable dosages count as zero.
pub fn fertilizer_ml<'a>(plants: impl IntoIterator<Item = &'a Plant>) -> f64 {
    plants
        .into_iter()
        .flat_map(|p| p.entries.iter())
        .filter(|e| e.entry_type == EntryType::Fertilizing)
        .map(|e| {
            let water = watering_liters(&e.value).unwrap_or(DEFAULT_FERTILIZER_WATER_LITERS);
            e.fertilizer_entries
                .iter()
                .map(|f| parse_decimal(&f.dosage).unwrap_or(0.0) * water)
                .sum::<f64>()
        })
        .sum()
}

/// Whole days since the oldest of `plants` was planted, at least 1.
///
/// 0 when there are no plants.
pub fn active_days(plants: &[&Plant], now: DateTime<Utc>) -> u32 {
    let Some(oldest) = plants.iter().map(|p| p.planting_date).min() else {
        return 0;
    };
    let days = (now - oldest).num_days().max(1);
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// Statistics of `growbox`, whose members are looked up in `plants`.
pub fn growbox_stats(growbox: &Growbox, plants: &[Plant], now: DateTime<Utc>) -> GrowboxStats {
    let members: Vec<&Plant> = growbox
        .plant_ids
        .iter()
        .filter_map(|id| plants.iter().find(|p| &p.id == id))
        .collect();
    let active_days = active_days(&members, now);
    let settings = &growbox.lighting_settings;

    let power = if growbox.is_active && !members.is_empty() {
        let watts = growbox.light_watts().unwrap_or(0);
        let device_kwh: f64 = members
            .iter()
            .flat_map(|p| p.power_devices.iter())
            .map(|d| d.daily_kwh())
            .sum();
        let daily_kwh = settings.daily_kwh(watts) + device_kwh;
        PowerConsumption {
            total_kwh: daily_kwh * active_days as f64,
            total_cost: daily_kwh * settings.electricity_price * active_days as f64,
        }
    } else {
        PowerConsumption::default()
    };

    GrowboxStats {
        growbox_id: growbox.id.clone(),
        name: growbox.name.clone(),
        is_active: growbox.is_active,
        plant_count: members.len(),
        water_liters: water_liters(members.iter().copied()),
        fertilizer_ml: fertilizer_ml(members.iter().copied()),
        active_days,
        power,
        light_schedule: settings.light_schedule,
        power_level: settings.power_level,
        electricity_price: settings.electricity_price,
    }
}

/// Statistics of every growbox in `growboxes`.
pub fn statistics(growboxes: &[Growbox], plants: &[Plant], now: DateTime<Utc>) -> Statistics {
    let per_box: Vec<GrowboxStats> = growboxes
        .iter()
        .map(|g| growbox_stats(g, plants, now))
        .collect();

    let mut overall = OverallStats {
        growbox_count: per_box.len(),
        ..OverallStats::default()
    };
    for stats in &per_box {
        if stats.is_active {
            overall.active_growboxes += 1;
        }
        overall.plant_count += stats.plant_count;
        overall.water_liters += stats.water_liters;
        overall.fertilizer_ml += stats.fertilizer_ml;
        overall.power.total_kwh += stats.power.total_kwh;
        overall.power.total_cost += stats.power.total_cost;
    }

    Statistics {
        growboxes: per_box,
        overall,
    }
}
