//! Growboxes, lighting settings and electricity cost estimation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::plant::Plant;
use crate::util::{new_id, now_millis, parse_decimal};

/// A cultivation environment grouping plants under shared lighting.
///
/// Member plants are referenced by id; the plant records themselves live in
/// the journal's plant collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Growbox {
    pub id: String,
    pub name: String,
    pub width: String,
    pub height: String,
    pub depth: String,
    #[serde(alias = "lightType")]
    pub light_type: String,
    /// Rated lamp power as entered, e.g. "240W".
    #[serde(alias = "lightPower")]
    pub light_power: String,
    #[serde(alias = "isActive")]
    pub is_active: bool,
    #[serde(alias = "plantIds")]
    pub plant_ids: Vec<String>,
    #[serde(alias = "lightingSettings")]
    pub lighting_settings: LightingSettings,
}

impl Default for Growbox {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            width: String::new(),
            height: String::new(),
            depth: String::new(),
            light_type: String::new(),
            light_power: String::new(),
            is_active: true,
            plant_ids: Vec::new(),
            lighting_settings: LightingSettings::default(),
        }
    }
}

impl Growbox {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Lamp wattage parsed from `light_power`.
    pub fn light_watts(&self) -> Option<u32> {
        parse_decimal(&self.light_power).map(|w| w.round().max(0.0) as u32)
    }

    pub fn contains(&self, plant_id: &str) -> bool {
        self.plant_ids.iter().any(|id| id == plant_id)
    }

    /// Electricity costs of the lamp plus every member plant's power devices.
    ///
    /// `None` when the lamp wattage is unknown.
    pub fn electricity_costs<'a>(
        &self,
        plants: impl IntoIterator<Item = &'a Plant>,
    ) -> Option<ElectricityCosts> {
        let watts = self.light_watts()?;
        let settings = &self.lighting_settings;
        let device_kwh: f64 = plants
            .into_iter()
            .filter(|p| self.contains(&p.id))
            .flat_map(|p| p.power_devices.iter())
            .map(|d| d.daily_kwh())
            .sum();
        let daily = (settings.daily_kwh(watts) + device_kwh) * settings.electricity_price;
        Some(ElectricityCosts::from_daily(daily))
    }
}

/// Light cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LightSchedule {
    /// 18 hours on, 6 off.
    #[default]
    Vegetative,
    /// 12 hours on, 12 off.
    Flowering,
}

impl LightSchedule {
    pub fn hours_on(&self) -> u32 {
        match self {
            LightSchedule::Vegetative => 18,
            LightSchedule::Flowering => 12,
        }
    }

    pub fn hours_off(&self) -> u32 {
        24 - self.hours_on()
    }

    pub fn display_name(&self) -> String {
        format!("{}/{}", self.hours_on(), self.hours_off())
    }
}

/// Lighting configuration of a growbox.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightingSettings {
    #[serde(alias = "lightSchedule")]
    pub light_schedule: LightSchedule,
    /// Dimmer level in percent, 0-100.
    #[serde(alias = "powerLevel")]
    pub power_level: u8,
    /// Price per kWh.
    #[serde(alias = "electricityPrice")]
    pub electricity_price: f64,
    #[serde(alias = "dailyOperatingHours")]
    pub daily_operating_hours: u32,
    #[serde(alias = "settingsHistory")]
    pub settings_history: Vec<LightingSettingsChange>,
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            light_schedule: LightSchedule::Vegetative,
            power_level: 100,
            electricity_price: 0.30,
            daily_operating_hours: LightSchedule::Vegetative.hours_on(),
            settings_history: Vec::new(),
        }
    }
}

impl LightingSettings {
    /// Energy used per day by a lamp of `watts` at the current power level.
    pub fn daily_kwh(&self, watts: u32) -> f64 {
        let actual = watts as f64 * (self.power_level.min(100) as f64 / 100.0);
        actual * self.daily_operating_hours as f64 / 1000.0
    }

    pub fn daily_cost(&self, watts: u32) -> f64 {
        self.daily_kwh(watts) * self.electricity_price
    }

    /// Apply new values and record the change in the history.
    ///
    /// Operating hours follow the schedule.
    pub fn apply_change(
        &mut self,
        schedule: LightSchedule,
        power_level: u8,
        electricity_price: f64,
        reason: impl Into<String>,
    ) {
        self.light_schedule = schedule;
        self.power_level = power_level.min(100);
        self.electricity_price = electricity_price;
        self.daily_operating_hours = schedule.hours_on();
        self.settings_history.push(LightingSettingsChange {
            timestamp: now_millis(),
            light_schedule: schedule,
            power_level: self.power_level,
            electricity_price,
            reason: reason.into(),
        });
    }

    /// Derive operating hours from a light-on window given in minutes of day.
    pub fn set_light_window(&mut self, on_minute: u32, off_minute: u32) {
        let minutes = daily_light_minutes(on_minute, off_minute);
        self.daily_operating_hours = (minutes as f64 / 60.0).round() as u32;
    }
}

/// One entry in the lighting settings history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LightingSettingsChange {
    #[serde(with = "chrono::serde::ts_milliseconds", default = "now_millis")]
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "lightSchedule")]
    pub light_schedule: LightSchedule,
    #[serde(alias = "powerLevel")]
    pub power_level: u8,
    #[serde(alias = "electricityPrice")]
    pub electricity_price: f64,
    #[serde(default = "default_change_reason")]
    pub reason: String,
}

fn default_change_reason() -> String {
    "Manual change".to_string()
}

/// Projected electricity costs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ElectricityCosts {
    pub daily_cost: f64,
    pub weekly_cost: f64,
    pub monthly_cost: f64,
    pub yearly_cost: f64,
}

impl ElectricityCosts {
    pub fn from_daily(daily: f64) -> Self {
        Self {
            daily_cost: daily,
            weekly_cost: daily * 7.0,
            monthly_cost: daily * 30.0,
            yearly_cost: daily * 365.0,
        }
    }
}

/// Minutes of light per day between two minute-of-day marks.
///
/// An end mark before the start crosses midnight; equal marks mean zero.
pub fn daily_light_minutes(start_minute: u32, end_minute: u32) -> u32 {
    const DAY: u32 = 24 * 60;
    let start = start_minute % DAY;
    let end = end_minute % DAY;
    (end + DAY - start) % DAY
}
