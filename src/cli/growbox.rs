//! Growbox commands for growtrack.
//!
//! Manages growboxes, their plant membership and lighting, and projects
//! electricity costs.

use serde::Serialize;

use crate::config::Config;
use crate::core::{ElectricityCosts, Growbox, Journal, LightSchedule};
use crate::error::Result;
use crate::storage::JournalStore;

/// Options for the growbox commands.
#[derive(Debug, Clone, Default)]
pub struct GrowboxOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Fields for a new growbox.
#[derive(Debug, Clone, Default)]
pub struct GrowboxFields {
    pub name: String,
    pub width: Option<String>,
    pub height: Option<String>,
    pub depth: Option<String>,
    pub light_type: Option<String>,
    pub light_power: Option<String>,
}

/// New lighting values; unset fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct LightingFields {
    pub schedule: Option<LightSchedule>,
    pub power_level: Option<u8>,
    pub electricity_price: Option<f64>,
    pub reason: Option<String>,
    /// Light-on and light-off marks in minutes of day.
    pub light_window: Option<(u32, u32)>,
}

/// Growbox summary for output.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GrowboxInfo {
    pub id: String,
    pub name: String,
    pub light: String,
    pub schedule: String,
    pub daily_hours: u32,
    pub power_level: u8,
    pub electricity_price: f64,
    pub plant_ids: Vec<String>,
}

impl From<&Growbox> for GrowboxInfo {
    fn from(growbox: &Growbox) -> Self {
        let settings = &growbox.lighting_settings;
        let light = [growbox.light_type.trim(), growbox.light_power.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            id: growbox.id.clone(),
            name: growbox.name.clone(),
            light,
            schedule: settings.light_schedule.display_name(),
            daily_hours: settings.daily_operating_hours,
            power_level: settings.power_level,
            electricity_price: settings.electricity_price,
            plant_ids: growbox.plant_ids.clone(),
        }
    }
}

/// Output format for the growbox commands.
#[derive(Debug, Clone, Serialize)]
pub struct GrowboxOutput {
    /// Whether the operation was successful.
    pub success: bool,
    /// The action performed.
    pub action: String,
    pub growboxes: Vec<GrowboxInfo>,
    /// Cost projection, for the costs action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub costs: Option<ElectricityCosts>,
    /// Error message if the operation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GrowboxOutput {
    fn from_result(action: &str, result: Result<Vec<GrowboxInfo>>) -> Self {
        match result {
            Ok(growboxes) => Self {
                success: true,
                action: action.to_string(),
                growboxes,
                costs: None,
                error: None,
            },
            Err(e) => Self::failure(action, e.to_string()),
        }
    }

    /// Create a failed output.
    pub fn failure(action: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            action: action.to_string(),
            growboxes: Vec::new(),
            costs: None,
            error: Some(error.into()),
        }
    }
}

/// The growbox command implementation.
pub struct GrowboxCommand<S: JournalStore> {
    journal: Journal<S>,
    config: Config,
}

impl<S: JournalStore> GrowboxCommand<S> {
    /// Create a new growbox command.
    pub fn new(journal: Journal<S>, config: Config) -> Self {
        Self { journal, config }
    }

    /// Create a growbox priced at the configured electricity rate.
    pub fn add(&self, fields: GrowboxFields) -> GrowboxOutput {
        if fields.name.trim().is_empty() {
            return GrowboxOutput::failure("add", "growbox name must not be empty");
        }
        let mut growbox = Growbox::new(fields.name);
        growbox.width = fields.width.unwrap_or_default();
        growbox.height = fields.height.unwrap_or_default();
        growbox.depth = fields.depth.unwrap_or_default();
        growbox.light_type = fields.light_type.unwrap_or_default();
        growbox.light_power = fields.light_power.unwrap_or_default();
        growbox.lighting_settings.electricity_price = self.config.lighting.electricity_price;

        let result = self
            .journal
            .add_growbox(growbox)
            .map(|g| vec![GrowboxInfo::from(&g)]);
        GrowboxOutput::from_result("add", result)
    }

    /// Change dimensions or lamp; blank name and unset fields are kept.
    pub fn update(&self, growbox_id: &str, fields: GrowboxFields) -> GrowboxOutput {
        let result = self.journal.growbox(growbox_id).and_then(|mut growbox| {
            if !fields.name.trim().is_empty() {
                growbox.name = fields.name;
            }
            if let Some(width) = fields.width {
                growbox.width = width;
            }
            if let Some(height) = fields.height {
                growbox.height = height;
            }
            if let Some(depth) = fields.depth {
                growbox.depth = depth;
            }
            if let Some(light_type) = fields.light_type {
                growbox.light_type = light_type;
            }
            if let Some(light_power) = fields.light_power {
                growbox.light_power = light_power;
            }
            self.journal.update_growbox(growbox.clone())?;
            Ok(vec![GrowboxInfo::from(&growbox)])
        });
        GrowboxOutput::from_result("update", result)
    }

    pub fn list(&self) -> GrowboxOutput {
        let result = self
            .journal
            .growboxes()
            .map(|boxes| boxes.iter().map(GrowboxInfo::from).collect());
        GrowboxOutput::from_result("list", result)
    }

    /// Delete a growbox. Member plants are kept.
    pub fn remove(&self, growbox_id: &str) -> GrowboxOutput {
        let result = self
            .journal
            .delete_growbox(growbox_id)
            .map(|g| vec![GrowboxInfo::from(&g)]);
        GrowboxOutput::from_result("remove", result)
    }

    /// Put a plant into a growbox, moving it out of any other.
    pub fn assign(&self, growbox_id: &str, plant_id: &str) -> GrowboxOutput {
        let result = self
            .journal
            .assign_plant(growbox_id, plant_id)
            .and_then(|()| self.journal.growbox(growbox_id))
            .map(|g| vec![GrowboxInfo::from(&g)]);
        GrowboxOutput::from_result("assign", result)
    }

    pub fn unassign(&self, growbox_id: &str, plant_id: &str) -> GrowboxOutput {
        let result = self
            .journal
            .unassign_plant(growbox_id, plant_id)
            .and_then(|()| self.journal.growbox(growbox_id))
            .map(|g| vec![GrowboxInfo::from(&g)]);
        GrowboxOutput::from_result("unassign", result)
    }

    /// Change lighting and record the change in the growbox history.
    pub fn light(&self, growbox_id: &str, fields: LightingFields) -> GrowboxOutput {
        let result = self.journal.growbox(growbox_id).and_then(|current| {
            let settings = &current.lighting_settings;
            self.journal.update_lighting(
                growbox_id,
                fields.schedule.unwrap_or(settings.light_schedule),
                fields.power_level.unwrap_or(settings.power_level),
                fields.electricity_price.unwrap_or(settings.electricity_price),
                fields.reason.as_deref().unwrap_or("Manual change"),
            )?;
            if let Some((on, off)) = fields.light_window {
                self.journal.set_light_window(growbox_id, on, off)?;
            }
            self.journal.growbox(growbox_id)
        });
        GrowboxOutput::from_result("light", result.map(|g| vec![GrowboxInfo::from(&g)]))
    }

    /// Project electricity costs of lamp plus member devices.
    pub fn costs(&self, growbox_id: &str) -> GrowboxOutput {
        let result = self.journal.growbox(growbox_id).and_then(|growbox| {
            let costs = self.journal.growbox_costs(growbox_id)?;
            Ok((growbox, costs))
        });
        match result {
            Ok((growbox, Some(costs))) => GrowboxOutput {
                costs: Some(costs),
                ..GrowboxOutput::from_result("costs", Ok(vec![GrowboxInfo::from(&growbox)]))
            },
            Ok((growbox, None)) => GrowboxOutput::failure(
                "costs",
                format!("growbox {} has no readable lamp power", growbox.name),
            ),
            Err(e) => GrowboxOutput::failure("costs", e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &GrowboxOutput, options: &GrowboxOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &GrowboxOutput) -> String {
        if !output.success {
            return format!(
                "Growbox {} failed: {}\n",
                output.action,
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if let (Some(costs), Some(growbox)) = (&output.costs, output.growboxes.first()) {
            return format!(
                concat!(
                    "Electricity costs for {} at {:.2}/kWh:\n",
                    "  Daily:   {:.2}\n",
                    "  Weekly:  {:.2}\n",
                    "  Monthly: {:.2}\n",
                    "  Yearly:  {:.2}\n",
                ),
                growbox.name,
                growbox.electricity_price,
                costs.daily_cost,
                costs.weekly_cost,
                costs.monthly_cost,
                costs.yearly_cost
            );
        }

        if output.growboxes.is_empty() {
            return "No growboxes found.\n".to_string();
        }

        let mut lines = Vec::new();
        for growbox in &output.growboxes {
            let light = if growbox.light.is_empty() {
                "no lamp".to_string()
            } else {
                growbox.light.clone()
            };
            lines.push(format!(
                "[{}] {} - {}, {} at {}%, {} plant(s)",
                growbox.id,
                growbox.name,
                light,
                growbox.schedule,
                growbox.power_level,
                growbox.plant_ids.len()
            ));
        }
        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StrainCatalog;
    use crate::core::{Plant, PowerDevice};
    use crate::storage::MemoryJournalStore;
    use std::sync::Arc;

    type Shared = Arc<MemoryJournalStore>;

    fn setup(price: f64) -> (Journal<Shared>, GrowboxCommand<Shared>) {
        let store = Arc::new(MemoryJournalStore::new());
        let journal = Journal::new(Arc::clone(&store), StrainCatalog::builtin());
        let mut config = Config::default();
        config.lighting.electricity_price = price;
        let cmd = GrowboxCommand::new(Journal::new(store, StrainCatalog::builtin()), config);
        (journal, cmd)
    }

    fn tent() -> GrowboxFields {
        GrowboxFields {
            name: "Tent".to_string(),
            light_type: Some("LED".to_string()),
            light_power: Some("100W".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_uses_configured_price() {
        let (_, cmd) = setup(0.40);
        let output = cmd.add(tent());
        assert!(output.success);
        assert_eq!(output.growboxes[0].electricity_price, 0.40);
        assert_eq!(output.growboxes[0].light, "LED 100W");
    }

    #[test]
    fn test_add_requires_name() {
        let (_, cmd) = setup(0.30);
        assert!(!cmd.add(GrowboxFields::default()).success);
    }

    #[test]
    fn test_assign_moves_between_boxes() {
        let (journal, cmd) = setup(0.30);
        let plant = journal.add_plant(Plant::new("Mover")).unwrap();
        let a = cmd.add(tent()).growboxes[0].id.clone();
        let b = cmd
            .add(GrowboxFields {
                name: "Closet".to_string(),
                ..Default::default()
            })
            .growboxes[0]
            .id
            .clone();

        assert!(cmd.assign(&a, &plant.id).success);
        let output = cmd.assign(&b, &plant.id);
        assert!(output.success);
        assert_eq!(output.growboxes[0].plant_ids, vec![plant.id.clone()]);

        let list = cmd.list();
        let box_a = list.growboxes.iter().find(|g| g.id == a).unwrap();
        assert!(box_a.plant_ids.is_empty());

        let output = cmd.unassign(&b, &plant.id);
        assert!(output.success);
        assert!(output.growboxes[0].plant_ids.is_empty());
    }

    #[test]
    fn test_assign_unknown_plant_fails() {
        let (_, cmd) = setup(0.30);
        let id = cmd.add(tent()).growboxes[0].id.clone();
        assert!(!cmd.assign(&id, "ghost").success);
    }

    #[test]
    fn test_light_updates_only_given_fields() {
        let (_, cmd) = setup(0.30);
        let id = cmd.add(tent()).growboxes[0].id.clone();

        let output = cmd.light(
            &id,
            LightingFields {
                schedule: Some(LightSchedule::Flowering),
                ..Default::default()
            },
        );
        assert!(output.success);
        let info = &output.growboxes[0];
        assert_eq!(info.schedule, "12/12");
        assert_eq!(info.power_level, 100);
        assert_eq!(info.electricity_price, 0.30);

        let output = cmd.light(
            &id,
            LightingFields {
                power_level: Some(150),
                ..Default::default()
            },
        );
        assert!(!output.success);
    }

    #[test]
    fn test_light_window_overrides_schedule_hours() {
        let (journal, cmd) = setup(0.30);
        let id = cmd.add(tent()).growboxes[0].id.clone();

        let output = cmd.light(
            &id,
            LightingFields {
                schedule: Some(LightSchedule::Flowering),
                light_window: Some((6 * 60, 19 * 60)),
                ..Default::default()
            },
        );
        assert!(output.success, "{:?}", output.error);
        assert_eq!(output.growboxes[0].daily_hours, 13);

        let stored = Journal::new(Arc::clone(journal.store()), StrainCatalog::builtin())
            .growbox(&id)
            .unwrap();
        assert_eq!(stored.lighting_settings.daily_operating_hours, 13);
        assert_eq!(stored.lighting_settings.settings_history.len(), 1);
    }

    #[test]
    fn test_costs_include_devices() {
        let (journal, cmd) = setup(0.50);
        let plant = journal.add_plant(Plant::new("Powered")).unwrap();
        journal
            .add_power_device(&plant.id, PowerDevice::new("Fan", 50, 24.0))
            .unwrap();
        let id = cmd.add(tent()).growboxes[0].id.clone();
        cmd.assign(&id, &plant.id);

        let output = cmd.costs(&id);
        assert!(output.success);
        let costs = output.costs.unwrap();
        // Lamp: 100 W * 18 h = 1.8 kWh; fan: 50 W * 24 h = 1.2 kWh; 3 kWh * 0.50
        assert!((costs.daily_cost - 1.5).abs() < 1e-9);
        assert!((costs.monthly_cost - 45.0).abs() < 1e-9);

        let text = cmd.format_output(&output, &GrowboxOptions::default());
        assert!(text.contains("Daily:   1.50"));
    }

    #[test]
    fn test_costs_without_lamp_power() {
        let (_, cmd) = setup(0.30);
        let id = cmd
            .add(GrowboxFields {
                name: "Dark".to_string(),
                ..Default::default()
            })
            .growboxes[0]
            .id
            .clone();
        let output = cmd.costs(&id);
        assert!(!output.success);
        assert!(output.error.unwrap().contains("lamp power"));
    }

    #[test]
    fn test_update_keeps_unset_fields() {
        let (journal, cmd) = setup(0.30);
        let id = cmd.add(tent()).growboxes[0].id.clone();
        let output = cmd.update(
            &id,
            GrowboxFields {
                light_power: Some("240W".to_string()),
                width: Some("80".to_string()),
                ..Default::default()
            },
        );
        assert!(output.success, "{:?}", output.error);
        assert_eq!(output.growboxes[0].name, "Tent");
        assert_eq!(output.growboxes[0].light, "LED 240W");

        let stored = journal.growbox(&id).unwrap();
        assert_eq!(stored.width, "80");
        assert_eq!(stored.light_watts(), Some(240));

        assert!(!cmd.update("missing", tent()).success);
    }

    #[test]
    fn test_remove_and_list() {
        let (_, cmd) = setup(0.30);
        let id = cmd.add(tent()).growboxes[0].id.clone();
        assert!(cmd.remove(&id).success);
        let list = cmd.list();
        assert!(list.growboxes.is_empty());
        assert_eq!(
            cmd.format_output(&list, &GrowboxOptions::default()),
            "No growboxes found.\n"
        );
    }
}
