//! Stage command for growtrack.
//!
//! Moves a plant through its lifecycle: flowering, harvest, drying,
//! fermentation and finishing the cure.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::{derive_phase, FermentationMethod, Journal, PlantPhase};
use crate::error::Result;
use crate::storage::JournalStore;
use crate::util::now_millis;

/// Options for the stage command.
#[derive(Debug, Clone, Default)]
pub struct StageOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// When the transition happened; now when unset.
    pub at: Option<DateTime<Utc>>,
}

/// A lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Flower,
    Harvest,
    Dry,
    UndoDry,
    Ferment(FermentationMethod),
    Finish,
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Flower => "flower",
            Transition::Harvest => "harvest",
            Transition::Dry => "dry",
            Transition::UndoDry => "undo-dry",
            Transition::Ferment(_) => "ferment",
            Transition::Finish => "finish",
        }
    }
}

/// Output format for the stage command.
#[derive(Debug, Clone, Serialize)]
pub struct StageOutput {
    /// Whether the transition was applied.
    pub success: bool,
    pub plant_id: String,
    pub transition: String,
    /// Phase after the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<PlantPhase>,
    /// Error message if the transition was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The stage command implementation.
pub struct StageCommand<S: JournalStore> {
    journal: Journal<S>,
}

impl<S: JournalStore> StageCommand<S> {
    /// Create a new stage command.
    pub fn new(journal: Journal<S>) -> Self {
        Self { journal }
    }

    /// Apply `transition` to a plant.
    pub fn run(
        &self,
        plant_id: &str,
        transition: Transition,
        options: &StageOptions,
    ) -> StageOutput {
        let at = options.at.unwrap_or_else(now_millis);
        let result = self.apply(plant_id, transition, at);
        let (phase, error) = match result {
            Ok(phase) => (Some(phase), None),
            Err(e) => (None, Some(e.to_string())),
        };
        StageOutput {
            success: error.is_none(),
            plant_id: plant_id.to_string(),
            transition: transition.name().to_string(),
            phase,
            error,
        }
    }

    fn apply(
        &self,
        plant_id: &str,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> Result<PlantPhase> {
        let plant = match transition {
            Transition::Flower => self.journal.start_flowering(plant_id, at)?,
            Transition::Harvest => self.journal.harvest(plant_id, at)?,
            Transition::Dry => self.journal.start_drying(plant_id, at)?,
            Transition::UndoDry => self.journal.undo_drying(plant_id)?,
            Transition::Ferment(method) => self.journal.start_fermentation(plant_id, method, at)?,
            Transition::Finish => self.journal.finish(plant_id)?,
        };
        Ok(derive_phase(&plant, at.max(now_millis())))
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &StageOutput, options: &StageOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &StageOutput) -> String {
        match output.phase {
            Some(phase) if output.success => {
                format!("Plant {} is now {}.\n", output.plant_id, phase)
            }
            _ => format!(
                "Cannot {} plant {}: {}\n",
                output.transition,
                output.plant_id,
                output.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}
