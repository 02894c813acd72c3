//! Mapping of raw classifier labels to categories and readable names.
//!
//! Two label vocabularies are in circulation: the uppercase taxonomy used by
//! current models (`NUTRIENT_DEF_N`, `HEAT_STRESS`, ...) and the lowercase
//! names of the first model generation (`nitrogen_deficiency`, ...).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Label shown when the stage-0 filter rejects an image.
pub const NO_LEAF_LABEL: &str = "(no cannabis leaf detected)";

/// Label of the first placeholder entry when no model is loaded.
pub const MODEL_NOT_LOADED_LABEL: &str = "(model not loaded)";

/// Broad grouping of a leaf diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafCategory {
    Health,
    Deficiency,
    Stress,
    Pest,
}

impl LeafCategory {
    pub fn label(&self) -> &'static str {
        match self {
            LeafCategory::Health => "health",
            LeafCategory::Deficiency => "deficiency",
            LeafCategory::Stress => "stress",
            LeafCategory::Pest => "pest",
        }
    }
}

impl fmt::Display for LeafCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category of a raw label. Unknown labels count as stress.
pub fn category_of(label: &str) -> LeafCategory {
    let raw = label.trim();
    match raw {
        "HEALTHY" | "healthy" => LeafCategory::Health,
        "GENERAL_CHLOROSIS" | "nitrogen_deficiency" => LeafCategory::Deficiency,
        "LIGHT_BURN" | "NECROSIS_EDGE" | "overwatering" => LeafCategory::Stress,
        "LEAF_PEST_INDICATOR" | "FUNGAL_SPOTS_GENERIC" | "MILDEW_LIKE" | "pests_risk" => {
            LeafCategory::Pest
        }
        _ if raw.starts_with("NUTRIENT_DEF_") => LeafCategory::Deficiency,
        _ => LeafCategory::Stress,
    }
}

/// Human readable name for a raw label.
///
/// Known labels map to fixed names; anything else gets its first letter
/// capitalized and underscores replaced by spaces.
pub fn readable_label(label: &str) -> String {
    let known = match label {
        "healthy" | "HEALTHY" => Some("Healthy"),
        "nitrogen_deficiency" => Some("Nitrogen deficiency"),
        "overwatering" | "OVERWATER_STRESS" => Some("Overwatering"),
        "pests_risk" => Some("Pest risk"),
        "leaf_spot" => Some("Leaf spot"),
        "ph_imbalance" => Some("pH imbalance"),
        "NUTRIENT_DEF_N" => Some("N deficiency"),
        "NUTRIENT_DEF_P" => Some("P deficiency"),
        "NUTRIENT_DEF_K" => Some("K deficiency"),
        "NUTRIENT_DEF_MG" => Some("Mg deficiency"),
        "NUTRIENT_DEF_FE" => Some("Fe deficiency"),
        "UNDERWATER_STRESS" => Some("Underwatering"),
        "HEAT_STRESS" => Some("Heat stress"),
        "COLD_STRESS" => Some("Cold stress"),
        "LIGHT_BURN" => Some("Light burn"),
        "FUNGAL_SPOTS_GENERIC" => Some("Fungal spots"),
        "MILDEW_LIKE" => Some("Mildew suspected"),
        "LEAF_PEST_INDICATOR" => Some("Pest indicator"),
        "NECROSIS_EDGE" => Some("Edge necrosis"),
        "GENERAL_CHLOROSIS" => Some("Chlorosis"),
        _ => None,
    };
    if let Some(name) = known {
        return name.to_string();
    }

    let mut chars = label.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    capitalized.replace('_', " ")
}
