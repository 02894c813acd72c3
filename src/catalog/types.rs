//! Reference catalog record types.

use serde::{Deserialize, Serialize};

use crate::core::PlantType;
use crate::util::potency_upper_bound;

/// A seed manufacturer and the strains it sells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedManufacturer {
    pub name: String,
    #[serde(default)]
    pub strains: Vec<StrainInfo>,
}

/// Potency and type metadata for one strain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrainInfo {
    pub name: String,
    #[serde(default, alias = "thcContent")]
    pub thc_content: String,
    #[serde(default, alias = "cbdContent")]
    pub cbd_content: String,
    #[serde(default, rename = "type")]
    pub plant_type: PlantType,
}

impl StrainInfo {
    pub fn new(
        name: impl Into<String>,
        thc: impl Into<String>,
        cbd: impl Into<String>,
        plant_type: PlantType,
    ) -> Self {
        Self {
            name: name.into(),
            thc_content: thc.into(),
            cbd_content: cbd.into(),
            plant_type,
        }
    }

    /// Upper THC bound in percent, if the content string has a number.
    pub fn max_thc(&self) -> Option<f64> {
        potency_upper_bound(&self.thc_content)
    }
}

/// A fertilizer manufacturer and its product line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FertilizerManufacturer {
    pub name: String,
    #[serde(default)]
    pub products: Vec<FertilizerProduct>,
}

/// One fertilizer product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FertilizerProduct {
    pub name: String,
    /// Product group, e.g. "Base", "Bloom", "Additive".
    #[serde(default)]
    pub category: String,
    /// N-P-K ratio, e.g. "10-5-7".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npk: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl FertilizerProduct {
    pub fn new(name: impl Into<String>, category: impl Into<String>, npk: Option<&str>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            npk: npk.map(str::to_string),
            description: String::new(),
        }
    }
}
