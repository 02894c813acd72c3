//! Reference catalogs for seed strains and fertilizers.
//!
//! Catalogs are immutable once loaded. Lookups are case-insensitive linear
//! scans in declaration order, so when a manufacturer appears in several
//! blocks the first block containing the name wins.

mod builtin;
pub mod types;

use std::path::Path;

use crate::config::CatalogConfig;
use crate::error::{FailOpen, GrowError, Result};
use crate::util::read_to_string_limited;

pub use types::{FertilizerManufacturer, FertilizerProduct, SeedManufacturer, StrainInfo};

/// Strain catalog keyed by manufacturer and strain name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrainCatalog {
    manufacturers: Vec<SeedManufacturer>,
}

/// A search hit from [`StrainCatalog::search`].
#[derive(Debug, Clone, PartialEq)]
pub struct StrainMatch<'a> {
    pub manufacturer: &'a str,
    pub strain: &'a StrainInfo,
}

impl StrainCatalog {
    pub fn new(manufacturers: Vec<SeedManufacturer>) -> Self {
        Self { manufacturers }
    }

    /// The bundled sample catalog.
    pub fn builtin() -> Self {
        builtin::strains()
    }

    /// Parse a catalog from a JSON array of manufacturers.
    pub fn from_json(json: &str) -> Result<Self> {
        let manufacturers: Vec<SeedManufacturer> = serde_json::from_str(json)?;
        Ok(Self::new(manufacturers))
    }

    /// Load a catalog from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = read_to_string_limited(path)?;
        Self::from_json(&content)
            .map_err(|e| GrowError::serde(format!("{}: {}", path.display(), e)))
    }

    /// Load the configured catalog, falling back to the built-in one.
    pub fn load(config: &CatalogConfig) -> Self {
        match &config.strains_file {
            Some(path) => {
                Self::from_json_file(path).fail_open_with("loading strain catalog", Self::builtin())
            }
            None => Self::builtin(),
        }
    }

    /// All manufacturer blocks in declaration order.
    pub fn manufacturers(&self) -> &[SeedManufacturer] {
        &self.manufacturers
    }

    /// Distinct manufacturer names in first-seen order.
    pub fn manufacturer_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for m in &self.manufacturers {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(&m.name)) {
                names.push(&m.name);
            }
        }
        names
    }

    /// Find a strain by manufacturer and strain name, ignoring case.
    pub fn lookup(&self, manufacturer: &str, strain: &str) -> Option<&StrainInfo> {
        let manufacturer = manufacturer.trim();
        let strain = strain.trim();
        if manufacturer.is_empty() || strain.is_empty() {
            return None;
        }
        self.manufacturers
            .iter()
            .filter(|m| eq_ignore_case(&m.name, manufacturer))
            .flat_map(|m| m.strains.iter())
            .find(|s| eq_ignore_case(&s.name, strain))
    }

    /// All strains of a manufacturer across every block with that name.
    pub fn strains_of(&self, manufacturer: &str) -> Vec<&StrainInfo> {
        self.manufacturers
            .iter()
            .filter(|m| eq_ignore_case(&m.name, manufacturer))
            .flat_map(|m| m.strains.iter())
            .collect()
    }

    /// Strains whose name contains `query`, ignoring case, for autocomplete.
    pub fn search(&self, query: &str, limit: usize) -> Vec<StrainMatch<'_>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.manufacturers
            .iter()
            .flat_map(|m| {
                m.strains.iter().map(move |s| StrainMatch {
                    manufacturer: &m.name,
                    strain: s,
                })
            })
            .filter(|hit| hit.strain.name.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }
}

/// Fertilizer catalog keyed by manufacturer and product name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FertilizerCatalog {
    manufacturers: Vec<FertilizerManufacturer>,
}

impl FertilizerCatalog {
    pub fn new(manufacturers: Vec<FertilizerManufacturer>) -> Self {
        Self { manufacturers }
    }

    pub fn builtin() -> Self {
        builtin::fertilizers()
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = read_to_string_limited(path)?;
        let manufacturers: Vec<FertilizerManufacturer> = serde_json::from_str(&content)
            .map_err(|e| GrowError::serde(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(manufacturers))
    }

    pub fn load(config: &CatalogConfig) -> Self {
        match &config.fertilizers_file {
            Some(path) => Self::from_json_file(path)
                .fail_open_with("loading fertilizer catalog", Self::builtin()),
            None => Self::builtin(),
        }
    }

    pub fn manufacturers(&self) -> &[FertilizerManufacturer] {
        &self.manufacturers
    }

    pub fn lookup(&self, manufacturer: &str, product: &str) -> Option<&FertilizerProduct> {
        self.products_of(manufacturer)
            .into_iter()
            .find(|p| eq_ignore_case(&p.name, product.trim()))
    }

    pub fn products_of(&self, manufacturer: &str) -> Vec<&FertilizerProduct> {
        self.manufacturers
            .iter()
            .filter(|m| eq_ignore_case(&m.name, manufacturer.trim()))
            .flat_map(|m| m.products.iter())
            .collect()
    }
}

/// Both catalogs, loaded together from config.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    pub strains: StrainCatalog,
    pub fertilizers: FertilizerCatalog,
}

impl Catalogs {
    pub fn builtin() -> Self {
        Self {
            strains: StrainCatalog::builtin(),
            fertilizers: FertilizerCatalog::builtin(),
        }
    }

    pub fn load(config: &CatalogConfig) -> Self {
        Self {
            strains: StrainCatalog::load(config),
            fertilizers: FertilizerCatalog::load(config),
        }
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlantType;
    use std::fs;
    use tempfile::TempDir;

    fn duplicate_block_catalog() -> StrainCatalog {
        StrainCatalog::new(vec![
            SeedManufacturer {
                name: "Dutch Passion".to_string(),
                strains: vec![StrainInfo::new(
                    "Frisian Dew",
                    "17",
                    "<1",
                    PlantType::FeminizedHybrid,
                )],
            },
            SeedManufacturer {
                name: "dutch passion".to_string(),
                strains: vec![
                    StrainInfo::new("Frisian Dew", "99", "99", PlantType::Autoflower),
                    StrainInfo::new("Auto Blueberry", "18", "<1", PlantType::Autoflower),
                ],
            },
        ])
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = StrainCatalog::builtin();
        let found = catalog.lookup("royal queen seeds", "AMNESIA HAZE").unwrap();
        assert_eq!(found.thc_content, "22");
        assert_eq!(found.cbd_content, "0.8");
    }

    #[test]
    fn test_lookup_first_match_wins_on_duplicates() {
        let catalog = duplicate_block_catalog();
        let found = catalog.lookup("DUTCH PASSION", "frisian dew").unwrap();
        assert_eq!(found.thc_content, "17");
    }

    #[test]
    fn test_lookup_continues_into_later_blocks() {
        let catalog = duplicate_block_catalog();
        let found = catalog.lookup("Dutch Passion", "Auto Blueberry").unwrap();
        assert_eq!(found.plant_type, PlantType::Autoflower);
    }

    #[test]
    fn test_lookup_same_strain_name_different_manufacturer() {
        let catalog = StrainCatalog::builtin();
        let rqs = catalog.lookup("Royal Queen Seeds", "White Widow").unwrap();
        let ghs = catalog.lookup("Green House Seeds", "White Widow").unwrap();
        assert_eq!(rqs.thc_content, "19-25");
        assert_eq!(ghs.thc_content, "18");
    }

    #[test]
    fn test_lookup_missing_and_blank() {
        let catalog = StrainCatalog::builtin();
        assert!(catalog.lookup("Royal Queen Seeds", "Nope").is_none());
        assert!(catalog.lookup("", "Amnesia Haze").is_none());
        assert!(catalog.lookup("Royal Queen Seeds", "  ").is_none());
    }

    #[test]
    fn test_manufacturer_names_are_distinct() {
        let catalog = duplicate_block_catalog();
        assert_eq!(catalog.manufacturer_names(), vec!["Dutch Passion"]);
        assert_eq!(catalog.strains_of("Dutch Passion").len(), 3);
    }

    #[test]
    fn test_search_substring() {
        let catalog = StrainCatalog::builtin();
        let hits = catalog.search("haze", 10);
        let names: Vec<&str> = hits.iter().map(|h| h.strain.name.as_str()).collect();
        assert_eq!(names, vec!["Amnesia Haze", "Super Lemon Haze"]);
        assert_eq!(hits[0].manufacturer, "Royal Queen Seeds");

        assert_eq!(catalog.search("haze", 1).len(), 1);
        assert!(catalog.search("", 10).is_empty());
    }

    #[test]
    fn test_from_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("strains.json");
        fs::write(
            &path,
            r#"[{"name": "BudVoyage", "strains": [
                {"name": "Tropicana", "thcContent": "24", "cbdContent": "<1",
                 "type": "AUTOFLOWER", "unknown": 1}
            ]}]"#,
        )
        .unwrap();

        let catalog = StrainCatalog::from_json_file(&path).unwrap();
        assert_eq!(catalog.lookup("budvoyage", "tropicana").unwrap().thc_content, "24");
    }

    #[test]
    fn test_load_falls_back_to_builtin_on_bad_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "not json").unwrap();

        let config = CatalogConfig {
            strains_file: Some(path),
            fertilizers_file: None,
        };
        assert_eq!(StrainCatalog::load(&config), StrainCatalog::builtin());
    }

    #[test]
    fn test_fertilizer_lookup() {
        let catalog = FertilizerCatalog::builtin();
        let product = catalog.lookup("biobizz", "bio-bloom").unwrap();
        assert_eq!(product.npk.as_deref(), Some("2-7-4"));
        assert_eq!(catalog.products_of("Canna").len(), 3);
        assert!(catalog.lookup("Canna", "Bio-Bloom").is_none());
    }
}
