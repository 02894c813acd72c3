//! Built-in sample catalog.
//!
//! A small bundled dataset so lookups work without a catalog file. Larger
//! datasets are loaded from JSON (see `catalog.strains_file` in config).

use crate::catalog::{
    FertilizerCatalog, FertilizerManufacturer, FertilizerProduct, SeedManufacturer, StrainCatalog,
    StrainInfo,
};
use crate::core::PlantType;

pub fn strains() -> StrainCatalog {
    use PlantType::*;

    StrainCatalog::new(vec![
        SeedManufacturer {
            name: "Royal Queen Seeds".to_string(),
            strains: vec![
                StrainInfo::new("Amnesia Haze", "22", "0.8", FeminizedSativa),
                StrainInfo::new("White Widow", "19-25", "<1", FeminizedHybrid),
                StrainInfo::new("Northern Light", "18-22", "<1", FeminizedIndica),
                StrainInfo::new("Quick One", "13-17", "<1", Autoflower),
                StrainInfo::new("Dance World", "12-15", "12-15", FeminizedHybrid),
            ],
        },
        SeedManufacturer {
            name: "Green House Seeds".to_string(),
            strains: vec![
                StrainInfo::new("Super Lemon Haze", "20", "1.2", FeminizedSativa),
                StrainInfo::new("White Widow", "18", "0.5", FeminizedHybrid),
            ],
        },
        SeedManufacturer {
            name: "Barney's Farm".to_string(),
            strains: vec![
                StrainInfo::new("Gorilla Zkittlez", "26", "<1", FeminizedHybrid),
                StrainInfo::new("Blue Gelato 41", "29", "<1", FeminizedHybrid),
            ],
        },
        SeedManufacturer {
            name: "Sweet Seeds".to_string(),
            strains: vec![StrainInfo::new("Black Jack", "20-22", "<1", FeminizedHybrid)],
        },
    ])
}

pub fn fertilizers() -> FertilizerCatalog {
    FertilizerCatalog::new(vec![
        FertilizerManufacturer {
            name: "BioBizz".to_string(),
            products: vec![
                FertilizerProduct::new("Bio-Grow", "Base", Some("4-3-6")),
                FertilizerProduct::new("Bio-Bloom", "Bloom", Some("2-7-4")),
                FertilizerProduct::new("Root-Juice", "Additive", None),
                FertilizerProduct::new("Top-Max", "Booster", Some("0.1-0.01-0.1")),
            ],
        },
        FertilizerManufacturer {
            name: "Canna".to_string(),
            products: vec![
                FertilizerProduct::new("Terra Vega", "Base", Some("3-1-5")),
                FertilizerProduct::new("Terra Flores", "Bloom", Some("2-2-4")),
                FertilizerProduct::new("PK 13/14", "Booster", Some("0-13-14")),
            ],
        },
    ])
}
