//! Cultivation phase derivation and bloom timing.
//!
//! Everything that needs a plant's phase goes through [`derive_phase`].
//! Functions take `now` explicitly so results are deterministic in tests.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::plant::{Plant, PlantType};

/// Cultivation phase of a plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlantPhase {
    /// No germination date recorded.
    Unknown,
    Germination,
    Seedling,
    Vegetative,
    Flowering,
    Harvested,
    Drying,
    Fermenting,
}

impl PlantPhase {
    pub fn label(&self) -> &'static str {
        match self {
            PlantPhase::Unknown => "unknown",
            PlantPhase::Germination => "germination",
            PlantPhase::Seedling => "seedling",
            PlantPhase::Vegetative => "vegetative",
            PlantPhase::Flowering => "flowering",
            PlantPhase::Harvested => "harvested",
            PlantPhase::Drying => "drying",
            PlantPhase::Fermenting => "fermenting",
        }
    }

    /// Whether the plant is past harvest.
    pub fn is_post_harvest(&self) -> bool {
        matches!(
            self,
            PlantPhase::Harvested | PlantPhase::Drying | PlantPhase::Fermenting
        )
    }
}

impl fmt::Display for PlantPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Days after germination below which a plant counts as germinating.
const GERMINATION_DAYS: i64 = 7;
/// Days after germination below which a plant counts as a seedling.
const SEEDLING_DAYS: i64 = 21;

/// Derive a plant's phase from its timestamps and flags.
///
/// The drying and fermenting flags are authoritative for those phases:
/// finishing a cure clears the flag but keeps its start date as history.
///
/// Precedence, first match wins:
/// 1. fermenting flag
/// 2. drying flag
/// 3. harvest, drying or fermentation start date
/// 4. flowering start date at or before `now`
/// 5. age since germination: under 7 days germination, under 21 days
///    seedling, otherwise vegetative
///
/// Without a germination date (and none of the above) the phase is unknown.
pub fn derive_phase(plant: &Plant, now: DateTime<Utc>) -> PlantPhase {
    if plant.is_fermenting {
        return PlantPhase::Fermenting;
    }
    if plant.is_drying {
        return PlantPhase::Drying;
    }
    if plant.harvest_date.is_some()
        || plant.drying_start_date.is_some()
        || plant.fermentation_start_date.is_some()
    {
        return PlantPhase::Harvested;
    }
    if plant.flowering_start_date.is_some_and(|start| start <= now) {
        return PlantPhase::Flowering;
    }
    let Some(germinated) = plant.germination_date else {
        return PlantPhase::Unknown;
    };
    let days = (now - germinated).num_days();
    if days < GERMINATION_DAYS {
        PlantPhase::Germination
    } else if days < SEEDLING_DAYS {
        PlantPhase::Seedling
    } else {
        PlantPhase::Vegetative
    }
}

/// One-based week number since germination (or planting when unknown).
pub fn age_week(plant: &Plant, now: DateTime<Utc>) -> u32 {
    let days = (now - plant.start_date()).num_days().max(0);
    (days / 7 + 1) as u32
}

/// Typical flowering duration for a seed type.
pub fn expected_bloom_days(plant_type: PlantType) -> u32 {
    match plant_type {
        PlantType::Autoflower => 70,
        PlantType::FeminizedSativa => 63,
        PlantType::FeminizedIndica | PlantType::FeminizedHybrid => 56,
    }
}

/// Whole days since flowering started, if it has.
pub fn bloom_days(plant: &Plant, now: DateTime<Utc>) -> Option<u32> {
    let start = plant.flowering_start_date?;
    Some((now - start).num_days().max(0) as u32)
}

/// Days left until the expected harvest.
///
/// Zero once harvested, `None` before flowering starts.
pub fn days_to_harvest(plant: &Plant, now: DateTime<Utc>) -> Option<u32> {
    if plant.harvest_date.is_some() {
        return Some(0);
    }
    let bloom = bloom_days(plant, now)?;
    Some(expected_bloom_days(plant.plant_type).saturating_sub(bloom))
}

/// Expected harvest date based on flowering start and seed type.
pub fn expected_harvest_date(plant: &Plant) -> Option<DateTime<Utc>> {
    if let Some(harvested) = plant.harvest_date {
        return Some(harvested);
    }
    let start = plant.flowering_start_date?;
    Some(start + Duration::days(expected_bloom_days(plant.plant_type) as i64))
}

/// Whole days spent drying, up to fermentation start or `now`.
pub fn drying_days(plant: &Plant, now: DateTime<Utc>) -> Option<u32> {
    let start = plant.drying_start_date?;
    let end = plant.fermentation_start_date.unwrap_or(now);
    Some((end - start).num_days().max(0) as u32)
}

/// Whole days since fermentation started.
pub fn fermentation_days(plant: &Plant, now: DateTime<Utc>) -> Option<u32> {
    let start = plant.fermentation_start_date?;
    Some((now - start).num_days().max(0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn germinated_days_ago(days: i64) -> Plant {
        Plant {
            germination_date: Some(now() - Duration::days(days)),
            ..Plant::new("p")
        }
    }

    #[test]
    fn test_unknown_without_germination() {
        let plant = Plant {
            germination_date: None,
            ..Plant::new("p")
        };
        assert_eq!(derive_phase(&plant, now()), PlantPhase::Unknown);
    }

    #[test]
    fn test_age_based_phases() {
        assert_eq!(
            derive_phase(&germinated_days_ago(0), now()),
            PlantPhase::Germination
        );
        assert_eq!(
            derive_phase(&germinated_days_ago(6), now()),
            PlantPhase::Germination
        );
        assert_eq!(
            derive_phase(&germinated_days_ago(7), now()),
            PlantPhase::Seedling
        );
        assert_eq!(
            derive_phase(&germinated_days_ago(20), now()),
            PlantPhase::Seedling
        );
        assert_eq!(
            derive_phase(&germinated_days_ago(21), now()),
            PlantPhase::Vegetative
        );
        assert_eq!(
            derive_phase(&germinated_days_ago(90), now()),
            PlantPhase::Vegetative
        );
    }

    #[test]
    fn test_flowering_and_harvest_transitions() {
        let mut plant = germinated_days_ago(21);
        plant.flowering_start_date = Some(now() - Duration::days(2));
        assert_eq!(derive_phase(&plant, now()), PlantPhase::Flowering);

        plant.harvest_date = Some(now());
        assert_eq!(derive_phase(&plant, now()), PlantPhase::Harvested);
    }

    #[test]
    fn test_future_flowering_date_is_ignored() {
        let mut plant = germinated_days_ago(10);
        plant.flowering_start_date = Some(now() + Duration::days(3));
        assert_eq!(derive_phase(&plant, now()), PlantPhase::Seedling);
    }

    #[test]
    fn test_flags_take_precedence_over_timestamps() {
        let mut plant = germinated_days_ago(80);
        plant.harvest_date = Some(now() - Duration::days(5));
        plant.is_drying = true;
        assert_eq!(derive_phase(&plant, now()), PlantPhase::Drying);

        plant.is_fermenting = true;
        assert_eq!(derive_phase(&plant, now()), PlantPhase::Fermenting);
        assert!(PlantPhase::Fermenting.is_post_harvest());
    }

    #[test]
    fn test_finished_cure_reads_as_harvested() {
        let mut plant = germinated_days_ago(120);
        plant.flowering_start_date = Some(now() - Duration::days(80));
        plant.drying_start_date = Some(now() - Duration::days(20));
        plant.fermentation_start_date = Some(now() - Duration::days(10));
        assert_eq!(derive_phase(&plant, now()), PlantPhase::Harvested);
    }

    #[test]
    fn test_age_week() {
        let plant = germinated_days_ago(14);
        assert_eq!(age_week(&plant, now()), 3);

        let fresh = germinated_days_ago(0);
        assert_eq!(age_week(&fresh, now()), 1);

        let mut planted = Plant::new("p");
        planted.planting_date = now() - Duration::days(8);
        assert_eq!(age_week(&planted, now()), 2);
    }

    #[test]
    fn test_expected_bloom_days_by_type() {
        assert_eq!(expected_bloom_days(PlantType::Autoflower), 70);
        assert_eq!(expected_bloom_days(PlantType::FeminizedSativa), 63);
        assert_eq!(expected_bloom_days(PlantType::FeminizedIndica), 56);
        assert_eq!(expected_bloom_days(PlantType::FeminizedHybrid), 56);
    }

    #[test]
    fn test_bloom_days_and_days_to_harvest() {
        let plant = Plant {
            plant_type: PlantType::FeminizedHybrid,
            flowering_start_date: Some(now() - Duration::days(10)),
            ..Plant::new("p")
        };
        assert_eq!(bloom_days(&plant, now()), Some(10));
        assert_eq!(days_to_harvest(&plant, now()), Some(46));
        assert_eq!(
            expected_harvest_date(&plant),
            Some(now() + Duration::days(46))
        );
    }

    #[test]
    fn test_days_to_harvest_edges() {
        let harvested = Plant {
            harvest_date: Some(now()),
            ..Plant::new("p")
        };
        assert_eq!(days_to_harvest(&harvested, now()), Some(0));

        let not_started = Plant {
            plant_type: PlantType::Autoflower,
            ..Plant::new("p")
        };
        assert_eq!(days_to_harvest(&not_started, now()), None);

        let overdue = Plant {
            flowering_start_date: Some(now() - Duration::days(100)),
            ..Plant::new("p")
        };
        assert_eq!(days_to_harvest(&overdue, now()), Some(0));
    }

    #[test]
    fn test_drying_and_fermentation_days() {
        let plant = Plant {
            drying_start_date: Some(now() - Duration::days(12)),
            fermentation_start_date: Some(now() - Duration::days(2)),
            ..Plant::new("p")
        };
        assert_eq!(drying_days(&plant, now()), Some(10));
        assert_eq!(fermentation_days(&plant, now()), Some(2));
        assert_eq!(drying_days(&Plant::new("p"), now()), None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn rank(phase: PlantPhase) -> u8 {
            match phase {
                PlantPhase::Unknown => 0,
                PlantPhase::Germination => 1,
                PlantPhase::Seedling => 2,
                PlantPhase::Vegetative => 3,
                PlantPhase::Flowering => 4,
                PlantPhase::Harvested => 5,
                PlantPhase::Drying => 6,
                PlantPhase::Fermenting => 7,
            }
        }

        proptest! {
            // Property: without later-stage data, age never moves a plant backwards
            #[test]
            fn prop_age_phase_is_monotonic(a in 0i64..400, b in 0i64..400) {
                let (young, old) = (a.min(b), a.max(b));
                let plant = germinated_days_ago(0);
                let early = derive_phase(&plant, now() + Duration::days(young));
                let late = derive_phase(&plant, now() + Duration::days(old));
                prop_assert!(rank(early) <= rank(late));
            }

            // Property: the fermenting flag wins over every date
            #[test]
            fn prop_fermenting_flag_wins(
                days in 0i64..400,
                harvested in any::<bool>(),
                drying in any::<bool>(),
            ) {
                let mut plant = germinated_days_ago(days);
                plant.is_fermenting = true;
                plant.is_drying = drying;
                if harvested {
                    plant.harvest_date = Some(now());
                }
                prop_assert_eq!(derive_phase(&plant, now()), PlantPhase::Fermenting);
            }

            // Property: a harvest date without flags always reads as harvested
            #[test]
            fn prop_harvest_date_means_harvested(days in 0i64..400, flowered in any::<bool>()) {
                let mut plant = germinated_days_ago(days);
                if flowered {
                    plant.flowering_start_date = Some(now() - Duration::days(days / 2));
                }
                plant.harvest_date = Some(now());
                prop_assert_eq!(derive_phase(&plant, now()), PlantPhase::Harvested);
            }
        }
    }
}
