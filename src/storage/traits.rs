//! Journal storage traits.
//!
//! This module defines the `JournalStore` trait for journal persistence.

use std::sync::Arc;

use crate::core::{Growbox, Plant};
use crate::error::Result;

/// Records read back from a store.
///
/// Records that could not be decoded are not fatal; their keys are reported
/// in `corrupt` so callers can tell "no data yet" from "damaged data".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub corrupt: Vec<String>,
}

impl<T> Loaded<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records,
            corrupt: Vec::new(),
        }
    }
}

/// Trait for journal storage backends.
///
/// Every plant and growbox is stored under its own key so that a mutation
/// of one record rewrites only that record. Plant order is stored
/// separately as a list of ids.
pub trait JournalStore: Send + Sync {
    /// Load all plants in persisted order.
    ///
    /// Plants missing from the order list are appended after the ordered
    /// ones, most recently planted first. An empty store yields no records.
    fn load_plants(&self) -> Result<Loaded<Plant>>;

    /// Create or replace a plant record.
    fn put_plant(&self, plant: &Plant) -> Result<()>;

    /// Delete a plant record.
    ///
    /// Returns `Ok(())` even if the plant doesn't exist.
    fn delete_plant(&self, id: &str) -> Result<()>;

    /// Persist the plant order, newest first.
    fn put_plant_order(&self, ids: &[String]) -> Result<()>;

    /// Load all growboxes, ordered by name.
    fn load_growboxes(&self) -> Result<Loaded<Growbox>>;

    /// Create or replace a growbox record.
    fn put_growbox(&self, growbox: &Growbox) -> Result<()>;

    /// Delete a growbox record.
    ///
    /// Returns `Ok(())` even if the growbox doesn't exist.
    fn delete_growbox(&self, id: &str) -> Result<()>;

    /// Remove every plant, growbox and the plant order.
    fn clear(&self) -> Result<()>;
}

/// Blanket implementation of JournalStore for Arc-wrapped stores.
///
/// This allows sharing one store between a journal and test assertions.
impl<T: JournalStore + ?Sized> JournalStore for Arc<T> {
    fn load_plants(&self) -> Result<Loaded<Plant>> {
        (**self).load_plants()
    }

    fn put_plant(&self, plant: &Plant) -> Result<()> {
        (**self).put_plant(plant)
    }

    fn delete_plant(&self, id: &str) -> Result<()> {
        (**self).delete_plant(id)
    }

    fn put_plant_order(&self, ids: &[String]) -> Result<()> {
        (**self).put_plant_order(ids)
    }

    fn load_growboxes(&self) -> Result<Loaded<Growbox>> {
        (**self).load_growboxes()
    }

    fn put_growbox(&self, growbox: &Growbox) -> Result<()> {
        (**self).put_growbox(growbox)
    }

    fn delete_growbox(&self, id: &str) -> Result<()> {
        (**self).delete_growbox(id)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// Order loaded plants by an id list, appending unlisted plants newest first.
pub(crate) fn apply_order(mut plants: Vec<Plant>, order: &[String]) -> Vec<Plant> {
    let mut ordered = Vec::with_capacity(plants.len());
    for id in order {
        if let Some(pos) = plants.iter().position(|p| &p.id == id) {
            ordered.push(plants.swap_remove(pos));
        }
    }
    plants.sort_by(|a, b| b.planting_date.cmp(&a.planting_date));
    ordered.extend(plants);
    ordered
}

/// Test utilities for JournalStore implementations.
#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::core::{EntryType, PlantEntry};

    /// Test helper to verify JournalStore implementations.
    pub fn test_journal_store_crud<S: JournalStore>(store: &S) {
        // Empty store loads nothing
        let loaded = store.load_plants().unwrap();
        assert!(loaded.records.is_empty());
        assert!(loaded.corrupt.is_empty());

        let mut first = Plant::new("First").with_strain("Royal Queen Seeds", "Amnesia Haze");
        first.entries.push(PlantEntry::new(EntryType::Watering, "1L"));
        let second = Plant::new("Second");

        store.put_plant(&first).unwrap();
        store.put_plant(&second).unwrap();
        store
            .put_plant_order(&[second.id.clone(), first.id.clone()])
            .unwrap();

        let loaded = store.load_plants().unwrap();
        assert_eq!(loaded.records, vec![second.clone(), first.clone()]);

        // Replace
        let mut renamed = first.clone();
        renamed.name = "Renamed".to_string();
        store.put_plant(&renamed).unwrap();
        let loaded = store.load_plants().unwrap();
        assert_eq!(loaded.records[1].name, "Renamed");

        // Delete, twice
        store.delete_plant(&first.id).unwrap();
        store.put_plant_order(&[second.id.clone()]).unwrap();
        store.delete_plant(&first.id).unwrap();
        let loaded = store.load_plants().unwrap();
        assert_eq!(loaded.records, vec![second.clone()]);

        // Growboxes
        let mut tent = Growbox::new("Tent");
        tent.plant_ids.push(second.id.clone());
        let closet = Growbox::new("Closet");
        store.put_growbox(&tent).unwrap();
        store.put_growbox(&closet).unwrap();

        let boxes = store.load_growboxes().unwrap();
        let names: Vec<&str> = boxes.records.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Closet", "Tent"]);
        assert_eq!(boxes.records[1].plant_ids, vec![second.id.clone()]);

        store.delete_growbox(&closet.id).unwrap();
        store.delete_growbox(&closet.id).unwrap();
        assert_eq!(store.load_growboxes().unwrap().records.len(), 1);

        // Clear
        store.clear().unwrap();
        assert!(store.load_plants().unwrap().records.is_empty());
        assert!(store.load_growboxes().unwrap().records.is_empty());
    }

    #[test]
    fn test_apply_order_appends_unlisted_newest_first() {
        use chrono::Duration;

        let a = Plant::new("a");
        let mut b = Plant::new("b");
        b.planting_date = a.planting_date - Duration::days(3);
        let mut c = Plant::new("c");
        c.planting_date = a.planting_date - Duration::days(1);

        let ordered = apply_order(
            vec![a.clone(), b.clone(), c.clone()],
            &[b.id.clone(), "gone".to_string()],
        );
        let names: Vec<&str> = ordered.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
