//! In-memory journal storage for testing.
//!
//! This module provides a thread-safe in-memory implementation of the
//! JournalStore trait, primarily for use in unit tests.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::core::{Growbox, Plant};
use crate::error::{GrowError, Result};
use crate::storage::traits::{apply_order, Loaded};
use crate::storage::JournalStore;
use crate::util::{validate_id, validate_plant_id};

/// In-memory journal store for testing.
///
/// Thread-safe implementation using `RwLock<HashMap>`.
/// Records are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryJournalStore {
    plants: RwLock<HashMap<String, Plant>>,
    order: RwLock<Vec<String>>,
    growboxes: RwLock<HashMap<String, Growbox>>,
    /// Number of plant record writes, for asserting write granularity.
    plant_writes: AtomicUsize,
    /// Successful `put_*` calls left before writes start failing.
    write_budget: RwLock<Option<usize>>,
}

impl MemoryJournalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored plant records.
    pub fn plant_count(&self) -> usize {
        self.plants.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of `put_plant` calls so far.
    pub fn plant_writes(&self) -> usize {
        self.plant_writes.load(Ordering::SeqCst)
    }

    /// The persisted plant order.
    pub fn order(&self) -> Vec<String> {
        self.order.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Make every following `put_*` call fail.
    pub fn fail_writes(&self) {
        self.fail_writes_after(0);
    }

    /// Let `n` more `put_*` calls succeed, then fail the rest.
    ///
    /// Deletes keep working so that rollbacks stay observable.
    pub fn fail_writes_after(&self, n: usize) {
        *self.write_budget.write().unwrap_or_else(PoisonError::into_inner) = Some(n);
    }

    /// Stop failing writes.
    pub fn allow_writes(&self) {
        *self.write_budget.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn check_write(&self, key: &str) -> Result<()> {
        let mut budget = self.write_budget.write().unwrap_or_else(PoisonError::into_inner);
        match budget.as_mut() {
            None => Ok(()),
            Some(0) => Err(GrowError::storage(
                format!("memory://{}", key),
                io::Error::other("write failed"),
            )),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
        }
    }
}

impl JournalStore for MemoryJournalStore {
    fn load_plants(&self) -> Result<Loaded<Plant>> {
        let plants: Vec<Plant> = self
            .plants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        let order = self.order.read().unwrap_or_else(PoisonError::into_inner);
        Ok(Loaded::new(apply_order(plants, &order)))
    }

    fn put_plant(&self, plant: &Plant) -> Result<()> {
        validate_plant_id(&plant.id)?;
        self.check_write(&plant.id)?;
        self.plants
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(plant.id.clone(), plant.clone());
        self.plant_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn delete_plant(&self, id: &str) -> Result<()> {
        self.plants.write().unwrap_or_else(PoisonError::into_inner).remove(id);
        Ok(())
    }

    fn put_plant_order(&self, ids: &[String]) -> Result<()> {
        self.check_write("index")?;
        *self.order.write().unwrap_or_else(PoisonError::into_inner) = ids.to_vec();
        Ok(())
    }

    fn load_growboxes(&self) -> Result<Loaded<Growbox>> {
        let mut growboxes: Vec<Growbox> = self
            .growboxes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        growboxes.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(Loaded::new(growboxes))
    }

    fn put_growbox(&self, growbox: &Growbox) -> Result<()> {
        validate_id(&growbox.id)?;
        self.check_write(&growbox.id)?;
        self.growboxes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(growbox.id.clone(), growbox.clone());
        Ok(())
    }

    fn delete_growbox(&self, id: &str) -> Result<()> {
        self.growboxes.write().unwrap_or_else(PoisonError::into_inner).remove(id);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.plants.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.order.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.growboxes.write().unwrap_or_else(PoisonError::into_inner).clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::test_journal_store_crud;

    #[test]
    fn test_memory_store_crud() {
        let store = MemoryJournalStore::new();
        test_journal_store_crud(&store);
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = MemoryJournalStore::new();
        assert_eq!(store.plant_count(), 0);
        assert_eq!(store.plant_writes(), 0);
        assert!(store.order().is_empty());
    }

    #[test]
    fn test_put_counts_writes() {
        let store = MemoryJournalStore::new();
        let plant = Plant::new("P");
        store.put_plant(&plant).unwrap();
        store.put_plant(&plant).unwrap();

        assert_eq!(store.plant_count(), 1);
        assert_eq!(store.plant_writes(), 2);
    }

    #[test]
    fn test_fail_writes_after_budget() {
        let store = MemoryJournalStore::new();
        let first = Plant::new("first");
        let second = Plant::new("second");

        store.fail_writes_after(1);
        store.put_plant(&first).unwrap();
        assert!(matches!(
            store.put_plant(&second),
            Err(GrowError::Storage { .. })
        ));
        assert!(store.put_growbox(&Growbox::new("G")).is_err());
        assert!(store.put_plant_order(&[first.id.clone()]).is_err());

        // Deletes are never failed
        store.delete_plant(&first.id).unwrap();
        assert_eq!(store.plant_count(), 0);

        store.allow_writes();
        store.put_plant(&second).unwrap();
        assert_eq!(store.plant_count(), 1);
    }

    #[test]
    fn test_rejects_reserved_plant_id() {
        let store = MemoryJournalStore::new();
        let mut plant = Plant::new("P");
        plant.id = "index".to_string();
        assert!(store.put_plant(&plant).is_err());
        assert_eq!(store.plant_writes(), 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MemoryJournalStore::new());
        let mut handles = vec![];

        for i in 0..10 {
            let store_clone = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                store_clone
                    .put_plant(&Plant::new(format!("p{}", i)))
                    .unwrap();
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.plant_count(), 10);
    }
}
