//! The grow journal: ordered plants and growboxes mirrored to a store.
//!
//! The in-memory state sits behind an `RwLock`. Every mutation takes the
//! write lock, applies the change to a copy of the affected record, writes
//! that record to the store and only then commits the copy to memory, so
//! a failed write leaves the journal unchanged and two concurrent mutations
//! cannot drop each other's changes. Mutations spanning several records
//! undo their earlier writes when a later one fails.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::catalog::StrainCatalog;
use crate::core::entry::{FermentationEntry, FermentationMethod, PlantEntry};
use crate::core::growbox::{ElectricityCosts, Growbox, LightSchedule, LightingSettings};
use crate::core::phase::{derive_phase, PlantPhase};
use crate::core::plant::{Plant, PlantPhoto, PowerDevice};
use crate::core::stats::{self, Statistics};
use crate::error::{FailOpen, GrowError, Result};
use crate::storage::JournalStore;
use crate::util::{new_id, validate_id, validate_plant_id};

/// Outcome of loading the journal from its store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Plants loaded.
    pub plants: usize,
    /// Growboxes loaded.
    pub growboxes: usize,
    /// Plants whose THC/CBD content was filled from the catalog.
    pub backfilled: usize,
    /// Growbox member references to plants that no longer exist, dropped.
    pub dangling_refs: usize,
    /// Records that could not be decoded and were skipped.
    pub corrupt: Vec<String>,
}

impl LoadReport {
    /// Whether any stored record was unreadable.
    pub fn has_corruption(&self) -> bool {
        !self.corrupt.is_empty()
    }
}

/// Outcome of a legacy import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub plants_added: usize,
    /// Plants skipped because their id already exists.
    pub plants_existing: usize,
    pub growboxes_added: usize,
    /// Array elements that could not be decoded or carry an unusable id.
    pub invalid: usize,
}

#[derive(Debug, Default)]
struct JournalState {
    loaded: bool,
    plants: Vec<Plant>,
    growboxes: Vec<Growbox>,
    report: LoadReport,
}

impl JournalState {
    fn plant_index(&self, id: &str) -> Result<usize> {
        self.plants
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| GrowError::not_found("plant", id))
    }

    fn growbox_index(&self, id: &str) -> Result<usize> {
        self.growboxes
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| GrowError::not_found("growbox", id))
    }

    fn has_plant(&self, id: &str) -> bool {
        self.plants.iter().any(|p| p.id == id)
    }

    fn order(&self) -> Vec<String> {
        self.plants.iter().map(|p| p.id.clone()).collect()
    }
}

/// A legacy growbox element with its plants nested inline.
#[derive(Debug, Deserialize)]
struct LegacyGrowbox {
    #[serde(flatten)]
    growbox: Growbox,
    #[serde(default)]
    plants: Vec<Plant>,
}

/// The grow journal.
///
/// Loads lazily on first use. All mutations are persisted before they
/// return.
#[derive(Debug)]
pub struct Journal<S: JournalStore> {
    store: S,
    catalog: StrainCatalog,
    state: RwLock<JournalState>,
}

impl<S: JournalStore> Journal<S> {
    /// Create a journal over `store`, backfilling potency from `catalog`.
    pub fn new(store: S, catalog: StrainCatalog) -> Self {
        Self {
            store,
            catalog,
            state: RwLock::new(JournalState::default()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &StrainCatalog {
        &self.catalog
    }

    /// Load the journal from the store. Idempotent.
    ///
    /// Unreadable records are skipped and reported. Plants with blank
    /// THC/CBD content are backfilled from the catalog and the backfilled
    /// records written back.
    pub fn initialize(&self) -> Result<LoadReport> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.loaded {
            self.load_into(&mut state)?;
        }
        Ok(state.report.clone())
    }

    fn load_into(&self, state: &mut JournalState) -> Result<()> {
        let loaded_plants = self.store.load_plants()?;
        let loaded_boxes = self.store.load_growboxes()?;

        let mut report = LoadReport {
            corrupt: loaded_plants.corrupt,
            ..LoadReport::default()
        };
        report.corrupt.extend(loaded_boxes.corrupt);

        let mut plants = loaded_plants.records;
        for plant in plants.iter_mut() {
            if self.backfill(plant) {
                self.store.put_plant(plant)?;
                report.backfilled += 1;
            }
        }

        let mut growboxes = loaded_boxes.records;
        for growbox in growboxes.iter_mut() {
            let before = growbox.plant_ids.len();
            growbox
                .plant_ids
                .retain(|id| plants.iter().any(|p| &p.id == id));
            let dropped = before - growbox.plant_ids.len();
            if dropped > 0 {
                tracing::info!(
                    "dropping {} missing plant reference(s) from growbox {}",
                    dropped,
                    growbox.id
                );
                self.store.put_growbox(growbox)?;
                report.dangling_refs += dropped;
            }
        }

        if report.has_corruption() {
            tracing::warn!(
                "journal loaded with {} unreadable record(s)",
                report.corrupt.len()
            );
        }
        tracing::debug!(
            "journal loaded: {} plants, {} growboxes, {} backfilled",
            plants.len(),
            growboxes.len(),
            report.backfilled
        );

        report.plants = plants.len();
        report.growboxes = growboxes.len();
        state.plants = plants;
        state.growboxes = growboxes;
        state.report = report;
        state.loaded = true;
        Ok(())
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, JournalState>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.loaded {
            return Ok(state);
        }
        drop(state);
        self.initialize()?;
        Ok(self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, JournalState>> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.loaded {
            self.load_into(&mut state)?;
        }
        Ok(state)
    }

    /// Fill blank potency fields from the catalog. Returns whether the plant changed.
    fn backfill(&self, plant: &mut Plant) -> bool {
        if !plant.needs_potency() {
            return false;
        }
        match self.catalog.lookup(&plant.manufacturer, &plant.strain) {
            Some(strain) => plant.fill_potency_from(strain),
            None => false,
        }
    }

    /// Write back growbox records after a failed multi-record mutation.
    fn restore_growboxes(&self, originals: &[&Growbox]) {
        for growbox in originals {
            self.store
                .put_growbox(growbox)
                .fail_open_default("restoring growbox");
        }
    }

    /// Apply `f` to a copy of the plant, persist it, then commit it.
    fn mutate_plant<T>(
        &self,
        plant_id: &str,
        f: impl FnOnce(&mut Plant) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.write_state()?;
        let idx = state.plant_index(plant_id)?;
        let mut plant = state.plants[idx].clone();
        let value = f(&mut plant)?;
        self.store.put_plant(&plant)?;
        state.plants[idx] = plant;
        Ok(value)
    }

    /// Apply `f` to a copy of the growbox, persist it, then commit it.
    fn mutate_growbox<T>(
        &self,
        growbox_id: &str,
        f: impl FnOnce(&mut Growbox) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.write_state()?;
        let idx = state.growbox_index(growbox_id)?;
        let mut growbox = state.growboxes[idx].clone();
        let value = f(&mut growbox)?;
        self.store.put_growbox(&growbox)?;
        state.growboxes[idx] = growbox;
        Ok(value)
    }

    // =========================================================================
    // Plant queries
    // =========================================================================

    /// All plants, newest first.
    pub fn plants(&self) -> Result<Vec<Plant>> {
        Ok(self.read_state()?.plants.clone())
    }

    pub fn plant(&self, id: &str) -> Result<Plant> {
        let state = self.read_state()?;
        let idx = state.plant_index(id)?;
        Ok(state.plants[idx].clone())
    }

    /// Plants whose derived phase is `phase`.
    pub fn plants_in_phase(&self, phase: PlantPhase, now: DateTime<Utc>) -> Result<Vec<Plant>> {
        Ok(self
            .read_state()?
            .plants
            .iter()
            .filter(|p| derive_phase(p, now) == phase)
            .cloned()
            .collect())
    }

    // =========================================================================
    // Plant mutations
    // =========================================================================

    /// Add a plant at the front of the collection.
    ///
    /// A blank id is replaced with a fresh one. Blank THC/CBD content is
    /// filled from the catalog. Returns the stored plant.
    pub fn add_plant(&self, mut plant: Plant) -> Result<Plant> {
        if plant.id.trim().is_empty() {
            plant.id = new_id();
        }
        validate_plant_id(&plant.id)?;
        self.backfill(&mut plant);

        let mut state = self.write_state()?;
        if state.has_plant(&plant.id) {
            return Err(GrowError::duplicate("plant", plant.id));
        }

        let mut order = Vec::with_capacity(state.plants.len() + 1);
        order.push(plant.id.clone());
        order.extend(state.order());

        self.store.put_plant(&plant)?;
        if let Err(err) = self.store.put_plant_order(&order) {
            self.store
                .delete_plant(&plant.id)
                .fail_open_default("rolling back plant add");
            return Err(err);
        }
        state.plants.insert(0, plant.clone());
        tracing::debug!("added plant {}", plant.id);
        Ok(plant)
    }

    /// Replace a plant record by id.
    pub fn update_plant(&self, plant: Plant) -> Result<()> {
        let mut state = self.write_state()?;
        let idx = state.plant_index(&plant.id)?;
        self.store.put_plant(&plant)?;
        state.plants[idx] = plant;
        Ok(())
    }

    /// Remove a plant and detach it from every growbox.
    pub fn remove_plant(&self, id: &str) -> Result<Plant> {
        let mut state = self.write_state()?;
        let idx = state.plant_index(id)?;

        let order: Vec<String> = state
            .plants
            .iter()
            .filter(|p| p.id != id)
            .map(|p| p.id.clone())
            .collect();

        let mut detached: Vec<(usize, Growbox)> = Vec::new();
        for (i, growbox) in state.growboxes.iter().enumerate() {
            if growbox.contains(id) {
                let mut updated = growbox.clone();
                updated.plant_ids.retain(|pid| pid != id);
                detached.push((i, updated));
            }
        }

        let mut written: Vec<&Growbox> = Vec::new();
        for (i, growbox) in &detached {
            if let Err(err) = self.store.put_growbox(growbox) {
                self.restore_growboxes(&written);
                return Err(err);
            }
            written.push(&state.growboxes[*i]);
        }
        if let Err(err) = self.store.delete_plant(id) {
            self.restore_growboxes(&written);
            return Err(err);
        }
        // Order entries without a record are skipped on load.
        self.store
            .put_plant_order(&order)
            .fail_open_default("writing plant order");

        for (i, growbox) in detached {
            state.growboxes[i] = growbox;
        }
        let removed = state.plants.remove(idx);
        tracing::debug!("removed plant {}", id);
        Ok(removed)
    }

    /// Append a journal entry. A blank entry id is replaced with a fresh one.
    pub fn add_entry(&self, plant_id: &str, mut entry: PlantEntry) -> Result<PlantEntry> {
        if entry.id.trim().is_empty() {
            entry.id = new_id();
        }
        self.mutate_plant(plant_id, |plant| {
            if plant.entries.iter().any(|e| e.id == entry.id) {
                return Err(GrowError::duplicate("entry", entry.id.clone()));
            }
            plant.entries.push(entry.clone());
            Ok(entry)
        })
    }

    /// Replace a journal entry by id.
    pub fn update_entry(&self, plant_id: &str, entry: PlantEntry) -> Result<()> {
        self.mutate_plant(plant_id, |plant| {
            let slot = plant
                .entries
                .iter_mut()
                .find(|e| e.id == entry.id)
                .ok_or_else(|| GrowError::not_found("entry", entry.id.clone()))?;
            *slot = entry;
            Ok(())
        })
    }

    pub fn remove_entry(&self, plant_id: &str, entry_id: &str) -> Result<PlantEntry> {
        self.mutate_plant(plant_id, |plant| {
            let idx = plant
                .entries
                .iter()
                .position(|e| e.id == entry_id)
                .ok_or_else(|| GrowError::not_found("entry", entry_id))?;
            Ok(plant.entries.remove(idx))
        })
    }

    pub fn add_fermentation_entry(
        &self,
        plant_id: &str,
        mut entry: FermentationEntry,
    ) -> Result<FermentationEntry> {
        if entry.id.trim().is_empty() {
            entry.id = new_id();
        }
        self.mutate_plant(plant_id, |plant| {
            plant.fermentation_entries.push(entry.clone());
            Ok(entry)
        })
    }

    pub fn remove_fermentation_entry(
        &self,
        plant_id: &str,
        entry_id: &str,
    ) -> Result<FermentationEntry> {
        self.mutate_plant(plant_id, |plant| {
            let idx = plant
                .fermentation_entries
                .iter()
                .position(|e| e.id == entry_id)
                .ok_or_else(|| GrowError::not_found("fermentation entry", entry_id))?;
            Ok(plant.fermentation_entries.remove(idx))
        })
    }

    /// Attach a photo, tagging it with the plant's current phase when untagged.
    pub fn add_photo(&self, plant_id: &str, mut photo: PlantPhoto) -> Result<PlantPhoto> {
        if photo.id.trim().is_empty() {
            photo.id = new_id();
        }
        self.mutate_plant(plant_id, |plant| {
            if photo.phase.is_empty() {
                photo.phase = derive_phase(plant, photo.timestamp).to_string();
            }
            plant.photos.push(photo.clone());
            Ok(photo)
        })
    }

    pub fn remove_photo(&self, plant_id: &str, photo_id: &str) -> Result<PlantPhoto> {
        self.mutate_plant(plant_id, |plant| {
            let idx = plant
                .photos
                .iter()
                .position(|p| p.id == photo_id)
                .ok_or_else(|| GrowError::not_found("photo", photo_id))?;
            Ok(plant.photos.remove(idx))
        })
    }

    pub fn add_power_device(&self, plant_id: &str, mut device: PowerDevice) -> Result<PowerDevice> {
        if device.id.trim().is_empty() {
            device.id = new_id();
        }
        if !device.hours_per_day.is_finite() || !(0.0..=24.0).contains(&device.hours_per_day) {
            return Err(GrowError::invalid_input(format!(
                "hours per day must be between 0 and 24, got {}",
                device.hours_per_day
            )));
        }
        self.mutate_plant(plant_id, |plant| {
            plant.power_devices.push(device.clone());
            Ok(device)
        })
    }

    pub fn remove_power_device(&self, plant_id: &str, device_id: &str) -> Result<PowerDevice> {
        self.mutate_plant(plant_id, |plant| {
            let idx = plant
                .power_devices
                .iter()
                .position(|d| d.id == device_id)
                .ok_or_else(|| GrowError::not_found("power device", device_id))?;
            Ok(plant.power_devices.remove(idx))
        })
    }

    // =========================================================================
    // Lifecycle transitions
    // =========================================================================

    /// Record the start of flowering.
    pub fn start_flowering(&self, plant_id: &str, at: DateTime<Utc>) -> Result<Plant> {
        self.mutate_plant(plant_id, |plant| {
            if derive_phase(plant, at).is_post_harvest() {
                return Err(GrowError::invalid_state(format!(
                    "plant {} is already harvested",
                    plant.id
                )));
            }
            plant.flowering_start_date = Some(at);
            Ok(plant.clone())
        })
    }

    pub fn harvest(&self, plant_id: &str, at: DateTime<Utc>) -> Result<Plant> {
        self.mutate_plant(plant_id, |plant| {
            if plant.harvest_date.is_some() {
                return Err(GrowError::invalid_state(format!(
                    "plant {} is already harvested",
                    plant.id
                )));
            }
            plant.harvest_date = Some(at);
            Ok(plant.clone())
        })
    }

    /// Move a plant into drying, recording the harvest if it was not yet.
    pub fn start_drying(&self, plant_id: &str, at: DateTime<Utc>) -> Result<Plant> {
        self.mutate_plant(plant_id, |plant| {
            if plant.is_drying || plant.is_fermenting {
                return Err(GrowError::invalid_state(format!(
                    "plant {} is already {}",
                    plant.id,
                    derive_phase(plant, at)
                )));
            }
            plant.harvest_date.get_or_insert(at);
            plant.is_drying = true;
            plant.drying_start_date = Some(at);
            Ok(plant.clone())
        })
    }

    /// Revert a drying start.
    pub fn undo_drying(&self, plant_id: &str) -> Result<Plant> {
        self.mutate_plant(plant_id, |plant| {
            if !plant.is_drying {
                return Err(GrowError::invalid_state(format!(
                    "plant {} is not drying",
                    plant.id
                )));
            }
            plant.is_drying = false;
            plant.drying_start_date = None;
            Ok(plant.clone())
        })
    }

    /// Move a harvested or drying plant into fermentation (curing).
    pub fn start_fermentation(
        &self,
        plant_id: &str,
        method: FermentationMethod,
        at: DateTime<Utc>,
    ) -> Result<Plant> {
        self.mutate_plant(plant_id, |plant| {
            if plant.is_fermenting {
                return Err(GrowError::invalid_state(format!(
                    "plant {} is already fermenting",
                    plant.id
                )));
            }
            if plant.harvest_date.is_none() && plant.drying_start_date.is_none() {
                return Err(GrowError::invalid_state(format!(
                    "plant {} has not been harvested",
                    plant.id
                )));
            }
            plant.is_drying = false;
            plant.is_fermenting = true;
            plant.fermentation_start_date = Some(at);
            plant.fermentation_method = method;
            Ok(plant.clone())
        })
    }

    /// End drying or fermentation. Start dates are kept.
    pub fn finish(&self, plant_id: &str) -> Result<Plant> {
        self.mutate_plant(plant_id, |plant| {
            if !plant.is_drying && !plant.is_fermenting {
                return Err(GrowError::invalid_state(format!(
                    "plant {} is neither drying nor fermenting",
                    plant.id
                )));
            }
            plant.is_drying = false;
            plant.is_fermenting = false;
            Ok(plant.clone())
        })
    }

    // =========================================================================
    // Catalog and bulk operations
    // =========================================================================

    /// Overwrite potency and type from the catalog for every plant of
    /// `manufacturer`. Returns the number of plants changed.
    pub fn refresh_catalog_values(&self, manufacturer: &str) -> Result<usize> {
        let mut state = self.write_state()?;
        let mut changed = 0;
        for idx in 0..state.plants.len() {
            let plant = &state.plants[idx];
            if !plant.manufacturer.trim().eq_ignore_ascii_case(manufacturer.trim()) {
                continue;
            }
            let Some(strain) = self.catalog.lookup(&plant.manufacturer, &plant.strain) else {
                continue;
            };
            let mut updated = plant.clone();
            if updated.apply_catalog(strain) {
                self.store.put_plant(&updated)?;
                state.plants[idx] = updated;
                changed += 1;
            }
        }
        tracing::info!("refreshed catalog values for {} plant(s) of {}", changed, manufacturer);
        Ok(changed)
    }

    /// Remove every plant and growbox.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        self.store.clear()?;
        *state = JournalState {
            loaded: true,
            ..JournalState::default()
        };
        Ok(())
    }

    // =========================================================================
    // Growboxes
    // =========================================================================

    pub fn growboxes(&self) -> Result<Vec<Growbox>> {
        Ok(self.read_state()?.growboxes.clone())
    }

    pub fn growbox(&self, id: &str) -> Result<Growbox> {
        let state = self.read_state()?;
        let idx = state.growbox_index(id)?;
        Ok(state.growboxes[idx].clone())
    }

    /// The growbox a plant belongs to, if any.
    pub fn growbox_of(&self, plant_id: &str) -> Result<Option<Growbox>> {
        Ok(self
            .read_state()?
            .growboxes
            .iter()
            .find(|g| g.contains(plant_id))
            .cloned())
    }

    /// Member plants of a growbox in member order.
    pub fn plants_in(&self, growbox_id: &str) -> Result<Vec<Plant>> {
        let state = self.read_state()?;
        let idx = state.growbox_index(growbox_id)?;
        Ok(state.growboxes[idx]
            .plant_ids
            .iter()
            .filter_map(|id| state.plants.iter().find(|p| &p.id == id))
            .cloned()
            .collect())
    }

    /// Add a growbox. A blank id is replaced with a fresh one.
    pub fn add_growbox(&self, mut growbox: Growbox) -> Result<Growbox> {
        if growbox.id.trim().is_empty() {
            growbox.id = new_id();
        }
        let mut state = self.write_state()?;
        if state.growbox_index(&growbox.id).is_ok() {
            return Err(GrowError::duplicate("growbox", growbox.id));
        }
        check_members(&state, &growbox)?;
        self.store.put_growbox(&growbox)?;
        state.growboxes.push(growbox.clone());
        Ok(growbox)
    }

    /// Replace a growbox record by id.
    pub fn update_growbox(&self, growbox: Growbox) -> Result<()> {
        let mut state = self.write_state()?;
        let idx = state.growbox_index(&growbox.id)?;
        check_members(&state, &growbox)?;
        self.store.put_growbox(&growbox)?;
        state.growboxes[idx] = growbox;
        Ok(())
    }

    /// Delete a growbox. Its member plants stay in the journal.
    pub fn delete_growbox(&self, id: &str) -> Result<Growbox> {
        let mut state = self.write_state()?;
        let idx = state.growbox_index(id)?;
        self.store.delete_growbox(id)?;
        Ok(state.growboxes.remove(idx))
    }

    /// Put a plant into a growbox, moving it out of any other growbox.
    pub fn assign_plant(&self, growbox_id: &str, plant_id: &str) -> Result<()> {
        let mut state = self.write_state()?;
        let target = state.growbox_index(growbox_id)?;
        state.plant_index(plant_id)?;

        let mut changed: Vec<(usize, Growbox)> = Vec::new();
        for (i, growbox) in state.growboxes.iter().enumerate() {
            if i == target {
                if !growbox.contains(plant_id) {
                    let mut updated = growbox.clone();
                    updated.plant_ids.push(plant_id.to_string());
                    changed.push((i, updated));
                }
            } else if growbox.contains(plant_id) {
                let mut updated = growbox.clone();
                updated.plant_ids.retain(|id| id != plant_id);
                changed.push((i, updated));
            }
        }

        for (_, growbox) in &changed {
            self.store.put_growbox(growbox)?;
        }
        for (i, growbox) in changed {
            state.growboxes[i] = growbox;
        }
        Ok(())
    }

    pub fn unassign_plant(&self, growbox_id: &str, plant_id: &str) -> Result<()> {
        self.mutate_growbox(growbox_id, |growbox| {
            if !growbox.contains(plant_id) {
                return Err(GrowError::not_found("growbox member", plant_id));
            }
            growbox.plant_ids.retain(|id| id != plant_id);
            Ok(())
        })
    }

    /// Change a growbox's lighting and record the change in its history.
    pub fn update_lighting(
        &self,
        growbox_id: &str,
        schedule: LightSchedule,
        power_level: u8,
        electricity_price: f64,
        reason: &str,
    ) -> Result<LightingSettings> {
        if power_level > 100 {
            return Err(GrowError::invalid_input(format!(
                "power level must be 0-100, got {}",
                power_level
            )));
        }
        if !electricity_price.is_finite() || electricity_price < 0.0 {
            return Err(GrowError::invalid_input(format!(
                "electricity price must be a non-negative number, got {}",
                electricity_price
            )));
        }
        self.mutate_growbox(growbox_id, |growbox| {
            growbox
                .lighting_settings
                .apply_change(schedule, power_level, electricity_price, reason);
            Ok(growbox.lighting_settings.clone())
        })
    }

    /// Derive a growbox's operating hours from a light-on window.
    ///
    /// Marks are minutes of day; an off mark before the on mark crosses
    /// midnight.
    pub fn set_light_window(
        &self,
        growbox_id: &str,
        on_minute: u32,
        off_minute: u32,
    ) -> Result<LightingSettings> {
        const DAY: u32 = 24 * 60;
        if on_minute >= DAY || off_minute >= DAY {
            return Err(GrowError::invalid_input(format!(
                "light window marks must be below {} minutes, got {}-{}",
                DAY, on_minute, off_minute
            )));
        }
        self.mutate_growbox(growbox_id, |growbox| {
            growbox.lighting_settings.set_light_window(on_minute, off_minute);
            Ok(growbox.lighting_settings.clone())
        })
    }

    /// Electricity cost projection for a growbox.
    ///
    /// `None` when the growbox's lamp wattage is unknown.
    pub fn growbox_costs(&self, growbox_id: &str) -> Result<Option<ElectricityCosts>> {
        let state = self.read_state()?;
        let idx = state.growbox_index(growbox_id)?;
        Ok(state.growboxes[idx].electricity_costs(&state.plants))
    }

    /// Consumption statistics of every growbox at `now`.
    pub fn statistics(&self, now: DateTime<Utc>) -> Result<Statistics> {
        let state = self.read_state()?;
        Ok(stats::statistics(&state.growboxes, &state.plants, now))
    }

    /// Consumption statistics of one growbox at `now`.
    pub fn growbox_statistics(&self, growbox_id: &str, now: DateTime<Utc>) -> Result<Statistics> {
        let state = self.read_state()?;
        let idx = state.growbox_index(growbox_id)?;
        let growbox = std::slice::from_ref(&state.growboxes[idx]);
        Ok(stats::statistics(growbox, &state.plants, now))
    }

    // =========================================================================
    // Legacy import
    // =========================================================================

    /// Import a legacy JSON blob.
    ///
    /// Accepts either a flat array of plants or an array of growboxes with
    /// plants nested under `plants`. Plants whose id already exists are
    /// skipped; nested plants become members of their growbox. Elements
    /// that fail to decode are counted and skipped.
    pub fn import_legacy(&self, json: &str) -> Result<ImportReport> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Array(items) = value else {
            return Err(GrowError::invalid_input("legacy data must be a JSON array"));
        };

        let mut report = ImportReport::default();
        let mut new_plants: Vec<Plant> = Vec::new();
        let mut new_boxes: Vec<Growbox> = Vec::new();
        let mut box_updates: Vec<(String, Vec<String>)> = Vec::new();

        let mut state = self.write_state()?;
        let claim = |plant: Plant,
                     report: &mut ImportReport,
                     new_plants: &mut Vec<Plant>|
         -> Option<String> {
            let mut plant = plant;
            if plant.id.trim().is_empty() {
                plant.id = new_id();
            }
            if let Err(err) = validate_plant_id(&plant.id) {
                tracing::warn!("skipping legacy plant: {}", err);
                report.invalid += 1;
                return None;
            }
            let exists =
                state.has_plant(&plant.id) || new_plants.iter().any(|p| p.id == plant.id);
            if exists {
                report.plants_existing += 1;
            } else {
                self.backfill(&mut plant);
                new_plants.push(plant.clone());
                report.plants_added += 1;
            }
            Some(plant.id)
        };

        for item in items {
            let is_growbox = item.get("plants").is_some_and(|p| p.is_array());
            if is_growbox {
                let legacy = match serde_json::from_value::<LegacyGrowbox>(item) {
                    Ok(legacy) => legacy,
                    Err(err) => {
                        tracing::warn!("skipping unreadable legacy growbox: {}", err);
                        report.invalid += 1;
                        continue;
                    }
                };
                let mut growbox = legacy.growbox;
                if growbox.id.trim().is_empty() {
                    growbox.id = new_id();
                }
                if let Err(err) = validate_id(&growbox.id) {
                    tracing::warn!("skipping legacy growbox: {}", err);
                    report.invalid += 1;
                    continue;
                }
                let member_ids: Vec<String> = legacy
                    .plants
                    .into_iter()
                    .filter_map(|p| claim(p, &mut report, &mut new_plants))
                    .collect();
                box_updates.push((growbox.id.clone(), member_ids));
                new_boxes.push(growbox);
            } else {
                match serde_json::from_value::<Plant>(item) {
                    Ok(plant) => {
                        claim(plant, &mut report, &mut new_plants);
                    }
                    Err(err) => {
                        tracing::warn!("skipping unreadable legacy plant: {}", err);
                        report.invalid += 1;
                    }
                }
            }
        }

        // Resolve growbox membership against existing and imported growboxes,
        // keeping each plant in at most one growbox.
        let mut boxes = state.growboxes.clone();
        let mut touched: Vec<String> = Vec::new();
        for growbox in new_boxes {
            if boxes.iter().any(|g| g.id == growbox.id) {
                continue;
            }
            let mut growbox = growbox;
            growbox.plant_ids.clear();
            touched.push(growbox.id.clone());
            boxes.push(growbox);
            report.growboxes_added += 1;
        }
        for (box_id, member_ids) in box_updates {
            for plant_id in member_ids {
                if boxes.iter().any(|g| g.contains(&plant_id)) {
                    continue;
                }
                if let Some(growbox) = boxes.iter_mut().find(|g| g.id == box_id) {
                    growbox.plant_ids.push(plant_id);
                    if !touched.contains(&box_id) {
                        touched.push(box_id.clone());
                    }
                }
            }
        }

        let mut order: Vec<String> = new_plants.iter().map(|p| p.id.clone()).collect();
        order.extend(state.order());

        let touched_boxes: Vec<&Growbox> =
            boxes.iter().filter(|g| touched.contains(&g.id)).collect();
        self.persist_import(&new_plants, &order, &touched_boxes, &state.growboxes)?;

        let mut plants = new_plants;
        plants.append(&mut state.plants);
        state.plants = plants;
        state.growboxes = boxes;

        tracing::info!(
            "imported {} plant(s) and {} growbox(es), {} existing, {} invalid",
            report.plants_added,
            report.growboxes_added,
            report.plants_existing,
            report.invalid
        );
        Ok(report)
    }

    /// Write imported records, undoing the writes already made if one fails.
    fn persist_import(
        &self,
        plants: &[Plant],
        order: &[String],
        growboxes: &[&Growbox],
        previous: &[Growbox],
    ) -> Result<()> {
        let mut written_plants: Vec<&str> = Vec::new();
        let mut written_boxes: Vec<&str> = Vec::new();
        let result = (|| -> Result<()> {
            for plant in plants {
                self.store.put_plant(plant)?;
                written_plants.push(&plant.id);
            }
            if !plants.is_empty() {
                self.store.put_plant_order(order)?;
            }
            for growbox in growboxes {
                self.store.put_growbox(growbox)?;
                written_boxes.push(&growbox.id);
            }
            Ok(())
        })();

        let Err(err) = result else {
            return Ok(());
        };
        tracing::warn!(
            error = %err,
            "import failed, rolling back {} plant(s) and {} growbox(es)",
            written_plants.len(),
            written_boxes.len()
        );
        for id in written_plants {
            self.store
                .delete_plant(id)
                .fail_open_default("rolling back imported plant");
        }
        for id in written_boxes {
            let restored = match previous.iter().find(|g| g.id == id) {
                Some(original) => self.store.put_growbox(original),
                None => self.store.delete_growbox(id),
            };
            restored.fail_open_default("rolling back imported growbox");
        }
        Err(err)
    }
}

/// Every member of `growbox` must be a known plant.
fn check_members(state: &JournalState, growbox: &Growbox) -> Result<()> {
    match growbox.plant_ids.iter().find(|id| !state.has_plant(id)) {
        Some(missing) => Err(GrowError::not_found("plant", missing.clone())),
        None => Ok(()),
    }
}
