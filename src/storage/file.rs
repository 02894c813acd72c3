//! File-based journal storage.
//!
//! Records are stored as JSON files under the data directory:
//!
//! ```text
//! <data_dir>/plants/<id>.json
//! <data_dir>/plants/index.json      ordered plant ids, newest first
//! <data_dir>/growboxes/<id>.json
//! ```
//!
//! Atomic writes are achieved via temp file + rename pattern.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::data_dir;
use crate::core::{Growbox, Plant};
use crate::error::{GrowError, Result};
use crate::storage::traits::{apply_order, Loaded};
use crate::storage::JournalStore;
use crate::util::{
    read_to_string_limited, validate_id, validate_plant_id, write_atomic, RESERVED_PLANT_ID,
};

const PLANTS_DIR: &str = "plants";
const GROWBOXES_DIR: &str = "growboxes";
/// File stem of the plant order file.
const INDEX_STEM: &str = RESERVED_PLANT_ID;

/// File-based journal storage.
///
/// Stores one JSON file per plant and per growbox in a configurable
/// directory. Uses atomic writes via temp file + rename pattern.
#[derive(Debug, Clone)]
pub struct FileJournalStore {
    plants_dir: PathBuf,
    growboxes_dir: PathBuf,
}

impl FileJournalStore {
    /// Create a store in the configured data directory.
    ///
    /// Uses `~/.growtrack/data/` or `$GROWTRACK_HOME/data/`.
    pub fn new() -> Result<Self> {
        let dir = data_dir().ok_or_else(|| {
            GrowError::config("Could not determine data directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a store rooted at a custom data directory.
    pub fn with_dir(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        let plants_dir = data_dir.join(PLANTS_DIR);
        let growboxes_dir = data_dir.join(GROWBOXES_DIR);

        for dir in [&plants_dir, &growboxes_dir] {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| GrowError::storage(dir, e))?;
            }
        }

        Ok(Self {
            plants_dir,
            growboxes_dir,
        })
    }

    fn plant_path(&self, id: &str) -> PathBuf {
        self.plants_dir.join(format!("{}.json", id))
    }

    fn growbox_path(&self, id: &str) -> PathBuf {
        self.growboxes_dir.join(format!("{}.json", id))
    }

    fn index_path(&self) -> PathBuf {
        self.plants_dir.join(format!("{}.json", INDEX_STEM))
    }

    fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        write_atomic(path, json.as_bytes())
    }

    fn remove_record(path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path).map_err(|e| GrowError::storage(path, e))?;
        }
        Ok(())
    }

    /// Read every record file in `dir`, skipping temp files and `skip_stem`.
    ///
    /// Files that fail to read or decode are reported as corrupt.
    fn read_records<T: DeserializeOwned>(dir: &Path, skip_stem: Option<&str>) -> Result<Loaded<T>> {
        let mut loaded = Loaded::new(Vec::new());
        if !dir.exists() {
            return Ok(loaded);
        }

        let entries = fs::read_dir(dir).map_err(|e| GrowError::storage(dir, e))?;
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| GrowError::storage(dir, e))?;
            let path = entry.path();

            // Skip non-JSON files and temp files
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            if stem.starts_with('.') || skip_stem == Some(stem.as_str()) {
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        for path in paths {
            let decoded = read_to_string_limited(&path).and_then(|content| {
                serde_json::from_str::<T>(&content).map_err(GrowError::from)
            });
            match decoded {
                Ok(record) => loaded.records.push(record),
                Err(err) => {
                    tracing::warn!("skipping unreadable record {}: {}", path.display(), err);
                    loaded.corrupt.push(path.display().to_string());
                }
            }
        }
        Ok(loaded)
    }

    fn read_order(&self) -> Result<Vec<String>> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = read_to_string_limited(&path)?;
        match serde_json::from_str::<Vec<String>>(&content) {
            Ok(ids) => Ok(ids),
            Err(err) => {
                tracing::warn!("ignoring unreadable plant index {}: {}", path.display(), err);
                Ok(Vec::new())
            }
        }
    }
}

impl JournalStore for FileJournalStore {
    fn load_plants(&self) -> Result<Loaded<Plant>> {
        let loaded: Loaded<Plant> = Self::read_records(&self.plants_dir, Some(INDEX_STEM))?;
        let order = self.read_order()?;
        Ok(Loaded {
            records: apply_order(loaded.records, &order),
            corrupt: loaded.corrupt,
        })
    }

    fn put_plant(&self, plant: &Plant) -> Result<()> {
        validate_plant_id(&plant.id)?;
        Self::write_record(&self.plant_path(&plant.id), plant)
    }

    fn delete_plant(&self, id: &str) -> Result<()> {
        validate_plant_id(id)?;
        Self::remove_record(&self.plant_path(id))
    }

    fn put_plant_order(&self, ids: &[String]) -> Result<()> {
        Self::write_record(&self.index_path(), &ids)
    }

    fn load_growboxes(&self) -> Result<Loaded<Growbox>> {
        let mut loaded: Loaded<Growbox> = Self::read_records(&self.growboxes_dir, None)?;
        loaded
            .records
            .sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(loaded)
    }

    fn put_growbox(&self, growbox: &Growbox) -> Result<()> {
        validate_id(&growbox.id)?;
        Self::write_record(&self.growbox_path(&growbox.id), growbox)
    }

    fn delete_growbox(&self, id: &str) -> Result<()> {
        validate_id(id)?;
        Self::remove_record(&self.growbox_path(id))
    }

    fn clear(&self) -> Result<()> {
        for dir in [&self.plants_dir, &self.growboxes_dir] {
            if dir.exists() {
                fs::remove_dir_all(dir).map_err(|e| GrowError::storage(dir, e))?;
            }
            fs::create_dir_all(dir).map_err(|e| GrowError::storage(dir, e))?;
        }
        Ok(())
    }
}
