//! Configuration loading for growtrack.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. User config (`~/.growtrack/config.toml`)
//! 3. Defaults (lowest priority)
//!
//! All configuration is optional. The system runs with sensible defaults
//! when no config exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GrowError, Result};
use crate::inference::PipelineMode;
use crate::util::{read_to_string_limited, write_atomic};

/// Default manifest file name inside the model directory.
pub const DEFAULT_MANIFEST_NAME: &str = "leafsense_model.json";

/// Main configuration struct for growtrack.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Journal storage location.
    pub storage: StorageConfig,
    /// Reference catalog files.
    pub catalog: CatalogConfig,
    /// Leaf analyzer settings.
    pub analyzer: AnalyzerConfig,
    /// Defaults for new growboxes.
    pub lighting: LightingConfig,
}

/// Journal storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory; `<growtrack_home>/data` when unset.
    pub data_dir: Option<PathBuf>,
}

/// Reference catalog configuration.
///
/// When a file is unset or unreadable, the built-in catalog is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON array of seed manufacturers with their strains.
    pub strains_file: Option<PathBuf>,
    /// JSON array of fertilizer manufacturers with their products.
    pub fertilizers_file: Option<PathBuf>,
}

/// Leaf analyzer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub pipeline_mode: PipelineMode,
    /// Stage-0 probability at or above which an image counts as a cannabis leaf.
    pub stage0_threshold: f32,
    /// Stage-0 probability below which an image is rejected outright.
    pub stage0_soft_floor: f32,
    /// Model directory; `<growtrack_home>/models` when unset.
    pub model_dir: Option<PathBuf>,
    pub manifest_name: String,
    /// Number of results reported per analysis.
    pub top_k: usize,
    /// Result confidence at or above which care tips are derived.
    pub confidence_threshold: f32,
}

impl AnalyzerConfig {
    /// Check if a probability threshold is valid (finite, within 0.0-1.0).
    pub fn is_valid_threshold(value: f32) -> bool {
        value.is_finite() && (0.0..=1.0).contains(&value)
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            pipeline_mode: PipelineMode::Direct,
            stage0_threshold: 0.60,
            stage0_soft_floor: 0.40,
            model_dir: None,
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            top_k: 5,
            confidence_threshold: 0.15,
        }
    }
}

/// Lighting defaults applied to new growboxes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightingConfig {
    /// Price per kWh.
    pub electricity_price: f64,
}

impl LightingConfig {
    /// Check if an electricity price is valid (finite, non-negative).
    pub fn is_valid_price(value: f64) -> bool {
        value.is_finite() && value >= 0.0
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            electricity_price: 0.30,
        }
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. User config (`~/.growtrack/config.toml`)
    /// 3. Defaults
    pub fn load() -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        config.apply_env_overrides();
        config
    }

    /// Load user config from `~/.growtrack/config.toml`.
    fn load_user_config() -> Option<Config> {
        let path = config_path()?;
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(&path) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!("ignoring config {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = read_to_string_limited(path)?;
        toml::from_str(&content).map_err(|e| GrowError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // GROWTRACK_DATA_DIR
        if let Ok(val) = env::var("GROWTRACK_DATA_DIR") {
            if val.trim().is_empty() {
                eprintln!("Warning: GROWTRACK_DATA_DIR is empty. Ignoring.");
            } else {
                self.storage.data_dir = Some(PathBuf::from(val));
            }
        }

        // GROWTRACK_MODEL_DIR
        if let Ok(val) = env::var("GROWTRACK_MODEL_DIR") {
            if val.trim().is_empty() {
                eprintln!("Warning: GROWTRACK_MODEL_DIR is empty. Ignoring.");
            } else {
                self.analyzer.model_dir = Some(PathBuf::from(val));
            }
        }

        // GROWTRACK_PIPELINE_MODE
        if let Ok(val) = env::var("GROWTRACK_PIPELINE_MODE") {
            match val.parse::<PipelineMode>() {
                Ok(mode) => self.analyzer.pipeline_mode = mode,
                Err(_) => eprintln!(
                    "Warning: Invalid GROWTRACK_PIPELINE_MODE value '{}'. \
                    Expected 'direct' or 'two_stage'. Using '{}'.",
                    val, self.analyzer.pipeline_mode
                ),
            }
        }

        // GROWTRACK_STAGE0_THRESHOLD
        if let Ok(val) = env::var("GROWTRACK_STAGE0_THRESHOLD") {
            match val.parse::<f32>() {
                Ok(t) if AnalyzerConfig::is_valid_threshold(t) => {
                    self.analyzer.stage0_threshold = t;
                }
                _ => eprintln!(
                    "Warning: Invalid GROWTRACK_STAGE0_THRESHOLD value '{}'. \
                    Expected a number between 0.0 and 1.0. Using '{}'.",
                    val, self.analyzer.stage0_threshold
                ),
            }
        }

        // GROWTRACK_CONFIDENCE_THRESHOLD
        if let Ok(val) = env::var("GROWTRACK_CONFIDENCE_THRESHOLD") {
            match val.parse::<f32>() {
                Ok(t) if AnalyzerConfig::is_valid_threshold(t) => {
                    self.analyzer.confidence_threshold = t;
                }
                _ => eprintln!(
                    "Warning: Invalid GROWTRACK_CONFIDENCE_THRESHOLD value '{}'. \
                    Expected a number between 0.0 and 1.0. Using '{}'.",
                    val, self.analyzer.confidence_threshold
                ),
            }
        }

        // GROWTRACK_ELECTRICITY_PRICE
        if let Ok(val) = env::var("GROWTRACK_ELECTRICITY_PRICE") {
            match val.replace(',', ".").parse::<f64>() {
                Ok(p) if LightingConfig::is_valid_price(p) => {
                    self.lighting.electricity_price = p;
                }
                _ => eprintln!(
                    "Warning: Invalid GROWTRACK_ELECTRICITY_PRICE value '{}'. \
                    Expected a non-negative number. Using '{}'.",
                    val, self.lighting.electricity_price
                ),
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// Values from `other` take precedence when they differ from defaults.
    /// Optional paths are taken whenever `other` sets them.
    ///
    /// A value in `other` that equals the default cannot override a
    /// non-default value from a lower-precedence config, since "not set in
    /// file" and "set to the default" deserialize identically.
    fn merge(mut self, other: Config) -> Self {
        // Storage
        if other.storage.data_dir.is_some() {
            self.storage.data_dir = other.storage.data_dir;
        }

        // Catalog
        if other.catalog.strains_file.is_some() {
            self.catalog.strains_file = other.catalog.strains_file;
        }
        if other.catalog.fertilizers_file.is_some() {
            self.catalog.fertilizers_file = other.catalog.fertilizers_file;
        }

        // Analyzer: merge field by field
        let default_analyzer = AnalyzerConfig::default();
        if other.analyzer.pipeline_mode != default_analyzer.pipeline_mode {
            self.analyzer.pipeline_mode = other.analyzer.pipeline_mode;
        }
        if other.analyzer.stage0_threshold != default_analyzer.stage0_threshold {
            self.analyzer.stage0_threshold = other.analyzer.stage0_threshold;
        }
        if other.analyzer.stage0_soft_floor != default_analyzer.stage0_soft_floor {
            self.analyzer.stage0_soft_floor = other.analyzer.stage0_soft_floor;
        }
        if other.analyzer.model_dir.is_some() {
            self.analyzer.model_dir = other.analyzer.model_dir;
        }
        if other.analyzer.manifest_name != default_analyzer.manifest_name {
            self.analyzer.manifest_name = other.analyzer.manifest_name;
        }
        if other.analyzer.top_k != default_analyzer.top_k {
            self.analyzer.top_k = other.analyzer.top_k;
        }
        if other.analyzer.confidence_threshold != default_analyzer.confidence_threshold {
            self.analyzer.confidence_threshold = other.analyzer.confidence_threshold;
        }

        // Lighting
        if other.lighting.electricity_price != LightingConfig::default().electricity_price {
            self.lighting.electricity_price = other.lighting.electricity_price;
        }

        self
    }

    /// Save configuration to `path` atomically, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| GrowError::storage(dir, e))?;
            }
        }
        let content = toml::to_string_pretty(self).map_err(|e| GrowError::config(e.to_string()))?;
        write_atomic(path, content.as_bytes())
    }

    /// Save configuration to the user config file.
    pub fn save(&self) -> Result<()> {
        let path = config_path().ok_or_else(|| {
            GrowError::config("Could not determine config path (no home directory)")
        })?;
        self.save_to(&path)
    }

    /// Effective data directory.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage.data_dir.clone().or_else(data_dir)
    }

    /// Effective model directory.
    pub fn model_dir(&self) -> Option<PathBuf> {
        self.analyzer
            .model_dir
            .clone()
            .or_else(|| growtrack_home().map(|h| h.join("models")))
    }

    /// Effective scan history directory, `<data_dir>/scans`.
    pub fn scans_dir(&self) -> Option<PathBuf> {
        self.data_dir().map(|d| d.join("scans"))
    }

    /// Effective feedback directory, `<data_dir>/feedback`.
    pub fn feedback_dir(&self) -> Option<PathBuf> {
        self.data_dir().map(|d| d.join("feedback"))
    }
}

/// Get the growtrack home directory.
///
/// Uses `GROWTRACK_HOME` when set and non-empty, else `~/.growtrack`.
/// Relative `GROWTRACK_HOME` values are canonicalized when they exist.
pub fn growtrack_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("GROWTRACK_HOME") {
        if home.is_empty() {
            tracing::warn!("GROWTRACK_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("GROWTRACK_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".growtrack"));
    }

    // Fallback for containerized/minimal environments without HOME
    let fallback_path = fallback_growtrack_home();
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback_path.display()
    );
    Some(fallback_path)
}

#[cfg(unix)]
fn fallback_growtrack_home() -> PathBuf {
    use std::os::unix::fs::MetadataExt;
    let uid = std::fs::metadata("/").map(|m| m.uid()).unwrap_or(0);
    PathBuf::from(format!("/tmp/growtrack-{}", uid))
}

#[cfg(not(unix))]
fn fallback_growtrack_home() -> PathBuf {
    std::env::temp_dir().join("growtrack")
}

/// Get the user config path.
///
/// Returns `<growtrack_home>/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    growtrack_home().map(|h| h.join("config.toml"))
}

/// Get the default data directory.
///
/// Returns `<growtrack_home>/data/`.
pub fn data_dir() -> Option<PathBuf> {
    growtrack_home().map(|h| h.join("data"))
}

/// Get the crash log path.
///
/// Returns `<growtrack_home>/crash.log`.
pub fn crash_log_path() -> Option<PathBuf> {
    growtrack_home().map(|h| h.join("crash.log"))
}
