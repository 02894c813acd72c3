//! Model manifest and on-disk model assets.
//!
//! A model directory holds the classifier file, an optional JSON manifest,
//! a labels file, an optional calibration file and an optional stage-0
//! filter model. [`ModelAssets::load`] resolves all of them and never fails:
//! anything missing or malformed is logged and left absent.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::util::read_to_string_limited;

/// Model file names tried after the manifest's own entry, in order.
pub const MODEL_FALLBACK_NAMES: [&str; 4] = [
    "model_int8_full.tflite",
    "model_int8_dynamic.tflite",
    "model_fp32.tflite",
    "leafsense_model.tflite",
];

/// Stage-0 filter model names, in order.
pub const STAGE0_MODEL_NAMES: [&str; 2] =
    ["cannabis_filter_int8.tflite", "cannabis_filter_fp32.tflite"];

pub const LABELS_FILE_NAME: &str = "leafsense_labels.txt";
pub const CALIBRATION_FILE_NAME: &str = "leafsense_calibration.json";

/// Input edge length when the manifest does not name one.
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// Input edge length of the stage-0 filter.
pub const STAGE0_INPUT_SIZE: u32 = 160;

/// Per-channel normalization parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Normalization {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl Normalization {
    /// Whether the parameters can be applied to RGB input.
    ///
    /// Needs at least three finite means and three finite, non-zero stds.
    pub fn is_usable(&self) -> bool {
        self.mean.len() >= 3
            && self.std.len() >= 3
            && self.mean.iter().all(|m| m.is_finite())
            && self.std.iter().all(|s| s.is_finite() && *s != 0.0)
    }
}

/// Knowledge base files shipped next to the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KnowledgeInfo {
    pub kb_version: Option<String>,
    pub merged_file: Option<String>,
    pub index_file: Option<String>,
    pub entry_count: Option<u32>,
}

/// Contents of the model manifest JSON.
///
/// Both snake_case and camelCase spellings of the model file and input size
/// are accepted; the snake_case one wins when both are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelManifest {
    pub model_version: Option<String>,
    pub model_file: Option<String>,
    #[serde(rename = "modelFile", skip_serializing_if = "Option::is_none")]
    pub model_file_camel: Option<String>,
    pub input_size: Option<u32>,
    #[serde(rename = "inputSize", skip_serializing_if = "Option::is_none")]
    pub input_size_camel: Option<u32>,
    pub quantization: Option<String>,
    pub classes: Vec<String>,
    pub normalization: Option<Normalization>,
    pub model_sha256: Option<String>,
    pub knowledge: Option<KnowledgeInfo>,
}

impl ModelManifest {
    pub fn parse(text: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Declared model file name, ignoring blank entries.
    pub fn model_file_name(&self) -> Option<&str> {
        non_blank(self.model_file.as_deref())
            .or_else(|| non_blank(self.model_file_camel.as_deref()))
    }

    /// Declared input edge length, ignoring zero.
    pub fn declared_input_size(&self) -> Option<u32> {
        self.input_size
            .filter(|s| *s > 0)
            .or(self.input_size_camel.filter(|s| *s > 0))
    }

    /// Expected model hash, lowercased, ignoring blank entries.
    pub fn expected_sha256(&self) -> Option<String> {
        non_blank(self.model_sha256.as_deref()).map(|h| h.to_ascii_lowercase())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Result of checking the model file against the manifest hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Integrity {
    /// No expected hash, or no model to hash.
    Unchecked,
    Verified { sha256: String },
    Mismatch { expected: String, actual: String },
}

impl Integrity {
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Integrity::Mismatch { .. })
    }
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Resolved model files and metadata for one model directory.
#[derive(Debug, Clone)]
pub struct ModelAssets {
    pub dir: PathBuf,
    pub manifest: Option<ModelManifest>,
    pub model_path: Option<PathBuf>,
    pub stage0_path: Option<PathBuf>,
    pub labels: Vec<String>,
    pub temperature: f32,
    pub input_size: u32,
    pub integrity: Integrity,
}

impl ModelAssets {
    /// Resolve the assets in `dir`.
    pub fn load(dir: &Path, manifest_name: &str) -> Self {
        let manifest = load_manifest(&dir.join(manifest_name));

        let model_path = pick_model(dir, manifest.as_ref());
        let stage0_path = STAGE0_MODEL_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file());

        let labels = match manifest.as_ref().filter(|m| !m.classes.is_empty()) {
            Some(m) => m.classes.clone(),
            None => load_labels(&dir.join(LABELS_FILE_NAME)),
        };

        let input_size = manifest
            .as_ref()
            .and_then(ModelManifest::declared_input_size)
            .unwrap_or(DEFAULT_INPUT_SIZE);

        let expected_sha256 = manifest.as_ref().and_then(ModelManifest::expected_sha256);
        let integrity = match (&model_path, expected_sha256) {
            (Some(path), Some(expected)) => check_integrity(path, expected),
            _ => Integrity::Unchecked,
        };
        if let Integrity::Mismatch { expected, actual } = &integrity {
            warn!(expected = %expected, actual = %actual, "model hash does not match manifest");
        }

        let temperature = load_temperature(&dir.join(CALIBRATION_FILE_NAME));

        debug!(
            dir = %dir.display(),
            model = ?model_path,
            stage0 = ?stage0_path,
            labels = labels.len(),
            input_size,
            temperature,
            "resolved model assets"
        );

        Self {
            dir: dir.to_path_buf(),
            manifest,
            model_path,
            stage0_path,
            labels,
            temperature,
            input_size,
            integrity,
        }
    }

    pub fn normalization(&self) -> Option<&Normalization> {
        self.manifest
            .as_ref()
            .and_then(|m| m.normalization.as_ref())
            .filter(|n| n.is_usable())
    }

    pub fn model_version(&self) -> Option<&str> {
        self.manifest.as_ref().and_then(|m| m.model_version.as_deref())
    }

    pub fn model_name(&self) -> Option<String> {
        self.model_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
    }
}

fn load_manifest(path: &Path) -> Option<ModelManifest> {
    if !path.is_file() {
        return None;
    }
    let parsed = read_to_string_limited(path).and_then(|text| ModelManifest::parse(&text));
    match parsed {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable model manifest");
            None
        }
    }
}

fn pick_model(dir: &Path, manifest: Option<&ModelManifest>) -> Option<PathBuf> {
    manifest
        .and_then(ModelManifest::model_file_name)
        .into_iter()
        .chain(MODEL_FALLBACK_NAMES)
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Non-blank trimmed lines of a labels file; empty when unreadable.
pub fn load_labels(path: &Path) -> Vec<String> {
    match read_to_string_limited(path) {
        Ok(text) => text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no labels file");
            Vec::new()
        }
    }
}

/// Calibration temperature from `temperature` or `T`; 1.0 when unusable.
pub fn load_temperature(path: &Path) -> f32 {
    let value = read_to_string_limited(path)
        .ok()
        .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
        .and_then(|json| {
            json.get("temperature")
                .or_else(|| json.get("T"))
                .and_then(serde_json::Value::as_f64)
        });
    match value {
        Some(t) if t.is_finite() && t > 0.0 => t as f32,
        _ => 1.0,
    }
}

fn check_integrity(path: &Path, expected: String) -> Integrity {
    match fs::read(path) {
        Ok(bytes) => {
            let actual = sha256_hex(&bytes);
            if actual == expected {
                Integrity::Verified { sha256: actual }
            } else {
                Integrity::Mismatch { expected, actual }
            }
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot hash model file");
            Integrity::Unchecked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = "leafsense_model.json";

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_empty_dir_has_no_assets() {
        let dir = TempDir::new().unwrap();
        let assets = ModelAssets::load(dir.path(), MANIFEST);
        assert!(assets.manifest.is_none());
        assert!(assets.model_path.is_none());
        assert!(assets.stage0_path.is_none());
        assert!(assets.labels.is_empty());
        assert_eq!(assets.input_size, DEFAULT_INPUT_SIZE);
        assert_eq!(assets.temperature, 1.0);
        assert_eq!(assets.integrity, Integrity::Unchecked);
    }

    #[test]
    fn test_manifest_model_file_wins() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("model_fp32.tflite"), b"fp32").unwrap();
        fs::write(dir.path().join("custom.tflite"), b"custom").unwrap();
        fs::write(
            dir.path().join(MANIFEST),
            r#"{"modelFile": "custom.tflite", "inputSize": 192}"#,
        )
        .unwrap();

        let assets = ModelAssets::load(dir.path(), MANIFEST);
        assert_eq!(assets.model_name().as_deref(), Some("custom.tflite"));
        assert_eq!(assets.input_size, 192);
    }

    #[test]
    fn test_fallback_priority() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("leafsense_model.tflite"), b"legacy").unwrap();
        fs::write(dir.path().join("model_int8_dynamic.tflite"), b"dyn").unwrap();
        fs::write(dir.path().join("model_fp32.tflite"), b"fp32").unwrap();

        let assets = ModelAssets::load(dir.path(), MANIFEST);
        assert_eq!(assets.model_name().as_deref(), Some("model_int8_dynamic.tflite"));
    }

    #[test]
    fn test_missing_manifest_model_falls_back() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("leafsense_model.tflite"), b"legacy").unwrap();
        fs::write(dir.path().join(MANIFEST), r#"{"model_file": "gone.tflite"}"#).unwrap();

        let assets = ModelAssets::load(dir.path(), MANIFEST);
        assert_eq!(assets.model_name().as_deref(), Some("leafsense_model.tflite"));
    }

    #[test]
    fn test_malformed_manifest_is_absent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MANIFEST), "{not json").unwrap();
        let assets = ModelAssets::load(dir.path(), MANIFEST);
        assert!(assets.manifest.is_none());
    }

    #[test]
    fn test_manifest_classes_beat_labels_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(LABELS_FILE_NAME), "healthy\noverwatering\n").unwrap();
        fs::write(dir.path().join(MANIFEST), r#"{"classes": ["HEALTHY", "HEAT_STRESS"]}"#).unwrap();

        let assets = ModelAssets::load(dir.path(), MANIFEST);
        assert_eq!(assets.labels, vec!["HEALTHY", "HEAT_STRESS"]);
    }

    #[test]
    fn test_labels_file_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(LABELS_FILE_NAME), "  healthy \n\n\noverwatering\n  \n").unwrap();
        let assets = ModelAssets::load(dir.path(), MANIFEST);
        assert_eq!(assets.labels, vec!["healthy", "overwatering"]);
    }

    #[test]
    fn test_temperature_keys_and_fallback() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CALIBRATION_FILE_NAME);

        fs::write(&path, r#"{"temperature": 1.5}"#).unwrap();
        assert_eq!(load_temperature(&path), 1.5);

        fs::write(&path, r#"{"T": 2.0}"#).unwrap();
        assert_eq!(load_temperature(&path), 2.0);

        fs::write(&path, r#"{"temperature": -3}"#).unwrap();
        assert_eq!(load_temperature(&path), 1.0);

        fs::write(&path, r#"{"temperature": 0}"#).unwrap();
        assert_eq!(load_temperature(&path), 1.0);

        fs::write(&path, "garbage").unwrap();
        assert_eq!(load_temperature(&path), 1.0);
    }

    #[test]
    fn test_integrity_verified_and_mismatch() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("model_fp32.tflite"), b"abc").unwrap();
        fs::write(
            dir.path().join(MANIFEST),
            concat!(
                r#"{"model_sha256": "#,
                r#""BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"}"#,
            ),
        )
        .unwrap();
        let assets = ModelAssets::load(dir.path(), MANIFEST);
        assert!(matches!(assets.integrity, Integrity::Verified { .. }));

        fs::write(dir.path().join(MANIFEST), r#"{"model_sha256": "00ff"}"#).unwrap();
        let assets = ModelAssets::load(dir.path(), MANIFEST);
        assert!(assets.integrity.is_mismatch());
    }

    #[test]
    fn test_stage0_model_discovered() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("cannabis_filter_fp32.tflite"), b"s0").unwrap();
        let assets = ModelAssets::load(dir.path(), MANIFEST);
        assert_eq!(
            assets.stage0_path,
            Some(dir.path().join("cannabis_filter_fp32.tflite"))
        );
    }

    #[test]
    fn test_normalization_usability() {
        let good = Normalization {
            mean: vec![0.485, 0.456, 0.406],
            std: vec![0.229, 0.224, 0.225],
        };
        assert!(good.is_usable());

        let zero_std = Normalization {
            mean: vec![0.5; 3],
            std: vec![0.5, 0.0, 0.5],
        };
        assert!(!zero_std.is_usable());

        let short = Normalization {
            mean: vec![0.5; 2],
            std: vec![0.5; 3],
        };
        assert!(!short.is_usable());

        let nan = Normalization {
            mean: vec![0.5, f32::NAN, 0.5],
            std: vec![0.5; 3],
        };
        assert!(!nan.is_usable());
    }

    #[test]
    fn test_knowledge_block_parses() {
        let manifest = ModelManifest::parse(
            r#"{"model_version": "v3", "knowledge": {
                "kb_version": "2", "merged_file": "kb.jsonl", "entry_count": 42
            }}"#,
        )
        .unwrap();
        let kb = manifest.knowledge.unwrap();
        assert_eq!(kb.merged_file.as_deref(), Some("kb.jsonl"));
        assert_eq!(kb.entry_count, Some(42));
        assert_eq!(manifest.model_version.as_deref(), Some("v3"));
    }
}
