//! Scan history.
//!
//! Each analyzed image produces one JSON record under
//! `<data_dir>/scans/<id>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GrowError, Result};
use crate::inference::analyzer::{Analysis, PipelineMode};
use crate::inference::manifest::ModelAssets;
use crate::util::{new_id, now_millis, read_to_string_limited, validate_id, write_atomic};

/// One stored scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Readable label of the top result.
    pub label: String,
    pub confidence: f32,
    #[serde(default)]
    pub pipeline_mode: PipelineMode,
    #[serde(default)]
    pub stage0_probability: Option<f32>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub model_version: Option<String>,
    #[serde(default)]
    pub image_file_name: Option<String>,
}

impl ScanRecord {
    /// Build a record from the top result of `analysis`.
    ///
    /// Returns `None` when the analysis has no results.
    pub fn from_analysis(
        analysis: &Analysis,
        assets: &ModelAssets,
        image_file_name: Option<String>,
    ) -> Option<Self> {
        let top = analysis.top()?;
        Some(Self {
            id: new_id(),
            timestamp: now_millis(),
            label: top.label.clone(),
            confidence: top.confidence,
            pipeline_mode: analysis.pipeline_mode,
            stage0_probability: analysis.stage0_probability,
            model_name: assets.model_name(),
            model_version: assets.model_version().map(String::from),
            image_file_name,
        })
    }
}

/// Directory of scan records.
#[derive(Debug, Clone)]
pub struct ScanHistory {
    dir: PathBuf,
}

impl ScanHistory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `record`, creating the directory on first use.
    pub fn record(&self, record: &ScanRecord) -> Result<()> {
        validate_id(&record.id)?;
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| GrowError::storage(&self.dir, e))?;
        }
        let path = self.dir.join(format!("{}.json", record.id));
        let json = serde_json::to_string_pretty(record)?;
        write_atomic(&path, json.as_bytes())
    }

    /// The record with `id`.
    pub fn get(&self, id: &str) -> Result<ScanRecord> {
        validate_id(id)?;
        let path = self.dir.join(format!("{}.json", id));
        if !path.is_file() {
            return Err(GrowError::not_found("scan", id));
        }
        let content = read_to_string_limited(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Up to `limit` records, newest first. Unreadable files are skipped.
    pub fn recent(&self, limit: usize) -> Result<Vec<ScanRecord>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| GrowError::storage(&self.dir, e))?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| GrowError::storage(&self.dir, e))?;
            let path = entry.path();
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            let hidden = path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with('.'))
                .unwrap_or(true);
            if hidden {
                continue;
            }

            let decoded = read_to_string_limited(&path).and_then(|content| {
                serde_json::from_str::<ScanRecord>(&content).map_err(GrowError::from)
            });
            match decoded {
                Ok(record) => records.push(record),
                Err(err) => tracing::debug!("skipping scan record {}: {}", path.display(), err),
            }
        }

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        records.truncate(limit);
        Ok(records)
    }

    /// Delete every stored scan.
    pub fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir).map_err(|e| GrowError::storage(&self.dir, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn scan(id: &str, minutes: i64) -> ScanRecord {
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        ScanRecord {
            id: id.to_string(),
            timestamp: base + Duration::minutes(minutes),
            label: "Healthy".to_string(),
            confidence: 0.9,
            pipeline_mode: PipelineMode::Direct,
            stage0_probability: None,
            model_name: Some("model_fp32.tflite".to_string()),
            model_version: None,
            image_file_name: None,
        }
    }

    #[test]
    fn test_recent_newest_first() {
        let dir = TempDir::new().unwrap();
        let history = ScanHistory::new(dir.path().join("scans"));

        history.record(&scan("a", 0)).unwrap();
        history.record(&scan("b", 10)).unwrap();
        history.record(&scan("c", 5)).unwrap();

        let ids: Vec<_> = history.recent(10).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        let ids: Vec<_> = history.recent(2).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_recent_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let history = ScanHistory::new(dir.path().join("never"));
        assert!(history.recent(5).unwrap().is_empty());
    }

    #[test]
    fn test_recent_skips_unreadable() {
        let dir = TempDir::new().unwrap();
        let history = ScanHistory::new(dir.path());
        history.record(&scan("good", 0)).unwrap();
        fs::write(dir.path().join("bad.json"), "{").unwrap();
        fs::write(dir.path().join(".tmp.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let records = history.recent(10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], scan("good", 0));
    }

    #[test]
    fn test_record_rejects_bad_id() {
        let dir = TempDir::new().unwrap();
        let history = ScanHistory::new(dir.path());
        assert!(history.record(&scan("../escape", 0)).is_err());
    }

    #[test]
    fn test_get_by_id() {
        let dir = TempDir::new().unwrap();
        let history = ScanHistory::new(dir.path());
        history.record(&scan("a", 0)).unwrap();

        assert_eq!(history.get("a").unwrap(), scan("a", 0));
        assert!(history.get("b").unwrap_err().is_not_found());
        assert!(history.get("../a").is_err());
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let history = ScanHistory::new(dir.path().join("scans"));
        history.record(&scan("a", 0)).unwrap();
        history.clear().unwrap();
        assert!(history.recent(10).unwrap().is_empty());
    }

    #[test]
    fn test_from_analysis_uses_top_result() {
        use crate::inference::analyzer::LeafAnalyzer;

        let dir = TempDir::new().unwrap();
        let assets = ModelAssets::load(dir.path(), "leafsense_model.json");
        let analysis = LeafAnalyzer::placeholder(PipelineMode::TwoStage);

        let record =
            ScanRecord::from_analysis(&analysis, &assets, Some("leaf.jpg".to_string())).unwrap();
        assert_eq!(record.label, "(model not loaded)");
        assert_eq!(record.pipeline_mode, PipelineMode::TwoStage);
        assert_eq!(record.image_file_name.as_deref(), Some("leaf.jpg"));
        assert!(record.model_name.is_none());
    }
}
