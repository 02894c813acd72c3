//! User feedback on leaf scans.
//!
//! Records are appended as JSON Lines to `<dir>/records.jsonl`. An optional
//! copy of the analyzed image goes to `<dir>/images/<id>.<ext>`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GrowError, Result};
use crate::inference::analyzer::PipelineMode;
use crate::inference::history::ScanRecord;
use crate::util::{new_id, now_millis, read_to_string_limited, validate_id};

/// File name of the feedback log.
pub const RECORDS_FILE_NAME: &str = "records.jsonl";

const IMAGES_DIR_NAME: &str = "images";

/// Why a result was corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackReason {
    WrongClass,
    LowConfidence,
    MultipleIssues,
    Other,
}

/// One piece of feedback on an analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub id: String,
    #[serde(rename = "timestampEpochMs", with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer_model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer_model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FeedbackReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_note: Option<String>,
    /// The user confirmed the original result.
    #[serde(default)]
    pub was_confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_mode: Option<PipelineMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage0_probability: Option<f32>,
}

impl FeedbackRecord {
    /// Empty feedback with a fresh id, dated now.
    pub fn new() -> Self {
        Self {
            id: new_id(),
            timestamp: now_millis(),
            analyzer_model_name: None,
            analyzer_model_version: None,
            original_label: None,
            original_confidence: None,
            corrected_label: None,
            reason: None,
            user_note: None,
            was_confirmed: false,
            image_file_name: None,
            pipeline_mode: None,
            stage0_probability: None,
        }
    }

    /// Feedback on a stored scan, carrying over its result and model.
    pub fn for_scan(scan: &ScanRecord) -> Self {
        Self {
            analyzer_model_name: scan.model_name.clone(),
            analyzer_model_version: scan.model_version.clone(),
            original_label: Some(scan.label.clone()),
            original_confidence: Some(scan.confidence),
            image_file_name: scan.image_file_name.clone(),
            pipeline_mode: Some(scan.pipeline_mode),
            stage0_probability: scan.stage0_probability,
            ..Self::new()
        }
    }

    /// Confirmation of the original result.
    pub fn confirm(mut self) -> Self {
        self.was_confirmed = true;
        self.corrected_label = None;
        self.reason = None;
        self
    }

    /// Correction to `label`.
    pub fn correct(mut self, label: impl Into<String>, reason: FeedbackReason) -> Self {
        self.was_confirmed = false;
        self.corrected_label = Some(label.into());
        self.reason = Some(reason);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.user_note = (!note.trim().is_empty()).then_some(note);
        self
    }
}

impl Default for FeedbackRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Append-only feedback log.
#[derive(Debug, Clone)]
pub struct FeedbackLog {
    dir: PathBuf,
}

impl FeedbackLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the JSON Lines log.
    pub fn path(&self) -> PathBuf {
        self.dir.join(RECORDS_FILE_NAME)
    }

    /// Append `record` as one line, creating the directory on first use.
    pub fn append(&self, record: &FeedbackRecord) -> Result<()> {
        validate_id(&record.id)?;
        fs::create_dir_all(&self.dir).map_err(|e| GrowError::storage(&self.dir, e))?;

        let json = serde_json::to_string(record)?;
        let path = self.path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| GrowError::storage(&path, e))?;
        writeln!(file, "{}", json).map_err(|e| GrowError::storage(&path, e))?;
        Ok(())
    }

    /// Copy the analyzed image next to the log as `images/<id>.<ext>`.
    pub fn attach_image(&self, record_id: &str, image: &Path) -> Result<PathBuf> {
        validate_id(record_id)?;
        let images = self.dir.join(IMAGES_DIR_NAME);
        fs::create_dir_all(&images).map_err(|e| GrowError::storage(&images, e))?;

        let ext = image
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("jpg");
        let target = images.join(format!("{}.{}", record_id, ext.to_lowercase()));
        fs::copy(image, &target).map_err(|e| GrowError::storage(image, e))?;
        Ok(target)
    }

    /// Every record in the log, oldest first. Malformed lines are skipped.
    pub fn read_all(&self) -> Result<Vec<FeedbackRecord>> {
        let path = self.path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = read_to_string_limited(&path)?;

        let mut records = Vec::new();
        for (line_num, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<FeedbackRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => tracing::debug!("skipping feedback line {}: {}", line_num + 1, e),
            }
        }
        Ok(records)
    }

    /// Up to `limit` records, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<FeedbackRecord>> {
        let mut records = self.read_all()?;
        records.reverse();
        records.truncate(limit);
        Ok(records)
    }
}
