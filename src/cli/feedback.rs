//! Feedback command for growtrack.
//!
//! Confirms or corrects the result of a stored scan and lists the feedback
//! given so far.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{FailOpen, GrowError, Result};
use crate::inference::{FeedbackLog, FeedbackReason, FeedbackRecord, ScanHistory};

/// Options for the feedback command.
#[derive(Debug, Clone, Default)]
pub struct FeedbackOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Maximum number of records to list.
    pub limit: Option<usize>,
}

/// What the user says about a scan.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Confirm,
    Correct {
        label: String,
        reason: FeedbackReason,
    },
}

/// Input for a new feedback record.
#[derive(Debug, Clone)]
pub struct FeedbackInput {
    /// Stored scan the feedback refers to.
    pub scan_id: String,
    pub verdict: Verdict,
    pub note: Option<String>,
    /// Image to keep alongside the record.
    pub image: Option<PathBuf>,
}

/// Output format for the feedback command.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedbackOutput {
    /// Whether the operation succeeded.
    pub success: bool,
    pub records: Vec<FeedbackRecord>,
    /// Path of the stored image copy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    /// Error message if the operation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FeedbackOutput {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// The feedback command implementation.
pub struct FeedbackCommand {
    log: FeedbackLog,
    history: ScanHistory,
}

impl FeedbackCommand {
    /// Create a new feedback command.
    pub fn new(log: FeedbackLog, history: ScanHistory) -> Self {
        Self { log, history }
    }

    /// Record feedback on a stored scan.
    pub fn add(&self, input: FeedbackInput) -> FeedbackOutput {
        match self.try_add(input) {
            Ok((record, image_path)) => FeedbackOutput {
                success: true,
                records: vec![record],
                image_path,
                error: None,
            },
            Err(e) => FeedbackOutput::failure(e.to_string()),
        }
    }

    fn try_add(&self, input: FeedbackInput) -> Result<(FeedbackRecord, Option<String>)> {
        let scan = self.history.get(&input.scan_id)?;
        let mut record = FeedbackRecord::for_scan(&scan);
        record = match input.verdict {
            Verdict::Confirm => record.confirm(),
            Verdict::Correct { label, reason } => {
                if label.trim().is_empty() {
                    return Err(GrowError::invalid_input("corrected label must not be empty"));
                }
                record.correct(label.trim(), reason)
            }
        };
        if let Some(note) = input.note {
            record = record.with_note(note);
        }

        // The image copy is optional; the record is what matters.
        let image_path = input.image.and_then(|image| {
            self.log
                .attach_image(&record.id, &image)
                .map(|p| Some(p.display().to_string()))
                .fail_open_default("copying feedback image")
        });

        self.log.append(&record)?;
        Ok((record, image_path))
    }

    /// List recent feedback, newest first.
    pub fn list(&self, options: &FeedbackOptions) -> FeedbackOutput {
        match self.log.recent(options.limit.unwrap_or(20)) {
            Ok(records) => FeedbackOutput {
                success: true,
                records,
                ..FeedbackOutput::default()
            },
            Err(e) => FeedbackOutput::failure(e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &FeedbackOutput, options: &FeedbackOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &FeedbackOutput) -> String {
        if !output.success {
            return format!(
                "Feedback failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }
        if output.records.is_empty() {
            return "No feedback recorded.\n".to_string();
        }

        let mut text = String::new();
        for record in &output.records {
            let original = record.original_label.as_deref().unwrap_or("?");
            let verdict = match (&record.corrected_label, record.was_confirmed) {
                (_, true) => "confirmed".to_string(),
                (Some(label), false) => format!("corrected to {}", label),
                (None, false) => "no verdict".to_string(),
            };
            text.push_str(&format!(
                "  {} {}: {}",
                record.timestamp.format("%Y-%m-%d %H:%M"),
                original,
                verdict
            ));
            if let Some(note) = &record.user_note {
                text.push_str(&format!(" ({})", note));
            }
            text.push('\n');
        }
        if let Some(path) = &output.image_path {
            text.push_str(&format!("Image saved to {}\n", path));
        }
        text
    }
}
