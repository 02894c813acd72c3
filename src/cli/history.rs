//! History command for growtrack.
//!
//! Lists stored leaf scans, newest first.

use serde::Serialize;

use crate::inference::{ScanHistory, ScanRecord};

/// Options for the history command.
#[derive(Debug, Clone, Default)]
pub struct HistoryOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Maximum number of scans to show.
    pub limit: Option<usize>,
}

/// Output format for the history command.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryOutput {
    /// Whether the history could be read.
    pub success: bool,
    pub scans: Vec<ScanRecord>,
    /// Error message if reading failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The history command implementation.
pub struct HistoryCommand {
    history: ScanHistory,
}

impl HistoryCommand {
    /// Create a new history command.
    pub fn new(history: ScanHistory) -> Self {
        Self { history }
    }

    /// List recent scans.
    pub fn run(&self, options: &HistoryOptions) -> HistoryOutput {
        match self.history.recent(options.limit.unwrap_or(20)) {
            Ok(scans) => HistoryOutput {
                success: true,
                scans,
                error: None,
            },
            Err(e) => HistoryOutput {
                error: Some(e.to_string()),
                ..HistoryOutput::default()
            },
        }
    }

    /// Delete every stored scan.
    pub fn clear(&self) -> HistoryOutput {
        match self.history.clear() {
            Ok(()) => HistoryOutput {
                success: true,
                ..HistoryOutput::default()
            },
            Err(e) => HistoryOutput {
                error: Some(e.to_string()),
                ..HistoryOutput::default()
            },
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &HistoryOutput, options: &HistoryOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &HistoryOutput) -> String {
        if !output.success {
            return format!(
                "Cannot read scan history: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }
        if output.scans.is_empty() {
            return "No scans recorded.\n".to_string();
        }

        let mut text = String::new();
        for scan in &output.scans {
            text.push_str(&format!(
                "  {} {} ({:.0}%)",
                scan.timestamp.format("%Y-%m-%d %H:%M"),
                scan.label,
                scan.confidence * 100.0
            ));
            if let Some(name) = &scan.image_file_name {
                text.push_str(&format!(" - {}", name));
            }
            text.push('\n');
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::PipelineMode;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn scan(id: &str, hour: u32, label: &str) -> ScanRecord {
        ScanRecord {
            id: id.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 5, 2, hour, 0, 0).unwrap(),
            label: label.to_string(),
            confidence: 0.88,
            pipeline_mode: PipelineMode::Direct,
            stage0_probability: None,
            model_name: None,
            model_version: None,
            image_file_name: Some(format!("{}.jpg", id)),
        }
    }

    #[test]
    fn test_lists_newest_first_with_limit() {
        let dir = TempDir::new().unwrap();
        let history = ScanHistory::new(dir.path().join("scans"));
        history.record(&scan("a", 8, "Healthy")).unwrap();
        history.record(&scan("b", 10, "Spider Mites")).unwrap();
        history.record(&scan("c", 9, "Heat Stress")).unwrap();
        let cmd = HistoryCommand::new(history);

        let output = cmd.run(&HistoryOptions {
            limit: Some(2),
            ..Default::default()
        });
        assert!(output.success);
        let ids: Vec<&str> = output.scans.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);

        let text = cmd.format_output(&output, &HistoryOptions::default());
        assert!(text.starts_with("  2025-05-02 10:00 Spider Mites (88%) - b.jpg\n"));
    }

    #[test]
    fn test_empty_and_clear() {
        let dir = TempDir::new().unwrap();
        let history = ScanHistory::new(dir.path().join("scans"));
        history.record(&scan("a", 8, "Healthy")).unwrap();
        let cmd = HistoryCommand::new(history);

        assert!(cmd.clear().success);
        let output = cmd.run(&HistoryOptions::default());
        assert!(output.success);
        assert_eq!(
            cmd.format_output(&output, &HistoryOptions::default()),
            "No scans recorded.\n"
        );
    }
}
