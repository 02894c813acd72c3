//! Import command for growtrack.
//!
//! Reads a legacy journal export (a JSON array of plants, or of growboxes
//! with nested plants) into the journal.

use std::path::Path;

use serde::Serialize;

use crate::core::{ImportReport, Journal};
use crate::error::Result;
use crate::storage::JournalStore;
use crate::util::read_to_string_limited;

/// Options for the import command.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the import command.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportOutput {
    /// Whether the file was imported.
    pub success: bool,
    pub plants_added: usize,
    pub plants_existing: usize,
    pub growboxes_added: usize,
    pub invalid: usize,
    /// Error message if the import failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ImportReport> for ImportOutput {
    fn from(report: ImportReport) -> Self {
        Self {
            success: true,
            plants_added: report.plants_added,
            plants_existing: report.plants_existing,
            growboxes_added: report.growboxes_added,
            invalid: report.invalid,
            error: None,
        }
    }
}

impl ImportOutput {
    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// The import command implementation.
pub struct ImportCommand<S: JournalStore> {
    journal: Journal<S>,
}

impl<S: JournalStore> ImportCommand<S> {
    /// Create a new import command.
    pub fn new(journal: Journal<S>) -> Self {
        Self { journal }
    }

    /// Import the legacy export at `path`.
    pub fn run(&self, path: &Path) -> ImportOutput {
        match self.import(path) {
            Ok(report) => report.into(),
            Err(e) => ImportOutput::failure(e.to_string()),
        }
    }

    fn import(&self, path: &Path) -> Result<ImportReport> {
        let json = read_to_string_limited(path)?;
        self.journal.import_legacy(&json)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ImportOutput, options: &ImportOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &ImportOutput) -> String {
        if !output.success {
            return format!(
                "Import failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut text = format!(
            "Imported {} plant(s) and {} growbox(es).\n",
            output.plants_added, output.growboxes_added
        );
        if output.plants_existing > 0 {
            text.push_str(&format!(
                "Skipped {} plant(s) already in the journal.\n",
                output.plants_existing
            ));
        }
        if output.invalid > 0 {
            text.push_str(&format!("Skipped {} unreadable record(s).\n", output.invalid));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StrainCatalog;
    use crate::storage::FileJournalStore;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ImportCommand<FileJournalStore>) {
        let dir = TempDir::new().unwrap();
        let store = FileJournalStore::with_dir(dir.path().join("data")).unwrap();
        let cmd = ImportCommand::new(Journal::new(store, StrainCatalog::builtin()));
        (dir, cmd)
    }

    #[test]
    fn test_import_nested_growboxes() {
        let (dir, cmd) = setup();
        let path = dir.path().join("export.json");
        fs::write(
            &path,
            r#"[
                {"id": "g1", "name": "Tent", "lightPower": "240W", "plants": [
                    {"id": "p1", "name": "Lemon", "plantingDate": 1735689600000,
                     "manufacturer": "Royal Queen Seeds", "strain": "Amnesia Haze"}
                ]},
                {"id": "g2", "name": "Closet", "plants": []}
            ]"#,
        )
        .unwrap();

        let output = cmd.run(&path);
        assert!(output.success, "{:?}", output.error);
        assert_eq!(output.plants_added, 1);
        assert_eq!(output.growboxes_added, 2);

        let store = FileJournalStore::with_dir(dir.path().join("data")).unwrap();
        let journal = Journal::new(store, StrainCatalog::builtin());
        assert_eq!(journal.plant("p1").unwrap().thc_content, "22");
        assert_eq!(journal.growbox("g1").unwrap().plant_ids, vec!["p1"]);
    }

    #[test]
    fn test_import_twice_skips_existing() {
        let (dir, cmd) = setup();
        let path = dir.path().join("plants.json");
        fs::write(&path, r#"[{"id": "p1", "name": "A"}, {"id": "p2", "name": "B"}, 42]"#).unwrap();

        let first = cmd.run(&path);
        assert_eq!(first.plants_added, 2);
        assert_eq!(first.invalid, 1);

        let second = cmd.run(&path);
        assert_eq!(second.plants_added, 0);
        assert_eq!(second.plants_existing, 2);

        let text = cmd.format_output(&second, &ImportOptions::default());
        assert!(text.contains("Skipped 2 plant(s) already in the journal."));
    }

    #[test]
    fn test_import_rejects_non_array() {
        let (dir, cmd) = setup();
        let path = dir.path().join("object.json");
        fs::write(&path, r#"{"plants": []}"#).unwrap();
        let output = cmd.run(&path);
        assert!(!output.success);
    }

    #[test]
    fn test_import_missing_file() {
        let (dir, cmd) = setup();
        let output = cmd.run(&dir.path().join("missing.json"));
        assert!(!output.success);
        assert!(cmd
            .format_output(&output, &ImportOptions::default())
            .starts_with("Import failed:"));
    }
}
