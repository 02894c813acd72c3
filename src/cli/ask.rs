//! Ask command for growtrack.
//!
//! Searches the knowledge base shipped with the leaf model.

use serde::Serialize;

use crate::inference::knowledge::{KnowledgeHit, DEFAULT_QUERY_LIMIT};
use crate::inference::KnowledgeBase;

/// Options for the ask command.
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Maximum number of answers.
    pub limit: Option<usize>,
}

/// Output format for the ask command.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AskOutput {
    /// Whether a knowledge base was available.
    pub success: bool,
    pub query: String,
    pub hits: Vec<KnowledgeHit>,
    /// Error message if the lookup failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The ask command implementation.
pub struct AskCommand {
    knowledge: Option<KnowledgeBase>,
}

impl AskCommand {
    /// Create a new ask command. Without a knowledge base every query fails.
    pub fn new(knowledge: Option<KnowledgeBase>) -> Self {
        Self { knowledge }
    }

    /// Look up `query`.
    pub fn run(&self, query: &str, options: &AskOptions) -> AskOutput {
        let mut output = AskOutput {
            query: query.to_string(),
            ..AskOutput::default()
        };
        match &self.knowledge {
            Some(kb) => {
                output.success = true;
                output.hits = kb.query(query, options.limit.unwrap_or(DEFAULT_QUERY_LIMIT));
            }
            None => {
                output.error = Some(
                    "no knowledge base installed; the model manifest must name one".to_string(),
                );
            }
        }
        output
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &AskOutput, options: &AskOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &AskOutput) -> String {
        if !output.success {
            return format!(
                "Cannot search: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }
        if output.hits.is_empty() {
            return format!("Nothing found for '{}'.\n", output.query);
        }

        let mut text = String::new();
        for hit in &output.hits {
            let entry = &hit.entry;
            let heading = if entry.question.trim().is_empty() {
                entry.category.as_deref().unwrap_or("Note")
            } else {
                entry.question.as_str()
            };
            text.push_str(&format!("{}\n  {}\n", heading, entry.answer));
        }
        text
    }
}
