//! Analyze command for growtrack.
//!
//! Runs the leaf analyzer on one image and, for real (non-placeholder)
//! results, derives care tips, looks up related knowledge base entries and
//! appends a record to the scan history.

use std::path::Path;

use serde::Serialize;

use crate::config::AnalyzerConfig;
use crate::inference::knowledge::{KnowledgeHit, DEFAULT_QUERY_LIMIT};
use crate::inference::recommend::{self, Recommendation};
use crate::inference::{
    Analysis, Integrity, KnowledgeBase, LeafAnalyzer, LeafResult, PipelineMode, ScanHistory,
    ScanRecord,
};

/// Options for the analyze command.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Do not write a scan record.
    pub no_record: bool,
}

/// Output format for the analyze command.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeOutput {
    /// Whether the image was analyzed.
    pub success: bool,
    pub image: String,
    pub pipeline_mode: PipelineMode,
    /// No model was loaded; results are the fixed placeholder.
    pub placeholder: bool,
    /// The stage-0 filter did not see a cannabis leaf.
    pub rejected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage0_probability: Option<f32>,
    pub results: Vec<LeafResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<Recommendation>,
    /// Knowledge base entries related to the top result.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub knowledge: Vec<KnowledgeHit>,
    pub integrity: Integrity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Id of the stored scan record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_id: Option<String>,
    /// Error message if analysis failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The analyze command implementation.
pub struct AnalyzeCommand {
    analyzer: LeafAnalyzer,
    history: Option<ScanHistory>,
    knowledge: Option<KnowledgeBase>,
    confidence_threshold: f32,
}

impl AnalyzeCommand {
    /// Create a new analyze command. Without a history, scans are not recorded.
    pub fn new(analyzer: LeafAnalyzer, history: Option<ScanHistory>) -> Self {
        Self {
            analyzer,
            history,
            knowledge: None,
            confidence_threshold: AnalyzerConfig::default().confidence_threshold,
        }
    }

    /// Look up related entries in `knowledge`.
    pub fn with_knowledge(mut self, knowledge: Option<KnowledgeBase>) -> Self {
        self.knowledge = knowledge;
        self
    }

    /// Minimum result confidence for care tips.
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Analyze the image at `path`.
    pub fn run(&self, path: &Path, options: &AnalyzeOptions) -> AnalyzeOutput {
        let assets = self.analyzer.assets();
        let mut output = AnalyzeOutput {
            success: false,
            image: path.display().to_string(),
            pipeline_mode: self.analyzer.pipeline_mode(),
            placeholder: false,
            rejected: false,
            stage0_probability: None,
            results: Vec::new(),
            recommendations: Vec::new(),
            knowledge: Vec::new(),
            integrity: assets.integrity.clone(),
            model_name: assets.model_name(),
            scan_id: None,
            error: None,
        };

        let analysis = match self.analyzer.analyze_path(path) {
            Ok(analysis) => analysis,
            Err(e) => {
                output.error = Some(e.to_string());
                return output;
            }
        };

        if !options.no_record {
            output.scan_id = self.record(path, &analysis);
        }

        output.success = true;
        output.pipeline_mode = analysis.pipeline_mode;
        output.placeholder = analysis.placeholder;
        output.rejected = analysis.rejected;
        output.stage0_probability = analysis.stage0_probability;
        if !analysis.placeholder && !analysis.rejected {
            output.recommendations =
                recommend::generate(&analysis.results, self.confidence_threshold);
            if let (Some(kb), Some(top)) = (&self.knowledge, analysis.top()) {
                output.knowledge = kb.query(&top.label, DEFAULT_QUERY_LIMIT);
            }
        }
        output.results = analysis.results;
        output
    }

    /// Store a scan record. History failures are logged, not fatal.
    fn record(&self, path: &Path, analysis: &Analysis) -> Option<String> {
        let history = self.history.as_ref()?;
        if analysis.placeholder {
            return None;
        }
        let file_name = path.file_name().map(|n| n.to_string_lossy().to_string());
        let record = ScanRecord::from_analysis(analysis, self.analyzer.assets(), file_name)?;
        match history.record(&record) {
            Ok(()) => Some(record.id),
            Err(e) => {
                tracing::warn!("failed to record scan: {}", e);
                None
            }
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &AnalyzeOutput, options: &AnalyzeOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &AnalyzeOutput) -> String {
        if !output.success {
            return format!(
                "Analysis failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut lines = Vec::new();
        if output.placeholder {
            lines.push("No leaf model is installed; showing placeholder results.".to_string());
        }
        if output.integrity.is_mismatch() {
            lines.push("Warning: model file does not match its manifest hash.".to_string());
        }
        if let Some(p) = output.stage0_probability {
            lines.push(format!("Leaf filter: {:.0}%", p * 100.0));
        }
        for result in &output.results {
            lines.push(format!(
                "  {:>5.1}%  {} ({})",
                result.confidence * 100.0,
                result.label,
                result.category
            ));
        }
        if !output.recommendations.is_empty() {
            lines.push("Recommendations:".to_string());
            for rec in &output.recommendations {
                lines.push(format!("  [{}] {}: {}", rec.priority, rec.title, rec.message));
            }
        }
        if !output.knowledge.is_empty() {
            lines.push("Related questions:".to_string());
            for hit in &output.knowledge {
                lines.push(format!("  {}", hit.entry.question));
            }
        }
        if let Some(id) = &output.scan_id {
            lines.push(format!("Saved scan {}", id));
        }
        lines.join("\n") + "\n"
    }
}
