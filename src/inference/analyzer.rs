//! Leaf analysis pipeline.
//!
//! The analyzer owns the resolved [`ModelAssets`] and up to two loaded
//! classifiers. Model execution itself sits behind the [`Classifier`] trait;
//! a [`ModelRuntime`] turns model files into classifiers. Without a runtime,
//! or without labels, the analyzer answers with a fixed placeholder.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AnalyzerConfig;
use crate::error::{FailOpen, GrowError, Result};
use crate::inference::labels::{
    category_of, readable_label, LeafCategory, MODEL_NOT_LOADED_LABEL, NO_LEAF_LABEL,
};
use crate::inference::manifest::{ModelAssets, STAGE0_INPUT_SIZE};
use crate::inference::preprocess::{load_image, preprocess};
use crate::inference::softmax::{binary_probability, softmax_with_temperature};

/// Whether images pass through the stage-0 cannabis filter first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    #[default]
    Direct,
    TwoStage,
}

impl PipelineMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineMode::Direct => "direct",
            PipelineMode::TwoStage => "two_stage",
        }
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineMode {
    type Err = GrowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(PipelineMode::Direct),
            "two_stage" | "two-stage" | "twostage" => Ok(PipelineMode::TwoStage),
            other => Err(GrowError::invalid_input(format!(
                "unknown pipeline mode '{}'",
                other
            ))),
        }
    }
}

/// A loaded image classifier.
pub trait Classifier: Send + Sync {
    /// Edge length of the square input the model expects; 0 if unknown.
    fn input_size(&self) -> u32;

    /// Run the model on an HWC f32 tensor and return its raw logits.
    fn run(&self, input: &[f32]) -> Result<Vec<f32>>;
}

/// Loads model files into classifiers.
pub trait ModelRuntime {
    fn load(&self, model_path: &Path) -> Result<Box<dyn Classifier>>;
}

/// One scored diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafResult {
    /// Readable name.
    pub label: String,
    /// Label as emitted by the model.
    pub raw_label: String,
    pub confidence: f32,
    pub category: LeafCategory,
}

impl LeafResult {
    fn new(raw_label: &str, confidence: f32, category: LeafCategory) -> Self {
        Self {
            label: readable_label(raw_label),
            raw_label: raw_label.to_string(),
            confidence: clamp_unit(confidence),
            category,
        }
    }
}

/// Outcome of analyzing one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Sorted by confidence, highest first.
    pub results: Vec<LeafResult>,
    pub pipeline_mode: PipelineMode,
    /// Stage-0 acceptance probability when the filter ran.
    pub stage0_probability: Option<f32>,
    /// The stage-0 filter rejected the image.
    pub rejected: bool,
    /// No model was available; `results` is the fixed placeholder.
    pub placeholder: bool,
}

impl Analysis {
    pub fn top(&self) -> Option<&LeafResult> {
        self.results.first()
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// The leaf analyzer.
pub struct LeafAnalyzer {
    assets: ModelAssets,
    classifier: Option<Box<dyn Classifier>>,
    stage0: Option<Box<dyn Classifier>>,
    config: AnalyzerConfig,
}

impl LeafAnalyzer {
    /// Build an analyzer, loading models through `runtime` when one is given.
    ///
    /// Load failures are logged and leave the analyzer in placeholder mode.
    pub fn new(
        assets: ModelAssets,
        runtime: Option<&dyn ModelRuntime>,
        config: AnalyzerConfig,
    ) -> Self {
        let load = |path: Option<&Path>, what: &str| -> Option<Box<dyn Classifier>> {
            let (runtime, path) = (runtime?, path?);
            match runtime.load(path) {
                Ok(classifier) => {
                    info!(path = %path.display(), "loaded {}", what);
                    Some(classifier)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load {}", what);
                    None
                }
            }
        };

        let classifier = load(assets.model_path.as_deref(), "leaf classifier");
        let stage0 = match config.pipeline_mode {
            PipelineMode::TwoStage => load(assets.stage0_path.as_deref(), "stage-0 filter"),
            PipelineMode::Direct => None,
        };

        Self {
            assets,
            classifier,
            stage0,
            config,
        }
    }

    /// Resolve assets from `model_dir` using the configured manifest name.
    pub fn from_dir(
        model_dir: &Path,
        runtime: Option<&dyn ModelRuntime>,
        config: AnalyzerConfig,
    ) -> Self {
        let assets = ModelAssets::load(model_dir, &config.manifest_name);
        Self::new(assets, runtime, config)
    }

    /// A classifier and labels are both available.
    pub fn is_ready(&self) -> bool {
        self.classifier.is_some() && !self.assets.labels.is_empty()
    }

    pub fn assets(&self) -> &ModelAssets {
        &self.assets
    }

    pub fn pipeline_mode(&self) -> PipelineMode {
        self.config.pipeline_mode
    }

    /// The fixed result returned when no model is loaded.
    pub fn placeholder(mode: PipelineMode) -> Analysis {
        Analysis {
            results: vec![
                LeafResult {
                    label: MODEL_NOT_LOADED_LABEL.to_string(),
                    raw_label: MODEL_NOT_LOADED_LABEL.to_string(),
                    confidence: 0.0,
                    category: LeafCategory::Health,
                },
                LeafResult {
                    label: "Demo Healthy".to_string(),
                    raw_label: "Demo Healthy".to_string(),
                    confidence: 0.75,
                    category: LeafCategory::Health,
                },
            ],
            pipeline_mode: mode,
            stage0_probability: None,
            rejected: false,
            placeholder: true,
        }
    }

    pub fn analyze_path(&self, path: &Path) -> Result<Analysis> {
        let img = load_image(path)?;
        self.analyze(&img)
    }

    pub fn analyze(&self, img: &RgbImage) -> Result<Analysis> {
        let mode = self.config.pipeline_mode;
        let classifier = match &self.classifier {
            Some(c) if !self.assets.labels.is_empty() => c,
            _ => {
                debug!("analyzer not ready, returning placeholder");
                return Ok(Self::placeholder(mode));
            }
        };

        let mut stage0_probability = None;
        if mode == PipelineMode::TwoStage {
            if let Some(stage0) = &self.stage0 {
                // A failing filter lets the image through.
                let accept = self
                    .run_stage0(stage0.as_ref(), img)
                    .fail_open_with("stage-0 filter", 1.0);
                stage0_probability = Some(accept);
                let floor = self.config.stage0_soft_floor.max(self.config.stage0_threshold);
                if accept < floor {
                    debug!(accept, "stage-0 rejected image");
                    return Ok(Analysis {
                        results: vec![LeafResult {
                            label: NO_LEAF_LABEL.to_string(),
                            raw_label: NO_LEAF_LABEL.to_string(),
                            confidence: clamp_unit(accept),
                            category: LeafCategory::Stress,
                        }],
                        pipeline_mode: mode,
                        stage0_probability,
                        rejected: true,
                        placeholder: false,
                    });
                }
            }
        }

        let size = match classifier.input_size() {
            0 => self.assets.input_size,
            n => n,
        };
        let input = preprocess(img, size, self.assets.normalization())?;
        let logits = classifier.run(&input)?;
        if logits.is_empty() {
            return Err(GrowError::inference("classifier returned no scores"));
        }
        let scores = softmax_with_temperature(&logits, self.assets.temperature);

        let mut results: Vec<LeafResult> = self
            .assets
            .labels
            .iter()
            .enumerate()
            .map(|(idx, raw)| {
                let score = scores.get(idx).copied().unwrap_or(0.0);
                LeafResult::new(raw, score, category_of(raw))
            })
            .collect();
        results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        results.truncate(self.config.top_k.max(1));

        Ok(Analysis {
            results,
            pipeline_mode: mode,
            stage0_probability,
            rejected: false,
            placeholder: false,
        })
    }

    fn run_stage0(&self, stage0: &dyn Classifier, img: &RgbImage) -> Result<f32> {
        let size = match stage0.input_size() {
            0 => STAGE0_INPUT_SIZE,
            n => n,
        };
        let input = preprocess(img, size, self.assets.normalization())?;
        let logits = stage0.run(&input)?;
        Ok(binary_probability(&logits))
    }
}

impl fmt::Debug for LeafAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafAnalyzer")
            .field("assets", &self.assets)
            .field("classifier", &self.classifier.is_some())
            .field("stage0", &self.stage0.is_some())
            .field("config", &self.config)
            .finish()
    }
}
