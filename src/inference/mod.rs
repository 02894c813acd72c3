//! Leaf analyzer inference glue.
//!
//! Resolves model assets from a model directory, preprocesses images,
//! runs the optional stage-0 filter and the main classifier, and keeps a
//! history of scans. Results feed a rule-based tip generator, a knowledge
//! base lookup and an append-only feedback log. Model execution is
//! pluggable via [`ModelRuntime`].

pub mod analyzer;
pub mod feedback;
pub mod history;
pub mod knowledge;
pub mod labels;
pub mod manifest;
pub mod preprocess;
pub mod recommend;
pub mod softmax;

pub use analyzer::{Analysis, Classifier, LeafAnalyzer, LeafResult, ModelRuntime, PipelineMode};
pub use feedback::{FeedbackLog, FeedbackReason, FeedbackRecord};
pub use history::{ScanHistory, ScanRecord};
pub use knowledge::{KnowledgeBase, KnowledgeEntry, KnowledgeHit};
pub use labels::{category_of, readable_label, LeafCategory};
pub use manifest::{sha256_hex, Integrity, ModelAssets, ModelManifest, Normalization};
pub use recommend::{Priority, Recommendation};
pub use softmax::{softmax, softmax_with_temperature};
