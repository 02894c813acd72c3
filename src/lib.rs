//! growtrack - a local grow journal
//!
//! growtrack keeps a journal of cannabis plants and growboxes on disk,
//! derives each plant's cultivation phase from its recorded dates, fills in
//! strain data from a reference catalog, estimates lighting costs and sums
//! up water, fertilizer and power consumption. It also runs leaf photos
//! through a pluggable classifier, turns the results into care tips, keeps
//! a history of the scans and a log of user feedback on them.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod inference;
pub mod storage;
pub mod util;

pub use catalog::{Catalogs, FertilizerCatalog, StrainCatalog};
pub use config::Config;
pub use core::{
    derive_phase, Growbox, ImportReport, Journal, LoadReport, Plant, PlantEntry, PlantPhase,
    Statistics,
};
pub use error::{GrowError, Result};
pub use inference::{
    Analysis, FeedbackLog, KnowledgeBase, LeafAnalyzer, ModelRuntime, PipelineMode,
    Recommendation, ScanHistory,
};
pub use storage::{FileJournalStore, JournalStore, MemoryJournalStore};

// CLI commands
pub use cli::{
    AnalyzeCommand, AskCommand, CatalogCommand, EntryCommand, FeedbackCommand, GrowboxCommand,
    HistoryCommand, ImportCommand, ListCommand, PlantCommand, ShowCommand, StageCommand,
    StatsCommand,
};
