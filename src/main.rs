//! growtrack - a local grow journal with strain catalogs and leaf analysis
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use growtrack::catalog::{Catalogs, FertilizerCatalog, StrainCatalog};
use growtrack::cli::entry::FertilizerInput;
use growtrack::cli::{parse_clock, parse_date};
use growtrack::config::{crash_log_path, Config};
use growtrack::core::{
    EntryType, FermentationEntryType, FermentationMethod, Journal, LightSchedule, PlantPhase,
    PlantType, PotSize,
};
use growtrack::error::exit_codes;
use growtrack::inference::{
    FeedbackLog, FeedbackReason, KnowledgeBase, LeafAnalyzer, ModelAssets, PipelineMode,
    ScanHistory,
};
use growtrack::storage::FileJournalStore;

type CliResult = Result<ExitCode, Box<dyn std::error::Error>>;

// =============================================================================
// CLI Definition
// =============================================================================

/// growtrack - a local grow journal with strain catalogs and leaf analysis
#[derive(Parser)]
#[command(name = "growtrack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List plants in the journal
    List {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Only plants in this phase
        #[arg(long, value_enum)]
        phase: Option<PhaseArg>,
        /// Only members of this growbox
        #[arg(long)]
        growbox: Option<String>,
        /// Maximum number of results
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Show one plant with timings and recent entries
    Show {
        /// Plant ID
        plant_id: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Number of recent entries to include
        #[arg(long, short)]
        entries: Option<usize>,
    },

    /// Add, update or remove plants
    Plant {
        #[command(subcommand)]
        action: PlantAction,
        /// Output as JSON
        #[arg(long, short, global = true)]
        json: bool,
        /// Suppress output
        #[arg(long, short, global = true)]
        quiet: bool,
    },

    /// Record journal entries
    Entry {
        #[command(subcommand)]
        action: EntryAction,
        /// Output as JSON
        #[arg(long, short, global = true)]
        json: bool,
        /// Suppress output
        #[arg(long, short, global = true)]
        quiet: bool,
    },

    /// Record curing notes
    Ferment {
        #[command(subcommand)]
        action: FermentAction,
        /// Output as JSON
        #[arg(long, short, global = true)]
        json: bool,
        /// Suppress output
        #[arg(long, short, global = true)]
        quiet: bool,
    },

    /// Attach or remove plant photos
    Photo {
        #[command(subcommand)]
        action: PhotoAction,
        /// Output as JSON
        #[arg(long, short, global = true)]
        json: bool,
        /// Suppress output
        #[arg(long, short, global = true)]
        quiet: bool,
    },

    /// Track per-plant power devices
    Device {
        #[command(subcommand)]
        action: DeviceAction,
        /// Output as JSON
        #[arg(long, short, global = true)]
        json: bool,
        /// Suppress output
        #[arg(long, short, global = true)]
        quiet: bool,
    },

    /// Move a plant to its next lifecycle stage
    Stage {
        /// Plant ID
        plant_id: String,
        /// The transition to apply
        #[arg(value_enum)]
        transition: TransitionArg,
        /// Curing container, for `ferment`
        #[arg(long, value_enum, default_value = "mason-jar")]
        method: MethodArg,
        /// When it happened (YYYY-MM-DD); now when unset
        #[arg(long, value_parser = parse_date_arg)]
        at: Option<chrono::DateTime<chrono::Utc>>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Manage growboxes and their lighting
    Growbox {
        #[command(subcommand)]
        action: GrowboxAction,
        /// Output as JSON
        #[arg(long, short, global = true)]
        json: bool,
        /// Suppress output
        #[arg(long, short, global = true)]
        quiet: bool,
    },

    /// Query the strain and fertilizer catalogs
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
        /// Output as JSON
        #[arg(long, short, global = true)]
        json: bool,
        /// Suppress output
        #[arg(long, short, global = true)]
        quiet: bool,
    },

    /// Import a legacy journal export
    Import {
        /// JSON file to import
        file: PathBuf,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Analyze a leaf photo
    ///
    /// This build links no model runtime, so results are placeholders and
    /// are not stored in the scan history.
    Analyze {
        /// Image file
        image: PathBuf,
        /// Pipeline mode, overriding the config
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Do not store the result in the scan history
        #[arg(long)]
        no_record: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show recent leaf scans
    ///
    /// Only results from a loaded classifier are recorded. This build links
    /// no model runtime, so `analyze` never records a scan and the history
    /// stays empty unless scans were stored by another build.
    History {
        /// Maximum number of scans
        #[arg(long, short)]
        limit: Option<usize>,
        /// Delete all stored scans
        #[arg(long)]
        clear: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Confirm or correct stored scan results
    Feedback {
        #[command(subcommand)]
        action: FeedbackAction,
        /// Output as JSON
        #[arg(long, short, global = true)]
        json: bool,
        /// Suppress output
        #[arg(long, short, global = true)]
        quiet: bool,
    },

    /// Search the knowledge base shipped with the leaf model
    Ask {
        /// Question or keywords
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Maximum number of answers
        #[arg(long, short)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show water, fertilizer and power consumption
    Stats {
        /// Show only this growbox
        #[arg(long, short)]
        growbox: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

/// Plant fields shared by `plant add` and `plant update`.
#[derive(Args)]
struct PlantArgs {
    /// Strain name
    #[arg(long)]
    strain: Option<String>,
    /// Seed manufacturer
    #[arg(long)]
    manufacturer: Option<String>,
    /// THC content
    #[arg(long)]
    thc: Option<String>,
    /// CBD content
    #[arg(long)]
    cbd: Option<String>,
    /// Seed type
    #[arg(long = "type", value_enum)]
    plant_type: Option<PlantTypeArg>,
    /// Pot size class
    #[arg(long, value_enum)]
    pot: Option<PotArg>,
    /// Pot size label when `--pot custom`
    #[arg(long)]
    custom_pot: Option<String>,
    /// Planting date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    planted: Option<chrono::DateTime<chrono::Utc>>,
    /// Germination date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    germinated: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Subcommand)]
enum PlantAction {
    /// Add a plant
    Add {
        /// Plant name
        name: String,
        #[command(flatten)]
        fields: PlantArgs,
    },
    /// Update a plant; unset fields are kept
    Update {
        /// Plant ID
        plant_id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: PlantArgs,
    },
    /// Remove a plant and its growbox membership
    Remove {
        /// Plant ID
        plant_id: String,
    },
}

#[derive(Subcommand)]
enum EntryAction {
    /// Add a journal entry
    Add {
        /// Plant ID
        plant_id: String,
        /// Entry type
        #[arg(value_enum)]
        entry_type: EntryTypeArg,
        /// Entry value (a number for measurements)
        value: String,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
        /// Entry date (YYYY-MM-DD); now when unset
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<chrono::DateTime<chrono::Utc>>,
        /// Product applied, as MANUFACTURER:PRODUCT:DOSAGE (ml/L); repeatable
        #[arg(long = "fertilizer", value_parser = parse_fertilizer_arg)]
        fertilizers: Vec<FertilizerInput>,
    },
    /// Update a journal entry
    Update {
        /// Plant ID
        plant_id: String,
        /// Entry ID
        entry_id: String,
        /// New value
        #[arg(long)]
        value: Option<String>,
        /// New notes
        #[arg(long)]
        notes: Option<String>,
        /// New date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<chrono::DateTime<chrono::Utc>>,
    },
    /// Remove a journal entry
    Remove {
        /// Plant ID
        plant_id: String,
        /// Entry ID
        entry_id: String,
    },
}

#[derive(Subcommand)]
enum FermentAction {
    /// Add a curing note
    Add {
        /// Plant ID
        plant_id: String,
        /// Note type
        #[arg(value_enum)]
        entry_type: FermentEntryArg,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
        /// Measured humidity
        #[arg(long)]
        humidity: Option<String>,
        /// Measured temperature
        #[arg(long)]
        temperature: Option<String>,
    },
    /// Remove a curing note
    Remove {
        /// Plant ID
        plant_id: String,
        /// Note ID
        entry_id: String,
    },
}

#[derive(Subcommand)]
enum PhotoAction {
    /// Attach a photo
    Add {
        /// Plant ID
        plant_id: String,
        /// Photo location
        uri: String,
        /// Caption
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a photo
    Remove {
        /// Plant ID
        plant_id: String,
        /// Photo ID
        photo_id: String,
    },
}

#[derive(Subcommand)]
enum DeviceAction {
    /// Add a power device (fan, heater, pump)
    Add {
        /// Plant ID
        plant_id: String,
        /// Device name
        name: String,
        /// Rated power in watts
        watts: u32,
        /// Running hours per day (0-24)
        hours: f64,
    },
    /// Remove a power device
    Remove {
        /// Plant ID
        plant_id: String,
        /// Device ID
        device_id: String,
    },
}

#[derive(Subcommand)]
enum GrowboxAction {
    /// Add a growbox
    Add {
        /// Growbox name
        name: String,
        /// Width
        #[arg(long)]
        width: Option<String>,
        /// Height
        #[arg(long)]
        height: Option<String>,
        /// Depth
        #[arg(long)]
        depth: Option<String>,
        /// Lamp type
        #[arg(long)]
        light_type: Option<String>,
        /// Lamp power, e.g. "240W"
        #[arg(long)]
        light_power: Option<String>,
    },
    /// Update a growbox; unset fields are kept
    Update {
        /// Growbox ID
        growbox_id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// Width
        #[arg(long)]
        width: Option<String>,
        /// Height
        #[arg(long)]
        height: Option<String>,
        /// Depth
        #[arg(long)]
        depth: Option<String>,
        /// Lamp type
        #[arg(long)]
        light_type: Option<String>,
        /// Lamp power, e.g. "240W"
        #[arg(long)]
        light_power: Option<String>,
    },
    /// List growboxes
    List,
    /// Remove a growbox; its plants are kept
    Remove {
        /// Growbox ID
        growbox_id: String,
    },
    /// Put a plant in a growbox
    Assign {
        /// Growbox ID
        growbox_id: String,
        /// Plant ID
        plant_id: String,
    },
    /// Take a plant out of a growbox
    Unassign {
        /// Growbox ID
        growbox_id: String,
        /// Plant ID
        plant_id: String,
    },
    /// Change lighting settings
    Light {
        /// Growbox ID
        growbox_id: String,
        /// Light cycle
        #[arg(long, value_enum)]
        schedule: Option<ScheduleArg>,
        /// Dimmer level in percent (0-100)
        #[arg(long)]
        power: Option<u8>,
        /// Electricity price per kWh
        #[arg(long)]
        price: Option<f64>,
        /// Why the settings changed
        #[arg(long)]
        reason: Option<String>,
        /// Lights-on time (HH:MM); operating hours follow the on/off window
        #[arg(long, value_parser = parse_clock_arg, requires = "off")]
        on: Option<u32>,
        /// Lights-off time (HH:MM)
        #[arg(long, value_parser = parse_clock_arg, requires = "on")]
        off: Option<u32>,
    },
    /// Estimate electricity costs
    Costs {
        /// Growbox ID
        growbox_id: String,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Look up one strain
    Lookup {
        /// Seed manufacturer
        manufacturer: String,
        /// Strain name
        strain: String,
    },
    /// Search strains by name
    Search {
        /// Substring to match
        query: String,
        /// Maximum number of results
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// List one manufacturer's strains
    Strains {
        /// Seed manufacturer
        manufacturer: String,
    },
    /// List fertilizer products
    Fertilizers {
        /// Fertilizer manufacturer
        manufacturer: String,
        /// Single product to show
        #[arg(long)]
        product: Option<String>,
    },
}

#[derive(Subcommand)]
enum FeedbackAction {
    /// Record feedback on a stored scan
    Add {
        /// Scan ID
        scan_id: String,
        /// The result was right
        #[arg(long, conflicts_with = "correct", required_unless_present = "correct")]
        confirm: bool,
        /// The right label
        #[arg(long, value_name = "LABEL")]
        correct: Option<String>,
        /// Why the result was wrong
        #[arg(long, value_enum, default_value = "wrong-class", requires = "correct")]
        reason: ReasonArg,
        /// Free-text note
        #[arg(long)]
        note: Option<String>,
        /// Keep a copy of this image with the feedback
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// List recorded feedback
    List {
        /// Maximum number of records
        #[arg(long, short)]
        limit: Option<usize>,
    },
}

fn parse_date_arg(value: &str) -> Result<chrono::DateTime<chrono::Utc>, String> {
    parse_date(value).map_err(|e| e.to_string())
}

fn parse_clock_arg(value: &str) -> Result<u32, String> {
    parse_clock(value).map_err(|e| e.to_string())
}

fn parse_fertilizer_arg(value: &str) -> Result<FertilizerInput, String> {
    value.parse().map_err(|e: growtrack::GrowError| e.to_string())
}

// =============================================================================
// Value enums
// =============================================================================

#[derive(Clone, Copy, ValueEnum)]
enum PhaseArg {
    Unknown,
    Germination,
    Seedling,
    Vegetative,
    Flowering,
    Harvested,
    Drying,
    Fermenting,
}

impl From<PhaseArg> for PlantPhase {
    fn from(arg: PhaseArg) -> Self {
        match arg {
            PhaseArg::Unknown => PlantPhase::Unknown,
            PhaseArg::Germination => PlantPhase::Germination,
            PhaseArg::Seedling => PlantPhase::Seedling,
            PhaseArg::Vegetative => PlantPhase::Vegetative,
            PhaseArg::Flowering => PlantPhase::Flowering,
            PhaseArg::Harvested => PlantPhase::Harvested,
            PhaseArg::Drying => PlantPhase::Drying,
            PhaseArg::Fermenting => PlantPhase::Fermenting,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum EntryTypeArg {
    Height,
    Watering,
    Fertilizing,
    Photo,
    Temperature,
    Humidity,
    Light,
    Topping,
    Lollipopping,
    Lst,
    Task,
    Note,
}

impl From<EntryTypeArg> for EntryType {
    fn from(arg: EntryTypeArg) -> Self {
        match arg {
            EntryTypeArg::Height => EntryType::Height,
            EntryTypeArg::Watering => EntryType::Watering,
            EntryTypeArg::Fertilizing => EntryType::Fertilizing,
            EntryTypeArg::Photo => EntryType::Photo,
            EntryTypeArg::Temperature => EntryType::Temperature,
            EntryTypeArg::Humidity => EntryType::Humidity,
            EntryTypeArg::Light => EntryType::Light,
            EntryTypeArg::Topping => EntryType::Topping,
            EntryTypeArg::Lollipopping => EntryType::Lollipopping,
            EntryTypeArg::Lst => EntryType::Lst,
            EntryTypeArg::Task => EntryType::Task,
            EntryTypeArg::Note => EntryType::Note,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FermentEntryArg {
    Ventilation,
    Note,
    Task,
    HumidityCheck,
    TemperatureCheck,
}

impl From<FermentEntryArg> for FermentationEntryType {
    fn from(arg: FermentEntryArg) -> Self {
        match arg {
            FermentEntryArg::Ventilation => FermentationEntryType::Ventilation,
            FermentEntryArg::Note => FermentationEntryType::Note,
            FermentEntryArg::Task => FermentationEntryType::Task,
            FermentEntryArg::HumidityCheck => FermentationEntryType::HumidityCheck,
            FermentEntryArg::TemperatureCheck => FermentationEntryType::TemperatureCheck,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    MasonJar,
    Humidor,
    TerplocBag,
    VacuumContainer,
}

impl From<MethodArg> for FermentationMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::MasonJar => FermentationMethod::MasonJar,
            MethodArg::Humidor => FermentationMethod::Humidor,
            MethodArg::TerplocBag => FermentationMethod::TerplocBag,
            MethodArg::VacuumContainer => FermentationMethod::VacuumContainer,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PlantTypeArg {
    Autoflower,
    FeminizedIndica,
    FeminizedSativa,
    FeminizedHybrid,
}

impl From<PlantTypeArg> for PlantType {
    fn from(arg: PlantTypeArg) -> Self {
        match arg {
            PlantTypeArg::Autoflower => PlantType::Autoflower,
            PlantTypeArg::FeminizedIndica => PlantType::FeminizedIndica,
            PlantTypeArg::FeminizedSativa => PlantType::FeminizedSativa,
            PlantTypeArg::FeminizedHybrid => PlantType::FeminizedHybrid,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PotArg {
    Small,
    Medium,
    Large,
    ExtraLarge,
    Custom,
}

impl From<PotArg> for PotSize {
    fn from(arg: PotArg) -> Self {
        match arg {
            PotArg::Small => PotSize::Small,
            PotArg::Medium => PotSize::Medium,
            PotArg::Large => PotSize::Large,
            PotArg::ExtraLarge => PotSize::ExtraLarge,
            PotArg::Custom => PotSize::Custom,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ScheduleArg {
    /// 18 hours on, 6 off
    Vegetative,
    /// 12 hours on, 12 off
    Flowering,
}

impl From<ScheduleArg> for LightSchedule {
    fn from(arg: ScheduleArg) -> Self {
        match arg {
            ScheduleArg::Vegetative => LightSchedule::Vegetative,
            ScheduleArg::Flowering => LightSchedule::Flowering,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TransitionArg {
    Flower,
    Harvest,
    Dry,
    UndoDry,
    Ferment,
    Finish,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Direct,
    TwoStage,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReasonArg {
    WrongClass,
    LowConfidence,
    MultipleIssues,
    Other,
}

impl From<ReasonArg> for FeedbackReason {
    fn from(arg: ReasonArg) -> Self {
        match arg {
            ReasonArg::WrongClass => FeedbackReason::WrongClass,
            ReasonArg::LowConfidence => FeedbackReason::LowConfidence,
            ReasonArg::MultipleIssues => FeedbackReason::MultipleIssues,
            ReasonArg::Other => FeedbackReason::Other,
        }
    }
}

impl From<ModeArg> for PipelineMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Direct => PipelineMode::Direct,
            ModeArg::TwoStage => PipelineMode::TwoStage,
        }
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();
    setup_logging();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("growtrack error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Set up the global panic handler.
///
/// On panic, logs to ~/.growtrack/crash.log and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("growtrack panic: {}", info);

        if let Some(crash_log) = crash_log_path() {
            if let Some(parent) = crash_log.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Log to stderr, filtered by `GROWTRACK_LOG` (default `warn`).
fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("GROWTRACK_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Run the CLI and return the exit code.
fn run() -> CliResult {
    let cli = Cli::parse();

    match cli.command {
        Commands::List {
            json,
            quiet,
            phase,
            growbox,
            limit,
        } => run_list(json, quiet, phase.map(Into::into), growbox, limit),
        Commands::Show {
            plant_id,
            json,
            quiet,
            entries,
        } => run_show(&plant_id, json, quiet, entries),
        Commands::Plant { action, json, quiet } => run_plant(action, json, quiet),
        Commands::Entry { action, json, quiet } => run_entry(action, json, quiet),
        Commands::Ferment { action, json, quiet } => run_ferment(action, json, quiet),
        Commands::Photo { action, json, quiet } => run_photo(action, json, quiet),
        Commands::Device { action, json, quiet } => run_device(action, json, quiet),
        Commands::Stage {
            plant_id,
            transition,
            method,
            at,
            json,
            quiet,
        } => run_stage(&plant_id, transition, method.into(), at, json, quiet),
        Commands::Growbox { action, json, quiet } => run_growbox(action, json, quiet),
        Commands::Catalog { action, json, quiet } => run_catalog(action, json, quiet),
        Commands::Import { file, json, quiet } => run_import(&file, json, quiet),
        Commands::Analyze {
            image,
            mode,
            no_record,
            json,
            quiet,
        } => run_analyze(&image, mode.map(Into::into), no_record, json, quiet),
        Commands::History {
            limit,
            clear,
            json,
            quiet,
        } => run_history(limit, clear, json, quiet),
        Commands::Feedback { action, json, quiet } => run_feedback(action, json, quiet),
        Commands::Ask {
            query,
            limit,
            json,
            quiet,
        } => run_ask(&query.join(" "), limit, json, quiet),
        Commands::Stats {
            growbox,
            json,
            quiet,
        } => run_stats(growbox, json, quiet),
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::OK as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}

/// Print non-empty formatted output.
fn emit(formatted: &str) {
    if !formatted.is_empty() {
        print!("{}", formatted);
        if !formatted.ends_with('\n') {
            println!();
        }
    }
}

fn open_journal(config: &Config) -> Result<Journal<FileJournalStore>, Box<dyn std::error::Error>> {
    let store = match config.data_dir() {
        Some(dir) => FileJournalStore::with_dir(dir)?,
        None => FileJournalStore::new()?,
    };
    Ok(Journal::new(store, StrainCatalog::load(&config.catalog)))
}

fn run_list(
    json: bool,
    quiet: bool,
    phase: Option<PlantPhase>,
    growbox: Option<String>,
    limit: Option<usize>,
) -> CliResult {
    use growtrack::cli::list::{ListCommand, ListOptions};

    let config = Config::load();
    let cmd = ListCommand::new(open_journal(&config)?);
    let options = ListOptions {
        json,
        quiet,
        phase,
        growbox,
        limit,
    };

    let output = cmd.run(&options);
    emit(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_show(plant_id: &str, json: bool, quiet: bool, entries: Option<usize>) -> CliResult {
    use growtrack::cli::show::{ShowCommand, ShowOptions};

    let config = Config::load();
    let cmd = ShowCommand::new(open_journal(&config)?);
    let options = ShowOptions {
        json,
        quiet,
        entries,
    };

    let output = cmd.run(plant_id, &options);
    emit(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn plant_fields(name: Option<String>, args: PlantArgs) -> growtrack::cli::plant::PlantFields {
    growtrack::cli::plant::PlantFields {
        name,
        strain: args.strain,
        manufacturer: args.manufacturer,
        thc: args.thc,
        cbd: args.cbd,
        plant_type: args.plant_type.map(Into::into),
        pot_size: args.pot.map(Into::into),
        custom_pot_size: args.custom_pot,
        planting_date: args.planted,
        germination_date: args.germinated,
    }
}

fn run_plant(action: PlantAction, json: bool, quiet: bool) -> CliResult {
    use growtrack::cli::plant::{PlantCommand, PlantOptions};

    let config = Config::load();
    let cmd = PlantCommand::new(open_journal(&config)?);
    let options = PlantOptions { json, quiet };

    let output = match action {
        PlantAction::Add { name, fields } => cmd.add(plant_fields(Some(name), fields)),
        PlantAction::Update {
            plant_id,
            name,
            fields,
        } => cmd.update(&plant_id, plant_fields(name, fields)),
        PlantAction::Remove { plant_id } => cmd.remove(&plant_id),
    };
    emit(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_entry(action: EntryAction, json: bool, quiet: bool) -> CliResult {
    use growtrack::cli::entry::{EntryCommand, EntryInput, EntryOptions};

    let config = Config::load();
    let cmd = EntryCommand::new(open_journal(&config)?)
        .with_fertilizers(FertilizerCatalog::load(&config.catalog));
    let options = EntryOptions { json, quiet };

    let output = match action {
        EntryAction::Add {
            plant_id,
            entry_type,
            value,
            notes,
            date,
            fertilizers,
        } => cmd.add_entry(
            &plant_id,
            EntryInput {
                entry_type: entry_type.into(),
                value,
                notes,
                date,
                fertilizers,
            },
        ),
        EntryAction::Update {
            plant_id,
            entry_id,
            value,
            notes,
            date,
        } => cmd.update_entry(&plant_id, &entry_id, value, notes, date),
        EntryAction::Remove { plant_id, entry_id } => cmd.remove_entry(&plant_id, &entry_id),
    };
    emit(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_ferment(action: FermentAction, json: bool, quiet: bool) -> CliResult {
    use growtrack::cli::entry::{EntryCommand, EntryOptions, FermentationInput};

    let config = Config::load();
    let cmd = EntryCommand::new(open_journal(&config)?);
    let options = EntryOptions { json, quiet };

    let output = match action {
        FermentAction::Add {
            plant_id,
            entry_type,
            notes,
            humidity,
            temperature,
        } => cmd.add_fermentation(
            &plant_id,
            FermentationInput {
                entry_type: entry_type.into(),
                notes,
                humidity,
                temperature,
            },
        ),
        FermentAction::Remove { plant_id, entry_id } => {
            cmd.remove_fermentation(&plant_id, &entry_id)
        }
    };
    emit(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_photo(action: PhotoAction, json: bool, quiet: bool) -> CliResult {
    use growtrack::cli::entry::{EntryCommand, EntryOptions};

    let config = Config::load();
    let cmd = EntryCommand::new(open_journal(&config)?);
    let options = EntryOptions { json, quiet };

    let output = match action {
        PhotoAction::Add {
            plant_id,
            uri,
            description,
        } => cmd.add_photo(&plant_id, &uri, description),
        PhotoAction::Remove { plant_id, photo_id } => cmd.remove_photo(&plant_id, &photo_id),
    };
    emit(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_device(action: DeviceAction, json: bool, quiet: bool) -> CliResult {
    use growtrack::cli::entry::{EntryCommand, EntryOptions};

    let config = Config::load();
    let cmd = EntryCommand::new(open_journal(&config)?);
    let options = EntryOptions { json, quiet };

    let output = match action {
        DeviceAction::Add {
            plant_id,
            name,
            watts,
            hours,
        } => cmd.add_device(&plant_id, &name, watts, hours),
        DeviceAction::Remove {
            plant_id,
            device_id,
        } => cmd.remove_device(&plant_id, &device_id),
    };
    emit(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_stage(
    plant_id: &str,
    transition: TransitionArg,
    method: FermentationMethod,
    at: Option<chrono::DateTime<chrono::Utc>>,
    json: bool,
    quiet: bool,
) -> CliResult {
    use growtrack::cli::stage::{StageCommand, StageOptions, Transition};

    let transition = match transition {
        TransitionArg::Flower => Transition::Flower,
        TransitionArg::Harvest => Transition::Harvest,
        TransitionArg::Dry => Transition::Dry,
        TransitionArg::UndoDry => Transition::UndoDry,
        TransitionArg::Ferment => Transition::Ferment(method),
        TransitionArg::Finish => Transition::Finish,
    };

    let config = Config::load();
    let cmd = StageCommand::new(open_journal(&config)?);
    let options = StageOptions { json, quiet, at };

    let output = cmd.run(plant_id, transition, &options);
    emit(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_growbox(action: GrowboxAction, json: bool, quiet: bool) -> CliResult {
    use growtrack::cli::growbox::{GrowboxCommand, GrowboxFields, GrowboxOptions, LightingFields};

    let config = Config::load();
    let journal = open_journal(&config)?;
    let cmd = GrowboxCommand::new(journal, config);
    let options = GrowboxOptions { json, quiet };

    let output = match action {
        GrowboxAction::Add {
            name,
            width,
            height,
            depth,
            light_type,
            light_power,
        } => cmd.add(GrowboxFields {
            name,
            width,
            height,
            depth,
            light_type,
            light_power,
        }),
        GrowboxAction::Update {
            growbox_id,
            name,
            width,
            height,
            depth,
            light_type,
            light_power,
        } => cmd.update(
            &growbox_id,
            GrowboxFields {
                name: name.unwrap_or_default(),
                width,
                height,
                depth,
                light_type,
                light_power,
            },
        ),
        GrowboxAction::List => cmd.list(),
        GrowboxAction::Remove { growbox_id } => cmd.remove(&growbox_id),
        GrowboxAction::Assign {
            growbox_id,
            plant_id,
        } => cmd.assign(&growbox_id, &plant_id),
        GrowboxAction::Unassign {
            growbox_id,
            plant_id,
        } => cmd.unassign(&growbox_id, &plant_id),
        GrowboxAction::Light {
            growbox_id,
            schedule,
            power,
            price,
            reason,
            on,
            off,
        } => cmd.light(
            &growbox_id,
            LightingFields {
                schedule: schedule.map(Into::into),
                power_level: power,
                electricity_price: price,
                reason,
                light_window: on.zip(off),
            },
        ),
        GrowboxAction::Costs { growbox_id } => cmd.costs(&growbox_id),
    };
    emit(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_catalog(action: CatalogAction, json: bool, quiet: bool) -> CliResult {
    use growtrack::cli::catalog::{CatalogCommand, CatalogOptions};

    let config = Config::load();
    let cmd = CatalogCommand::new(Catalogs::load(&config.catalog));
    let mut options = CatalogOptions {
        json,
        quiet,
        limit: None,
    };

    let output = match action {
        CatalogAction::Lookup {
            manufacturer,
            strain,
        } => cmd.lookup(&manufacturer, &strain),
        CatalogAction::Search { query, limit } => {
            options.limit = limit;
            cmd.search(&query, &options)
        }
        CatalogAction::Strains { manufacturer } => cmd.strains_of(&manufacturer),
        CatalogAction::Fertilizers {
            manufacturer,
            product,
        } => cmd.fertilizers(&manufacturer, product.as_deref()),
    };
    emit(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_import(file: &Path, json: bool, quiet: bool) -> CliResult {
    use growtrack::cli::import::{ImportCommand, ImportOptions};

    let config = Config::load();
    let cmd = ImportCommand::new(open_journal(&config)?);
    let options = ImportOptions { json, quiet };

    let output = cmd.run(file);
    emit(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_analyze(
    image: &Path,
    mode: Option<PipelineMode>,
    no_record: bool,
    json: bool,
    quiet: bool,
) -> CliResult {
    use growtrack::cli::analyze::{AnalyzeCommand, AnalyzeOptions};

    let config = Config::load();
    let mut analyzer_config = config.analyzer.clone();
    if let Some(mode) = mode {
        analyzer_config.pipeline_mode = mode;
    }
    let model_dir = config
        .model_dir()
        .ok_or("cannot determine model directory")?;

    let threshold = analyzer_config.confidence_threshold;

    // No runtime is linked in; without one the analyzer reports placeholders.
    let analyzer = LeafAnalyzer::from_dir(&model_dir, None, analyzer_config);
    let knowledge = KnowledgeBase::from_assets(analyzer.assets());
    let history = config.scans_dir().map(ScanHistory::new);
    let cmd = AnalyzeCommand::new(analyzer, history)
        .with_knowledge(knowledge)
        .with_confidence_threshold(threshold);
    let options = AnalyzeOptions {
        json,
        quiet,
        no_record,
    };

    let output = cmd.run(image, &options);
    emit(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_history(limit: Option<usize>, clear: bool, json: bool, quiet: bool) -> CliResult {
    use growtrack::cli::history::{HistoryCommand, HistoryOptions};

    let config = Config::load();
    let scans_dir = config
        .scans_dir()
        .ok_or("cannot determine data directory")?;
    let cmd = HistoryCommand::new(ScanHistory::new(scans_dir));
    let options = HistoryOptions { json, quiet, limit };

    let output = if clear { cmd.clear() } else { cmd.run(&options) };
    emit(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_feedback(action: FeedbackAction, json: bool, quiet: bool) -> CliResult {
    use growtrack::cli::feedback::{FeedbackCommand, FeedbackInput, FeedbackOptions, Verdict};

    let config = Config::load();
    let scans_dir = config
        .scans_dir()
        .ok_or("cannot determine data directory")?;
    let feedback_dir = config
        .feedback_dir()
        .ok_or("cannot determine data directory")?;
    let cmd = FeedbackCommand::new(FeedbackLog::new(feedback_dir), ScanHistory::new(scans_dir));
    let mut options = FeedbackOptions {
        json,
        quiet,
        limit: None,
    };

    let output = match action {
        FeedbackAction::Add {
            scan_id,
            confirm: _,
            correct,
            reason,
            note,
            image,
        } => {
            let verdict = match correct {
                Some(label) => Verdict::Correct {
                    label,
                    reason: reason.into(),
                },
                None => Verdict::Confirm,
            };
            cmd.add(FeedbackInput {
                scan_id,
                verdict,
                note,
                image,
            })
        }
        FeedbackAction::List { limit } => {
            options.limit = limit;
            cmd.list(&options)
        }
    };
    emit(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_ask(query: &str, limit: Option<usize>, json: bool, quiet: bool) -> CliResult {
    use growtrack::cli::ask::{AskCommand, AskOptions};

    let config = Config::load();
    let model_dir = config
        .model_dir()
        .ok_or("cannot determine model directory")?;
    let assets = ModelAssets::load(&model_dir, &config.analyzer.manifest_name);
    let cmd = AskCommand::new(KnowledgeBase::from_assets(&assets));
    let options = AskOptions { json, quiet, limit };

    let output = cmd.run(query, &options);
    emit(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

fn run_stats(growbox: Option<String>, json: bool, quiet: bool) -> CliResult {
    use growtrack::cli::stats::{StatsCommand, StatsOptions};

    let config = Config::load();
    let cmd = StatsCommand::new(open_journal(&config)?);
    let options = StatsOptions {
        json,
        quiet,
        growbox,
    };

    let output = cmd.run(&options);
    emit(&cmd.format_output(&output, &options));
    Ok(success_to_exit_code(output.success))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_success_to_exit_code() {
        assert_eq!(success_to_exit_code(true), ExitCode::from(exit_codes::OK as u8));
        assert_eq!(
            success_to_exit_code(false),
            ExitCode::from(exit_codes::ERROR as u8)
        );
    }

    #[test]
    fn test_value_enum_conversions() {
        assert_eq!(PlantPhase::from(PhaseArg::Fermenting), PlantPhase::Fermenting);
        assert_eq!(EntryType::from(EntryTypeArg::Lst), EntryType::Lst);
        assert_eq!(
            FermentationEntryType::from(FermentEntryArg::HumidityCheck),
            FermentationEntryType::HumidityCheck
        );
        assert_eq!(FermentationMethod::from(MethodArg::TerplocBag), FermentationMethod::TerplocBag);
        assert_eq!(PotSize::from(PotArg::ExtraLarge), PotSize::ExtraLarge);
        assert_eq!(LightSchedule::from(ScheduleArg::Flowering), LightSchedule::Flowering);
        assert_eq!(PipelineMode::from(ModeArg::TwoStage), PipelineMode::TwoStage);
    }

    #[test]
    fn test_cli_parse_list() {
        let cli = Cli::parse_from(["growtrack", "list", "--phase", "flowering", "--limit", "5"]);
        match cli.command {
            Commands::List { phase, limit, .. } => {
                assert!(matches!(phase, Some(PhaseArg::Flowering)));
                assert_eq!(limit, Some(5));
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_cli_parse_plant_add() {
        let cli = Cli::parse_from([
            "growtrack",
            "plant",
            "add",
            "Lemon",
            "--manufacturer",
            "Royal Queen Seeds",
            "--strain",
            "Amnesia Haze",
            "--type",
            "autoflower",
            "--planted",
            "2025-03-01",
            "--json",
        ]);
        match cli.command {
            Commands::Plant { action, json, .. } => {
                assert!(json);
                let PlantAction::Add { name, fields } = action else {
                    panic!("Expected Add action");
                };
                assert_eq!(name, "Lemon");
                assert_eq!(fields.strain.as_deref(), Some("Amnesia Haze"));
                assert!(matches!(fields.plant_type, Some(PlantTypeArg::Autoflower)));
                assert_eq!(
                    fields.planted,
                    Some(chrono::Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
                );
            }
            _ => panic!("Expected Plant command"),
        }
    }

    #[test]
    fn test_cli_parse_entry_add() {
        let cli = Cli::parse_from([
            "growtrack", "entry", "add", "p1", "height", "42", "--notes", "tall",
        ]);
        match cli.command {
            Commands::Entry { action, .. } => {
                let EntryAction::Add {
                    plant_id,
                    entry_type,
                    value,
                    notes,
                    date,
                    fertilizers,
                } = action
                else {
                    panic!("Expected Add action");
                };
                assert_eq!(plant_id, "p1");
                assert!(matches!(entry_type, EntryTypeArg::Height));
                assert_eq!(value, "42");
                assert_eq!(notes.as_deref(), Some("tall"));
                assert!(date.is_none());
                assert!(fertilizers.is_empty());
            }
            _ => panic!("Expected Entry command"),
        }
    }

    #[test]
    fn test_cli_parse_entry_fertilizers() {
        let cli = Cli::parse_from([
            "growtrack",
            "entry",
            "add",
            "p1",
            "fertilizing",
            "5 L",
            "--fertilizer",
            "BioBizz:Bio-Grow:2 ml/L",
            "--fertilizer",
            "Canna:PK 13/14:0.5",
        ]);
        let Commands::Entry {
            action: EntryAction::Add { fertilizers, .. },
            ..
        } = cli.command
        else {
            panic!("Expected Entry add");
        };
        assert_eq!(fertilizers.len(), 2);
        assert_eq!(fertilizers[0].product, "Bio-Grow");
        assert_eq!(fertilizers[1].dosage, "0.5");

        let result = Cli::try_parse_from([
            "growtrack",
            "entry",
            "add",
            "p1",
            "fertilizing",
            "5 L",
            "--fertilizer",
            "Bio-Grow",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_stage_ferment() {
        let cli = Cli::parse_from(["growtrack", "stage", "p1", "ferment", "--method", "humidor"]);
        match cli.command {
            Commands::Stage {
                plant_id,
                transition,
                method,
                ..
            } => {
                assert_eq!(plant_id, "p1");
                assert!(matches!(transition, TransitionArg::Ferment));
                assert!(matches!(method, MethodArg::Humidor));
            }
            _ => panic!("Expected Stage command"),
        }
    }

    #[test]
    fn test_cli_parse_stage_rejects_bad_date() {
        let result =
            Cli::try_parse_from(["growtrack", "stage", "p1", "harvest", "--at", "yesterday"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_growbox_light() {
        let cli = Cli::parse_from([
            "growtrack",
            "growbox",
            "light",
            "g1",
            "--schedule",
            "flowering",
            "--power",
            "80",
            "--reason",
            "flip",
        ]);
        match cli.command {
            Commands::Growbox { action, .. } => {
                let GrowboxAction::Light {
                    growbox_id,
                    schedule,
                    power,
                    price,
                    reason,
                    on,
                    off,
                } = action
                else {
                    panic!("Expected Light action");
                };
                assert_eq!(growbox_id, "g1");
                assert!(matches!(schedule, Some(ScheduleArg::Flowering)));
                assert_eq!(power, Some(80));
                assert!(price.is_none());
                assert_eq!(reason.as_deref(), Some("flip"));
                assert!(on.is_none() && off.is_none());
            }
            _ => panic!("Expected Growbox command"),
        }
    }

    #[test]
    fn test_cli_parse_growbox_light_window() {
        let cli = Cli::parse_from([
            "growtrack", "growbox", "light", "g1", "--on", "06:00", "--off", "00:00",
        ]);
        let Commands::Growbox {
            action: GrowboxAction::Light { on, off, .. },
            ..
        } = cli.command
        else {
            panic!("Expected Growbox light");
        };
        assert_eq!(on.zip(off), Some((360, 0)));

        // Both marks are required together
        assert!(Cli::try_parse_from(["growtrack", "growbox", "light", "g1", "--on", "06:00"])
            .is_err());
    }

    #[test]
    fn test_cli_parse_device_add() {
        let cli = Cli::parse_from(["growtrack", "device", "add", "p1", "Fan", "25", "12.5"]);
        match cli.command {
            Commands::Device { action, .. } => {
                let DeviceAction::Add { name, watts, hours, .. } = action else {
                    panic!("Expected Add action");
                };
                assert_eq!(name, "Fan");
                assert_eq!(watts, 25);
                assert_eq!(hours, 12.5);
            }
            _ => panic!("Expected Device command"),
        }
    }

    #[test]
    fn test_cli_parse_catalog_search() {
        let cli = Cli::parse_from(["growtrack", "catalog", "search", "haze", "--limit", "3"]);
        match cli.command {
            Commands::Catalog { action, .. } => {
                let CatalogAction::Search { query, limit } = action else {
                    panic!("Expected Search action");
                };
                assert_eq!(query, "haze");
                assert_eq!(limit, Some(3));
            }
            _ => panic!("Expected Catalog command"),
        }
    }

    #[test]
    fn test_cli_parse_analyze() {
        let cli = Cli::parse_from([
            "growtrack",
            "analyze",
            "leaf.jpg",
            "--mode",
            "two-stage",
            "--no-record",
        ]);
        match cli.command {
            Commands::Analyze {
                image,
                mode,
                no_record,
                ..
            } => {
                assert_eq!(image, PathBuf::from("leaf.jpg"));
                assert!(matches!(mode, Some(ModeArg::TwoStage)));
                assert!(no_record);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_history_help_explains_missing_runtime() {
        use clap::CommandFactory;

        let command = Cli::command();
        let history = command
            .find_subcommand("history")
            .expect("history subcommand");
        let help = history.get_long_about().unwrap().to_string();
        assert!(help.contains("no model runtime"));
    }

    #[test]
    fn test_cli_parse_history() {
        let cli = Cli::parse_from(["growtrack", "history", "--limit", "3", "--json"]);
        match cli.command {
            Commands::History {
                limit, json, clear, ..
            } => {
                assert_eq!(limit, Some(3));
                assert!(json);
                assert!(!clear);
            }
            _ => panic!("Expected History command"),
        }
    }

    #[test]
    fn test_cli_parse_feedback_add() {
        let cli = Cli::parse_from([
            "growtrack",
            "feedback",
            "add",
            "scan-1",
            "--correct",
            "Light burn",
            "--reason",
            "low-confidence",
            "--note",
            "edges curl",
        ]);
        match cli.command {
            Commands::Feedback {
                action:
                    FeedbackAction::Add {
                        scan_id,
                        confirm,
                        correct,
                        reason,
                        note,
                        image,
                    },
                ..
            } => {
                assert_eq!(scan_id, "scan-1");
                assert!(!confirm);
                assert_eq!(correct.as_deref(), Some("Light burn"));
                assert_eq!(FeedbackReason::from(reason), FeedbackReason::LowConfidence);
                assert_eq!(note.as_deref(), Some("edges curl"));
                assert!(image.is_none());
            }
            _ => panic!("Expected Feedback add"),
        }
    }

    #[test]
    fn test_cli_feedback_needs_one_verdict() {
        let parse = |args: &[&str]| {
            let mut full = vec!["growtrack", "feedback", "add", "scan-1"];
            full.extend_from_slice(args);
            Cli::try_parse_from(full)
        };
        assert!(parse(&[]).is_err());
        assert!(parse(&["--confirm", "--correct", "Heat stress"]).is_err());
        assert!(parse(&["--confirm", "--reason", "other"]).is_err());
        assert!(parse(&["--confirm"]).is_ok());
        assert!(parse(&["--correct", "Heat stress"]).is_ok());
    }

    #[test]
    fn test_cli_parse_feedback_list_and_stats() {
        let cli = Cli::parse_from(["growtrack", "feedback", "list", "--limit", "4", "--json"]);
        match cli.command {
            Commands::Feedback {
                action: FeedbackAction::List { limit },
                json,
                ..
            } => {
                assert_eq!(limit, Some(4));
                assert!(json);
            }
            _ => panic!("Expected Feedback list"),
        }

        let cli = Cli::parse_from(["growtrack", "stats", "--growbox", "tent"]);
        match cli.command {
            Commands::Stats { growbox, json, .. } => {
                assert_eq!(growbox.as_deref(), Some("tent"));
                assert!(!json);
            }
            _ => panic!("Expected Stats command"),
        }
    }

    #[test]
    fn test_cli_parse_ask() {
        let cli = Cli::parse_from(["growtrack", "ask", "yellow", "leaves", "--limit", "2"]);
        match cli.command {
            Commands::Ask { query, limit, .. } => {
                assert_eq!(query.join(" "), "yellow leaves");
                assert_eq!(limit, Some(2));
            }
            _ => panic!("Expected Ask command"),
        }
        assert!(Cli::try_parse_from(["growtrack", "ask"]).is_err());
    }
}
