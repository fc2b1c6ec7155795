//! CLI entry point for blendoc.
//!
//! Scans a creative project folder, follows the files each scene references,
//! and reports the resulting dependency graph.
//!
//! # Usage
//!
//! ```bash
//! blendoc [OPTIONS] <COMMAND>
//!
//! # Scan and show summary
//! blendoc --folder ./my-film scan --detailed
//!
//! # Folder-level dependency graph as Graphviz DOT
//! blendoc --folder ./my-film graph --mode folder --format dot -o deps.dot
//!
//! # File inventory as CSV
//! blendoc --folder ./my-film inventory --format csv
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;

use bd_core::{Config, FileEntry, FileMetadata, GraphMode, MetadataStore, ReportFormat};
use bd_graph::DigraphBuilder;
use bd_scanner::{ProcessStats, ProjectScanner, ScanResult};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Dependency inventory for multi-file creative projects.
///
/// Walks a project folder, extracts per-file metadata, expands the files
/// each scene container links to, and builds folder or file dependency graphs.
#[derive(Parser)]
#[command(name = "blendoc", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Project folder to scan.
    ///
    /// Defaults to the current directory.
    #[arg(long, global = true, env = "BLENDOC_FOLDER")]
    folder: Option<Utf8PathBuf>,

    /// JSON configuration file. Flags override its values.
    #[arg(long, global = true, env = "BLENDOC_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Add and expand files referenced from outside the project folder.
    #[arg(long, global = true, env = "BLENDOC_FOLLOW_EXTERNAL")]
    follow_external: bool,

    /// Blender executable (searched on PATH if not specified).
    #[arg(long, global = true, env = "BLENDOC_BLENDER_PATH")]
    blender_path: Option<Utf8PathBuf>,

    /// Seconds before a Blender invocation is killed.
    #[arg(long, global = true, env = "BLENDOC_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Only scan files directly inside the project folder.
    #[arg(long, global = true)]
    no_recursive: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Scan the project and display a summary.
    Scan {
        /// Show every processed file.
        #[arg(short, long)]
        detailed: bool,
    },

    /// Build and export the dependency graph.
    Graph {
        /// Node granularity (defaults to the configured mode).
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Output format (defaults to the configured format).
        #[arg(short, long, value_enum)]
        format: Option<GraphFormat>,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },

    /// Export the per-file inventory.
    Inventory {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = InventoryFormat::Json)]
        format: InventoryFormat,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },
}

/// Graph node granularity.
#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// One node per folder.
    Folder,
    /// One node per file.
    File,
}

impl From<ModeArg> for GraphMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Folder => Self::Folder,
            ModeArg::File => Self::File,
        }
    }
}

/// Graph output format.
#[derive(Clone, Copy, ValueEnum)]
enum GraphFormat {
    /// Graphviz DOT.
    Dot,
    /// JSON with statistics.
    Json,
}

impl From<GraphFormat> for ReportFormat {
    fn from(format: GraphFormat) -> Self {
        match format {
            GraphFormat::Dot => Self::Dot,
            GraphFormat::Json => Self::Json,
        }
    }
}

/// Inventory output format.
#[derive(Clone, Copy, ValueEnum)]
enum InventoryFormat {
    /// JSON format.
    Json,
    /// CSV format.
    Csv,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `warn` level by default so that
/// reports written to stdout stay clean.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "warn" };
        EnvFilter::new(format!("{level},ignore=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Builds a [`Config`] from the optional config file and CLI flags.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded, the folder is not
/// a directory, or an option is out of range.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load config {path}: {e}"))?,
        None => Config::default(),
    };

    if let Some(folder) = &cli.folder {
        config.scan.root_path.clone_from(folder);
    }
    if config.scan.root_path.as_str().is_empty() {
        config.scan.root_path = Utf8PathBuf::from(".");
    }
    if cli.follow_external {
        config.scan.follow_external = true;
    }
    if cli.no_recursive {
        config.scan.recursive = false;
    }
    if cli.blender_path.is_some() {
        config.scene.blender_path.clone_from(&cli.blender_path);
    }
    if let Some(secs) = cli.timeout_secs {
        config.scene.timeout_secs = secs;
    }

    config.validate_root()?;
    config.validate()?;

    Ok(config)
}

/// Runs the scan pipeline for `config`.
fn scan_project(config: &Config) -> color_eyre::Result<ScanResult> {
    info!(folder = %config.scan.root_path, "Starting scan");
    let scanner = ProjectScanner::new(config.clone())?;
    let result = scanner.scan()?;
    info!(
        files = result.store.len(),
        links = result.links.link_count(),
        errors = result.errors.len(),
        "Scan complete"
    );
    Ok(result)
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs a one-shot scan with summary output.
///
/// # Errors
///
/// Returns an error if scanning fails.
fn run_scan(config: &Config, detailed: bool) -> color_eyre::Result<()> {
    let result = scan_project(config)?;

    print_scan_summary(&result);

    if detailed {
        print_detailed_file_list(&result);
    }

    if !result.errors.is_empty() {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        writeln!(handle)?;
        writeln!(handle, "Errors ({}):", result.errors.len())?;
        for error in &result.errors {
            writeln!(handle, "  {error}")?;
        }
    }

    Ok(())
}

/// Builds the dependency graph and writes it in the requested format.
///
/// # Errors
///
/// Returns an error if scanning, rendering, or writing fails.
fn run_graph(
    config: &Config,
    mode: Option<ModeArg>,
    format: Option<GraphFormat>,
    output: Option<&Utf8Path>,
) -> color_eyre::Result<()> {
    let result = scan_project(config)?;

    let mode = mode.map_or(config.report.graph_mode, GraphMode::from);
    let format = format.map_or(config.report.format, ReportFormat::from);
    let graph = DigraphBuilder::new(&result.store, &result.links).build(mode);

    let content = match format {
        ReportFormat::Dot => bd_graph::to_dot(&graph),
        ReportFormat::Json => bd_graph::to_json(&graph)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to serialize JSON: {}", e))?,
    };

    write_output(&content, output)
}

/// Writes the file inventory.
///
/// # Errors
///
/// Returns an error if scanning or writing fails.
fn run_inventory(
    config: &Config,
    format: InventoryFormat,
    output: Option<&Utf8Path>,
) -> color_eyre::Result<()> {
    let result = scan_project(config)?;

    let content = match format {
        InventoryFormat::Json => generate_json_inventory(&result.store, &result.stats)?,
        InventoryFormat::Csv => generate_csv_inventory(&result.store),
    };

    write_output(&content, output)
}

fn write_output(content: &str, output: Option<&Utf8Path>) -> color_eyre::Result<()> {
    if let Some(output_path) = output {
        std::fs::write(output_path.as_std_path(), content)?;
        info!(path = %output_path, "Report written");
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{content}")?;
    }
    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Prints a summary of the scan.
fn print_scan_summary(result: &ScanResult) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let store = result.store.stats();
    let stats = &result.stats;

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Project Scan Summary");
    let _ = writeln!(handle, "====================");
    let _ = writeln!(handle);
    if result.scene_tool {
        let _ = writeln!(handle, "Scene tool:          available");
    } else {
        let _ = writeln!(
            handle,
            "Scene tool:          not found (scene files were not expanded)"
        );
    }
    let _ = writeln!(handle, "Files:               {}", store.total_entries);
    let _ = writeln!(handle, "  Leaf:              {}", stats.leaves);
    let _ = writeln!(
        handle,
        "  Containers:        {} ({:.1}%)",
        stats.containers,
        stats.container_percent()
    );
    let _ = writeln!(handle, "  Unknown:           {}", stats.unknown);
    let _ = writeln!(handle, "  Discovered:        {}", stats.discovered);
    let _ = writeln!(handle, "Folders:             {}", store.total_folders);
    let _ = writeln!(handle, "File types:          {}", store.unique_types);
    let _ = writeln!(handle, "Total size:          {} bytes", store.total_size);
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Links:               {}", result.links.link_count());
    let _ = writeln!(handle, "  External skipped:  {}", stats.external_skipped);
    let _ = writeln!(handle, "  Missing targets:   {}", stats.missing);
    let _ = writeln!(handle, "  Cycles rejected:   {}", stats.cycles_rejected);
    let _ = writeln!(handle, "Failed extractions:  {}", stats.failed);
}

/// Prints every processed file in completion order.
fn print_detailed_file_list(result: &ScanResult) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Files ({}):", result.processed.len());
    for entry in result.processed.iter().filter_map(|&id| result.store.entry(id)) {
        let summary = entry
            .metadata
            .as_ref()
            .map_or_else(|| "-".to_owned(), FileMetadata::summary);
        let _ = writeln!(
            handle,
            "  {:<9} {}  ({} bytes, {})",
            entry.kind().label(),
            result.store.get_relative_path(entry),
            entry.size,
            summary
        );

        if let Some(container) = entry.metadata.as_ref().and_then(FileMetadata::as_container) {
            for target in &container.external_links {
                let _ = writeln!(handle, "      external: {target}");
            }
            for target in &container.rejected_links {
                let _ = writeln!(handle, "      cycle:    {target}");
            }
        }
    }
}

/// One inventory row.
#[derive(serde::Serialize)]
struct InventoryEntry<'a> {
    path: String,
    name: &'a str,
    folder: &'a Utf8Path,
    size: u64,
    file_type: &'a str,
    kind: &'static str,
    links: Vec<String>,
    metadata: Option<&'a FileMetadata>,
}

fn inventory_entry<'a>(store: &'a MetadataStore, entry: &'a FileEntry) -> InventoryEntry<'a> {
    InventoryEntry {
        path: store.get_relative_path(entry),
        name: entry.name(),
        folder: entry.folder(),
        size: entry.size,
        file_type: &entry.file_type,
        kind: entry.kind().label(),
        links: entry
            .links()
            .iter()
            .filter_map(|&id| store.entry(id))
            .map(|target| store.get_relative_path(target))
            .collect(),
        metadata: entry.metadata.as_ref(),
    }
}

/// Generates a JSON inventory.
fn generate_json_inventory(
    store: &MetadataStore,
    stats: &ProcessStats,
) -> color_eyre::Result<String> {
    #[derive(serde::Serialize)]
    struct Inventory<'a> {
        store: bd_core::StoreStats,
        traversal: &'a ProcessStats,
        files: Vec<InventoryEntry<'a>>,
    }

    let inventory = Inventory {
        store: store.stats(),
        traversal: stats,
        files: store.entries().map(|e| inventory_entry(store, e)).collect(),
    };
    serde_json::to_string_pretty(&inventory)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to serialize JSON: {}", e))
}

/// Generates a CSV inventory.
fn generate_csv_inventory(store: &MetadataStore) -> String {
    use std::fmt::Write;

    let mut output = String::from("path,file_type,kind,size,link_count,summary\n");

    for entry in store.entries() {
        let row = inventory_entry(store, entry);
        let escaped_path = escape_csv(&row.path);
        let summary = row
            .metadata
            .map_or_else(|| "-".to_owned(), FileMetadata::summary);
        let _ = writeln!(
            output,
            "{escaped_path},{},{},{},{},{}",
            escape_csv(row.file_type),
            row.kind,
            row.size,
            row.links.len(),
            escape_csv(&summary)
        );
    }

    output
}

/// Escapes a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_owned()
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Route to appropriate command
    let config = build_config(&cli)?;
    match &cli.command {
        Commands::Scan { detailed } => run_scan(&config, *detailed),
        Commands::Graph {
            mode,
            format,
            output,
        } => run_graph(&config, *mode, *format, output.as_deref()),
        Commands::Inventory { format, output } => {
            run_inventory(&config, *format, output.as_deref())
        }
    }
}
