//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use nbindex_core::{
    IndexBuildResult, build_index, execute_operation, validate_links, write_index_files,
};
use nbindex_shared::{
    AppConfig, BuildOptions, Inventory, RunMetadata, init_config, load_config, load_config_from,
    relative_link_path,
};
use tracing::info;

const UNKNOWN: &str = "Unknown";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// nbindex: plan notebook export layouts and build navigable indexes.
#[derive(Parser)]
#[command(
    name = "nbindex",
    version,
    about = "Plan a notebook export layout and write its navigable index files.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.nbindex/nbindex.toml.
    #[arg(long, env = "NBINDEX_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Plan the layout, create its directories, and write both index files.
    Plan {
        /// Inventory JSON produced by the notebook scan.
        #[arg(long)]
        inventory: PathBuf,

        /// Export root to plan into.
        #[arg(long)]
        out: PathBuf,

        /// Print the planned operations without touching the disk.
        #[arg(long)]
        dry_run: bool,
    },

    /// Check that every planned path exists under an exported root.
    Validate {
        /// Inventory JSON the export was made from.
        #[arg(long)]
        inventory: PathBuf,

        /// Export root to audit.
        #[arg(long)]
        out: PathBuf,

        /// Exit with an error if any link is missing.
        #[arg(long)]
        strict: bool,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "nbindex=info",
        1 => "nbindex=debug",
        _ => "nbindex=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Plan {
            inventory,
            out,
            dry_run,
        } => cmd_plan(config_path, &inventory, &out, dry_run),
        Command::Validate {
            inventory,
            out,
            strict,
            json,
        } => cmd_validate(config_path, &inventory, &out, strict, json),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Run metadata from the inventory, with the current time as the fallback timestamp.
pub(crate) fn run_metadata(inventory: &Inventory) -> RunMetadata {
    RunMetadata {
        scan_timestamp: inventory
            .scan_timestamp
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        account: inventory.account.clone().unwrap_or_default(),
        tenant: inventory.tenant.clone().unwrap_or_else(|| UNKNOWN.into()),
        scope: inventory.scope.clone().unwrap_or_else(|| UNKNOWN.into()),
    }
}

fn build(
    config_path: Option<&Path>,
    inventory: &Path,
    out: &Path,
) -> Result<(IndexBuildResult, BuildOptions)> {
    let config = resolve_config(config_path)?;
    let options = BuildOptions::from(&config);
    let inventory = Inventory::load(inventory)?;
    let meta = run_metadata(&inventory);

    info!(
        notebooks = inventory.notebooks.len(),
        out = %out.display(),
        "building index"
    );
    let result = build_index(out, &inventory, &meta, &options);
    Ok((result, options))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_plan(
    config_path: Option<&Path>,
    inventory: &Path,
    out: &Path,
    dry_run: bool,
) -> Result<()> {
    let (result, options) = build(config_path, inventory, out)?;

    if dry_run {
        for op in &result.operations {
            let relative = relative_link_path(op.path(), &result.export_root);
            println!("{} {relative}", op.name());
        }
        print_summary(&result);
        return Ok(());
    }

    let bar = ProgressBar::new(result.operations.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:30}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    bar.set_message("creating directories");
    for op in &result.operations {
        execute_operation(op)?;
        bar.inc(1);
    }
    bar.finish_and_clear();

    let written = write_index_files(&result, &options)?;

    print_summary(&result);
    let (markdown, json) = (&written.markdown, &written.json);
    println!("  Index:       {} ({} bytes)", markdown.filename, markdown.size_bytes);
    println!("  Inventory:   {} ({} bytes)", json.filename, json.size_bytes);
    println!("  Path:        {}", result.export_root.display());
    println!();
    Ok(())
}

fn print_summary(result: &IndexBuildResult) {
    let totals = &result.totals;
    println!();
    println!("  Notebooks:   {}", totals.notebooks);
    println!("  Groups:      {}", totals.section_groups);
    println!("  Sections:    {}", totals.sections);
    println!("  Pages:       {}", totals.pages);
    println!("  Orphans:     {}", totals.orphans);
    println!("  Directories: {}", result.operations.len());
    if !result.errors.is_empty() {
        println!("  Scan errors: {}", result.errors.len());
    }
    if !result.collisions.is_empty() {
        println!("  Collisions:  {}", result.collisions.len());
    }
}

fn cmd_validate(
    config_path: Option<&Path>,
    inventory: &Path,
    out: &Path,
    strict: bool,
    json: bool,
) -> Result<()> {
    let (result, _) = build(config_path, inventory, out)?;
    let report = validate_links(&result);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for link in &report.missing {
            println!("  missing: {} ({})", link.relative_target, link.context);
        }
        println!();
        println!("  Checked: {}", report.checked);
        println!("  Missing: {}", report.missing.len());
        println!();
    }

    if strict && !report.is_clean() {
        return Err(eyre!(
            "{} of {} planned links are missing under '{}'",
            report.missing.len(),
            report.checked,
            out.display()
        ));
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
