//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use parcel_core::pipeline::ProgressReporter;
use parcel_core::{
    AssumptionEdits, apply_edits, build_assumptions, run_full_workflow, run_with_assumptions,
    select_model, summarize_report,
};
use parcel_shared::{
    AppConfig, AssetContext, FullValuationReport, ParcelError, ValuationAssumptions,
    config_file_path, init_config, load_config, load_config_from,
};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::analyst::CliAnalyst;
use crate::render;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Parcel: valuation and feasibility reports for real estate assets.
#[derive(Parser)]
#[command(
    name = "parcel",
    version,
    about = "Value a real estate asset and score its feasibility for tokenization.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.parcel/parcel.toml.
    #[arg(long, global = true)]
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

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Analyst options shared by every command that calls out.
#[derive(Args, Debug, Clone)]
pub(crate) struct AnalystArgs {
    /// Run without an analyst; every estimate and analysis uses its fallback.
    #[arg(long)]
    pub offline: bool,

    /// Override the analyst model from the config file.
    #[arg(long, env = "PARCEL_MODEL")]
    pub model: Option<String>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the full workflow and print the report.
    Value {
        /// Asset description (.toml or .json).
        asset: PathBuf,

        /// Output format.
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Append a short investor memo.
        #[arg(long)]
        summary: bool,

        #[command(flatten)]
        analyst: AnalystArgs,
    },

    /// Build the assumption snapshot and print it as JSON.
    Assumptions {
        /// Asset description (.toml or .json).
        asset: PathBuf,

        #[command(flatten)]
        analyst: AnalystArgs,
    },

    /// Value again from a saved (optionally edited) assumption snapshot.
    Revalue {
        /// Asset description (.toml or .json).
        asset: PathBuf,

        /// Snapshot written by `parcel assumptions`.
        #[arg(long)]
        assumptions: PathBuf,

        /// Field edits to apply on top of the snapshot (.toml or .json).
        #[arg(long)]
        edits: Option<PathBuf>,

        /// Output format.
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Append a short investor memo.
        #[arg(long)]
        summary: bool,

        #[command(flatten)]
        analyst: AnalystArgs,
    },

    /// Print the valuation model selected for an asset.
    Model {
        /// Asset description (.toml or .json).
        asset: PathBuf,
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

/// Initialize tracing based on CLI flags. Logs go to stderr so reports can be piped.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "parcel=info",
        1 => "parcel=debug",
        _ => "parcel=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
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
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Value {
            asset,
            format,
            summary,
            analyst,
        } => {
            let config = resolve_config(config_path.as_deref(), &analyst)?;
            cmd_value(&config, &asset, format, summary, &analyst).await
        }
        Command::Assumptions { asset, analyst } => {
            let config = resolve_config(config_path.as_deref(), &analyst)?;
            cmd_assumptions(&config, &asset, &analyst).await
        }
        Command::Revalue {
            asset,
            assumptions,
            edits,
            format,
            summary,
            analyst,
        } => {
            let config = resolve_config(config_path.as_deref(), &analyst)?;
            cmd_revalue(
                &config,
                &asset,
                &assumptions,
                edits.as_deref(),
                format,
                summary,
                &analyst,
            )
            .await
        }
        Command::Model { asset } => cmd_model(&asset),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

/// Load config from `--config` or the default location, then apply flag overrides.
fn resolve_config(path: Option<&Path>, args: &AnalystArgs) -> Result<AppConfig> {
    let mut config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    if let Some(model) = &args.model {
        config.analyst.model = model.clone();
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Input files
// ---------------------------------------------------------------------------

/// Read a `.json` or `.toml` file (anything not `.json` is treated as TOML).
pub(crate) fn read_document<T: DeserializeOwned>(path: &Path) -> parcel_shared::Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| ParcelError::io(path, e))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content)
            .map_err(|e| ParcelError::parse(format!("{}: {e}", path.display())))
    } else {
        toml::from_str(&content).map_err(|e| ParcelError::parse(format!("{}: {e}", path.display())))
    }
}

fn load_asset(path: &Path) -> Result<AssetContext> {
    let asset: AssetContext =
        read_document(path).wrap_err_with(|| format!("loading asset {}", path.display()))?;
    if asset.name.trim().is_empty() {
        let message = format!("{}: asset name is empty", path.display());
        return Err(ParcelError::validation(message).into());
    }
    info!(
        asset = %asset.name,
        asset_type = %asset.asset_type,
        status = %asset.status,
        "asset loaded"
    );
    Ok(asset)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_value(
    config: &AppConfig,
    asset_path: &Path,
    format: OutputFormat,
    summary: bool,
    args: &AnalystArgs,
) -> Result<()> {
    let asset = load_asset(asset_path)?;
    let analyst = CliAnalyst::from_config(config, args.offline)?;

    let reporter = CliProgress::new();
    let report = run_full_workflow(&analyst, &asset, &config.policy, &reporter).await;

    emit_report(&analyst, &report, format, summary).await
}

async fn cmd_assumptions(config: &AppConfig, asset_path: &Path, args: &AnalystArgs) -> Result<()> {
    let asset = load_asset(asset_path)?;
    let analyst = CliAnalyst::from_config(config, args.offline)?;

    let assumptions = build_assumptions(&analyst, &asset, &config.policy).await;
    println!("{}", serde_json::to_string_pretty(&assumptions)?);
    Ok(())
}

async fn cmd_revalue(
    config: &AppConfig,
    asset_path: &Path,
    assumptions_path: &Path,
    edits_path: Option<&Path>,
    format: OutputFormat,
    summary: bool,
    args: &AnalystArgs,
) -> Result<()> {
    let asset = load_asset(asset_path)?;
    let snapshot: ValuationAssumptions = read_document(assumptions_path)
        .wrap_err_with(|| format!("loading assumptions {}", assumptions_path.display()))?;

    let assumptions = match edits_path {
        Some(path) => {
            let edits: AssumptionEdits =
                read_document(path).wrap_err_with(|| format!("loading edits {}", path.display()))?;
            if edits.is_empty() {
                info!(path = %path.display(), "edits file changes nothing");
            }
            apply_edits(&snapshot, &edits)
        }
        None => snapshot,
    };

    let analyst = CliAnalyst::from_config(config, args.offline)?;
    let reporter = CliProgress::new();
    let report = run_with_assumptions(&analyst, &asset, assumptions, &reporter).await;

    emit_report(&analyst, &report, format, summary).await
}

async fn emit_report(
    analyst: &CliAnalyst,
    report: &FullValuationReport,
    format: OutputFormat,
    summary: bool,
) -> Result<()> {
    let memo = if summary {
        Some(summarize_report(analyst, report).await)
    } else {
        None
    };

    match format {
        OutputFormat::Json => {
            let mut value = serde_json::to_value(report)?;
            if let (Some(memo), Some(obj)) = (memo, value.as_object_mut()) {
                obj.insert("summary".to_string(), serde_json::Value::String(memo));
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            print!("{}", render::report_text(report));
            if let Some(memo) = memo {
                println!();
                println!("  Summary");
                println!("  {memo}");
                println!();
            }
        }
    }
    Ok(())
}

fn cmd_model(asset_path: &Path) -> Result<()> {
    let asset = load_asset(asset_path)?;
    println!("{}", select_model(&asset));
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let (source, config) = match path {
        Some(p) => (p.to_path_buf(), load_config_from(p)?),
        None => (config_file_path()?, load_config()?),
    };
    let toml_str = toml::to_string_pretty(&config)?;
    println!("# {}", source.display());
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn stage_done(&self, stage: &str) {
        self.spinner.println(format!("  ✓ {stage}"));
    }

    fn done(&self, _report: &FullValuationReport) {
        self.spinner.finish_and_clear();
    }
}
