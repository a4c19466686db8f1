//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use contactsync_core::{RunAborted, SilentProgress, SyncProgress, run_sync};
use contactsync_ingest::{load_template, read_records};
use contactsync_remote::BrevoClient;
use contactsync_shared::{
    AppConfig, ProcessingReport, SyncSettings, init_config, load_config, load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::schedule::{daily_input, next_tick, parse_schedule};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// contactsync: sync vendor contacts to Brevo and send the daily campaign.
#[derive(Parser)]
#[command(
    name = "contactsync",
    version,
    about = "Upsert exported contacts into Brevo, then create and send a campaign to them.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.contactsync/contactsync.toml.
    #[arg(long, global = true, env = "CONTACTSYNC_CONFIG")]
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
    /// Sync one CSV export and dispatch the campaign.
    Run {
        /// Path to the CSV export.
        csv: PathBuf,

        /// Write the JSON report to this file.
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print the JSON report to stdout.
        #[arg(long)]
        json: bool,
    },

    /// Run daily on the configured cron schedule.
    Schedule {
        /// Evaluate today's input once and exit.
        #[arg(long)]
        once: bool,
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
///
/// Logs go to stderr so `run --json` keeps stdout clean.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "contactsync=info",
        1 => "contactsync=debug",
        _ => "contactsync=trace",
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
    match cli.command {
        Command::Run { csv, report, json } => {
            let config = resolve_config(cli.config.as_deref())?;
            cmd_run(&config, &csv, report.as_deref(), json).await
        }
        Command::Schedule { once } => {
            let config = resolve_config(cli.config.as_deref())?;
            cmd_schedule(&config, once).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()).await,
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

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

async fn cmd_run(
    config: &AppConfig,
    csv: &Path,
    report_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let settings = SyncSettings::resolve(config)?;

    info!(csv = %csv.display(), "processing CSV export");

    let progress = CliProgress::new();
    let outcome = sync_file(&settings, csv, &progress).await?;
    let report = match &outcome {
        Ok(report) => report,
        Err(aborted) => {
            progress.abandon();
            aborted.report.as_ref()
        }
    };

    if let Some(path) = report_path {
        write_report(path, report)?;
        info!(path = %path.display(), "report written");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_summary(report);
    }

    match outcome {
        Ok(_) => Ok(()),
        Err(aborted) => Err(aborted.into()),
    }
}

/// Load inputs and run one sync. The outer error covers input loading only.
async fn sync_file(
    settings: &SyncSettings,
    csv: &Path,
    progress: &dyn SyncProgress,
) -> Result<std::result::Result<ProcessingReport, RunAborted>> {
    let records = read_records(csv)?;
    let template = load_template(&settings.template_path)?;
    let client = BrevoClient::new(&settings.remote)?;

    info!(records = records.len(), "loaded input");

    let outcome = run_sync(&client, settings, &records, &template, progress).await;
    match &outcome {
        Ok(report) => log_summary(report),
        Err(aborted) => {
            error!(stage = %aborted.stage, error = %aborted.error, "processing aborted");
            log_summary(&aborted.report);
        }
    }
    Ok(outcome)
}

fn write_report(path: &Path, report: &ProcessingReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .map_err(|e| eyre!("failed to write report to {}: {e}", path.display()))
}

/// Log run totals and every error entry.
fn log_summary(report: &ProcessingReport) {
    let campaign = &report.campaign_info;
    info!(
        run_id = %report.run_id,
        total_existing_contacts = report.total_existing_contacts,
        added = report.added_to_campaign.len(),
        updated = report.updated_contacts.len(),
        errors = report.errors.len(),
        campaign_name = campaign.campaign_name.as_deref().unwrap_or("-"),
        campaign_id = campaign.campaign_id.unwrap_or(0),
        campaign_state = %campaign.state,
        "processing results"
    );

    for entry in &report.errors {
        warn!(
            email = entry.email.as_deref().unwrap_or("-"),
            details = entry.details.as_deref().unwrap_or("-"),
            "error: {}",
            entry.error
        );
    }
}

fn print_summary(report: &ProcessingReport) {
    let campaign = &report.campaign_info;
    println!();
    println!("  Run:       {}", report.run_id);
    println!("  Existing:  {}", report.total_existing_contacts);
    println!("  Added:     {}", report.added_to_campaign.len());
    println!("  Updated:   {}", report.updated_contacts.len());
    println!("  Errors:    {}", report.errors.len());
    match campaign.campaign_id {
        Some(id) => println!("  Campaign:  {id} ({})", campaign.state),
        None => println!("  Campaign:  {}", campaign.state),
    }
    println!();
}

// ---------------------------------------------------------------------------
// schedule
// ---------------------------------------------------------------------------

async fn cmd_schedule(config: &AppConfig, once: bool) -> Result<()> {
    let settings = SyncSettings::resolve(config)?;

    if once {
        run_tick(config, &settings, chrono::Local::now().date_naive()).await;
        return Ok(());
    }

    let schedule = parse_schedule(&config.schedule.cron)?;
    info!(cron = %config.schedule.cron, "scheduler started");

    loop {
        let now = chrono::Local::now();
        let next = next_tick(&schedule, now).ok_or_else(|| {
            eyre!("cron expression '{}' has no upcoming ticks", config.schedule.cron)
        })?;
        let wait = (next - now).to_std().unwrap_or_default();
        info!(next = %next.to_rfc3339(), "waiting for next run");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("scheduler stopped");
                return Ok(());
            }
        }

        run_tick(config, &settings, next.date_naive()).await;
    }
}

/// One scheduled run. Failures are logged; the scheduler keeps going.
async fn run_tick(config: &AppConfig, settings: &SyncSettings, date: chrono::NaiveDate) {
    info!(%date, "running scheduled task");

    let Some(csv) = daily_input(&config.schedule, date) else {
        let expected = config.schedule.input_path_for(date);
        info!(path = %expected.display(), "CSV file not found; skipping this run");
        return;
    };

    match sync_file(settings, &csv, &SilentProgress).await {
        Ok(Ok(_)) => {}
        Ok(Err(aborted)) => error!(error = %aborted, "scheduled run aborted"),
        Err(e) => error!(error = %e, "scheduled run failed to start"),
    }
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
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn abandon(&self) {
        self.spinner.finish_and_clear();
    }
}

impl SyncProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn record_processed(&self, email: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Syncing [{current}/{total}] {email}"));
    }

    fn done(&self, _report: &ProcessingReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
