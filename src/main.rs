//! Synheart Affect Monitor CLI
//!
//! Critical-issue detection over facial and vocal emotion readings.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use synheart_affect_monitor::{
    audit::{AuditLog, PersistedStats},
    config::Config,
    core::{generate_report, history_summary, Issue, IssueDetector, IssueHistory, ObservationBuffer},
    observation::{ingest_json, parse_timestamp, FeedEvent, ObservationFeed},
    MONITORING_DECLARATION, VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synheart-affect")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Critical-issue detection over emotion readings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one check over a batch of observations (JSON array or JSON lines)
    Check {
        /// Observation file
        #[arg(long, short)]
        input: PathBuf,

        /// Last time the user interacted (RFC 3339); omit to skip the breakdown rule
        #[arg(long)]
        last_interaction: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Do not record raised issues in the persisted history
        #[arg(long)]
        dry_run: bool,
    },

    /// Continuously check a stream of JSON-line observations
    Watch {
        /// Observation stream (defaults to stdin)
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Seconds between checks (defaults to the configured interval)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// List issues raised recently
    History {
        /// Hours to look back (defaults to the configured retention)
        #[arg(long)]
        hours: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write a report of recent issues
    Report {
        /// Hours to look back (defaults to the configured retention)
        #[arg(long)]
        hours: Option<u64>,

        /// Output file (defaults to a timestamped file under the report directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show monitoring status
    Status,

    /// Display the monitoring declaration
    Declaration,

    /// Show configuration
    Config {
        /// Write the current configuration (defaults if none exists) to the config file
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            input,
            last_interaction,
            format,
            dry_run,
        } => cmd_check(&input, last_interaction.as_deref(), format, dry_run),
        Commands::Watch { input, interval } => cmd_watch(input, interval),
        Commands::History { hours, format } => cmd_history(hours, format),
        Commands::Report { hours, output } => cmd_report(hours, output),
        Commands::Status => cmd_status(),
        Commands::Declaration => {
            println!("{MONITORING_DECLARATION}");
            Ok(())
        }
        Commands::Config { init } => cmd_config(init),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Log to stderr so reports on stdout stay clean.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Result<Config> {
    Config::load().with_context(|| format!("loading {}", Config::config_path().display()))
}

fn load_detector(config: &Config) -> Result<IssueDetector> {
    let history = IssueHistory::load(&config.history_file()).context("loading issue history")?;
    Ok(IssueDetector::with_history(config.thresholds.clone(), history))
}

fn render_report(config: &Config, issues: &[Issue]) -> Result<String> {
    let now = Utc::now().with_timezone(&config.tz()?);
    Ok(generate_report(issues, now))
}

fn cmd_check(
    input: &Path,
    last_interaction: Option<&str>,
    format: OutputFormat,
    dry_run: bool,
) -> Result<()> {
    let config = load_config()?;
    let last_interaction = last_interaction
        .map(parse_timestamp)
        .transpose()
        .context("parsing --last-interaction")?;

    let content = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let outcome = ingest_json(&content, Utc::now())?;
    if !outcome.rejected.is_empty() {
        eprintln!(
            "Excluded {} of {} observations as malformed",
            outcome.rejected.len(),
            outcome.total()
        );
    }

    let mut audit = AuditLog::with_persistence(config.audit_file());
    audit.record_observations(outcome.accepted.len() as u64);
    audit.record_rejected(outcome.rejected.len() as u64);

    let mut detector = load_detector(&config)?;
    let issues = detector.check_now(&outcome.accepted, last_interaction);
    audit.record_check(issues.len() as u64);

    match format {
        OutputFormat::Text => println!("{}", render_report(&config, &issues)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&issues)?),
    }

    if !dry_run {
        detector
            .issue_history()
            .save(&config.history_file())
            .context("saving issue history")?;
        if let Err(e) = audit.save() {
            tracing::warn!("Could not save audit stats: {e}");
        }
    }

    Ok(())
}

fn cmd_watch(input: Option<PathBuf>, interval: Option<u64>) -> Result<()> {
    let config = load_config()?;
    if let Err(e) = config.ensure_directories() {
        tracing::warn!("Could not create directories: {e}");
    }
    let check_interval = interval
        .map(Duration::from_secs)
        .unwrap_or(config.check_interval);

    println!("Synheart Affect Monitor v{VERSION}");
    println!();
    println!("  Check interval: {}s", check_interval.as_secs());
    println!("  Observation buffer: {}", config.observation_buffer_size);
    println!(
        "  Source: {}",
        input
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdin".to_string())
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let mut feed = match input {
        Some(path) => {
            let file = std::fs::File::open(&path)
                .with_context(|| format!("opening {}", path.display()))?;
            ObservationFeed::spawn(BufReader::new(file))
        }
        None => ObservationFeed::spawn(BufReader::new(std::io::stdin())),
    };

    let retention = lookback(&config, None)?;
    let mut audit = AuditLog::with_persistence(config.audit_file());
    let mut detector = load_detector(&config)?;
    let mut buffer = ObservationBuffer::new(config.observation_buffer_size);
    let tz = config.tz()?;

    // The session counts as an interaction.
    let mut last_interaction: Option<DateTime<Utc>> = Some(Utc::now());

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    let receiver = feed.receiver().clone();
    let mut last_check = Instant::now();
    let mut feed_open = true;

    while running.load(Ordering::SeqCst) && feed_open {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(FeedEvent::Observation(obs)) => {
                audit.record_observations(1);
                buffer.push(obs);
            }
            Ok(FeedEvent::Interaction(at)) => {
                last_interaction = Some(at);
            }
            Ok(FeedEvent::Rejected { line, reason }) => {
                audit.record_rejected(1);
                tracing::warn!(line, "Excluding observation: {reason}");
            }
            Ok(FeedEvent::Closed) | Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                tracing::info!("Observation feed closed");
                feed_open = false;
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
        }

        // End of input gets one last check over what was buffered.
        if last_check.elapsed() >= check_interval || !feed_open {
            let issues = detector.check_now(buffer.observations(), last_interaction);
            audit.record_check(issues.len() as u64);

            if !issues.is_empty() {
                println!();
                println!("⚠️  CRITICAL ISSUE DETECTED ⚠️");
                println!("{}", generate_report(&issues, Utc::now().with_timezone(&tz)));
            }
            last_check = Instant::now();
        }
    }

    println!();
    println!("Stopping monitor...");
    feed.stop();

    let history = detector.issue_history_mut();
    if let Some(cutoff) = Utc::now().checked_sub_signed(retention) {
        let pruned = history.prune_before(cutoff);
        if pruned > 0 {
            tracing::info!(pruned, "Dropped issues older than the retention window");
        }
    }
    history
        .save(&config.history_file())
        .context("saving issue history")?;

    if let Err(e) = audit.save() {
        tracing::warn!("Could not save audit stats: {e}");
    }

    println!();
    println!("{}", audit.summary());
    Ok(())
}

fn lookback(config: &Config, hours: Option<u64>) -> Result<ChronoDuration> {
    let hours = hours.unwrap_or(config.history_retention_hours);
    i64::try_from(hours)
        .ok()
        .and_then(ChronoDuration::try_hours)
        .with_context(|| format!("look-back of {hours} hours is out of range"))
}

fn cmd_history(hours: Option<u64>, format: OutputFormat) -> Result<()> {
    let config = load_config()?;
    let detector = load_detector(&config)?;
    let issues = detector.history_now(lookback(&config, hours)?);

    match format {
        OutputFormat::Text => println!("{}", history_summary(&issues, issues.len())),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&issues)?),
    }
    Ok(())
}

fn cmd_report(hours: Option<u64>, output: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;
    let detector = load_detector(&config)?;
    let issues = detector.history_now(lookback(&config, hours)?);
    let report = render_report(&config, &issues)?;

    let path = output.unwrap_or_else(|| {
        config
            .report_path
            .join(format!("report_{}.txt", Utc::now().format("%Y%m%d_%H%M%S")))
    });
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &report).with_context(|| format!("writing {}", path.display()))?;

    println!("{report}");
    println!("Report written to {path:?}");
    Ok(())
}

fn cmd_status() -> Result<()> {
    let config = load_config()?;

    println!("Synheart Affect Monitor Status");
    println!("==============================");
    println!();

    println!("Configuration:");
    println!("  Check interval: {}s", config.check_interval.as_secs());
    println!("  Observation buffer: {}", config.observation_buffer_size);
    println!("  History retention: {}h", config.history_retention_hours);
    println!("  Report timezone: {}", config.timezone);
    println!();

    match PersistedStats::read(&config.audit_file()) {
        Ok(Some(stats)) => {
            let c = stats.counters;
            println!("Cumulative Statistics:");
            println!("  Observations evaluated: {}", c.observations_received);
            println!("  Observations rejected: {}", c.observations_rejected);
            println!("  Checks run: {}", c.checks_run);
            println!("  Issues raised: {}", c.issues_raised);
            println!("  Last updated: {}", stats.last_updated.to_rfc3339());
        }
        Ok(None) => println!("No previous session data found."),
        Err(e) => tracing::warn!("Could not read audit stats: {e}"),
    }
    println!();

    let detector = load_detector(&config)?;
    let recent = detector.history_now(lookback(&config, None)?);
    println!("Last {}h:", config.history_retention_hours);
    println!("{}", history_summary(&recent, 5));
    Ok(())
}

fn cmd_config(init: bool) -> Result<()> {
    let config = load_config()?;
    if init {
        config.save().context("writing configuration")?;
        println!("Wrote {:?}", Config::config_path());
        println!();
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")
}
