//! Roaster CLI - Get Your Startup Roasted From the Terminal
//!
//! Wakes the roast service, submits a startup and prints the verdict.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use roaster::api::{ApiState, start_api_server};
use roaster::client::{RoastClient, RoastLevel, RoastRequest};
use roaster::config::Config;
use roaster::readiness::{ProgressStage, ReadinessError, ReadinessPoller};

/// Roaster - brutal startup feedback, cold starts included
#[derive(Debug, Parser)]
#[command(name = "roaster")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Override the service base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Wait until the roast service is awake
    Wait {
        /// Give up after this long (e.g. 90s, 5m); waits forever by default
        #[arg(short, long, value_parser = humantime::parse_duration)]
        timeout: Option<Duration>,

        /// Serve the status API on this port while waiting
        #[arg(long)]
        api_port: Option<u16>,

        /// Keep serving the status API after the service is ready
        #[arg(long)]
        keep_alive: bool,
    },

    /// Probe the service health endpoint once
    Health,

    /// Roast a startup
    Roast {
        /// Read the request from a YAML or JSON file
        #[arg(short, long)]
        request: Option<String>,

        /// Startup name
        #[arg(long, required_unless_present = "request", conflicts_with = "request")]
        name: Option<String>,

        /// What the startup does
        #[arg(long, required_unless_present = "request", conflicts_with = "request")]
        idea: Option<String>,

        /// Who it is for
        #[arg(long, required_unless_present = "request", conflicts_with = "request")]
        users: Option<String>,

        /// Budget, free-form (e.g. "$50k")
        #[arg(long, required_unless_present = "request", conflicts_with = "request")]
        budget: Option<String>,

        /// Roast intensity: soft, medium or nuclear
        #[arg(short, long)]
        level: Option<RoastLevel>,

        /// Wait for the service to wake up before submitting
        #[arg(short, long)]
        wait: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show roast statistics
    Stats {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Generate a default configuration file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "roaster.yaml")]
        output: String,
    },

    /// Validate a configuration file
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn setup_logging(verbose: bool, json: bool) {
    // stdout carries command output only
    build_subscriber(verbose, json, std::io::stderr).init();
}

fn build_subscriber<W>(verbose: bool, json: bool, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        Box::new(registry.with(tracing_subscriber::fmt::layer().json().with_writer(writer)))
    } else {
        Box::new(registry.with(tracing_subscriber::fmt::layer().with_writer(writer)))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.json);

    match cli.command {
        Commands::Wait {
            timeout,
            api_port,
            keep_alive,
        } => {
            let config = load_config(cli.config.as_deref(), cli.base_url.as_deref())?;
            let client = config.client()?;
            wait_until_ready(&config, client, timeout, api_port, keep_alive).await
        }

        Commands::Health => {
            let config = load_config(cli.config.as_deref(), cli.base_url.as_deref())?;
            check_health(&config.client()?).await
        }

        Commands::Roast {
            request,
            name,
            idea,
            users,
            budget,
            level,
            wait,
            format,
        } => {
            let config = load_config(cli.config.as_deref(), cli.base_url.as_deref())?;
            let request = match request {
                Some(path) => load_request(&path, level)?,
                None => RoastRequest::new(
                    name.unwrap_or_default(),
                    idea.unwrap_or_default(),
                    users.unwrap_or_default(),
                    budget.unwrap_or_default(),
                    level.unwrap_or_default(),
                ),
            };
            run_roast(&config, &request, wait, format).await
        }

        Commands::Stats { format } => {
            let config = load_config(cli.config.as_deref(), cli.base_url.as_deref())?;
            show_stats(&config.client()?, format).await
        }

        Commands::Init { output } => init_config(&output),

        Commands::Validate => {
            let Some(path) = cli.config.as_deref() else {
                bail!("validate needs --config <FILE>");
            };
            validate_config(path)
        }
    }
}

/// Load configuration, falling back to defaults when no file is given
fn load_config(path: Option<&str>, base_url: Option<&str>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            tracing::debug!(config = %path, "Loading configuration");
            Config::from_file(path).with_context(|| format!("Failed to load config from {path}"))?
        }
        None => Config::default_config(),
    };

    let config = match base_url {
        Some(url) => config.with_base_url(url),
        None => config,
    };
    config.validate().context("Invalid configuration")?;

    Ok(config)
}

/// Read a request file; `level` overrides the file's roast level
fn load_request(path: &str, level: Option<RoastLevel>) -> Result<RoastRequest> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read request from {path}"))?;
    let mut request: RoastRequest = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse request from {path}"))?;

    if let Some(level) = level {
        request.roast_level = level;
    }
    Ok(request)
}

/// Poll the service until it reports alive
async fn wait_until_ready(
    config: &Config,
    client: RoastClient,
    timeout: Option<Duration>,
    api_port: Option<u16>,
    keep_alive: bool,
) -> Result<()> {
    let target = client.base_url().to_string();
    let mut poller = ReadinessPoller::new(Arc::new(client), config.readiness.clone());

    if let Some(port) = api_port {
        let state = ApiState::new(target.as_str(), poller.subscribe());
        tokio::spawn(async move {
            if let Err(e) = start_api_server(port, state).await {
                tracing::error!(error = %e, "API server error");
            }
        });
    }

    // Log each stage once, the way the loader screen shows one line per stage
    let mut updates = poller.subscribe();
    let reporter = tokio::spawn(async move {
        let mut last_stage: Option<ProgressStage> = None;
        while updates.changed().await.is_ok() {
            let snapshot = *updates.borrow_and_update();
            let stage = snapshot.stage();
            if last_stage != Some(stage) {
                tracing::info!(
                    progress = snapshot.progress.floor() as u32,
                    attempts = snapshot.attempts,
                    "{}",
                    stage.message()
                );
                last_stage = Some(stage);
            }
        }
    });

    let (ready_tx, ready_rx) = oneshot::channel();
    poller.start(move || {
        let _ = ready_tx.send(());
    })?;
    tracing::info!(target = %target, "Waiting for the roast service to wake up");

    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, ready_rx).await {
            Ok(outcome) => outcome,
            Err(_) => {
                reporter.abort();
                bail!(
                    "Service at {target} not ready after {} ({} probes)",
                    humantime::format_duration(limit),
                    poller.snapshot().attempts
                );
            }
        },
        None => ready_rx.await,
    };
    reporter.abort();

    // The callback is dropped unsent only when the poller gave up
    if outcome.is_err() {
        return Err(ReadinessError::Exhausted {
            attempts: poller.snapshot().attempts,
        }
        .into());
    }

    let snapshot = poller.snapshot();
    tracing::info!(
        attempts = snapshot.attempts,
        ready_after_ms = snapshot.ready_after.map(|d| d.as_millis() as u64),
        "Roast service is ready"
    );

    if keep_alive && api_port.is_some() {
        tracing::info!("Keeping alive for API access. Press Ctrl+C to exit.");
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    }

    Ok(())
}

/// Probe `/health` once and print the result
async fn check_health(client: &RoastClient) -> Result<()> {
    let health = client
        .health()
        .await
        .with_context(|| format!("Health check against {} failed", client.base_url()))?;

    println!("Status: {}", health.status);
    if let Some(model) = &health.model {
        println!("Model: {model}");
    }
    if let Some(database) = &health.database {
        println!("Database: {database}");
    }

    if !health.is_alive() {
        bail!("Service is not ready (status: {})", health.status);
    }
    Ok(())
}

/// Validate, submit and print one roast
async fn run_roast(
    config: &Config,
    request: &RoastRequest,
    wait: bool,
    format: OutputFormat,
) -> Result<()> {
    if let Err(errors) = request.validate() {
        let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        bail!("Invalid roast request:\n  - {}", details.join("\n  - "));
    }

    let client = config.client()?;
    if wait {
        wait_until_ready(config, client.clone(), None, None, false).await?;
    }

    tracing::info!(
        startup = %request.startup_name,
        level = %request.roast_level,
        "Submitting startup for roasting"
    );

    let response = client
        .roast(request)
        .await
        .context("Failed to generate roast")?;

    match format {
        OutputFormat::Text => print!("{response}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
    }

    Ok(())
}

/// Fetch and print `/stats`
async fn show_stats(client: &RoastClient, format: OutputFormat) -> Result<()> {
    let stats = client
        .stats()
        .await
        .context("Failed to fetch roast statistics")?;

    match format {
        OutputFormat::Text => {
            println!("Total roasts: {}", stats.total_roasts);
            for level in RoastLevel::ALL {
                println!("  {:8} {}", level.as_str(), stats.count(level));
            }
            if let Some(updated) = &stats.last_updated {
                println!("Last updated: {updated}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
    }

    Ok(())
}

/// Generate a default configuration file
fn init_config(output: &str) -> Result<()> {
    let config = Config::default_config();
    let yaml = config.to_yaml().context("Failed to serialize config")?;

    std::fs::write(output, &yaml).with_context(|| format!("Failed to write config to {output}"))?;

    tracing::info!(path = %output, "Configuration file created");
    println!("Created {output}");
    println!();
    println!("Edit the file to point at your service, then run:");
    println!("  roaster --config {output} wait");

    Ok(())
}

/// Validate a configuration file
fn validate_config(config_path: &str) -> Result<()> {
    tracing::info!(config = %config_path, "Validating configuration");

    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load config from {config_path}"))?;

    let readiness = &config.readiness;
    println!("Configuration is valid!");
    println!();
    println!("Service: {}", config.service.base_url);
    println!(
        "Probe interval: {}",
        humantime::format_duration(readiness.interval)
    );
    println!(
        "Settle delay: {}",
        humantime::format_duration(readiness.settle_delay)
    );
    match readiness.max_attempts {
        Some(max) => println!("Max attempts: {max}"),
        None => println!("Max attempts: unbounded"),
    }

    Ok(())
}
