// # recordkeeperd - DNS record reconciliation daemon
//
// Thin integration layer: all reconciliation logic lives in
// recordkeeper-core. This binary is responsible for:
//
// 1. Loading configuration (config file, `RECORDKEEPER_*` overrides, flags)
// 2. Initializing logging and the runtime
// 3. Registering providers and building the IP source
// 4. Running the engine until its schedule ends or a signal arrives
//
// ## Configuration
//
// Flags (`--config`, `--provider`, `--username`, `--authToken`,
// `--interval`) override the environment, which overrides the config file.
//
// - `RECORDKEEPER_CONFIG`: Path to a JSON config file
// - `RECORDKEEPER_PROVIDER`: Provider name (cloudflare)
// - `RECORDKEEPER_USERNAME`: Account email, or `service-key`
// - `RECORDKEEPER_AUTH_TOKEN`: API key or service key
// - `RECORDKEEPER_INTERVAL`: Minutes between passes; 0 runs a single pass
// - `RECORDKEEPER_RECORDS`: Comma-separated `name=address` list; a bare
//   name tracks the public address
// - `RECORDKEEPER_IP_URL`: Public address lookup service
// - `RECORDKEEPER_HTTP_TIMEOUT_SECS`: Provider request timeout
// - `RECORDKEEPER_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export RECORDKEEPER_USERNAME=ops@example.com
// export RECORDKEEPER_AUTH_TOKEN=your_key
// export RECORDKEEPER_RECORDS=home.example.com,www.example.com=198.51.100.7
// export RECORDKEEPER_INTERVAL=5
//
// recordkeeperd
// ```

mod args;

use anyhow::{Context, Result};
use args::Args;
use clap::Parser;
use recordkeeper_core::{ProviderRegistry, ReconcileEngine, ReconcileEvent, RecordkeeperConfig};
use recordkeeper_ip_http::HttpIpSource;
use std::env;
use std::process::ExitCode;
use tokio::sync::oneshot;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum RecordkeeperExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<RecordkeeperExitCode> for ExitCode {
    fn from(code: RecordkeeperExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn parse_log_level(value: &str) -> Option<Level> {
    match value.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // --help and --version land here too
            return if e.use_stderr() {
                RecordkeeperExitCode::ConfigError.into()
            } else {
                RecordkeeperExitCode::CleanShutdown.into()
            };
        }
    };

    let requested_level = env::var("RECORDKEEPER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_level = match parse_log_level(&requested_level) {
        Some(level) => level,
        None => {
            eprintln!(
                "RECORDKEEPER_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                requested_level
            );
            return RecordkeeperExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return RecordkeeperExitCode::ConfigError.into();
    }

    let config = match args.load_config(|key| env::var(key).ok()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{}", e);
            return RecordkeeperExitCode::ConfigError.into();
        }
    };

    info!("Starting recordkeeperd");
    info!("Configuration loaded: {} record(s)", config.records.len());

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return RecordkeeperExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let engine = match build_engine(config) {
            Ok(parts) => parts,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return RecordkeeperExitCode::ConfigError;
            }
        };

        if let Err(e) = run_daemon(engine).await {
            error!("Daemon error: {:#}", e);
            RecordkeeperExitCode::RuntimeError
        } else {
            RecordkeeperExitCode::CleanShutdown
        }
    })
    .into()
}

type EngineParts = (ReconcileEngine, tokio::sync::mpsc::Receiver<ReconcileEvent>);

/// Wire the configured provider and IP source into an engine
fn build_engine(config: RecordkeeperConfig) -> Result<EngineParts> {
    #[allow(unused_mut)]
    let mut registry = ProviderRegistry::new();

    #[cfg(feature = "cloudflare")]
    {
        info!("Registering Cloudflare provider");
        recordkeeper_provider_cloudflare::register(&mut registry);
    }

    let provider = registry
        .create_provider(&config.provider, config.http_timeout())
        .context("Failed to create DNS provider")?;
    let ip_source =
        HttpIpSource::from_config(&config.ip_lookup).context("Failed to create IP source")?;

    info!("Provider: {}", provider.provider_name());
    info!("Public address lookup: {}", ip_source.url());
    for record in &config.records {
        info!("Managing record: {} -> {}", record.name, record.address);
    }

    let parts = ReconcileEngine::new(provider, Box::new(ip_source), config)?;
    Ok(parts)
}

/// Run the engine until its schedule ends or a shutdown signal arrives
async fn run_daemon((mut engine, events): EngineParts) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let signal_task = tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Signal handling failed: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    let event_task = tokio::spawn(log_events(events));

    let result = engine.run_with_shutdown(Some(shutdown_rx)).await;

    signal_task.abort();
    drop(engine);
    if let Err(e) = event_task.await {
        warn!("Event logger ended abnormally: {}", e);
    }

    result?;
    info!("Shutting down daemon");
    Ok(())
}

/// Log pass boundaries and the stop reason
///
/// Per-record outcomes are already logged by the engine as they happen, so
/// they only reach the debug level here.
async fn log_events(events: tokio::sync::mpsc::Receiver<ReconcileEvent>) {
    let mut events = ReceiverStream::new(events);
    while let Some(event) = events.next().await {
        match event {
            ReconcileEvent::Started { records_count } => {
                debug!("Engine started with {} record(s)", records_count);
            }
            ReconcileEvent::PassStarted { pass } => debug!("Pass {} started", pass),
            ReconcileEvent::PassCompleted {
                pass,
                updated,
                failed,
            } => {
                info!(
                    "Pass {} complete: {} updated, {} failed",
                    pass, updated, failed
                );
            }
            ReconcileEvent::Stopped { reason } => info!("Engine stopped: {}", reason),
            ReconcileEvent::AlreadyCorrect { domain, .. }
            | ReconcileEvent::Updated { domain, .. }
            | ReconcileEvent::UpdateRejected { domain, .. }
            | ReconcileEvent::DomainSkipped { domain, .. } => {
                debug!("Outcome recorded for {}", domain);
            }
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for CTRL-C")?;
    Ok("SIGINT")
}
