//! ocrfix-cs - OCR correction service
//!
//! `serve` (the default) runs the HTTP API. `correct` runs one correction
//! from the command line; `stats` prints secondary OCR statistics for a
//! script without correcting anything.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ocrfix_common::config::{resolve_config, ConfigOverrides, TomlConfig};
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ocrfix_cs::backend::{fetch_combined, BackendClient};
use ocrfix_cs::correction::run_correction;
use ocrfix_cs::normalize::{
    compute_statistics, extract_primary_text, extract_secondary_text, preview,
};
use ocrfix_cs::pipeline::HttpCorrectionPipeline;
use ocrfix_cs::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "ocrfix-cs")]
#[command(about = "OCR correction service")]
#[command(version)]
struct Args {
    /// Configuration file (default: <config dir>/ocrfix/config.toml)
    #[arg(short, long, env = "OCRFIX_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Records backend base URL
    #[arg(long)]
    backend_url: Option<String>,

    /// Correction pipeline endpoint
    #[arg(long)]
    pipeline_url: Option<String>,

    /// Log level used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Correct one script and save the result
    Correct { subject_id: String, script_id: String },
    /// Print secondary OCR statistics for one script
    Stats { subject_id: String, script_id: String },
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            backend_url: self.backend_url.clone(),
            pipeline_url: self.pipeline_url.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = resolve_config(args.config.as_deref(), args.overrides())
        .context("Failed to resolve configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("ocrfix_cs={0},ocrfix_common={0},tower_http={0}", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting ocrfix-cs v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Backend: {}", config.backend.base_url);
    info!("Pipeline: {}", config.pipeline.url);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config).await,
        Command::Correct {
            subject_id,
            script_id,
        } => correct(&config, &subject_id, &script_id).await,
        Command::Stats {
            subject_id,
            script_id,
        } => stats(&config, &subject_id, &script_id).await,
    }
}

async fn serve(config: &TomlConfig) -> Result<()> {
    let state = AppState::from_config(config)?;
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.server.host, config.server.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("ocrfix-cs listening on http://{}", addr);
    info!("Health check: http://{}/correction/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn correct(config: &TomlConfig, subject_id: &str, script_id: &str) -> Result<()> {
    let backend = BackendClient::new(&config.backend)?;
    let pipeline = HttpCorrectionPipeline::new(&config.pipeline)?;

    let outcome = run_correction(&backend, &pipeline, subject_id, script_id).await;
    println!("{}", outcome.message);
    if !outcome.success {
        bail!("Correction failed for script_id {}", script_id);
    }
    Ok(())
}

async fn stats(config: &TomlConfig, subject_id: &str, script_id: &str) -> Result<()> {
    let backend = BackendClient::new(&config.backend)?;
    let record = fetch_combined(&backend, subject_id, script_id).await?;

    let report = json!({
        "subject_id": subject_id,
        "script_id": script_id,
        "ocr_text_preview": preview(&extract_primary_text(&record.primary_ocr), 200),
        "textract_text_preview": preview(&extract_secondary_text(&record.secondary_ocr), 200),
        "textract_statistics": compute_statistics(&record.secondary_ocr),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Which signal ended the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "Ctrl+C"),
            ShutdownSignal::Terminate => write!(f, "terminate signal"),
        }
    }
}

/// Graceful shutdown: resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed is logged and never fires; the other
/// one still does.
async fn shutdown_signal() {
    let received = wait_for_signal().await;
    info!(signal = %received, "Shutting down; finishing in-flight corrections");
}

async fn wait_for_signal() -> ShutdownSignal {
    let interrupt = async {
        match signal::ctrl_c().await {
            Ok(()) => ShutdownSignal::Interrupt,
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                ShutdownSignal::Terminate
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<ShutdownSignal>();

    tokio::select! {
        received = interrupt => received,
        received = terminate => received,
    }
}
