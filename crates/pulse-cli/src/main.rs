//! pulse: merge, score and enrich brand mentions in a data directory.
//!
//! Reads `<platform>_raw.json` files from the data directory, merges them,
//! scores them offline, classifies only records the previous run has not
//! seen, and writes the dataset, alerts, word cloud, dashboard feed and
//! (on Sundays, or when asked) the weekly digest.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulse_core::{defaults, GenerationBackend};
use pulse_inference::{BackendSelector, OllamaBackend, RemoteBackend};
use pulse_pipeline::{run_digest_only, run_pipeline, DigestMode, PipelineConfig, RunContext};

#[derive(Parser, Debug)]
#[command(name = "pulse")]
#[command(author, version, about = "Brand mention pulse: merge, score, enrich")]
struct Cli {
    /// Produce the weekly digest after the run regardless of the weekday
    #[arg(long)]
    digest: bool,

    /// Only rebuild the digest from the current enriched dataset
    #[arg(long, conflicts_with = "digest")]
    digest_only: bool,

    /// Data directory (overrides PULSE_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Credential/config file loaded into the environment
    #[arg(long, default_value = defaults::CONFIG_FILE)]
    config: PathBuf,
}

impl Cli {
    fn digest_mode(&self) -> DigestMode {
        if self.digest {
            DigestMode::Forced
        } else {
            DigestMode::Scheduled
        }
    }
}

/// Initialize tracing with configurable output.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
///   RUST_LOG    - standard env filter (default: "pulse=info,pulse_pipeline=info,pulse_inference=info")
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pulse=info,pulse_pipeline=info,pulse_inference=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let file_dir = Path::new(path).parent().unwrap_or(Path::new("."));
        let file_name = Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("pulse.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false)); // no ANSI in files by default
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // stderr keeps stdout free for the digest text
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        subsystem = "cli",
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );
    guard
}

/// Build both backends from the environment and probe them.
async fn select_backend() -> BackendSelector {
    let local: Option<Arc<dyn GenerationBackend>> = match OllamaBackend::from_env() {
        Ok(backend) => Some(Arc::new(backend)),
        Err(e) => {
            warn!(subsystem = "cli", error = %e, "Local backend unavailable");
            None
        }
    };
    let remote: Option<Arc<dyn GenerationBackend>> = match RemoteBackend::from_env() {
        Ok(backend) => Some(Arc::new(backend)),
        Err(e) => {
            warn!(subsystem = "cli", error = %e, "Remote backend unavailable");
            None
        }
    };
    BackendSelector::probe(local, remote).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing config file is fine; the environment may already be set.
    let config_loaded = dotenvy::from_path(&cli.config).is_ok();

    let _log_guard = init_tracing();
    if !config_loaded {
        info!(subsystem = "cli", path = %cli.config.display(), "No config file loaded");
    }

    let mut config = PipelineConfig::from_env();
    if let Some(dir) = cli.data_dir.clone() {
        config = config.with_data_dir(dir);
    }
    info!(
        subsystem = "cli",
        data_dir = %config.data_dir.display(),
        batch_size = config.batch_size,
        brand = %config.brand_name,
        "Configuration loaded"
    );

    let selector = select_backend().await;
    if !selector.has_backend() {
        warn!(
            subsystem = "cli",
            "No classification backend available; running search-only"
        );
    }
    let ctx = RunContext::new(config, selector);

    if cli.digest_only {
        let text = run_digest_only(&ctx)
            .await
            .context("digest generation failed")?;
        println!("{}", text);
        return Ok(());
    }

    let outcome = run_pipeline(&ctx, cli.digest_mode())
        .await
        .context("pipeline run failed")?;

    println!(
        "{} mentions ({} newly enriched, {} from cache), {} critical, backend: {}",
        outcome.total,
        outcome.new_this_run,
        outcome.already_done,
        outcome.critical_count,
        outcome.llm_backend
    );
    if outcome.batches_failed > 0 {
        println!(
            "{} of {} batches were filled with defaults",
            outcome.batches_failed, outcome.batches_sent
        );
    }
    if outcome.digest_written {
        println!("Weekly digest written to {}", ctx.path(defaults::DIGEST_FILE).display());
    }
    Ok(())
}
