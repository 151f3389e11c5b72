//! CLI entrypoint for Counsel Gateway
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use counsel_application::{BatchCoordinator, CounselService, DispatchBatchUseCase};
use counsel_infrastructure::{
    ConfigLoader, FileConfig, MemoryBackend, ResponderFactory, ResponderKind, open_store,
};
use counsel_presentation::{AppState, Cli, MemoryArg, ResponderArg, create_router};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Held for the process lifetime so buffered file logs are flushed on exit.
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_without_files()
    } else {
        ConfigLoader::load(cli.config.as_ref())
    }
    .map_err(|e| anyhow!("Failed to load configuration: {}", e))?;
    apply_cli_overrides(&mut config, &cli);

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            error!("Invalid configuration: {}", issue);
        }
        bail!("{} configuration error(s)", issues.len());
    }

    info!("Starting Counsel Gateway");

    // === Dependency Injection ===
    let directory = Arc::new(config.directory()?);
    let policy = config.batch.to_policy()?;
    let store = open_store(&config.memory)
        .await
        .context("Failed to open conversation memory")?;
    let responder = ResponderFactory::from_config(&config.responder, &config.providers)
        .context("Failed to configure responder")?;

    let dispatcher = Arc::new(
        DispatchBatchUseCase::new(Arc::clone(&responder), Arc::clone(&store))
            .with_params(config.responder.dispatch_params()),
    );

    let cancel = CancellationToken::new();
    let coordinator = BatchCoordinator::spawn(
        dispatcher,
        Arc::clone(&directory),
        policy,
        config.batch.coordinator_options(),
        cancel.clone(),
    );

    let service = Arc::new(CounselService::new(
        coordinator.clone(),
        store,
        Arc::clone(&directory),
        responder,
    ));
    let app = create_router(AppState::new(service));

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!(
        "Listening on http://{} ({} registered user(s))",
        listener.local_addr()?,
        directory.len()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;

    // Queued requests were already drained while connections closed; this
    // waits for whatever batch is still in flight.
    coordinator.shutdown().await;
    info!("Counsel Gateway stopped");

    Ok(())
}

/// Initialize logging based on verbosity level. `RUST_LOG` takes precedence.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr)
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("--log-file must name a file: {}", path.display()))?;
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create log directory {}", directory.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .init();

    Ok(Some(guard))
}

/// CLI flags sit above every other configuration source.
fn apply_cli_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(max_size) = cli.max_batch_size {
        config.batch.max_size = max_size;
    }
    if let Some(max_wait_ms) = cli.max_wait_ms {
        config.batch.max_wait_ms = max_wait_ms;
    }
    if cli.max_pending.is_some() {
        config.batch.max_pending = cli.max_pending;
    }
    if let Some(responder) = cli.responder {
        config.responder.kind = match responder {
            ResponderArg::Anthropic => ResponderKind::Anthropic,
            ResponderArg::Openai => ResponderKind::Openai,
        };
    }
    if let Some(model) = &cli.model {
        config.responder.model = Some(model.clone());
    }
    if let Some(backend) = cli.memory_backend {
        config.memory.backend = match backend {
            MemoryArg::Jsonl => MemoryBackend::Jsonl,
            MemoryArg::Snapshot => MemoryBackend::Snapshot,
            MemoryArg::Memory => MemoryBackend::Memory,
        };
    }
    if let Some(path) = &cli.memory_path {
        config.memory.path = Some(path.clone());
    }
}

/// Resolves on Ctrl+C or SIGTERM and starts draining the coordinator.
async fn shutdown_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal"),
        () = terminate => info!("Received SIGTERM signal"),
    }

    cancel.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_config() {
        let cli = Cli::parse_from([
            "counsel-gateway",
            "--port",
            "9000",
            "--max-wait-ms",
            "500",
            "--responder",
            "openai",
            "--memory-backend",
            "memory",
            "--model",
            "llama-3.2-1b",
        ]);
        let mut config = FileConfig::default();

        apply_cli_overrides(&mut config, &cli);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.batch.max_wait_ms, 500);
        assert_eq!(config.batch.max_size, 3);
        assert_eq!(config.responder.kind, ResponderKind::Openai);
        assert_eq!(config.responder.model.as_deref(), Some("llama-3.2-1b"));
        assert_eq!(config.memory.backend, MemoryBackend::Memory);
    }

    #[test]
    fn test_absent_flags_leave_config_untouched() {
        let cli = Cli::parse_from(["counsel-gateway"]);
        let mut config = FileConfig::default();
        config.batch.max_pending = Some(16);

        apply_cli_overrides(&mut config, &cli);

        assert_eq!(config.batch.max_pending, Some(16));
        assert_eq!(config, FileConfig {
            batch: counsel_infrastructure::FileBatchConfig {
                max_pending: Some(16),
                ..Default::default()
            },
            ..Default::default()
        });
    }
}
