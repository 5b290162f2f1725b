//! Command implementations for docsearch.
//!
//! `run` is the composition root: it loads settings, builds the client once
//! and hands it by reference to the command that was asked for. Every command
//! shares one cancellation token, cancelled on Ctrl+C / SIGTERM.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use docsearch_client::{
    paginate, CursorPagination, OffsetPagination, SearchClient, Strategy, Transport,
};
use docsearch_types::{Cursor, Settings};

use crate::cli::{Cli, Commands, PaginateCommands};

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(log_level) = &cli.log_level {
        settings.log_level = log_level.clone();
    }
    if let Some(host) = &cli.host {
        settings.hosts = vec![host.clone()];
    }

    Ok(settings)
}

/// Install the global tracing subscriber. Logs go to stderr; stdout is
/// reserved for command output.
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, cancelling...");
        }
        _ = terminate => {
            info!("Received SIGTERM, cancelling...");
        }
    }
}

/// A token cancelled when the process receives Ctrl+C or SIGTERM.
pub fn cancel_on_shutdown_signal() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        trigger.cancel();
    });
    token
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{}", rendered);
    Ok(())
}

/// Run a parsed command line. Expects logging to be initialised.
pub async fn run(cli: Cli, settings: Settings) -> Result<()> {
    let client = SearchClient::from_settings(&settings).context("Failed to create client")?;
    let cancel = cancel_on_shutdown_signal();
    execute(&client, &settings, &cli.index, cli.command, &cancel).await
}

/// Dispatch one command against an already-built client.
pub async fn execute<T: Transport>(
    client: &SearchClient<T>,
    settings: &Settings,
    index: &str,
    command: Commands,
    cancel: &CancellationToken,
) -> Result<()> {
    match command {
        Commands::CreateIndex { mapping } => {
            let mapping = mapping.unwrap_or_else(|| settings.mapping_path.clone());
            client
                .create_index(index, &mapping, cancel)
                .await
                .with_context(|| format!("Failed to create index from {}", mapping))?;
            println!("Created index {}", client.resolve_index(index));
        }
        Commands::Seed { count } => {
            let stored = client
                .seed(index, count, Utc::now(), cancel)
                .await
                .context("Seeding failed")?;
            println!("Stored {} documents in {}", stored, client.resolve_index(index));
        }
        Commands::Load { from, size, cursor } => {
            let cursor = cursor.as_deref().map(Cursor::parse);
            let page = client
                .load(index, from, size, cursor.as_ref(), cancel)
                .await
                .context("Failed to load page")?;
            print_json(&page)?;
        }
        Commands::Paginate { strategy } => {
            let strategy = match strategy {
                PaginateCommands::Offset { size, bound } => {
                    Strategy::Offset(OffsetPagination { size, bound })
                }
                PaginateCommands::Cursor {
                    size,
                    pages,
                    stop_on_empty,
                } => Strategy::Cursor(CursorPagination {
                    size,
                    pages,
                    stop_on_empty,
                }),
            };

            let documents = paginate(client, index, strategy, cancel).await?;
            print_json(&documents)?;
        }
    }

    Ok(())
}
