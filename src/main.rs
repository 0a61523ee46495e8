//! Catalog Server - library catalog REST service
//!
//! `catalog-server` runs the server; `catalog-server hash-password <password>`
//! prints an Argon2 hash suitable for the `auth.users` configuration.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use catalog_server::{
    api,
    config::{AppConfig, LogFormat, LoggingConfig},
    repository,
    services::{auth::hash_password, clock::SystemClock, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    if let Some(command) = args.next() {
        return match (command.as_str(), args.next()) {
            ("hash-password", Some(password)) => {
                println!("{}", hash_password(&password)?);
                Ok(())
            }
            _ => anyhow::bail!("usage: catalog-server [hash-password <password>]"),
        };
    }

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Keep the guard alive so buffered file logs get flushed on exit
    let _log_guard = init_tracing(&config.logging)?;

    tracing::info!("Starting Catalog Server v{}", env!("CARGO_PKG_VERSION"));

    let store = repository::open(config.storage.backend, &config.database)
        .await
        .context("Failed to open book store")?;

    let services = Services::new(store, Arc::new(SystemClock), &config)
        .await
        .context("Failed to create services")?;

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };
    let app = api::router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Install the global subscriber: stdout in the configured format, plus a
/// daily rolling file when a log directory is configured.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("catalog_server={},tower_http=debug", logging.level).into()
    });

    let stdout = match logging.format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    let (file, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "catalog-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
