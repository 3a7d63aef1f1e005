//! Experiment Catalogue API
//!
//! Serves the real and fake experiment collections over HTTP, together with
//! the static front-end bundle.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `file` (default) | `in_memory`
//! - `STORE_DIR`: journal directory (default: `store`)
//! - `SYNC_WRITES`: fsync after every write (default: `false`)
//! - `STATIC_ROOT`: static asset directory (default: `data`)
//! - `HOME_PAGE`: asset served for `/` (default: `home.html`)
//! - `COMPRESSION_MIN_SIZE`: gzip threshold in bytes (default: `1024`)
//! - `MAX_SAMPLE_SIZE`: largest accepted random sample (default: `10000`)
//! - `RNG_SEED`: fixed seed for sampling and synthetic data (default: random)
//! - `RUST_LOG`: Logging level (e.g., `debug`, `info`, `experiment_catalog_api=debug`)
//! - `LOG_FORMAT`: `text` (default) | `json`
//! - `HOST`: Server host address (default: `0.0.0.0`)
//! - `PORT`: Server port (default: `8000`)
//! - `WORKER_THREADS`: Number of tokio worker threads (default: logical CPU count)

use std::env;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use experiment_catalog_api::api::{AppState, router};
use experiment_catalog_api::infrastructure::{CollectionFactory, ServiceConfig};

const DEFAULT_LOG_FILTER: &str = "experiment_catalog_api=debug,tower_http=debug";

/// Parses a `WORKER_THREADS` value. Blank, zero or unparsable values leave
/// the runtime default in place.
fn parse_worker_threads(value: &str) -> Option<usize> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<usize>() {
        Ok(threads) if threads > 0 => Some(threads),
        _ => {
            eprintln!("Warning: ignoring invalid WORKER_THREADS='{trimmed}', using default");
            None
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    let threads = env::var("WORKER_THREADS")
        .ok()
        .and_then(|value| parse_worker_threads(&value));
    if let Some(threads) = threads {
        builder.worker_threads(threads);
    }

    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("Failed to create tokio runtime: {error}");
            std::process::exit(1);
        }
    };
    runtime.block_on(async_main());
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.trim().eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn async_main() {
    init_tracing();

    tracing::info!("Starting Experiment Catalogue API");

    // Initialize configuration from environment
    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("Configuration error: {}", error);
            std::process::exit(1);
        }
    };

    tracing::info!(
        storage_mode = ?config.storage_mode,
        store_dir = %config.store_dir.display(),
        static_root = %config.static_root.display(),
        seeded = config.rng_seed.is_some(),
        "Service configuration loaded"
    );

    // Open both collections and seed the fake one from the real one
    let collections = match CollectionFactory::new(config.clone()).create().await {
        Ok(collections) => {
            tracing::info!(
                real = collections.real.len(),
                fake = collections.fake.len(),
                "Collections initialized successfully"
            );
            collections
        }
        Err(error) => {
            tracing::error!("Failed to initialize collections: {}", error);
            std::process::exit(1);
        }
    };

    let application = router(AppState::new(collections, &config));

    // Parse server address from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(8000);

    let address: SocketAddr = match format!("{host}:{port}").parse() {
        Ok(address) => address,
        Err(error) => {
            tracing::error!(%error, "Invalid server address: {}:{}", host, port);
            std::process::exit(1);
        }
    };

    // Start the server
    let listener = match TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, "Failed to bind to address {}", address);
            std::process::exit(1);
        }
    };

    match listener.local_addr() {
        Ok(address) => tracing::info!("Listening on {}", address),
        Err(error) => tracing::warn!(%error, "Could not determine local address"),
    }

    if let Err(error) = axum::serve(listener, application)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(%error, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Server shutdown complete");
}

/// Completes on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("4", Some(4))]
    #[case(" 2 ", Some(2))]
    #[case("", None)]
    #[case("0", None)]
    #[case("many", None)]
    fn test_parse_worker_threads(#[case] value: &str, #[case] expected: Option<usize>) {
        assert_eq!(parse_worker_threads(value), expected);
    }
}
