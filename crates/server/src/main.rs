//! tally server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::net::SocketAddr;
use tally_core::config::AppConfig;
use tally_server::{AppState, create_router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// tally - rating counter API server
#[derive(Parser, Debug)]
#[command(name = "tallyd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "TALLY_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

/// Load configuration: optional TOML file, then TALLY_* environment overrides.
fn load_config(config_path: &str) -> Result<AppConfig> {
    let mut figment = Figment::new();

    if std::path::Path::new(config_path).exists() {
        tracing::info!(config_path, "Loading configuration from file");
        figment = figment.merge(Toml::file(config_path));
    } else {
        tracing::info!(
            config_path,
            "No config file found, using defaults and environment"
        );
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("TALLY_").ignore(&["CONFIG"]).split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .store
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid store configuration: {e}"))?;

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("tally v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;

    if config.server.metrics_enabled {
        tally_server::metrics::register_metrics();
        tracing::info!("Prometheus metrics registered");
    }

    let store = tally_store::from_config(&config.store)
        .await
        .context("failed to initialize rating store")?;

    // Refuse to start against an unreachable store
    store
        .health_check()
        .await
        .context("rating store health check failed")?;
    tracing::info!("Rating store initialized");

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    let state = AppState::new(config, store);
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);

    // ConnectInfo supplies the peer address for user identity
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
