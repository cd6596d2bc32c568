//! Crowdvine storefront edge server
//!
//! This server provides:
//! - Host-based tenant resolution (Dirtywine B2B / Pact Wines B2C)
//! - Tenant-specific logo content keys and asset lookup
//! - Stock display policy and "Few left" badge classification
//! - Cart id and access-granted cookie issuance
//! - Health, readiness and Prometheus metrics endpoints
//!
//! Usage:
//! ```bash
//! # With config file
//! crowdvine-server --config crowdvine.yaml
//!
//! # Serve the B2B storefront on localhost during development
//! CROWDVINE_LOCAL_TENANT_OVERRIDE=true crowdvine-server
//! ```
//!
//! Test with:
//! ```bash
//! curl -H 'Host: www.dirtywine.se' http://localhost:3000/api/storefront
//! curl -X POST -c jar.txt -b jar.txt http://localhost:3000/api/cart
//! curl 'http://localhost:3000/api/stock/badge?available=3'
//! ```

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crowdvine_server::{AppState, ServerConfig, router, watcher::spawn_settings_watcher};

/// Crowdvine Server - multi-tenant storefront edge
#[derive(Parser)]
#[command(name = "crowdvine-server")]
#[command(about = "Crowdvine storefront edge for tenant resolution and cart cookies", long_about = None)]
struct Cli {
    /// Path to configuration file (YAML or TOML)
    #[arg(short, long, value_name = "FILE", env = "CROWDVINE_CONFIG")]
    config: Option<String>,

    /// Port to listen on (overrides config and environment)
    #[arg(short, long)]
    port: Option<u16>,

    /// Serve the B2B storefront on localhost / 127.0.0.1
    #[arg(long)]
    local_tenant_override: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Configuration problems are fatal: nothing is served until this succeeds
    let mut config = match &cli.config {
        Some(config_path) => ServerConfig::from_file(config_path)
            .with_context(|| format!("Failed to load configuration from {}", config_path))?,
        None => ServerConfig::default(),
    };

    let env_warnings = config.merge_env();

    // CLI flags take highest precedence
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.local_tenant_override {
        config.tenancy.local_override = true;
    }

    config.validate().context("Invalid configuration")?;

    let log_level = match config.logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::new(format!("{}", log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🍷 Initializing Crowdvine storefront edge");
    match &cli.config {
        Some(path) => info!("📁 Configuration loaded from: {}", path),
        None => info!("📁 Using default configuration"),
    }
    for warning in env_warnings {
        warn!("⚠️  {}", warning);
    }

    if config.tenancy.local_override {
        info!("🏠 Local tenant override enabled: localhost serves Dirtywine (B2B)");
    }
    if config.cookies.secure {
        info!("🔒 Cookies are issued with the Secure attribute");
    }

    let state = AppState::from_config(&config)
        .await
        .context("Failed to initialize storefront state")?;
    let initial_policy = state.stock_policy().await;
    info!(
        "📦 Few-left threshold: {}",
        initial_policy.few_left_threshold
    );

    let _watcher = spawn_settings_watcher(state.clone());

    let app = router(state);

    let addr = config
        .socket_addr()
        .await
        .context("Invalid listen address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🚀 Listening on http://{}", addr);
    info!("   Health: http://{}/healthz", addr);
    info!("   Metrics: http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler, run until the process is killed
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
