//! dinewise-wine - Wine Intelligence Microservice
//!
//! Ingests restaurant wine lists, enriches wines from external research
//! sources under a daily call budget, and recommends wines for a guest.

use anyhow::{Context, Result};
use clap::Parser;
use dinewise_common::config::TomlConfig;
use dinewise_common::logging::init_logging;
use dinewise_common::time::SystemClock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use dinewise_wine::services::Services;
use dinewise_wine::AppState;

#[derive(Debug, Parser)]
#[command(name = "dinewise-wine", version, about = "Dinewise wine intelligence service")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "DINEWISE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listening port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the root folder holding the database
    #[arg(long)]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    init_logging(&config.logging)?;

    info!("Starting dinewise-wine (Wine Intelligence) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Step 1: Resolve root folder and make sure it exists
    let root_folder = args.root_folder.unwrap_or_else(|| config.root_folder());
    std::fs::create_dir_all(&root_folder).with_context(|| {
        format!("Failed to initialize root folder: {}", root_folder.display())
    })?;

    // Step 2: Open or create database
    let db_path = root_folder.join("dinewise.db");
    info!("Database: {}", db_path.display());
    let db_pool = dinewise_wine::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // Step 3: Wire providers and pipelines
    let services = Services::from_config(db_pool.clone(), &config, Arc::new(SystemClock))?;
    let state = AppState::new(db_pool, services);
    let shutdown = state.shutdown.clone();

    let app = dinewise_wine::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown requested; cancelling active enrichment runs");
            shutdown.cancel();
        })
        .await?;

    info!("dinewise-wine stopped");
    Ok(())
}
