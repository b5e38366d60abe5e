//! Gemini Gateway - Headless Daemon
//!
//! A pure Rust HTTP server that:
//! - Serves OpenAI-style chat completions on `/v1/chat/completions`
//! - Serves the native generateContent surface on `/v1/models` and `/v1beta/models`
//! - Rotates requests over a persisted credential pool
//! - Exposes an operator API on `/admin/*` when an admin key is configured
//!
//! Access via: http://localhost:8045

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod bootstrap;
mod cli;
mod config_commands;
mod credential_commands;
mod server_utils;

use cli::{Cli, Commands, ConfigCommands, ServeArgs};
use gateway_core::proxy::{build_proxy_router, AppState, PersistenceWorker, UpstreamClient};
use gateway_core::utils::paths;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(dir) = &cli.data_dir {
        paths::set_data_dir(dir.clone());
    }
    let config_path = bootstrap::config_path(&cli)?;

    match cli.command {
        None => run_server(&config_path, &ServeArgs::default()).await,
        Some(Commands::Serve(args)) => run_server(&config_path, &args).await,
        Some(Commands::Credentials(cmd)) => {
            let config = bootstrap::resolve_config(&config_path, &ServeArgs::default())?;
            credential_commands::handle(cmd, &config).await
        },
        Some(Commands::Config(ConfigCommands::Show { json })) => {
            let config = bootstrap::resolve_config(&config_path, &ServeArgs::default())?;
            config_commands::show_config(&config, &config_path, json)
        },
        Some(Commands::Config(ConfigCommands::Init { force })) => {
            config_commands::init_config(&config_path, force)
        },
    }
}

async fn run_server(config_path: &std::path::Path, overrides: &ServeArgs) -> Result<()> {
    let config = bootstrap::resolve_config(config_path, overrides)?;
    info!("🚀 Gemini Gateway {} starting on {}...", env!("GIT_VERSION"), config.server.get_socket_addr());

    let (storage, pool) = bootstrap::open_pool(&config).await?;
    let stats = pool.stats();
    info!("📊 {} credentials loaded ({} enabled)", stats.total, stats.enabled);
    if stats.enabled == 0 {
        tracing::warn!("⚠️ No enabled credentials, requests will fail with 503 until one is added");
    }

    let worker = PersistenceWorker::new(pool.clone(), storage, &config.persistence);
    worker.start();

    let upstream = Arc::new(
        UpstreamClient::from_config(&config.upstream)
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to build upstream HTTP client")?,
    );
    let state = AppState::new(&config, pool, upstream, Some(worker.clone()));
    let router = build_proxy_router(state, &config);

    info!("🔀 OpenAI endpoint at http://{}/v1/chat/completions", config.server.get_socket_addr());
    info!("🔀 Native endpoints at http://{}/v1beta/models/", config.server.get_socket_addr());
    if config.server.admin_key.is_none() {
        info!("🔒 Admin API disabled (no admin key configured)");
    }

    let served = gateway_core::proxy::serve(router, &config, server_utils::shutdown_signal()).await;

    worker.shutdown().await;
    served.context("Server error")?;
    info!("👋 Gateway stopped");
    Ok(())
}
