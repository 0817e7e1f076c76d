//! Magpie bot — Telegram front end for hosted model inference plus a
//! small URL/contract lookup store.
//!
//! Wires the Telegram long-poll loop, the model adapter, and the
//! resource store into a single binary.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use mg_adapter::{HostedBackend, ModelAdapter};
use mg_bot::config::BotConfig;
use mg_bot::dispatcher::Dispatcher;
use mg_bot::telegram::TelegramClient;
use mg_bot::update_loop;
use mg_store::ResourceStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "mg-bot starting");

    // ── Load config ─────────────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "magpie.toml".to_string());

    let config = BotConfig::from_file(&config_path)?;
    if config.telegram.token.is_empty() {
        anyhow::bail!("telegram token is not configured (set telegram.token or TELEGRAM_BOT_TOKEN)");
    }
    tracing::info!(config_path = %config_path, "config loaded");

    // ── Resource store ──────────────────────────────────────────
    let store = match &config.store.database_url {
        Some(database_url) => {
            tracing::info!("connecting to PostgreSQL");
            ResourceStore::connect(database_url).await?
        }
        None => {
            tracing::warn!("store.database_url not set, records will not survive restarts");
            ResourceStore::in_memory()
        }
    };

    // ── Model adapter ───────────────────────────────────────────
    let backend = Arc::new(HostedBackend::new(config.backend.clone()));
    let adapter = Arc::new(ModelAdapter::new(backend, config.adapter.clone()));

    // Startup load failure is not fatal: the bot still serves store
    // commands and answers not-ready until an admin /switch succeeds.
    match adapter.load_with_fallback(&config.adapter.default_model).await {
        Ok(info) if info.degraded => {
            tracing::warn!(
                model = ?info.identifier,
                "configured model failed to load, serving the fallback baseline"
            );
        }
        Ok(info) => {
            tracing::info!(model = ?info.identifier, "model loaded");
        }
        Err(e) => {
            tracing::warn!(error = %e, "no model could be loaded at startup");
        }
    }

    // ── Telegram ────────────────────────────────────────────────
    let client = TelegramClient::new(config.telegram.clone());
    let me = client.get_me().await?;
    tracing::info!(bot_id = me.id, username = ?me.username, "authenticated with Telegram");

    let dispatcher =
        Dispatcher::new(adapter, store, &config).with_username(me.username.clone());

    tracing::info!("mg-bot ready");

    tokio::select! {
        // Poll for updates and answer them
        () = update_loop::run(&client, &dispatcher) => {
            tracing::error!("update loop exited unexpectedly");
        }
        // Graceful shutdown on SIGINT/SIGTERM
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    tracing::info!("mg-bot stopped");
    Ok(())
}
