//! Volume Boost Bot - Main entry point.

use anyhow::Context;
use payment_verifier::{ChainClient, PaymentVerifier};
use session_store::SessionStore;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use volume_bot::api::AppState;
use volume_bot::{AppResult, Config, ConversationController, PlanCatalog};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.bot.log_level);

    info!("Starting Volume Boost Bot...");

    let verifier = Arc::new(
        PaymentVerifier::from_config(&config.verifier)
            .context("Failed to create payment verifier")?,
    );

    // Health checks
    for chain in verifier.chains() {
        let Some(client) = verifier.client(chain) else {
            continue;
        };
        if client.health_check().await {
            info!("{} RPC healthy", chain);
        } else {
            warn!("{} RPC health check failed - will retry on requests", chain);
        }
    }

    let sessions = Arc::new(SessionStore::new(config.session.ttl));
    let plans = Arc::new(PlanCatalog::default());

    let controller = Arc::new(ConversationController::from_config(
        &config,
        verifier.clone(),
        sessions.clone(),
        plans,
    ));
    info!("Registered {} handlers", controller.handler_count());

    let state = AppState::new(controller, verifier, sessions);
    volume_bot::start_server(config.bot.server_port, state).await?;

    info!("Shutting down...");
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
