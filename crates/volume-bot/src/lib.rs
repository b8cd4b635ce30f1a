//! Volume Boost Bot
//!
//! A chat wizard that sells volume boost plans and verifies the payment
//! on-chain before an order is accepted.
//!
//! # Architecture
//!
//! ```text
//! Chat adapter → POST /v1/updates → ConversationController → handlers
//!                                          ↓                     ↓
//!                                    SessionStore        PaymentVerifier → Solana / EVM RPC
//! ```
//!
//! # Modules
//!
//! - [`api`] - HTTP webhook for transport adapters
//! - [`commands`] - One handler per wizard step
//! - [`config`] - Environment configuration
//! - [`controller`] - Update dispatch
//! - [`plans`] - Plan catalogue

pub mod api;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod plans;
pub mod types;

pub use config::Config;
pub use controller::ConversationController;
pub use error::{AppError, AppResult};
pub use plans::{Plan, PlanCatalog};
pub use types::{Button, IncomingUpdate, Reply, UpdateKind};

use api::AppState;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Serve the webhook on `0.0.0.0:<port>` until Ctrl-C.
pub async fn start_server(port: u16, state: AppState) -> AppResult<()> {
    let router = api::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Webhook listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Server(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
