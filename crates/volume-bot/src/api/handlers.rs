//! HTTP request handlers.

use super::types::{ChainHealth, HealthResponse};
use super::AppState;
use crate::error::AppError;
use crate::types::{IncomingUpdate, Reply};
use axum::{extract::State, Json};
use futures::future::join_all;
use payment_verifier::ChainClient;
use tracing::error;

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let chains = state.verifier.chains();
    let checks = chains.iter().map(|chain| {
        let verifier = state.verifier.clone();
        let chain = *chain;
        async move {
            let healthy = match verifier.client(chain) {
                Some(client) => client.health_check().await,
                None => false,
            };
            ChainHealth {
                chain: chain.slug(),
                healthy,
            }
        }
    });

    Json(HealthResponse {
        status: "ok".to_string(),
        sessions: state.sessions.session_count().await,
        chains: join_all(checks).await,
    })
}

/// Deliver one chat update to the wizard and return its reply.
pub async fn handle_update(
    State(state): State<AppState>,
    Json(update): Json<IncomingUpdate>,
) -> Result<Json<Reply>, AppError> {
    state.controller.handle(&update).await.map(Json).map_err(|e| {
        error!("Handler error for {}: {}", update.conversation_id, e);
        e
    })
}
