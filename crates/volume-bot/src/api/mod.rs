//! HTTP webhook for chat transport adapters.

mod handlers;
mod types;

pub use handlers::*;
pub use types::*;

use crate::controller::ConversationController;
use axum::{
    routing::{get, post},
    Router,
};
use payment_verifier::PaymentVerifier;
use session_store::SessionStore;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Wizard controller
    pub controller: Arc<ConversationController>,
    /// Payment verifier, for chain health
    pub verifier: Arc<PaymentVerifier>,
    /// Session store, for health reporting
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(
        controller: Arc<ConversationController>,
        verifier: Arc<PaymentVerifier>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            controller,
            verifier,
            sessions,
        }
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/updates", post(handlers::handle_update))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
