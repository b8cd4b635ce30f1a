//! Start command - resets the wizard and shows the blockchain menu.

use crate::commands::{chain_menu, CommandHandler};
use crate::error::AppResult;
use crate::types::{IncomingUpdate, Reply};
use async_trait::async_trait;
use payment_verifier::Chain;
use session_store::{Session, SessionStore};
use std::sync::Arc;
use tracing::info;

pub struct StartHandler {
    sessions: Arc<SessionStore>,
    chains: Vec<Chain>,
}

impl StartHandler {
    pub fn new(sessions: Arc<SessionStore>, chains: Vec<Chain>) -> Self {
        Self { sessions, chains }
    }
}

#[async_trait]
impl CommandHandler for StartHandler {
    fn name(&self) -> &str {
        "start"
    }

    fn trigger(&self) -> Option<&str> {
        Some("/start")
    }

    async fn execute(&self, update: &IncomingUpdate, _session: &Session) -> AppResult<Reply> {
        self.sessions.reset(&update.conversation_id).await;
        info!("Wizard started for {}", update.conversation_id);

        if self.chains.is_empty() {
            return Ok(Reply::text(
                "🚀 *Welcome to multi bumper  Volume Boost Bot!*\n\n\
                 No blockchains are accepting payments right now. Please try again later.",
            ));
        }

        Ok(Reply::text(
            "🚀 *Welcome to multi bumper  Volume Boost Bot!*\n\nSelect your blockchain to begin:",
        )
        .with_buttons(chain_menu(&self.chains)))
    }
}
