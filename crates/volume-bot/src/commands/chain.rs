//! Blockchain selection.

use crate::commands::{chain_menu, plan_menu, CommandHandler};
use crate::error::AppResult;
use crate::plans::PlanCatalog;
use crate::types::{IncomingUpdate, Reply};
use async_trait::async_trait;
use payment_verifier::Chain;
use session_store::{Session, SessionStore};
use std::sync::Arc;
use tracing::info;

pub struct ChainHandler {
    sessions: Arc<SessionStore>,
    plans: Arc<PlanCatalog>,
    chains: Vec<Chain>,
}

impl ChainHandler {
    pub fn new(sessions: Arc<SessionStore>, plans: Arc<PlanCatalog>, chains: Vec<Chain>) -> Self {
        Self {
            sessions,
            plans,
            chains,
        }
    }
}

#[async_trait]
impl CommandHandler for ChainHandler {
    fn name(&self) -> &str {
        "chain"
    }

    fn matches(&self, update: &IncomingUpdate, _session: &Session) -> bool {
        update
            .callback_data()
            .is_some_and(|data| data.starts_with("blockchain_"))
    }

    async fn execute(&self, update: &IncomingUpdate, _session: &Session) -> AppResult<Reply> {
        let requested = update
            .callback_data()
            .and_then(|data| data.strip_prefix("blockchain_"))
            .and_then(|name| name.parse::<Chain>().ok());

        let Some(chain) = requested.filter(|c| self.chains.contains(c)) else {
            return Ok(Reply::text(
                "⚠️ That blockchain is not available right now. Please choose another one:",
            )
            .with_buttons(chain_menu(&self.chains)));
        };

        self.sessions
            .update(&update.conversation_id, |s| s.select_chain(chain))
            .await;
        info!("{} selected {}", update.conversation_id, chain);

        Ok(Reply::text(format!(
            "🌐 *Selected Blockchain:* {}\n\nSelect your desired volume boost plan:",
            chain.to_string().to_uppercase()
        ))
        .with_buttons(plan_menu(chain, self.plans.for_chain(chain))))
    }
}
