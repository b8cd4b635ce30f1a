//! The conversation controller.
//!
//! One controller owns the wizard. It loads the conversation's session,
//! dispatches the update to the first matching [`CommandHandler`] (or the
//! default handler) and returns the reply for the transport to deliver.

use crate::commands::*;
use crate::config::Config;
use crate::error::AppResult;
use crate::plans::PlanCatalog;
use crate::types::{IncomingUpdate, Reply};
use payment_verifier::{Chain, PaymentVerifier};
use session_store::{Session, SessionStore};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub struct ConversationController {
    sessions: Arc<SessionStore>,
    handlers: Vec<Box<dyn CommandHandler>>,
}

impl ConversationController {
    pub fn new(sessions: Arc<SessionStore>, handlers: Vec<Box<dyn CommandHandler>>) -> Self {
        Self { sessions, handlers }
    }

    /// Build the standard wizard from configuration.
    ///
    /// A chain is offered only when the verifier has a client for it, a
    /// receiving wallet is configured and the catalogue has plans for it.
    pub fn from_config(
        config: &Config,
        verifier: Arc<PaymentVerifier>,
        sessions: Arc<SessionStore>,
        plans: Arc<PlanCatalog>,
    ) -> Self {
        let wallets = Arc::new(config.receiving_wallets());
        let chains: Vec<Chain> = [Chain::ETHEREUM, Chain::BASE, Chain::Solana]
            .into_iter()
            .filter(|chain| {
                verifier.client(*chain).is_some()
                    && wallets.contains_key(chain)
                    && plans.has_chain(*chain)
            })
            .collect();

        if chains.is_empty() {
            warn!("No blockchain has both an RPC client and a receiving wallet configured");
        }

        let support = config.bot.support_contact.clone();

        let handlers: Vec<Box<dyn CommandHandler>> = vec![
            Box::new(StartHandler::new(sessions.clone(), chains.clone())),
            Box::new(HelpHandler::new(support.clone())),
            Box::new(VolumeInfoHandler::new()),
            Box::new(ChainHandler::new(sessions.clone(), plans.clone(), chains)),
            Box::new(PlanHandler::new(sessions.clone(), plans)),
            Box::new(PaymentHandler::new(sessions.clone())),
            Box::new(TransactionHandler::new(
                sessions.clone(),
                verifier,
                wallets.clone(),
                config.verifier.tolerance,
                support.clone(),
            )),
            Box::new(AddressHandler::new(sessions.clone(), wallets, support)),
            Box::new(FallbackHandler::new()),
        ];

        Self::new(sessions, handlers)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Handle one update and produce the reply.
    #[instrument(skip(self, update), fields(conversation = %update.conversation_id))]
    pub async fn handle(&self, update: &IncomingUpdate) -> AppResult<Reply> {
        let session = self
            .sessions
            .get(&update.conversation_id)
            .await
            .unwrap_or_else(|| Session::new(&update.conversation_id));

        let handler = self
            .handlers
            .iter()
            .find(|h| h.matches(update, &session))
            .or_else(|| self.handlers.iter().find(|h| h.is_default()));

        match handler {
            Some(handler) => {
                debug!("Dispatching to {} handler", handler.name());
                handler.execute(update, &session).await
            }
            None => Ok(Reply::text("Use /start to begin.")),
        }
    }
}
