//! Token contract address input and payment instructions.

use crate::commands::{missing_step_reply, support_link, CommandHandler};
use crate::error::AppResult;
use crate::types::{IncomingUpdate, Reply};
use async_trait::async_trait;
use payment_verifier::Chain;
use session_store::{Session, SessionStore, WizardStep};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

pub struct AddressHandler {
    sessions: Arc<SessionStore>,
    wallets: Arc<HashMap<Chain, String>>,
    support_contact: String,
}

impl AddressHandler {
    pub fn new(
        sessions: Arc<SessionStore>,
        wallets: Arc<HashMap<Chain, String>>,
        support_contact: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            wallets,
            support_contact: support_contact.into(),
        }
    }
}

/// Whether `text` is an account address on any supported chain family.
fn looks_like_address(text: &str) -> bool {
    Chain::Solana.validate_address(text) || Chain::ETHEREUM.validate_address(text)
}

#[async_trait]
impl CommandHandler for AddressHandler {
    fn name(&self) -> &str {
        "address"
    }

    fn matches(&self, update: &IncomingUpdate, _session: &Session) -> bool {
        update.text().is_some_and(looks_like_address)
    }

    async fn execute(&self, update: &IncomingUpdate, session: &Session) -> AppResult<Reply> {
        let address = update.text().unwrap_or_default();

        match session.next_step() {
            WizardStep::Paid => {
                return Ok(Reply::text(
                    "✅ This order is already paid. Use /start to order another boost.",
                ));
            }
            WizardStep::SelectChain | WizardStep::SelectPlan | WizardStep::SelectPaymentMethod => {
                if let Some(reply) = missing_step_reply(session) {
                    return Ok(reply);
                }
            }
            WizardStep::EnterAddress | WizardStep::SubmitTransaction => {}
        }

        let (Some(chain), Some(plan), Some(method)) =
            (session.chain, session.plan.as_ref(), session.payment_method)
        else {
            return Ok(Reply::text("⚠️ Please select a blockchain first. Use /start to begin."));
        };

        if !chain.validate_address(address) {
            return Ok(Reply::text(format!(
                "❌ Error: Invalid {} contract address. Please check it and try again.",
                chain
            )));
        }

        let Some(wallet) = self.wallets.get(&chain) else {
            warn!("No receiving wallet configured for {}", chain);
            return Ok(Reply::text(format!(
                "❌ Payments on {} are temporarily unavailable. Please contact support: {}",
                chain,
                support_link(&self.support_contact)
            )));
        };

        self.sessions
            .update(&update.conversation_id, |s| s.set_contract_address(address))
            .await;
        info!("{} set contract address {}", update.conversation_id, address);

        Ok(Reply::text(format!(
            "🎉 *Token Address Received*\n\n\
             📝 *Order:*\n\
             • Blockchain: `{}`\n\
             • Plan: `{}`\n\
             • Token: `{}`\n\n\
             💰 *Payment Instructions:*\n\
             1. Send exactly `{}` {} to:\n\
             `{}`\n\n\
             2. After payment, provide the transaction hash/link here for verification.\n\n\
             _⚠️ Ensure you send the exact amount to avoid delays in processing._",
            chain,
            plan.description,
            address,
            plan.amount.normalize(),
            method.symbol(),
            wallet
        )))
    }
}
