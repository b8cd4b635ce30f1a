//! Payment method selection.

use crate::commands::{method_from_callback, missing_step_reply, payment_menu, CommandHandler};
use crate::error::AppResult;
use crate::types::{IncomingUpdate, Reply};
use async_trait::async_trait;
use session_store::{PaymentMethod, Session, SessionStore, WizardStep};
use std::sync::Arc;
use tracing::info;

pub struct PaymentHandler {
    sessions: Arc<SessionStore>,
}

impl PaymentHandler {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl CommandHandler for PaymentHandler {
    fn name(&self) -> &str {
        "payment"
    }

    fn matches(&self, update: &IncomingUpdate, _session: &Session) -> bool {
        update
            .callback_data()
            .is_some_and(|data| data.starts_with("payment_"))
    }

    async fn execute(&self, update: &IncomingUpdate, session: &Session) -> AppResult<Reply> {
        let (Some(chain), Some(_)) = (session.chain, session.plan.as_ref()) else {
            return Ok(missing_step_reply(session)
                .unwrap_or_else(|| Reply::text("⚠️ Please select a plan first.")));
        };

        let Some(method) = update.callback_data().and_then(method_from_callback) else {
            return Ok(Reply::text("⚠️ Unknown payment method. Please choose again:")
                .with_buttons(payment_menu()));
        };

        if !method.is_native_to(chain) {
            return Ok(Reply::text(format!(
                "⚠️ Payments on {} must be made in {}. Please choose again:",
                chain,
                PaymentMethod::native_to(chain).symbol()
            ))
            .with_buttons(payment_menu()));
        }

        let updated = self
            .sessions
            .update(&update.conversation_id, |s| s.select_payment_method(method))
            .await;
        info!("{} selected payment method {}", update.conversation_id, method.symbol());

        let prompt = if updated.next_step() == WizardStep::EnterAddress {
            "Please enter the contract address of the token."
        } else {
            "You can enter a new contract address or send your transaction hash/link."
        };

        Ok(Reply::text(format!(
            "💳 *Payment Method:* {}\n\n{}",
            method.symbol(),
            prompt
        )))
    }
}
