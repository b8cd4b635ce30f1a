//! Fallback - anything no other handler claimed.

use crate::commands::{command_of, missing_step_reply, CommandHandler};
use crate::error::AppResult;
use crate::types::{IncomingUpdate, Reply};
use async_trait::async_trait;
use session_store::{Session, WizardStep};

pub struct FallbackHandler;

impl FallbackHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FallbackHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandHandler for FallbackHandler {
    fn name(&self) -> &str {
        "fallback"
    }

    fn is_default(&self) -> bool {
        true
    }

    async fn execute(&self, update: &IncomingUpdate, session: &Session) -> AppResult<Reply> {
        if update.text().and_then(command_of).is_some() {
            return Ok(Reply::text("❓ Unknown command. Use /help to see how the bot works."));
        }

        if let Some(reply) = missing_step_reply(session) {
            return Ok(reply);
        }

        let text = match session.next_step() {
            WizardStep::Paid => "✅ Your order is paid. Use /start to order another boost.",
            _ => "⚠️ Please send the transaction hash or explorer link of your payment.",
        };
        Ok(Reply::text(text))
    }
}
