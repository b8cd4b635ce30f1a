//! Help command - usage steps and support contact.

use crate::commands::{support_link, CommandHandler};
use crate::error::AppResult;
use crate::types::{IncomingUpdate, Reply};
use async_trait::async_trait;
use session_store::Session;

pub struct HelpHandler {
    support_contact: String,
}

impl HelpHandler {
    pub fn new(support_contact: impl Into<String>) -> Self {
        Self {
            support_contact: support_contact.into(),
        }
    }
}

#[async_trait]
impl CommandHandler for HelpHandler {
    fn name(&self) -> &str {
        "help"
    }

    fn trigger(&self) -> Option<&str> {
        Some("/help")
    }

    async fn execute(&self, _update: &IncomingUpdate, _session: &Session) -> AppResult<Reply> {
        Ok(Reply::text(format!(
            "🆘 *Volume Boost Bot - Help & Support*\n\n\
             *How to Use the Bot:*\n\
             1. Start with /start command\n\
             2. Select your preferred blockchain\n\
             3. Choose a volume boost plan\n\
             4. Select payment method\n\
             5. Provide contract address\n\
             6. Send the payment and share the transaction hash/link\n\n\
             *Supported Blockchains:*\n\
             • Ethereum\n\
             • Base\n\
             • Solana\n\n\
             *Payment Methods:*\n\
             • ETH (Ethereum, Base)\n\
             • SOL (Solana)\n\n\
             *Support & Consultations:*\n\
             🤝 For personalized assistance, contact our support team:\n\
             {}\n\n\
             _Note: Our support team is available 24/7 to help you with any questions or issues._",
            support_link(&self.support_contact)
        )))
    }
}
