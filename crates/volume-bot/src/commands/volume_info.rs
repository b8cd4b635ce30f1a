//! Volume info command - describes the service.

use crate::commands::CommandHandler;
use crate::error::AppResult;
use crate::types::{IncomingUpdate, Reply};
use async_trait::async_trait;
use session_store::Session;

pub struct VolumeInfoHandler;

impl VolumeInfoHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VolumeInfoHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandHandler for VolumeInfoHandler {
    fn name(&self) -> &str {
        "volume_info"
    }

    fn trigger(&self) -> Option<&str> {
        Some("/volume_info")
    }

    async fn execute(&self, _update: &IncomingUpdate, _session: &Session) -> AppResult<Reply> {
        Ok(Reply::text(
            "🤖 *Volume Bot Details*\n\n\
             📈 Our Volume Bot spreads buys over the plan's duration so your token \
             shows steady trading activity.\n\n\
             💵 *What You Get:*\n\
             • 10% of your initial payment refunded back.\n\
             • All profits generated from the volume boost.\n\n\
             ✨ *Why Choose Us?*\n\
             1. Plans from 3 to 24 hours.\n\
             2. Support for multiple blockchains (Ethereum, Solana, Base).\n\
             3. Payments verified on-chain before the boost starts.\n\n\
             🚀 Ready to boost your token's volume? Start with /start and follow the steps!\n\n\
             _For further questions, contact our support team._",
        ))
    }
}
