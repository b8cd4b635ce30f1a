//! Wizard step handlers.

mod address;
mod chain;
mod fallback;
mod help;
mod payment;
mod plan;
mod start;
mod transaction;
mod volume_info;

pub use address::AddressHandler;
pub use chain::ChainHandler;
pub use fallback::FallbackHandler;
pub use help::HelpHandler;
pub use payment::PaymentHandler;
pub use plan::PlanHandler;
pub use start::StartHandler;
pub use transaction::{extract_reference, TransactionHandler};
pub use volume_info::VolumeInfoHandler;

use crate::error::AppResult;
use crate::plans::Plan;
use crate::types::{Button, IncomingUpdate, Reply};
use async_trait::async_trait;
use payment_verifier::Chain;
use session_store::{PaymentMethod, Session, WizardStep};

/// Command handler trait.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Handler name, for logging.
    fn name(&self) -> &str;

    /// Command trigger (e.g., "/help").
    fn trigger(&self) -> Option<&str> {
        None
    }

    /// Whether this is the handler for updates nothing else matched.
    fn is_default(&self) -> bool {
        false
    }

    /// Check if this handler matches the update in the current session.
    fn matches(&self, update: &IncomingUpdate, _session: &Session) -> bool {
        match (self.trigger(), update.text()) {
            (Some(trigger), Some(text)) => command_of(text) == Some(trigger),
            _ => false,
        }
    }

    /// Execute the handler.
    async fn execute(&self, update: &IncomingUpdate, session: &Session) -> AppResult<Reply>;
}

/// The `/command` a message starts with, without any `@botname` suffix.
pub(crate) fn command_of(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    if !first.starts_with('/') {
        return None;
    }
    first.split('@').next()
}

pub(crate) fn chain_label(chain: Chain) -> String {
    match chain {
        Chain::Solana => "🟢 Solana".to_string(),
        Chain::ETHEREUM => "🟡 Ethereum".to_string(),
        Chain::BASE => "🔵 Base".to_string(),
        other => format!("⚪ {}", other),
    }
}

/// One button per chain, `blockchain_<slug>` callbacks.
pub(crate) fn chain_menu(chains: &[Chain]) -> Vec<Vec<Button>> {
    chains
        .iter()
        .map(|chain| vec![Button::new(chain_label(*chain), format!("blockchain_{}", chain.slug()))])
        .collect()
}

pub(crate) fn plan_label(chain: Chain, plan: &Plan) -> String {
    format!(
        "⏰ {} ({} {})",
        plan.description,
        plan.amount.normalize(),
        chain.native_symbol()
    )
}

pub(crate) fn plan_menu(chain: Chain, plans: &[Plan]) -> Vec<Vec<Button>> {
    plans
        .iter()
        .map(|plan| vec![Button::new(plan_label(chain, plan), plan.key.clone())])
        .collect()
}

pub(crate) fn payment_menu() -> Vec<Vec<Button>> {
    vec![
        vec![Button::new("💰 ETH", "payment_eth")],
        vec![Button::new("🌊 SOL", "payment_sol")],
    ]
}

pub(crate) fn support_link(contact: &str) -> String {
    format!("[📞 @{contact}](https://t.me/{contact})")
}

/// Prompt for the first selection the session is missing.
pub(crate) fn missing_step_reply(session: &Session) -> Option<Reply> {
    let text = match session.next_step() {
        WizardStep::SelectChain => "⚠️ Please select a blockchain first. Use /start to begin.",
        WizardStep::SelectPlan => "⚠️ Please select a plan before providing the contract address.",
        WizardStep::SelectPaymentMethod => "⚠️ Please select a payment method.",
        WizardStep::EnterAddress => "⚠️ Please enter the contract address of the token first.",
        WizardStep::SubmitTransaction | WizardStep::Paid => return None,
    };

    let reply = Reply::text(text);
    Some(match session.next_step() {
        WizardStep::SelectPaymentMethod => reply.with_buttons(payment_menu()),
        _ => reply,
    })
}

pub(crate) fn method_from_callback(data: &str) -> Option<PaymentMethod> {
    match data.strip_prefix("payment_")? {
        "eth" => Some(PaymentMethod::Eth),
        "sol" => Some(PaymentMethod::Sol),
        _ => None,
    }
}
