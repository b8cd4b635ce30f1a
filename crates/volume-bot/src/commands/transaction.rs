//! Transaction submission - verifies the payment on-chain.

use crate::commands::{missing_step_reply, support_link, CommandHandler};
use crate::error::AppResult;
use crate::types::{IncomingUpdate, Reply};
use async_trait::async_trait;
use payment_verifier::{
    Chain, FailureReason, PaymentVerifier, TransactionReference, VerificationRequest,
    VerificationResult,
};
use rust_decimal::Decimal;
use session_store::{Session, SessionError, SessionStore, WizardStep};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

pub struct TransactionHandler {
    sessions: Arc<SessionStore>,
    verifier: Arc<PaymentVerifier>,
    wallets: Arc<HashMap<Chain, String>>,
    tolerance: Decimal,
    support_contact: String,
}

impl TransactionHandler {
    pub fn new(
        sessions: Arc<SessionStore>,
        verifier: Arc<PaymentVerifier>,
        wallets: Arc<HashMap<Chain, String>>,
        tolerance: Decimal,
        support_contact: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            verifier,
            wallets,
            tolerance,
            support_contact: support_contact.into(),
        }
    }

    fn support(&self) -> String {
        support_link(&self.support_contact)
    }

    fn describe_result(
        &self,
        result: &VerificationResult,
        chain: Chain,
        session: &Session,
        wallet: &str,
    ) -> String {
        let symbol = chain.native_symbol();
        let expected = session
            .plan
            .as_ref()
            .map(|p| p.amount.normalize().to_string())
            .unwrap_or_default();

        match result {
            VerificationResult::Valid(event) => {
                let received = event
                    .amount_decimal()
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| expected.clone());
                format!(
                    "✅ *Payment Verified*\n\n\
                     Received `{} {}` for the *{}*.\n\
                     Token: `{}`\n\n\
                     Your volume boost will start shortly. Use /start to order another boost.",
                    received,
                    symbol,
                    session.plan.as_ref().map(|p| p.description.as_str()).unwrap_or("plan"),
                    session.contract_address.as_deref().unwrap_or_default()
                )
            }
            VerificationResult::NotFound => "⏳ Your transaction is not confirmed yet. \
                 Please wait a moment and send the hash/link again."
                .to_string(),
            VerificationResult::NoMatchingTransfer => format!(
                "❌ This transaction does not send exactly `{} {}` to `{}`.\n\n\
                 Please check the details and resubmit the correct transaction hash/link, \
                 or contact support: {}",
                expected,
                symbol,
                wallet,
                self.support()
            ),
            VerificationResult::Failed(reason) if result.is_retryable() => {
                warn!("Verification on {} failed transiently: {}", chain, reason);
                format!(
                    "⚠️ We couldn't reach the {} network to verify your payment. \
                     Please try again shortly.",
                    chain
                )
            }
            VerificationResult::Failed(FailureReason::MalformedReference(_)) => format!(
                "❌ That doesn't look like a {} transaction hash. \
                 Please send the transaction hash or explorer link.",
                chain
            ),
            VerificationResult::Failed(FailureReason::TransactionFailed(_)) => format!(
                "❌ This transaction failed on-chain. Please resubmit a successful payment \
                 transaction, or contact support: {}",
                self.support()
            ),
            VerificationResult::Failed(reason) => {
                error!("Verification on {} cannot proceed: {}", chain, reason);
                format!(
                    "❌ We can't verify {} payments right now. Please contact support: {}",
                    chain,
                    self.support()
                )
            }
        }
    }
}

/// Pull a transaction reference out of a hash or an explorer link.
///
/// Links resolve to their last non-empty path segment, so
/// `https://solscan.io/tx/<sig>?cluster=mainnet` yields `<sig>`.
pub fn extract_reference(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() || text.contains(char::is_whitespace) {
        return None;
    }

    match Url::parse(text) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url
            .path_segments()?
            .filter(|segment| !segment.is_empty())
            .last()
            .map(str::to_string),
        _ => Some(text.to_string()),
    }
}

/// Whether `candidate` has the syntax of a reference on any chain family.
fn looks_like_reference(candidate: &str) -> bool {
    TransactionReference::parse(Chain::Solana, candidate).is_ok()
        || TransactionReference::parse(Chain::ETHEREUM, candidate).is_ok()
}

#[async_trait]
impl CommandHandler for TransactionHandler {
    fn name(&self) -> &str {
        "transaction"
    }

    fn matches(&self, update: &IncomingUpdate, _session: &Session) -> bool {
        update
            .text()
            .and_then(extract_reference)
            .is_some_and(|candidate| looks_like_reference(&candidate))
    }

    async fn execute(&self, update: &IncomingUpdate, session: &Session) -> AppResult<Reply> {
        match session.next_step() {
            WizardStep::SubmitTransaction => {}
            WizardStep::Paid => {
                return Ok(Reply::text(
                    "✅ This order is already paid. Use /start to order another boost.",
                ));
            }
            _ => {
                return Ok(missing_step_reply(session).unwrap_or_else(|| {
                    Reply::text("⚠️ Please use /start to set up your order first.")
                }));
            }
        }

        let Some(order) = session.order() else {
            return Ok(Reply::text("⚠️ Please use /start to set up your order first."));
        };
        let chain = order.chain;
        let Some(wallet) = self.wallets.get(&chain) else {
            return Ok(Reply::text(format!(
                "❌ Payments on {} are temporarily unavailable. Please contact support: {}",
                chain,
                self.support()
            )));
        };
        let Some(raw) = update.text().and_then(extract_reference) else {
            return Ok(Reply::text(
                "⚠️ Please send the transaction hash or explorer link of your payment.",
            ));
        };

        let reference = TransactionReference::parse(chain, &raw).ok();
        if let Some(reference) = &reference {
            if self.sessions.is_reference_used(chain, reference.as_str()).await {
                warn!("{} resubmitted used transaction {}", update.conversation_id, reference);
                return Ok(Reply::text(
                    "❌ This transaction has already been used for a payment. \
                     Please send the hash/link of your own payment.",
                ));
            }
        }

        let request = VerificationRequest::new(chain, raw, wallet.clone(), order.amount)
            .with_tolerance(self.tolerance);
        let result = self.verifier.verify(&request).await;
        info!(
            "Verification for {} on {}: {:?}",
            update.conversation_id, chain, result
        );

        if let (VerificationResult::Valid(_), Some(reference)) = (&result, &reference) {
            match self
                .sessions
                .complete_payment(&update.conversation_id, &order, reference.as_str())
                .await
            {
                Ok(paid) => {
                    return Ok(Reply::text(self.describe_result(&result, chain, &paid, wallet)));
                }
                Err(SessionError::DuplicateTransaction(_)) => {
                    return Ok(Reply::text(
                        "❌ This transaction has already been used for a payment. \
                         Please send the hash/link of your own payment.",
                    ));
                }
                Err(SessionError::AlreadyPaid(_)) => {
                    return Ok(Reply::text(
                        "✅ This order is already paid. Use /start to order another boost.",
                    ));
                }
                Err(SessionError::OrderChanged(_)) => {
                    warn!(
                        "{} changed the order while {} was verified",
                        update.conversation_id, reference
                    );
                    return Ok(Reply::text(
                        "⚠️ Your order changed while we were verifying this payment, so it was \
                         not applied. Please check your order and send the transaction hash/link \
                         again.",
                    ));
                }
                Err(e @ SessionError::NotFound(_)) => {
                    warn!("Verified payment for expired session: {}", e);
                    return Ok(Reply::text(format!(
                        "⚠️ Your payment was verified but your session expired. \
                         Please contact support with your transaction hash: {}",
                        self.support()
                    )));
                }
            }
        }

        Ok(Reply::text(self.describe_result(&result, chain, session, wallet)))
    }
}
