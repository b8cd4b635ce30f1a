//! Wizard session types.

use chrono::{DateTime, Utc};
use payment_verifier::Chain;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the user intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Eth,
    Sol,
}

impl PaymentMethod {
    pub fn symbol(&self) -> &'static str {
        match self {
            PaymentMethod::Eth => "ETH",
            PaymentMethod::Sol => "SOL",
        }
    }

    /// The native payment method of `chain`.
    pub fn native_to(chain: Chain) -> Self {
        match chain {
            Chain::Solana => PaymentMethod::Sol,
            Chain::Evm(_) => PaymentMethod::Eth,
        }
    }

    /// Whether this method pays in `chain`'s native asset.
    pub fn is_native_to(&self, chain: Chain) -> bool {
        *self == Self::native_to(chain)
    }
}

/// A plan picked from the chain's catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedPlan {
    pub key: String,
    pub description: String,
    /// Price in the chain's native asset.
    pub amount: Decimal,
}

/// A verified payment for the session's plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaidPlan {
    pub plan_key: String,
    pub reference: String,
    pub verified_at: DateTime<Utc>,
}

/// The selections a payment is verified against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub chain: Chain,
    pub plan_key: String,
    pub amount: Decimal,
    pub contract_address: String,
}

/// What the wizard is waiting for next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    SelectChain,
    SelectPlan,
    SelectPaymentMethod,
    EnterAddress,
    SubmitTransaction,
    Paid,
}

/// Wizard state for one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub conversation_id: String,
    pub chain: Option<Chain>,
    pub plan: Option<SelectedPlan>,
    pub payment_method: Option<PaymentMethod>,
    /// Token contract to boost.
    pub contract_address: Option<String>,
    pub paid: Option<PaidPlan>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            conversation_id: conversation_id.into(),
            chain: None,
            plan: None,
            payment_method: None,
            contract_address: None,
            paid: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Select a chain. Everything chosen after the chain is cleared.
    pub fn select_chain(&mut self, chain: Chain) {
        self.chain = Some(chain);
        self.plan = None;
        self.payment_method = None;
        self.contract_address = None;
        self.paid = None;
        self.touch();
    }

    /// Select a plan. A new plan starts a new payment.
    pub fn select_plan(&mut self, plan: SelectedPlan) {
        self.plan = Some(plan);
        self.contract_address = None;
        self.paid = None;
        self.touch();
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = Some(method);
        self.touch();
    }

    pub fn set_contract_address(&mut self, address: impl Into<String>) {
        self.contract_address = Some(address.into());
        self.touch();
    }

    /// The first missing selection, or the submission/paid state.
    pub fn next_step(&self) -> WizardStep {
        if self.chain.is_none() {
            WizardStep::SelectChain
        } else if self.plan.is_none() {
            WizardStep::SelectPlan
        } else if self.payment_method.is_none() {
            WizardStep::SelectPaymentMethod
        } else if self.contract_address.is_none() {
            WizardStep::EnterAddress
        } else if self.paid.is_none() {
            WizardStep::SubmitTransaction
        } else {
            WizardStep::Paid
        }
    }

    /// The order awaiting payment, once every selection has been made.
    pub fn order(&self) -> Option<PaymentOrder> {
        if self.next_step() != WizardStep::SubmitTransaction {
            return None;
        }
        let plan = self.plan.as_ref()?;
        Some(PaymentOrder {
            chain: self.chain?,
            plan_key: plan.key.clone(),
            amount: plan.amount,
            contract_address: self.contract_address.clone()?,
        })
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub(crate) fn mark_paid(&mut self, reference: &str) {
        let plan_key = self.plan.as_ref().map(|p| p.key.clone()).unwrap_or_default();
        self.paid = Some(PaidPlan {
            plan_key,
            reference: reference.to_string(),
            verified_at: Utc::now(),
        });
        self.touch();
    }
}
