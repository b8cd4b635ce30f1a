//! Plan selection.

use crate::commands::{payment_menu, CommandHandler};
use crate::error::AppResult;
use crate::plans::PlanCatalog;
use crate::types::{IncomingUpdate, Reply};
use async_trait::async_trait;
use session_store::{SelectedPlan, Session, SessionStore};
use std::sync::Arc;
use tracing::info;

pub struct PlanHandler {
    sessions: Arc<SessionStore>,
    plans: Arc<PlanCatalog>,
}

impl PlanHandler {
    pub fn new(sessions: Arc<SessionStore>, plans: Arc<PlanCatalog>) -> Self {
        Self { sessions, plans }
    }
}

#[async_trait]
impl CommandHandler for PlanHandler {
    fn name(&self) -> &str {
        "plan"
    }

    /// Plan keys only mean something once a chain is selected.
    fn matches(&self, update: &IncomingUpdate, session: &Session) -> bool {
        match (update.callback_data(), session.chain) {
            (Some(data), Some(chain)) => self.plans.find(chain, data).is_some(),
            _ => false,
        }
    }

    async fn execute(&self, update: &IncomingUpdate, session: &Session) -> AppResult<Reply> {
        let plan = session
            .chain
            .zip(update.callback_data())
            .and_then(|(chain, key)| self.plans.find(chain, key));

        let Some(plan) = plan else {
            return Ok(Reply::text("⚠️ Please select a blockchain first. Use /start to begin."));
        };

        let selected = SelectedPlan {
            key: plan.key.clone(),
            description: plan.description.clone(),
            amount: plan.amount,
        };
        self.sessions
            .update(&update.conversation_id, |s| s.select_plan(selected))
            .await;
        info!("{} selected plan {}", update.conversation_id, plan.key);

        Ok(Reply::text(format!(
            "✨ *Selected Plan:* {}\n\nSelect your payment method:",
            plan.description
        ))
        .with_buttons(payment_menu()))
    }
}
