//! In-memory session storage with TTL expiration.

use crate::error::SessionError;
use crate::types::*;
use payment_verifier::Chain;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Entry in the session store with expiration tracking.
struct SessionEntry {
    session: Session,
    expires_at: Instant,
}

/// In-memory wizard session store with automatic TTL expiration.
///
/// Sessions expire after the configured TTL of inactivity. Transaction
/// references accepted as payment are remembered for the life of the
/// process so the same transaction cannot pay twice.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    used_references: Arc<RwLock<HashSet<String>>>,
    ttl: Duration,
}

fn reference_key(chain: Chain, reference: &str) -> String {
    format!("{}:{}", chain.slug(), reference)
}

impl SessionStore {
    /// Create a new in-memory session store.
    ///
    /// Spawns a background task to periodically clean up expired sessions.
    pub fn new(ttl: Duration) -> Self {
        let store = Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            used_references: Arc::new(RwLock::new(HashSet::new())),
            ttl,
        };

        let cleanup_store = store.clone();
        tokio::spawn(async move {
            cleanup_store.cleanup_loop().await;
        });

        info!("In-memory session store initialized (ttl={:?})", ttl);

        store
    }

    async fn cleanup_loop(&self) {
        let cleanup_interval = Duration::from_secs(60);

        loop {
            tokio::time::sleep(cleanup_interval).await;

            let now = Instant::now();
            let mut sessions = self.sessions.write().await;
            let before_count = sessions.len();

            sessions.retain(|_, entry| entry.expires_at > now);

            let removed = before_count - sessions.len();
            if removed > 0 {
                debug!("Cleaned up {} expired sessions", removed);
            }
        }
    }

    /// Get the live session for a conversation.
    #[instrument(skip(self))]
    pub async fn get(&self, conversation_id: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        let now = Instant::now();

        sessions
            .get(conversation_id)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.session.clone())
    }

    /// Apply `f` to the conversation's session, creating it if needed.
    ///
    /// Refreshes the TTL and returns the updated session.
    pub async fn update<F>(&self, conversation_id: &str, f: F) -> Session
    where
        F: FnOnce(&mut Session),
    {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        let expires_at = now + self.ttl;

        let entry = sessions
            .entry(conversation_id.to_string())
            .or_insert_with(|| SessionEntry {
                session: Session::new(conversation_id),
                expires_at,
            });

        if entry.expires_at <= now {
            entry.session = Session::new(conversation_id);
        }
        entry.expires_at = expires_at;

        f(&mut entry.session);

        entry.session.clone()
    }

    /// Replace the conversation's session with a fresh one.
    #[instrument(skip(self))]
    pub async fn reset(&self, conversation_id: &str) -> Session {
        let mut sessions = self.sessions.write().await;
        let session = Session::new(conversation_id);

        sessions.insert(
            conversation_id.to_string(),
            SessionEntry {
                session: session.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );

        debug!("Reset session for {}", conversation_id);
        session
    }

    /// Remove a conversation's session.
    #[instrument(skip(self))]
    pub async fn clear(&self, conversation_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(conversation_id).is_some();

        if removed {
            info!("Cleared session for {}", conversation_id);
        }

        removed
    }

    /// Get total number of live sessions.
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        let now = Instant::now();
        sessions.values().filter(|entry| entry.expires_at > now).count()
    }

    /// Record `reference` as used. Returns false if it already was.
    pub async fn mark_reference_used(&self, chain: Chain, reference: &str) -> bool {
        let mut used = self.used_references.write().await;
        used.insert(reference_key(chain, reference))
    }

    pub async fn is_reference_used(&self, chain: Chain, reference: &str) -> bool {
        let used = self.used_references.read().await;
        used.contains(&reference_key(chain, reference))
    }

    /// Mark `order` as paid by `reference`.
    ///
    /// Claims the reference and updates the session under one lock, so two
    /// conversations racing with the same transaction cannot both succeed.
    /// The session must still hold exactly `order`; a selection changed
    /// while the payment was being verified is [`SessionError::OrderChanged`]
    /// and leaves the reference unclaimed.
    #[instrument(skip(self, order), fields(chain = %order.chain, plan = %order.plan_key))]
    pub async fn complete_payment(
        &self,
        conversation_id: &str,
        order: &PaymentOrder,
        reference: &str,
    ) -> Result<Session, SessionError> {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();

        let entry = sessions
            .get_mut(conversation_id)
            .filter(|entry| entry.expires_at > now)
            .ok_or_else(|| SessionError::NotFound(conversation_id.to_string()))?;

        if let Some(paid) = &entry.session.paid {
            return Err(SessionError::AlreadyPaid(paid.reference.clone()));
        }

        if entry.session.order().as_ref() != Some(order) {
            warn!("Order for {} changed during verification", conversation_id);
            return Err(SessionError::OrderChanged(conversation_id.to_string()));
        }

        let mut used = self.used_references.write().await;
        if !used.insert(reference_key(order.chain, reference)) {
            return Err(SessionError::DuplicateTransaction(reference.to_string()));
        }

        entry.session.mark_paid(reference);
        entry.expires_at = now + self.ttl;

        info!("Payment recorded for {} ({})", conversation_id, reference);
        Ok(entry.session.clone())
    }

    /// Health check - always returns true for in-memory store.
    pub async fn health_check(&self) -> bool {
        true
    }
}
