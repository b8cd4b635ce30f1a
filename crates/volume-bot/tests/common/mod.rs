//! Common test utilities for integration tests.

use async_trait::async_trait;
use payment_verifier::{
    Chain, ChainClient, ChainError, Consistency, EvmChainConfig, PaymentVerifier,
    RawTransactionRecord, SolanaChainConfig, TransactionReference,
};
use payment_verifier::chains::{SolanaInstruction, SolanaTransaction};
use session_store::SessionStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use volume_bot::{Config, ConversationController, PlanCatalog};

pub const SOL_WALLET: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const SOL_SENDER: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
pub const BASE_WALLET: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";
pub const TOKEN_MINT: &str = "So11111111111111111111111111111111111111112";

/// A Solana signature that parses.
pub fn sol_sig(seed: u8) -> String {
    bs58::encode([seed; 64]).into_string()
}

/// What the stub node answers.
#[derive(Clone)]
pub enum StubAnswer {
    Found(RawTransactionRecord),
    Missing,
    Unreachable,
}

/// Chain client returning a fixed answer and counting calls.
pub struct StubChainClient {
    chain: Chain,
    answer: Mutex<StubAnswer>,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
}

impl StubChainClient {
    pub fn new(chain: Chain, answer: StubAnswer) -> Arc<Self> {
        Arc::new(Self {
            chain,
            answer: Mutex::new(answer),
            delay: Mutex::new(Duration::ZERO),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_answer(&self, answer: StubAnswer) {
        *self.answer.lock().unwrap() = answer;
    }

    /// Make every lookup take `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }
}

#[async_trait]
impl ChainClient for StubChainClient {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn get_transaction(
        &self,
        _reference: &TransactionReference,
        _consistency: Consistency,
    ) -> Result<Option<RawTransactionRecord>, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let answer = self.answer.lock().unwrap().clone();
        match answer {
            StubAnswer::Found(record) => Ok(Some(record)),
            StubAnswer::Missing => Ok(None),
            StubAnswer::Unreachable => Err(ChainError::Decode("node unreachable".into())),
        }
    }
}

/// A successful System Program transfer of `lamports` to `destination`.
pub fn sol_transfer(signature: &str, destination: &str, lamports: u64) -> RawTransactionRecord {
    let mut data = 2u32.to_le_bytes().to_vec();
    data.extend_from_slice(&lamports.to_le_bytes());

    RawTransactionRecord::Solana(SolanaTransaction {
        signature: signature.to_string(),
        slot: 1,
        account_keys: vec![
            SOL_SENDER.to_string(),
            destination.to_string(),
            "11111111111111111111111111111111".to_string(),
        ],
        instructions: vec![SolanaInstruction {
            program_id_index: 2,
            accounts: vec![0, 1],
            data,
        }],
        error: None,
    })
}

/// Config with Solana and Base wallets.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.verifier.solana = Some(SolanaChainConfig {
        enabled: true,
        rpc_url: "http://localhost:8899".into(),
        receiving_address: Some(SOL_WALLET.into()),
    });
    config.verifier.base = Some(EvmChainConfig {
        enabled: true,
        rpc_url: Some("http://localhost:8545".into()),
        receiving_address: Some(BASE_WALLET.into()),
    });
    config
}

pub struct TestBot {
    pub controller: Arc<ConversationController>,
    pub verifier: Arc<PaymentVerifier>,
    pub sessions: Arc<SessionStore>,
    pub solana: Arc<StubChainClient>,
    pub base: Arc<StubChainClient>,
}

/// A controller wired to stub Solana and Base clients.
pub fn test_bot(solana_answer: StubAnswer) -> TestBot {
    let solana = StubChainClient::new(Chain::Solana, solana_answer);
    let base = StubChainClient::new(Chain::BASE, StubAnswer::Missing);

    let verifier = Arc::new(
        PaymentVerifier::new(Duration::from_secs(5), Consistency::Confirmed)
            .with_client(solana.clone())
            .with_client(base.clone()),
    );
    let sessions = Arc::new(SessionStore::new(Duration::from_secs(3600)));
    let controller = Arc::new(ConversationController::from_config(
        &test_config(),
        verifier.clone(),
        sessions.clone(),
        Arc::new(PlanCatalog::default()),
    ));

    TestBot {
        controller,
        verifier,
        sessions,
        solana,
        base,
    }
}
