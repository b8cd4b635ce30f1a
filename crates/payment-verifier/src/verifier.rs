//! The payment verifier.
//!
//! [`PaymentVerifier::verify`] turns a [`VerificationRequest`] into a
//! [`VerificationResult`]. It never returns an error: every failure mode is a
//! variant of the result, classified as permanent or transient.

use crate::chains::{ChainClient, EvmClient, RawTransactionRecord, SolanaClient};
use crate::config::PaymentVerifierConfig;
use crate::error::ChainError;
use crate::types::{
    Chain, Consistency, FailureReason, TransactionReference, TransferEvent, VerificationRequest,
    VerificationResult,
};
use crate::units;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Expected payment in integer smallest units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ExpectedAmount {
    amount: u128,
    tolerance: u128,
}

/// Verifies on-chain payments through per-chain [`ChainClient`]s.
#[derive(Clone)]
pub struct PaymentVerifier {
    clients: HashMap<Chain, Arc<dyn ChainClient>>,
    timeout: Duration,
    consistency: Consistency,
}

impl PaymentVerifier {
    /// Create a verifier with no chains registered.
    pub fn new(timeout: Duration, consistency: Consistency) -> Self {
        Self {
            clients: HashMap::new(),
            timeout,
            consistency,
        }
    }

    /// Register the client for its chain, replacing any previous one.
    pub fn with_client(mut self, client: Arc<dyn ChainClient>) -> Self {
        self.clients.insert(client.chain(), client);
        self
    }

    /// Build a verifier with a JSON-RPC client for every enabled chain.
    pub fn from_config(config: &PaymentVerifierConfig) -> Result<Self, ChainError> {
        let mut verifier = Self::new(config.timeout, config.consistency);

        if let Some(solana) = config.solana.as_ref().filter(|c| c.enabled) {
            let client = SolanaClient::new(solana.rpc_url.clone(), config.timeout)?;
            verifier = verifier.with_client(Arc::new(client));
        }

        for (chain, section) in [(Chain::ETHEREUM, &config.ethereum), (Chain::BASE, &config.base)] {
            let Some(section) = section.as_ref().filter(|c| c.enabled) else {
                continue;
            };
            let Chain::Evm(chain_id) = chain else {
                continue;
            };
            let rpc_url = section
                .rpc_url_for(chain)
                .ok_or_else(|| ChainError::Config(format!("No RPC URL for {}", chain)))?;
            let client = EvmClient::new(chain_id, rpc_url, config.timeout, config.min_confirmations)?;
            verifier = verifier.with_client(Arc::new(client));
        }

        info!(
            "Payment verifier ready: chains={:?}, consistency={:?}, timeout={:?}",
            verifier.chains(),
            verifier.consistency,
            verifier.timeout
        );

        Ok(verifier)
    }

    /// Chains with a registered client.
    pub fn chains(&self) -> Vec<Chain> {
        let mut chains: Vec<Chain> = self.clients.keys().copied().collect();
        chains.sort_by_key(|c| c.slug());
        chains
    }

    pub fn client(&self, chain: Chain) -> Option<&Arc<dyn ChainClient>> {
        self.clients.get(&chain)
    }

    /// Decide whether the referenced transaction pays the expected amount
    /// to the expected destination.
    #[instrument(skip(self, request), fields(chain = %request.chain, reference = %request.reference))]
    pub async fn verify(&self, request: &VerificationRequest) -> VerificationResult {
        let result = self.verify_inner(request).await;
        match &result {
            VerificationResult::Valid(event) => {
                info!("Payment verified: {} to {}", event.amount, event.destination)
            }
            VerificationResult::NotFound => info!("Transaction not found or not yet settled"),
            VerificationResult::NoMatchingTransfer => info!("Transaction has no matching transfer"),
            VerificationResult::Failed(reason) if result.is_retryable() => {
                warn!("Verification failed transiently: {}", reason)
            }
            VerificationResult::Failed(reason) => info!("Verification failed: {}", reason),
        }
        result
    }

    async fn verify_inner(&self, request: &VerificationRequest) -> VerificationResult {
        let chain = request.chain;

        let reference = match TransactionReference::parse(chain, &request.reference) {
            Ok(reference) => reference,
            Err(e) => return VerificationResult::Failed(FailureReason::MalformedReference(e.reason)),
        };

        if !chain.supports_asset(&request.asset) {
            return VerificationResult::Failed(FailureReason::UnsupportedAsset(format!(
                "{:?} on {}",
                request.asset, chain
            )));
        }

        let expected = match expected_amount(request) {
            Ok(expected) => expected,
            Err(reason) => return VerificationResult::Failed(FailureReason::InvalidAmount(reason)),
        };

        let Some(client) = self.clients.get(&chain) else {
            return VerificationResult::Failed(FailureReason::UnsupportedChain(chain));
        };

        let fetched = tokio::time::timeout(
            self.timeout,
            client.get_transaction(&reference, self.consistency),
        )
        .await;

        let record = match fetched {
            Err(_) => return VerificationResult::Failed(FailureReason::Timeout),
            Ok(Err(e)) => return VerificationResult::Failed(FailureReason::Transport(e.to_string())),
            Ok(Ok(None)) => return VerificationResult::NotFound,
            Ok(Ok(Some(record))) => record,
        };

        evaluate_record(chain, &record, request, expected)
    }
}

/// Convert the request's amount and tolerance to smallest units.
fn expected_amount(request: &VerificationRequest) -> Result<ExpectedAmount, String> {
    let decimals = request.asset.decimals(request.chain);

    if request.expected_amount.is_sign_negative() || request.expected_amount.is_zero() {
        return Err(format!("expected amount must be positive, got {}", request.expected_amount));
    }
    if request.tolerance.is_sign_negative() && !request.tolerance.is_zero() {
        return Err(format!("tolerance must not be negative, got {}", request.tolerance));
    }

    let amount = units::to_smallest_unit(request.expected_amount, decimals)
        .map_err(|e| format!("expected amount {}: {}", request.expected_amount, e))?;
    let tolerance = units::to_smallest_unit_floor(request.tolerance, decimals)
        .map_err(|e| format!("tolerance {}: {}", request.tolerance, e))?;

    Ok(ExpectedAmount { amount, tolerance })
}

fn evaluate_record(
    chain: Chain,
    record: &RawTransactionRecord,
    request: &VerificationRequest,
    expected: ExpectedAmount,
) -> VerificationResult {
    if let Some(reason) = record.failure() {
        return VerificationResult::Failed(FailureReason::TransactionFailed(reason));
    }

    let transfers = record.decode_transfers(&request.asset);
    debug!("Decoded {} transfer(s)", transfers.len());

    match find_matching_transfer(
        chain,
        &transfers,
        &request.expected_destination,
        expected.amount,
        expected.tolerance,
    ) {
        Some(event) => VerificationResult::Valid(event.clone()),
        None => VerificationResult::NoMatchingTransfer,
    }
}

/// First transfer paying `destination` an amount within `tolerance` of `expected`.
pub fn find_matching_transfer<'a>(
    chain: Chain,
    transfers: &'a [TransferEvent],
    destination: &str,
    expected: u128,
    tolerance: u128,
) -> Option<&'a TransferEvent> {
    transfers.iter().find(|t| {
        chain.addresses_match(&t.destination, destination)
            && units::within_tolerance(t.amount, expected, tolerance)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::{EvmLog, EvmTransaction, MockChainClient, SolanaInstruction, SolanaTransaction};
    use crate::types::Asset;
    use alloy_primitives::{B256, U256};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const SOL_WALLET: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
    const SOL_SENDER: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
    const SYSTEM_PROGRAM: &str = "11111111111111111111111111111111";
    const EVM_WALLET: &str = "0xAbCdEf0123456789aBcDeF0123456789AbCdEf01";

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sol_sig() -> String {
        bs58::encode([9u8; 64]).into_string()
    }

    fn evm_hash() -> String {
        format!("0x{}", "cd".repeat(32))
    }

    fn transfer_data(lamports: u64) -> Vec<u8> {
        let mut data = 2u32.to_le_bytes().to_vec();
        data.extend_from_slice(&lamports.to_le_bytes());
        data
    }

    fn sol_payment(lamports: u64, error: Option<serde_json::Value>) -> RawTransactionRecord {
        RawTransactionRecord::Solana(SolanaTransaction {
            signature: sol_sig(),
            slot: 1,
            account_keys: vec![
                SOL_SENDER.to_string(),
                SOL_WALLET.to_string(),
                SYSTEM_PROGRAM.to_string(),
            ],
            instructions: vec![SolanaInstruction {
                program_id_index: 2,
                accounts: vec![0, 1],
                data: transfer_data(lamports),
            }],
            error,
        })
    }

    fn evm_payment(wei: u128, succeeded: bool) -> RawTransactionRecord {
        RawTransactionRecord::Evm(EvmTransaction {
            hash: B256::repeat_byte(0xcd),
            from: "0x1111111111111111111111111111111111111111".parse().unwrap(),
            to: Some(EVM_WALLET.parse().unwrap()),
            value: U256::from(wei),
            block_number: 10,
            succeeded,
            logs: vec![],
        })
    }

    fn mock_returning(
        chain: Chain,
        record: Option<RawTransactionRecord>,
        times: usize,
    ) -> MockChainClient {
        let mut mock = MockChainClient::new();
        mock.expect_chain().return_const(chain);
        mock.expect_get_transaction()
            .times(times)
            .returning(move |_, _| Ok(record.clone()));
        mock
    }

    fn verifier_with(mock: MockChainClient) -> PaymentVerifier {
        PaymentVerifier::new(Duration::from_secs(5), Consistency::Confirmed)
            .with_client(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_malformed_reference_skips_rpc() {
        let verifier = verifier_with(mock_returning(Chain::BASE, None, 0));
        let request = VerificationRequest::new(Chain::BASE, "not-a-hash", EVM_WALLET, dec("0.08"));

        let result = verifier.verify(&request).await;
        assert!(matches!(
            result,
            VerificationResult::Failed(FailureReason::MalformedReference(_))
        ));
    }

    #[tokio::test]
    async fn test_exact_sol_payment_is_valid() {
        let verifier = verifier_with(mock_returning(
            Chain::Solana,
            Some(sol_payment(10_000_000_000, None)),
            1,
        ));
        let request = VerificationRequest::new(Chain::Solana, sol_sig(), SOL_WALLET, dec("10.0"));

        match verifier.verify(&request).await {
            VerificationResult::Valid(event) => {
                assert_eq!(event.amount, 10_000_000_000);
                assert_eq!(event.destination, SOL_WALLET);
                assert_eq!(event.source.as_deref(), Some(SOL_SENDER));
            }
            other => panic!("expected Valid, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_evm_destination_case_insensitive() {
        let verifier = verifier_with(mock_returning(
            Chain::BASE,
            Some(evm_payment(80_000_000_000_000_000, true)),
            1,
        ));
        let request = VerificationRequest::new(
            Chain::BASE,
            evm_hash(),
            EVM_WALLET.to_lowercase(),
            dec("0.08"),
        );

        assert!(verifier.verify(&request).await.is_valid());
    }

    #[tokio::test]
    async fn test_failed_transaction_never_valid() {
        let verifier = verifier_with(mock_returning(
            Chain::ETHEREUM,
            Some(evm_payment(100_000_000_000_000_000, false)),
            1,
        ));
        let request = VerificationRequest::new(Chain::ETHEREUM, evm_hash(), EVM_WALLET, dec("0.1"));

        assert!(matches!(
            verifier.verify(&request).await,
            VerificationResult::Failed(FailureReason::TransactionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_solana_transaction_never_valid() {
        let error = serde_json::json!({"InstructionError": [0, "Custom"]});
        let verifier = verifier_with(mock_returning(
            Chain::Solana,
            Some(sol_payment(10_000_000_000, Some(error))),
            1,
        ));
        let request = VerificationRequest::new(Chain::Solana, sol_sig(), SOL_WALLET, dec("10"));

        assert!(matches!(
            verifier.verify(&request).await,
            VerificationResult::Failed(FailureReason::TransactionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_amount_or_destination() {
        let verifier = verifier_with(mock_returning(
            Chain::Solana,
            Some(sol_payment(9_999_999_999, None)),
            2,
        ));

        let underpaid = VerificationRequest::new(Chain::Solana, sol_sig(), SOL_WALLET, dec("10"));
        assert_eq!(verifier.verify(&underpaid).await, VerificationResult::NoMatchingTransfer);

        let elsewhere =
            VerificationRequest::new(Chain::Solana, sol_sig(), SOL_SENDER, dec("9.999999999"));
        assert_eq!(verifier.verify(&elsewhere).await, VerificationResult::NoMatchingTransfer);
    }

    #[tokio::test]
    async fn test_tolerance_is_inclusive() {
        let verifier = verifier_with(mock_returning(
            Chain::Solana,
            Some(sol_payment(9_999_999_999, None)),
            2,
        ));

        let within = VerificationRequest::new(Chain::Solana, sol_sig(), SOL_WALLET, dec("10"))
            .with_tolerance(dec("0.000000001"));
        assert!(verifier.verify(&within).await.is_valid());

        // Sub-lamport tolerance floors to zero.
        let floored = VerificationRequest::new(Chain::Solana, sol_sig(), SOL_WALLET, dec("10"))
            .with_tolerance(dec("0.0000000009"));
        assert_eq!(verifier.verify(&floored).await, VerificationResult::NoMatchingTransfer);
    }

    #[tokio::test]
    async fn test_verify_is_idempotent() {
        let verifier = verifier_with(mock_returning(
            Chain::Solana,
            Some(sol_payment(5_000_000_000, None)),
            2,
        ));
        let request = VerificationRequest::new(Chain::Solana, sol_sig(), SOL_WALLET, dec("5"));

        let first = verifier.verify(&request).await;
        let second = verifier.verify(&request).await;
        assert!(first.is_valid());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_not_found() {
        let verifier = verifier_with(mock_returning(Chain::Solana, None, 1));
        let request = VerificationRequest::new(Chain::Solana, sol_sig(), SOL_WALLET, dec("1"));

        let result = verifier.verify(&request).await;
        assert_eq!(result, VerificationResult::NotFound);
        assert!(result.may_settle_later());
    }

    #[tokio::test]
    async fn test_transport_error_is_not_not_found() {
        let mut mock = MockChainClient::new();
        mock.expect_chain().return_const(Chain::BASE);
        mock.expect_get_transaction()
            .times(1)
            .returning(|_, _| Err(ChainError::Decode("connection reset".into())));
        let verifier = verifier_with(mock);
        let request = VerificationRequest::new(Chain::BASE, evm_hash(), EVM_WALLET, dec("0.08"));

        let result = verifier.verify(&request).await;
        assert!(matches!(result, VerificationResult::Failed(FailureReason::Transport(_))));
        assert!(result.is_retryable());
    }

    #[tokio::test]
    async fn test_slow_node_times_out() {
        struct SlowClient;

        #[async_trait::async_trait]
        impl ChainClient for SlowClient {
            fn chain(&self) -> Chain {
                Chain::Solana
            }

            async fn get_transaction(
                &self,
                _reference: &TransactionReference,
                _consistency: Consistency,
            ) -> Result<Option<RawTransactionRecord>, ChainError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(None)
            }
        }

        let verifier = PaymentVerifier::new(Duration::from_millis(20), Consistency::Confirmed)
            .with_client(Arc::new(SlowClient));
        let request = VerificationRequest::new(Chain::Solana, sol_sig(), SOL_WALLET, dec("1"));

        assert_eq!(
            verifier.verify(&request).await,
            VerificationResult::Failed(FailureReason::Timeout)
        );
    }

    #[tokio::test]
    async fn test_unsupported_chain() {
        let verifier = verifier_with(mock_returning(Chain::Solana, None, 0));
        let request = VerificationRequest::new(Chain::BASE, evm_hash(), EVM_WALLET, dec("0.08"));

        assert_eq!(
            verifier.verify(&request).await,
            VerificationResult::Failed(FailureReason::UnsupportedChain(Chain::BASE))
        );
    }

    #[tokio::test]
    async fn test_invalid_amounts_rejected_before_rpc() {
        let verifier = verifier_with(mock_returning(Chain::Solana, None, 0));

        for amount in ["0", "-1", "0.0000000001"] {
            let request = VerificationRequest::new(Chain::Solana, sol_sig(), SOL_WALLET, dec(amount));
            assert!(matches!(
                verifier.verify(&request).await,
                VerificationResult::Failed(FailureReason::InvalidAmount(_))
            ));
        }

        let request = VerificationRequest::new(Chain::Solana, sol_sig(), SOL_WALLET, dec("1"))
            .with_tolerance(dec("-0.1"));
        assert!(matches!(
            verifier.verify(&request).await,
            VerificationResult::Failed(FailureReason::InvalidAmount(_))
        ));
    }

    #[tokio::test]
    async fn test_token_asset_on_solana_unsupported() {
        let verifier = verifier_with(mock_returning(Chain::Solana, None, 0));
        let request = VerificationRequest::new(Chain::Solana, sol_sig(), SOL_WALLET, dec("1"))
            .with_asset(Asset::Erc20 {
                contract: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".into(),
                decimals: 6,
            });

        assert!(matches!(
            verifier.verify(&request).await,
            VerificationResult::Failed(FailureReason::UnsupportedAsset(_))
        ));
    }

    #[tokio::test]
    async fn test_erc20_payment_verified_from_logs() {
        const USDC: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";
        const OTHER_TOKEN: &str = "0x2222222222222222222222222222222222222222";

        let transfer_log = |token: &str, amount: u64| {
            let from: alloy_primitives::Address =
                "0x1111111111111111111111111111111111111111".parse().unwrap();
            let to: alloy_primitives::Address = EVM_WALLET.parse().unwrap();
            EvmLog {
                address: token.parse().unwrap(),
                topics: vec![
                    alloy_primitives::keccak256("Transfer(address,address,uint256)"),
                    from.into_word(),
                    to.into_word(),
                ],
                data: U256::from(amount).to_be_bytes::<32>().to_vec().into(),
            }
        };
        let record = RawTransactionRecord::Evm(EvmTransaction {
            hash: B256::repeat_byte(0xcd),
            from: "0x1111111111111111111111111111111111111111".parse().unwrap(),
            to: Some(USDC.parse().unwrap()),
            value: U256::ZERO,
            block_number: 10,
            succeeded: true,
            logs: vec![transfer_log(OTHER_TOKEN, 25_000_000), transfer_log(USDC, 25_000_000)],
        });

        let verifier = verifier_with(mock_returning(Chain::BASE, Some(record), 2));
        let usdc = Asset::Erc20 {
            contract: USDC.into(),
            decimals: 6,
        };
        let destination = format!("0x{}", EVM_WALLET[2..].to_uppercase());

        let request = VerificationRequest::new(Chain::BASE, evm_hash(), destination.clone(), dec("25"))
            .with_asset(usdc.clone());
        match verifier.verify(&request).await {
            VerificationResult::Valid(event) => {
                assert_eq!(event.amount, 25_000_000);
                assert_eq!(event.decimals, 6);
                assert_eq!(event.asset, usdc);
            }
            other => panic!("expected a valid payment, got {:?}", other),
        }

        let request = VerificationRequest::new(Chain::BASE, evm_hash(), destination, dec("25.5"))
            .with_asset(usdc);
        assert_eq!(
            verifier.verify(&request).await,
            VerificationResult::NoMatchingTransfer
        );
    }

    #[test]
    fn test_find_matching_transfer_picks_first_match() {
        let event = |destination: &str, amount: u128| TransferEvent {
            source: None,
            destination: destination.to_string(),
            amount,
            decimals: 9,
            asset: Asset::Native,
        };
        let transfers = vec![
            event(SOL_SENDER, 100),
            event(SOL_WALLET, 99),
            event(SOL_WALLET, 100),
            event(SOL_WALLET, 101),
        ];

        let found = find_matching_transfer(Chain::Solana, &transfers, SOL_WALLET, 100, 1).unwrap();
        assert_eq!(found.amount, 99);

        let exact = find_matching_transfer(Chain::Solana, &transfers, SOL_WALLET, 100, 0).unwrap();
        assert_eq!(exact.amount, 100);

        assert!(find_matching_transfer(Chain::Solana, &transfers, SOL_WALLET, 200, 0).is_none());
    }

    #[test]
    fn test_from_config_registers_enabled_chains() {
        let config: PaymentVerifierConfig = serde_json::from_value(serde_json::json!({
            "solana": { "rpc_url": "http://localhost:8899" },
            "base": {},
            "ethereum": { "enabled": false }
        }))
        .unwrap();

        let verifier = PaymentVerifier::from_config(&config).unwrap();
        assert_eq!(verifier.chains(), vec![Chain::BASE, Chain::Solana]);
        assert!(verifier.client(Chain::ETHEREUM).is_none());
    }
}
