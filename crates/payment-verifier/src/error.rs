//! Payment verification error types.

use crate::types::Chain;
use thiserror::Error;

/// Errors raised by a chain adapter while talking to its node.
///
/// These never escape [`PaymentVerifier::verify`](crate::PaymentVerifier::verify);
/// they are folded into a transient `Failed` verdict there.
#[derive(Error, Debug)]
pub enum ChainError {
    /// HTTP transport failure (connect, TLS, status code, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The node answered with something we could not decode.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Client construction or configuration problem.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A transaction reference that does not match its chain's syntax.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed {chain} transaction reference: {reason}")]
pub struct ReferenceError {
    pub chain: Chain,
    pub reason: String,
}

/// Decimal to smallest-unit conversion failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("Amount must not be negative")]
    Negative,

    #[error("Amount has more than {decimals} fractional digits")]
    Precision { decimals: u32 },

    #[error("Unsupported decimal scale: {0}")]
    UnsupportedScale(u32),

    #[error("Amount overflows the supported range")]
    Overflow,
}
