//! Session storage errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No active session for {0}")]
    NotFound(String),

    #[error("Transaction already used for a payment: {0}")]
    DuplicateTransaction(String),

    #[error("Plan already paid with transaction {0}")]
    AlreadyPaid(String),

    #[error("Order for {0} changed during verification")]
    OrderChanged(String),
}
