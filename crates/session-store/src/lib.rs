//! In-memory wizard session storage.
//!
//! Each conversation has one [`Session`] holding the user's selections
//! (chain, plan, payment method, token address) with automatic TTL-based
//! expiration. No external persistence.

mod error;
mod store;
mod types;

pub use error::SessionError;
pub use store::SessionStore;
pub use types::*;
