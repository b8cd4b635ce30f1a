//! Minimal JSON-RPC 2.0 client shared by the chain adapters.

use crate::error::ChainError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, T> {
    jsonrpc: &'static str,
    method: &'a str,
    params: T,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// JSON-RPC client bound to one endpoint.
pub(crate) struct JsonRpcClient {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub(crate) fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// Call `method` and return its result; a JSON `null` result is `Ok(None)`.
    #[instrument(skip(self, params), fields(url = %self.url))]
    pub(crate) async fn call<P, R>(&self, method: &str, params: P) -> Result<Option<R>, ChainError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body = response.bytes().await?;
        let parsed: JsonRpcResponse<R> = serde_json::from_slice(&body)
            .map_err(|e| ChainError::Decode(format!("{} response: {}", method, e)))?;

        if let Some(error) = parsed.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        debug!("{} returned {}", method, if parsed.result.is_some() { "a result" } else { "null" });
        Ok(parsed.result)
    }

    /// Like [`call`](Self::call), but a `null` result is an error.
    pub(crate) async fn call_required<P, R>(&self, method: &str, params: P) -> Result<R, ChainError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        self.call(method, params)
            .await?
            .ok_or_else(|| ChainError::Decode(format!("Empty {} response", method)))
    }
}
