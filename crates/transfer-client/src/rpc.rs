//! Minimal JSON-RPC 2.0 client shared by the wallet and inventory adapters

use std::{
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use alloy_primitives::{B256, U256};
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::ProviderError;

const RPC_LOG_TARGET: &str = "RPC";
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct JsonRpcClient {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: &str) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Sends a request and decodes its `result` member
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        debug!(target: RPC_LOG_TARGET, "{} -> {method} #{id}", self.url);

        let response = self.client.post(&self.url).json(&payload).send().await?;

        if !response.status().is_success() {
            return Err(ProviderError::other(format!(
                "{method} request failed: {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        decode_response(method, body)
    }
}

/// Splits a JSON-RPC response body into its result or its error object
pub fn decode_response<T: DeserializeOwned>(method: &str, body: Value) -> Result<T, ProviderError> {
    if let Some(err) = body.get("error").filter(|e| !e.is_null()) {
        let code = err.get("code").and_then(Value::as_i64);
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(ProviderError { code, message });
    }

    let result = body
        .get("result")
        .cloned()
        .ok_or_else(|| ProviderError::other(format!("{method}: response has no result")))?;

    Ok(serde_json::from_value(result)?)
}

/// Parses a hex quantity such as `0x1a`
pub fn parse_quantity(raw: &str) -> Result<U256, ProviderError> {
    let digits = raw.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| ProviderError::other(format!("invalid quantity {raw}: {e}")))
}

pub fn parse_u64_quantity(raw: &str) -> Result<u64, ProviderError> {
    let digits = raw.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| ProviderError::other(format!("invalid quantity {raw}: {e}")))
}

pub fn parse_hash(raw: &str) -> Result<B256, ProviderError> {
    B256::from_str(raw).map_err(|e| ProviderError::other(format!("invalid hash {raw}: {e}")))
}

/// Hex quantity encoding, no leading zeroes
pub fn to_quantity(value: U256) -> String {
    format!("0x{value:x}")
}
