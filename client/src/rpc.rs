//! Soroban RPC client.
//!
//! Covers the endpoints the CLI needs against a live network: node health,
//! latest ledger, submission of a signed transaction envelope and lookup of
//! its outcome. Building and signing envelopes happens outside this crate.

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::retry::RetryStrategy;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// JSON-RPC request ID type
type RequestId = u64;

/// Transaction hash type
pub type TransactionHash = String;

/// Soroban RPC client
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    base_url: String,
    retry_strategy: RetryStrategy,
    request_id: Arc<AtomicU64>,
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: RequestId,
    method: String,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// `getHealth` result
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub latest_ledger: Option<u64>,
    #[serde(default)]
    pub oldest_ledger: Option<u64>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// `getLatestLedger` result
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestLedger {
    pub id: String,
    pub protocol_version: u32,
    pub sequence: u64,
}

/// Status reported by `sendTransaction`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendStatus {
    Pending,
    Duplicate,
    TryAgainLater,
    Error,
}

/// `sendTransaction` result
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub hash: TransactionHash,
    pub status: SendStatus,
    #[serde(default)]
    pub latest_ledger: Option<u64>,
    #[serde(default)]
    pub error_result_xdr: Option<String>,
}

/// Transaction status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Success,
    Failed,
    NotFound,
}

/// `getTransaction` result for a transaction the node knows about
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    #[serde(default)]
    pub hash: TransactionHash,
    pub status: TransactionStatus,
    #[serde(default)]
    pub ledger: Option<u64>,
    #[serde(default)]
    pub result_xdr: Option<String>,
}

impl RpcClient {
    /// Create a new Soroban RPC client
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            client,
            base_url: config.rpc_url.clone(),
            retry_strategy: RetryStrategy::from_config(config),
            request_id: Arc::new(AtomicU64::new(1)),
        })
    }

    fn next_request_id(&self) -> RequestId {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Make a JSON-RPC call
    async fn call_rpc(&self, method: &str, params: Value) -> Result<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: self.next_request_id(),
            method: method.to_string(),
            params,
        };

        debug!("Soroban RPC request: {} (id: {})", method, request.id);

        self.retry_strategy
            .retry(|| async {
                let response = self
                    .client
                    .post(&self.base_url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(ClientError::Network)?;

                let status = response.status();
                if !status.is_success() {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(ClientError::Rpc(format!("HTTP {}: {}", status, error_text)));
                }

                let rpc_response: JsonRpcResponse = response
                    .json()
                    .await
                    .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

                if let Some(error) = rpc_response.error {
                    error!("Soroban RPC error: {} (code: {})", error.message, error.code);
                    return Err(ClientError::Rpc(format!(
                        "{} (code: {})",
                        error.message, error.code
                    )));
                }

                rpc_response.result.ok_or_else(|| {
                    ClientError::InvalidResponse("Missing result in response".to_string())
                })
            })
            .await
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let result = self.call_rpc(method, params).await?;
        serde_json::from_value(result)
            .map_err(|e| ClientError::InvalidResponse(format!("{}: {}", method, e)))
    }

    pub async fn get_health(&self) -> Result<HealthStatus> {
        self.call("getHealth", json!({})).await
    }

    pub async fn get_latest_ledger(&self) -> Result<LatestLedger> {
        let ledger: LatestLedger = self.call("getLatestLedger", json!({})).await?;
        debug!("Latest ledger: {}", ledger.sequence);
        Ok(ledger)
    }

    /// Submits a signed, base64 encoded transaction envelope.
    ///
    /// An envelope that is not valid base64 is refused locally. A node
    /// verdict of `ERROR` becomes [`ClientError::TransactionFailed`];
    /// `PENDING`, `DUPLICATE` and `TRY_AGAIN_LATER` are returned as is.
    pub async fn send_transaction(&self, envelope_xdr: &str) -> Result<SendResult> {
        general_purpose::STANDARD.decode(envelope_xdr.trim())?;
        info!("Sending transaction via Soroban RPC");

        let result: SendResult = self
            .call("sendTransaction", json!({ "transaction": envelope_xdr.trim() }))
            .await?;

        if result.status == SendStatus::Error {
            return Err(ClientError::TransactionFailed {
                hash: result.hash,
                message: result
                    .error_result_xdr
                    .unwrap_or_else(|| "rejected by node".to_string()),
            });
        }

        info!("Transaction sent: {} (status: {:?})", result.hash, result.status);
        Ok(result)
    }

    /// Looks a transaction up; `NOT_FOUND` is reported as
    /// [`ClientError::TransactionNotFound`].
    pub async fn get_transaction(&self, tx_hash: &str) -> Result<TransactionInfo> {
        debug!("Fetching Soroban transaction: {}", tx_hash);

        let mut info: TransactionInfo = self
            .call("getTransaction", json!({ "hash": tx_hash }))
            .await?;
        if info.status == TransactionStatus::NotFound {
            return Err(ClientError::TransactionNotFound(tx_hash.to_string()));
        }
        info.hash = tx_hash.to_string();

        debug!(
            "Transaction retrieved: {} (status: {:?}, ledger: {:?})",
            tx_hash, info.status, info.ledger
        );
        Ok(info)
    }

    /// Health check - node reports healthy
    pub async fn health_check(&self) -> Result<bool> {
        match self.get_health().await {
            Ok(health) => {
                info!("Soroban RPC health: {}", health.status);
                Ok(health.is_healthy())
            }
            Err(e) => {
                error!("Soroban RPC health check failed: {:?}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn create_test_config() -> ClientConfig {
        ClientConfig::testnet()
            .with_request_timeout(Duration::from_secs(10))
            .with_max_retries(1)
    }

    #[test]
    fn test_rpc_client_creation() {
        assert!(RpcClient::new(&create_test_config()).is_ok());
    }

    #[test]
    fn test_request_id_increment() {
        let client = RpcClient::new(&create_test_config()).unwrap();

        assert_eq!(client.next_request_id(), 1);
        assert_eq!(client.next_request_id(), 2);
        assert_eq!(client.clone().next_request_id(), 3);
    }

    #[test]
    fn test_response_shapes() {
        let sent: SendResult = serde_json::from_value(json!({
            "hash": "ab12",
            "status": "TRY_AGAIN_LATER",
            "latestLedger": 10
        }))
        .unwrap();
        assert_eq!(sent.status, SendStatus::TryAgainLater);
        assert_eq!(sent.latest_ledger, Some(10));

        let info: TransactionInfo = serde_json::from_value(json!({
            "status": "FAILED",
            "ledger": 7,
            "latestLedger": 9
        }))
        .unwrap();
        assert_eq!(info.status, TransactionStatus::Failed);
        assert_eq!(info.result_xdr, None);
    }

    #[tokio::test]
    async fn test_invalid_envelope_is_refused_locally() {
        let client = RpcClient::new(&create_test_config()).unwrap();
        let err = client.send_transaction("not base64!").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidEnvelope(_)));
    }
}
