//! Transaction confirmation polling.

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::rpc::{RpcClient, TransactionInfo, TransactionStatus};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Transaction monitor for tracking transaction status
#[derive(Clone)]
pub struct TransactionMonitor {
    rpc: RpcClient,
    options: MonitorOptions,
}

/// Monitoring options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOptions {
    /// Poll interval (in milliseconds)
    pub poll_interval_ms: u64,
    /// Timeout (in seconds)
    pub timeout_secs: u64,
}

impl MonitorOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            poll_interval_ms: config.tx_poll_interval_ms,
            timeout_secs: config.tx_timeout_secs,
        }
    }

    pub fn with_poll_interval(mut self, interval_ms: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Transaction monitoring result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorResult {
    /// Included and succeeded
    Success(TransactionInfo),
    /// Included and failed
    Failed(TransactionInfo),
    /// Not seen before the deadline
    Timeout,
}

impl TransactionMonitor {
    pub fn new(rpc: RpcClient, options: MonitorOptions) -> Self {
        Self { rpc, options }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(
            RpcClient::new(config)?,
            MonitorOptions::from_config(config),
        ))
    }

    pub fn options(&self) -> &MonitorOptions {
        &self.options
    }

    /// Polls `getTransaction` until the transaction lands or the timeout
    /// elapses. Lookup errors other than "not found" are logged and polling
    /// continues.
    pub async fn monitor(&self, tx_hash: &str) -> Result<MonitorResult> {
        info!(
            "Monitoring transaction: {} (timeout: {}s)",
            tx_hash, self.options.timeout_secs
        );

        let start = Instant::now();
        let timeout = Duration::from_secs(self.options.timeout_secs);
        let poll_interval = Duration::from_millis(self.options.poll_interval_ms);

        loop {
            if start.elapsed() >= timeout {
                warn!("Transaction monitoring timed out: {}", tx_hash);
                return Ok(MonitorResult::Timeout);
            }

            match self.rpc.get_transaction(tx_hash).await {
                Ok(info) => match info.status {
                    TransactionStatus::Success => {
                        info!("Transaction succeeded: {} (ledger {:?})", tx_hash, info.ledger);
                        return Ok(MonitorResult::Success(info));
                    }
                    TransactionStatus::Failed => {
                        warn!("Transaction failed: {}", tx_hash);
                        return Ok(MonitorResult::Failed(info));
                    }
                    TransactionStatus::NotFound => {
                        debug!("Transaction not yet in ledger: {}", tx_hash);
                    }
                },
                Err(ClientError::TransactionNotFound(_)) => {
                    debug!("Transaction not yet in ledger: {}", tx_hash);
                }
                Err(e) => {
                    debug!("Error fetching transaction: {:?}", e);
                }
            }

            sleep(poll_interval).await;
        }
    }

    /// Like [`monitor`](Self::monitor) but turns failure and timeout into
    /// errors.
    pub async fn wait_for_confirmation(&self, tx_hash: &str) -> Result<TransactionInfo> {
        match self.monitor(tx_hash).await? {
            MonitorResult::Success(info) => Ok(info),
            MonitorResult::Failed(info) => Err(ClientError::TransactionFailed {
                hash: info.hash,
                message: info
                    .result_xdr
                    .unwrap_or_else(|| "transaction failed".to_string()),
            }),
            MonitorResult::Timeout => {
                Err(ClientError::TransactionTimeout(self.options.timeout_secs))
            }
        }
    }

    /// Single status check, no polling
    pub async fn get_status(&self, tx_hash: &str) -> Result<TransactionStatus> {
        match self.rpc.get_transaction(tx_hash).await {
            Ok(info) => Ok(info.status),
            Err(ClientError::TransactionNotFound(_)) => Ok(TransactionStatus::NotFound),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_options_from_config() {
        let config = ClientConfig::testnet();
        let options = MonitorOptions::from_config(&config);
        assert_eq!(options.poll_interval_ms, config.tx_poll_interval_ms);
        assert_eq!(options.timeout_secs, config.tx_timeout_secs);
    }

    #[test]
    fn test_monitor_options_builder() {
        let options = MonitorOptions::from_config(&ClientConfig::testnet())
            .with_poll_interval(500)
            .with_timeout(120);

        assert_eq!(options.poll_interval_ms, 500);
        assert_eq!(options.timeout_secs, 120);
    }

    #[test]
    fn test_monitor_creation() {
        let monitor = TransactionMonitor::from_config(&ClientConfig::testnet()).unwrap();
        assert_eq!(monitor.options().timeout_secs, 60);
    }
}
