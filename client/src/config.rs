//! Client configuration.
//!
//! A [`ClientConfig`] names the network the driver talks to, the Soroban RPC
//! endpoint and contract id for live networks, and the retry and
//! confirmation-polling knobs. It can be built in code, read from a TOML
//! file, and patched from `DOOR_*` environment variables.

use crate::error::{ClientError, Result};
use gated_door::MAX_OWNERS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Environment variable selecting the network preset.
pub const ENV_NETWORK: &str = "DOOR_NETWORK";
/// Environment variable overriding the RPC endpoint.
pub const ENV_RPC_URL: &str = "DOOR_RPC_URL";
/// Environment variable carrying the deployed contract id.
pub const ENV_CONTRACT_ID: &str = "DOOR_CONTRACT_ID";

/// Network type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// In-process Soroban host, no endpoint required
    Sandbox,
    /// Stellar testnet
    Testnet,
    /// Stellar futurenet
    Futurenet,
    /// Stellar mainnet (public network)
    Mainnet,
    /// Custom network with user-defined endpoint
    Custom,
}

impl Network {
    /// Get the network passphrase
    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Sandbox => "Standalone Network ; February 2017",
            Network::Testnet => "Test SDF Network ; September 2015",
            Network::Futurenet => "Test SDF Future Network ; October 2022",
            Network::Mainnet => "Public Global Stellar Network ; September 2015",
            Network::Custom => "Custom Network",
        }
    }

    /// Get the default Soroban RPC URL for this network
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://soroban-testnet.stellar.org",
            Network::Futurenet => "https://rpc-futurenet.stellar.org",
            Network::Mainnet => "https://soroban-mainnet.stellar.org",
            Network::Sandbox | Network::Custom => "",
        }
    }

    /// Whether calls go to a remote endpoint
    pub fn is_remote(&self) -> bool {
        !matches!(self, Network::Sandbox)
    }
}

impl FromStr for Network {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" | "local" => Ok(Network::Sandbox),
            "testnet" => Ok(Network::Testnet),
            "futurenet" => Ok(Network::Futurenet),
            "mainnet" | "public" => Ok(Network::Mainnet),
            "custom" => Ok(Network::Custom),
            other => Err(ClientError::Config(format!("unknown network: {}", other))),
        }
    }
}

/// Configuration for the gated door client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Network to connect to
    pub network: Network,

    /// Soroban RPC endpoint URL (unused by the sandbox)
    pub rpc_url: String,

    /// Network passphrase
    pub network_passphrase: String,

    /// Deployed gated door contract id (`C...`), live networks only
    pub contract_id: Option<String>,

    /// HTTP request timeout (in seconds)
    pub request_timeout_secs: u64,

    /// Maximum number of retries for transient RPC failures
    pub max_retries: usize,

    /// Initial retry delay (in milliseconds)
    pub retry_initial_delay_ms: u64,

    /// Maximum retry delay (in milliseconds)
    pub retry_max_delay_ms: u64,

    /// Retry backoff multiplier
    pub retry_multiplier: f64,

    /// Transaction polling interval (in milliseconds)
    pub tx_poll_interval_ms: u64,

    /// Transaction confirmation timeout (in seconds)
    pub tx_timeout_secs: u64,

    /// Approval threshold used by the multisig scenarios
    pub default_threshold: u32,
}

impl ClientConfig {
    /// Create a new configuration for the specified network
    pub fn new(network: Network) -> Self {
        Self {
            network,
            rpc_url: network.default_rpc_url().to_string(),
            network_passphrase: network.passphrase().to_string(),
            contract_id: None,
            request_timeout_secs: 30,
            max_retries: 3,
            retry_initial_delay_ms: 100,
            retry_max_delay_ms: 5000,
            retry_multiplier: 2.0,
            tx_poll_interval_ms: 1000,
            tx_timeout_secs: 60,
            default_threshold: 2,
        }
    }

    pub fn sandbox() -> Self {
        Self::new(Network::Sandbox)
    }

    pub fn testnet() -> Self {
        Self::new(Network::Testnet)
    }

    pub fn futurenet() -> Self {
        Self::new(Network::Futurenet)
    }

    pub fn mainnet() -> Self {
        Self::new(Network::Mainnet)
    }

    /// Create a custom configuration
    pub fn custom(rpc_url: String, network_passphrase: String) -> Result<Self> {
        if rpc_url.is_empty() {
            return Err(ClientError::Config("RPC URL cannot be empty".to_string()));
        }
        if network_passphrase.is_empty() {
            return Err(ClientError::Config(
                "Network passphrase cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            rpc_url,
            network_passphrase,
            ..Self::new(Network::Custom)
        })
    }

    /// Load configuration from a TOML file. Missing keys take the sandbox
    /// defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses TOML. A file that names a network but omits its endpoint or
    /// passphrase gets that network's presets.
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: ClientConfig = toml::from_str(content)?;
        let sandbox = Network::Sandbox;
        if config.rpc_url.is_empty() {
            config.rpc_url = config.network.default_rpc_url().to_string();
        }
        if config.network != sandbox && config.network_passphrase == sandbox.passphrase() {
            config.network_passphrase = config.network.passphrase().to_string();
        }
        Ok(config)
    }

    /// Applies `DOOR_NETWORK`, `DOOR_RPC_URL` and `DOOR_CONTRACT_ID` from
    /// the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`. Switching network resets the URL and
    /// passphrase to that network's defaults before an explicit URL is
    /// applied.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(network) = lookup(ENV_NETWORK) {
            let network: Network = network.parse()?;
            if network != self.network {
                self.network = network;
                self.rpc_url = network.default_rpc_url().to_string();
                self.network_passphrase = network.passphrase().to_string();
            }
        }
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.rpc_url = url;
        }
        if let Some(id) = lookup(ENV_CONTRACT_ID) {
            self.contract_id = Some(id);
        }
        Ok(self)
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    /// Set maximum retries
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set retry delays
    pub fn with_retry_config(
        mut self,
        initial_delay_ms: u64,
        max_delay_ms: u64,
        multiplier: f64,
    ) -> Self {
        self.retry_initial_delay_ms = initial_delay_ms;
        self.retry_max_delay_ms = max_delay_ms;
        self.retry_multiplier = multiplier;
        self
    }

    /// Set transaction polling configuration
    pub fn with_tx_config(mut self, poll_interval_ms: u64, timeout_secs: u64) -> Self {
        self.tx_poll_interval_ms = poll_interval_ms;
        self.tx_timeout_secs = timeout_secs;
        self
    }

    pub fn with_contract_id(mut self, contract_id: impl Into<String>) -> Self {
        self.contract_id = Some(contract_id.into());
        self
    }

    pub fn with_default_threshold(mut self, threshold: u32) -> Self {
        self.default_threshold = threshold;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.network.is_remote() {
            if self.rpc_url.is_empty() {
                return Err(ClientError::Config("RPC URL cannot be empty".to_string()));
            }
            Url::parse(&self.rpc_url)?;
        }
        if self.network_passphrase.is_empty() {
            return Err(ClientError::Config(
                "Network passphrase cannot be empty".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ClientError::Config(
                "Request timeout must be greater than 0".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(ClientError::Config(
                "Max retries must be greater than 0".to_string(),
            ));
        }
        if self.retry_initial_delay_ms == 0 {
            return Err(ClientError::Config(
                "Retry initial delay must be greater than 0".to_string(),
            ));
        }
        if self.retry_multiplier <= 1.0 {
            return Err(ClientError::Config(
                "Retry multiplier must be greater than 1.0".to_string(),
            ));
        }
        if self.tx_poll_interval_ms == 0 {
            return Err(ClientError::Config(
                "Transaction poll interval must be greater than 0".to_string(),
            ));
        }
        if self.tx_timeout_secs == 0 {
            return Err(ClientError::Config(
                "Transaction timeout must be greater than 0".to_string(),
            ));
        }
        // one owner is left over to approve after execution
        if self.default_threshold == 0 || self.default_threshold >= MAX_OWNERS {
            return Err(ClientError::Config(format!(
                "Default threshold must be between 1 and {}",
                MAX_OWNERS - 1
            )));
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::sandbox()
    }
}
