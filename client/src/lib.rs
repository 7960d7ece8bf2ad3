//! Gated door client
//!
//! Drives the `gated-door` contract: provisions slots, encodes instructions
//! from the contract's own schema, submits them on behalf of named signers
//! and reports what happened. Two ledgers sit behind the [`Ledger`] trait
//! boundary: [`SandboxLedger`], an in-process Soroban host, and a Soroban
//! RPC endpoint reached through [`GatedDoorClient`] for node health and
//! transaction submission/confirmation.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gated_door_client::{ClientConfig, Driver, SandboxLedger, Scenario, Session};
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     gated_door_client::init_tracing("gated_door_client=info");
//!
//!     let config = Arc::new(ClientConfig::sandbox().with_default_threshold(2));
//!     let session = Session::open(config, SandboxLedger::new(), "payer").await?;
//!
//!     let report = Driver::new(&session).run(Scenario::GeneralMultisig).await?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```
//!
//! # Submitting to a live network
//!
//! ```rust,no_run
//! use gated_door_client::{ClientConfig, GatedDoorClient};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GatedDoorClient::new(Arc::new(ClientConfig::testnet()))?;
//!
//! let envelope = "..."; // signed transaction envelope, base64 XDR
//! let info = client.submit_and_wait(envelope).await?;
//! println!("Included in ledger {:?}", info.ledger);
//! # Ok(())
//! # }
//! ```

#![warn(rustdoc::broken_intra_doc_links)]

pub mod call;
pub mod config;
pub mod driver;
pub mod error;
pub mod ledger;
pub mod monitor;
pub mod retry;
pub mod rpc;
pub mod sandbox;
pub mod session;

pub use call::{Call, Op, SlotId};
pub use config::{ClientConfig, Network};
pub use driver::{Driver, Outcome, Report, Scenario, Step};
pub use error::{ClientError, Result};
pub use ledger::{AuthorityView, DoorView, Ledger, RequestView, SlotAllocation};
pub use monitor::{MonitorOptions, MonitorResult, TransactionMonitor};
pub use retry::RetryStrategy;
pub use rpc::{
    HealthStatus, LatestLedger, RpcClient, SendResult, SendStatus, TransactionInfo,
    TransactionStatus,
};
pub use sandbox::SandboxLedger;
pub use session::{Session, RECORD_SIZE};

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a formatting subscriber. `RUST_LOG` wins over
/// `default_directive`. Calling it twice is harmless.
pub fn init_tracing(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}

/// Soroban RPC access plus confirmation polling for one network.
#[derive(Clone)]
pub struct GatedDoorClient {
    rpc: RpcClient,
    monitor: TransactionMonitor,
    config: Arc<ClientConfig>,
}

impl GatedDoorClient {
    /// Validates `config` and builds the RPC client and monitor.
    pub fn new(config: Arc<ClientConfig>) -> Result<Self> {
        config.validate()?;
        if !config.network.is_remote() {
            return Err(ClientError::Config(
                "the sandbox has no RPC endpoint".to_string(),
            ));
        }

        info!(
            "Initializing gated door client for network: {:?} ({})",
            config.network, config.rpc_url
        );

        let rpc = RpcClient::new(&config)?;
        let monitor = TransactionMonitor::new(rpc.clone(), MonitorOptions::from_config(&config));

        Ok(Self {
            rpc,
            monitor,
            config,
        })
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn monitor(&self) -> &TransactionMonitor {
        &self.monitor
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn health_check(&self) -> Result<bool> {
        self.rpc.health_check().await
    }

    pub async fn latest_ledger(&self) -> Result<LatestLedger> {
        self.rpc.get_latest_ledger().await
    }

    /// Submits a signed envelope without waiting for inclusion.
    pub async fn submit(&self, envelope_xdr: &str) -> Result<SendResult> {
        self.rpc.send_transaction(envelope_xdr).await
    }

    /// Submits a signed envelope and polls until it succeeds, fails or the
    /// confirmation timeout passes.
    pub async fn submit_and_wait(&self, envelope_xdr: &str) -> Result<TransactionInfo> {
        let sent = self.submit(envelope_xdr).await?;
        self.monitor.wait_for_confirmation(&sent.hash).await
    }

    pub async fn status(&self, tx_hash: &str) -> Result<TransactionStatus> {
        self.monitor.get_status(tx_hash).await
    }
}
