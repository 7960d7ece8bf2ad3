//! Explicit context threaded through every driver step: the validated
//! configuration, the ledger, and the identity that pays for storage.

use crate::call::{Call, SlotId};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::ledger::Ledger;
use std::sync::Arc;
use tracing::{debug, info};

/// Bytes reserved for every record slot; covers the largest record (an
/// authority with the maximum owner count).
pub const RECORD_SIZE: u32 = 1024;

pub struct Session<L> {
    config: Arc<ClientConfig>,
    ledger: L,
    payer: String,
}

impl<L: Ledger> Session<L> {
    /// Validates `config`, registers `payer` on the ledger and returns the
    /// session.
    pub async fn open(config: Arc<ClientConfig>, ledger: L, payer: &str) -> Result<Self> {
        config.validate()?;
        ledger.create_identity(payer).await?;
        info!(
            "Session opened on {} ({:?}), payer {}",
            ledger.label(),
            config.network,
            payer
        );

        Ok(Self {
            config,
            ledger,
            payer: payer.to_string(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn payer(&self) -> &str {
        &self.payer
    }

    /// Registers a signer.
    pub async fn identity(&self, name: &str) -> Result<()> {
        self.ledger.create_identity(name).await
    }

    /// Allocates the `(owner, purpose)` slot at the payer's expense.
    pub async fn provision(&self, owner: &str, purpose: &str) -> Result<SlotId> {
        let allocation = self
            .ledger
            .allocate(&self.payer, owner, purpose, RECORD_SIZE)
            .await?;
        info!(
            "Provisioned {} for {} ({} bytes, minimum balance {})",
            purpose, owner, allocation.size, allocation.minimum_balance
        );
        Ok(allocation.slot)
    }

    /// Submits `call` as `signer`.
    pub async fn send(&self, signer: &str, call: &Call) -> Result<()> {
        debug!("{} -> {}", signer, call.name());
        self.ledger.submit(signer, call).await
    }
}
