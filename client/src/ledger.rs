//! The collaborator boundary the driver runs against.
//!
//! A [`Ledger`] resolves named signing identities, derives and provisions
//! slots, submits encoded [`Call`]s on behalf of a signer and reads records
//! back. Identities are referred to by name so the driver never handles key
//! material.

use crate::call::{Call, SlotId};
use crate::error::Result;
use async_trait::async_trait;
use gated_door::{DoorAction, DoorPosition, LockState};

/// A provisioned slot and the balance it must hold to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAllocation {
    pub slot: SlotId,
    pub owner: String,
    pub size: u32,
    pub minimum_balance: i128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityView {
    pub owners: Vec<String>,
    pub threshold: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorView {
    pub authority: SlotId,
    pub lock: LockState,
    pub position: DoorPosition,
}

impl DoorView {
    pub fn is_locked(&self) -> bool {
        self.lock == LockState::Locked
    }

    pub fn is_open(&self) -> bool {
        self.position == DoorPosition::Open
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestView {
    pub authority: SlotId,
    pub door: SlotId,
    pub action: DoorAction,
    pub proposer: String,
    /// Approving owners, in owner order
    pub approvers: Vec<String>,
    pub executed: bool,
    pub can_execute: bool,
}

#[async_trait(?Send)]
pub trait Ledger {
    /// Short label for logs.
    fn label(&self) -> &str;

    /// Registers a signing identity under `name`. Registering an existing
    /// name is a no-op.
    async fn create_identity(&self, name: &str) -> Result<()>;

    async fn derive_slot(&self, owner: &str, purpose: &str) -> Result<SlotId>;

    /// Provisions the `(owner, purpose)` slot, paid for by `payer`.
    async fn allocate(
        &self,
        payer: &str,
        owner: &str,
        purpose: &str,
        size: u32,
    ) -> Result<SlotAllocation>;

    /// Submits `call` signed by `signer` and waits for its outcome.
    async fn submit(&self, signer: &str, call: &Call) -> Result<()>;

    async fn authority(&self, slot: &SlotId) -> Result<AuthorityView>;

    async fn door(&self, slot: &SlotId) -> Result<DoorView>;

    async fn request(&self, slot: &SlotId) -> Result<RequestView>;
}
