//! Events published on every successful state change.
//!
//! Each struct is a `#[contractevent]`: the snake_case struct name becomes
//! the leading topic and the fields form the data map.

use soroban_sdk::{contractevent, Address, BytesN};

use crate::types::{DoorAction, DoorPosition, LockState};

#[contractevent]
#[derive(Clone, Debug)]
pub struct SlotAllocatedEvent {
    pub slot: BytesN<32>,
    pub owner: Address,
    pub size: u32,
    pub minimum_balance: i128,
}

#[contractevent]
#[derive(Clone, Debug)]
pub struct AuthorityCreatedEvent {
    pub authority: BytesN<32>,
    pub owner_count: u32,
    pub threshold: u32,
}

#[contractevent]
#[derive(Clone, Debug)]
pub struct DoorInitializedEvent {
    pub door: BytesN<32>,
    pub authority: BytesN<32>,
}

/// Emitted for every door transition, direct or through a request.
#[contractevent]
#[derive(Clone, Debug)]
pub struct DoorTransitionEvent {
    pub door: BytesN<32>,
    pub action: DoorAction,
    pub lock: LockState,
    pub position: DoorPosition,
}

#[contractevent]
#[derive(Clone, Debug)]
pub struct RequestCreatedEvent {
    pub request: BytesN<32>,
    pub door: BytesN<32>,
    pub action: DoorAction,
    pub proposer: Address,
}

#[contractevent]
#[derive(Clone, Debug)]
pub struct RequestApprovedEvent {
    pub request: BytesN<32>,
    pub signer: Address,
    pub approvals: u32,
    pub threshold: u32,
}

#[contractevent]
#[derive(Clone, Debug)]
pub struct RequestExecutedEvent {
    pub request: BytesN<32>,
    pub door: BytesN<32>,
    pub action: DoorAction,
}
