//! # Resource controller
//!
//! The only code path that writes a [`Door`] or flips
//! [`ActionRequest::executed`]. Each function loads what it needs, asks the
//! quorum engine for a verdict, computes the new state, and writes it back
//! only when every check has passed. A failed call leaves storage as it was.
//!
//! Door transitions can be reached two ways:
//! - directly: `lock`/`unlock` need `threshold` co-signing owners in one
//!   call, `open`/`close` only need the lock state to allow them;
//! - through an [`ActionRequest`] that collected `threshold` approvals.

use soroban_sdk::{log, Address, Env, Vec};

use crate::errors::DoorError;
use crate::events::{
    DoorInitializedEvent, DoorTransitionEvent, RequestApprovedEvent, RequestCreatedEvent,
    RequestExecutedEvent,
};
use crate::quorum;
use crate::storage;
use crate::types::{ActionRequest, Door, DoorAction, Slot};

fn commit(env: &Env, slot: &Slot, door: &Door, action: DoorAction) {
    storage::save_door(env, slot, door);
    DoorTransitionEvent {
        door: slot.clone(),
        action,
        lock: door.lock,
        position: door.position,
    }
    .publish(env);
    log!(env, "door transition {} -> {}/{}", action, door.lock, door.position);
}

/// Binds a new door in `slot` to an existing authority.
///
/// # Errors
/// - [`DoorError::AlreadyInitialized`] if the slot already holds a record.
/// - [`DoorError::StorageNotFound`] if either slot was never allocated.
/// - [`DoorError::NotAuthorized`] if `caller` did not allocate the door slot.
pub fn initialize_door(
    env: &Env,
    caller: &Address,
    slot: &Slot,
    authority: &Slot,
) -> Result<Door, DoorError> {
    caller.require_auth();
    storage::claim_slot(env, slot, caller, DoorError::AlreadyInitialized)?;
    storage::load_authority(env, authority)?;

    let door = Door::new(authority.clone());
    storage::save_door(env, slot, &door);

    DoorInitializedEvent {
        door: slot.clone(),
        authority: authority.clone(),
    }
    .publish(env);
    log!(env, "door initialized: closed, locked");
    Ok(door)
}

fn cosigned_transition(
    env: &Env,
    slot: &Slot,
    signers: &Vec<Address>,
    action: DoorAction,
) -> Result<Door, DoorError> {
    let mut door = storage::load_door(env, slot)?;
    let config = storage::load_authority(env, &door.authority)?;
    let signed = quorum::cosigning_owners(&config, signers)?;
    for (index, owner) in config.owners.iter().enumerate() {
        if signed & (1u32 << index) != 0 {
            owner.require_auth();
        }
    }

    door.apply(action)?;
    commit(env, slot, &door, action);
    Ok(door)
}

/// `Unlocked -> Locked`, co-signed by at least `threshold` owners.
///
/// # Errors
/// - [`DoorError::NotAuthorized`] if a signer is not an owner or fewer than
///   `threshold` distinct owners signed.
/// - [`DoorError::InvalidTransition`] if the door is already locked.
pub fn lock(env: &Env, slot: &Slot, signers: &Vec<Address>) -> Result<Door, DoorError> {
    cosigned_transition(env, slot, signers, DoorAction::Lock)
}

/// `Locked -> Unlocked`, under the same signing rule as [`lock`].
pub fn unlock(env: &Env, slot: &Slot, signers: &Vec<Address>) -> Result<Door, DoorError> {
    cosigned_transition(env, slot, signers, DoorAction::Unlock)
}

/// `Closed -> Open`; fails with [`DoorError::Locked`] while locked.
pub fn open(env: &Env, slot: &Slot) -> Result<Door, DoorError> {
    let mut door = storage::load_door(env, slot)?;
    door.apply(DoorAction::Open)?;
    commit(env, slot, &door, DoorAction::Open);
    Ok(door)
}

/// `Open -> Closed`.
pub fn close(env: &Env, slot: &Slot) -> Result<Door, DoorError> {
    let mut door = storage::load_door(env, slot)?;
    door.apply(DoorAction::Close)?;
    commit(env, slot, &door, DoorAction::Close);
    Ok(door)
}

/// Creates a pending request for `action` on `door`, with no approvals.
///
/// # Errors
/// - [`DoorError::AlreadyCreated`] if the request slot is occupied.
/// - [`DoorError::NotAnOwner`] if the proposer is not registered.
/// - [`DoorError::NotAuthorized`] if the door is governed by another
///   authority, or the proposer did not allocate the request slot.
pub fn create_request(
    env: &Env,
    proposer: &Address,
    slot: &Slot,
    authority: &Slot,
    door: &Slot,
    action: DoorAction,
) -> Result<ActionRequest, DoorError> {
    proposer.require_auth();
    storage::claim_slot(env, slot, proposer, DoorError::AlreadyCreated)?;

    let config = storage::load_authority(env, authority)?;
    if !quorum::is_owner(&config, proposer) {
        return Err(DoorError::NotAnOwner);
    }
    let target = storage::load_door(env, door)?;
    if target.authority != *authority {
        return Err(DoorError::NotAuthorized);
    }

    let request = ActionRequest {
        authority: authority.clone(),
        door: door.clone(),
        action,
        proposer: proposer.clone(),
        approvals: 0,
        executed: false,
    };
    storage::save_request(env, slot, &request);

    RequestCreatedEvent {
        request: slot.clone(),
        door: door.clone(),
        action,
        proposer: proposer.clone(),
    }
    .publish(env);
    log!(env, "request created for {}", action);
    Ok(request)
}

/// Records `signer`'s approval on a pending request.
pub fn approve(env: &Env, slot: &Slot, signer: &Address) -> Result<ActionRequest, DoorError> {
    signer.require_auth();
    let mut request = storage::load_request(env, slot)?;
    let config = storage::load_authority(env, &request.authority)?;

    let index = quorum::validate_approval(&config, &request, signer)?;
    quorum::record_approval(&mut request, index);
    storage::save_request(env, slot, &request);

    let approvals = quorum::approval_count(&request);
    RequestApprovedEvent {
        request: slot.clone(),
        signer: signer.clone(),
        approvals,
        threshold: config.threshold,
    }
    .publish(env);
    log!(env, "approval {} of {}", approvals, config.threshold);
    Ok(request)
}

pub fn can_execute(env: &Env, slot: &Slot) -> Result<bool, DoorError> {
    let request = storage::load_request(env, slot)?;
    let config = storage::load_authority(env, &request.authority)?;
    Ok(quorum::can_execute(&config, &request))
}

/// Applies a quorate request to its door and consumes it.
///
/// The door transition follows the same rules as the direct calls, so a
/// request to open a locked door fails with [`DoorError::Locked`] and stays
/// pending.
///
/// # Errors
/// - [`DoorError::AlreadyExecuted`] if the request was consumed.
/// - [`DoorError::QuorumNotMet`] if approvals are below the threshold.
/// - [`DoorError::NotAuthorized`] if the door is no longer bound to the
///   request's authority.
pub fn execute(env: &Env, slot: &Slot) -> Result<Door, DoorError> {
    let mut request = storage::load_request(env, slot)?;
    let config = storage::load_authority(env, &request.authority)?;
    quorum::require_executable(&config, &request)?;

    let mut door = storage::load_door(env, &request.door)?;
    if door.authority != request.authority {
        return Err(DoorError::NotAuthorized);
    }
    door.apply(request.action)?;

    request.executed = true;
    storage::save_request(env, slot, &request);
    commit(env, &request.door, &door, request.action);

    RequestExecutedEvent {
        request: slot.clone(),
        door: request.door.clone(),
        action: request.action,
    }
    .publish(env);
    Ok(door)
}
