//! # Quorum engine
//!
//! Pure decision logic over an [`AuthorityConfig`] and an [`ActionRequest`].
//! Nothing here touches storage: callers load the records, ask for a
//! verdict, and write back only on success.
//!
//! Approvals are kept as a bitmap indexed by owner position. The owner list
//! is immutable, so a set bit always names a registered owner and the
//! approval set can never contain an outsider.

use soroban_sdk::{Address, Env, Vec};

use crate::errors::DoorError;
use crate::types::{ActionRequest, AuthorityConfig};

/// Position of `signer` in the owner list, if registered.
pub fn owner_index(config: &AuthorityConfig, signer: &Address) -> Option<u32> {
    config
        .owners
        .iter()
        .position(|owner| owner == *signer)
        .map(|index| index as u32)
}

pub fn is_owner(config: &AuthorityConfig, signer: &Address) -> bool {
    owner_index(config, signer).is_some()
}

/// Authorization for a direct lock or unlock.
///
/// Every signer must be a registered owner and at least `threshold`
/// distinct owners must be present; repeats count once. Returns the signing
/// owners as a bitmap over owner positions.
///
/// # Errors
/// - [`DoorError::NotAuthorized`] for an outsider among the signers or too
///   few distinct owners.
pub fn cosigning_owners(
    config: &AuthorityConfig,
    signers: &Vec<Address>,
) -> Result<u32, DoorError> {
    let mut signed = 0u32;
    for signer in signers.iter() {
        let index = owner_index(config, &signer).ok_or(DoorError::NotAuthorized)?;
        signed |= 1u32 << index;
    }
    if signed.count_ones() < config.threshold {
        return Err(DoorError::NotAuthorized);
    }
    Ok(signed)
}

pub fn has_approved(request: &ActionRequest, index: u32) -> bool {
    request.approvals & (1u32 << index) != 0
}

pub fn approval_count(request: &ActionRequest) -> u32 {
    request.approvals.count_ones()
}

/// Decides whether `signer` may add an approval to `request`.
///
/// Returns the signer's owner index; the caller records it with
/// [`record_approval`].
///
/// # Errors
/// - [`DoorError::NotAnOwner`] if the signer is not registered.
/// - [`DoorError::AlreadyApproved`] if the signer's bit is already set.
/// - [`DoorError::AlreadyExecuted`] if the request was consumed.
pub fn validate_approval(
    config: &AuthorityConfig,
    request: &ActionRequest,
    signer: &Address,
) -> Result<u32, DoorError> {
    let index = owner_index(config, signer).ok_or(DoorError::NotAnOwner)?;
    if has_approved(request, index) {
        return Err(DoorError::AlreadyApproved);
    }
    if request.executed {
        return Err(DoorError::AlreadyExecuted);
    }
    Ok(index)
}

pub fn record_approval(request: &mut ActionRequest, index: u32) {
    request.approvals |= 1u32 << index;
}

/// True iff enough distinct owners approved and the request is unconsumed.
pub fn can_execute(config: &AuthorityConfig, request: &ActionRequest) -> bool {
    !request.executed && approval_count(request) >= config.threshold
}

/// Checked form of [`can_execute`] used by the controller.
pub fn require_executable(
    config: &AuthorityConfig,
    request: &ActionRequest,
) -> Result<(), DoorError> {
    if request.executed {
        return Err(DoorError::AlreadyExecuted);
    }
    if approval_count(request) < config.threshold {
        return Err(DoorError::QuorumNotMet);
    }
    Ok(())
}

/// Owners whose approval is recorded on `request`, in owner order.
pub fn approvers(env: &Env, config: &AuthorityConfig, request: &ActionRequest) -> Vec<Address> {
    let mut out = Vec::new(env);
    for (index, owner) in config.owners.iter().enumerate() {
        if has_approved(request, index as u32) {
            out.push_back(owner);
        }
    }
    out
}
