use soroban_sdk::{log, Address, Env, Vec};

use crate::errors::DoorError;
use crate::events::AuthorityCreatedEvent;
use crate::storage;
use crate::types::{AuthorityConfig, Slot, MAX_OWNERS};

/// Checks an owner list and threshold before anything is stored.
///
/// # Errors
/// - [`DoorError::InvalidThreshold`] if `threshold` is zero or exceeds the
///   number of owners (an empty owner list always lands here).
/// - [`DoorError::TooManyOwners`] if more than [`MAX_OWNERS`] are given.
/// - [`DoorError::DuplicateOwner`] if an identity appears twice.
pub fn validate_config(owners: &Vec<Address>, threshold: u32) -> Result<(), DoorError> {
    if threshold == 0 || threshold > owners.len() {
        return Err(DoorError::InvalidThreshold);
    }
    if owners.len() > MAX_OWNERS {
        return Err(DoorError::TooManyOwners);
    }

    for i in 0..owners.len() {
        for j in (i + 1)..owners.len() {
            if owners.get_unchecked(i) == owners.get_unchecked(j) {
                return Err(DoorError::DuplicateOwner);
            }
        }
    }
    Ok(())
}

/// Writes a new authority into `slot`.
///
/// The slot must be allocated to `caller` and empty; an occupied slot
/// reports [`DoorError::AlreadyCreated`].
pub fn create_config(
    env: &Env,
    caller: &Address,
    slot: &Slot,
    owners: Vec<Address>,
    threshold: u32,
) -> Result<AuthorityConfig, DoorError> {
    validate_config(&owners, threshold)?;
    storage::claim_slot(env, slot, caller, DoorError::AlreadyCreated)?;

    let config = AuthorityConfig { owners, threshold };
    storage::save_authority(env, slot, &config);

    AuthorityCreatedEvent {
        authority: slot.clone(),
        owner_count: config.owners.len(),
        threshold,
    }
    .publish(env);
    log!(
        env,
        "authority created: {} owners, threshold {}",
        config.owners.len(),
        threshold
    );
    Ok(config)
}
