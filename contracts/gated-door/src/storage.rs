//! Slot derivation, allocation and typed record access.
//!
//! Every record lives in persistent storage under a [`DataKey`] built from
//! its slot. A slot must be allocated before a record can be written to it,
//! and only the identity the slot was derived for may write the first
//! record.

use soroban_sdk::{xdr::ToXdr, Address, Bytes, Env, Symbol};

use crate::errors::DoorError;
use crate::types::{ActionRequest, Allocation, AuthorityConfig, DataKey, Door, Slot};

const DAY_IN_LEDGERS: u32 = 17_280;
const TTL_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;
const TTL_EXTEND_TO: u32 = 30 * DAY_IN_LEDGERS;

/// Per-entry overhead charged on top of the requested size.
const ENTRY_OVERHEAD_BYTES: i128 = 128;
const RENT_PER_BYTE_YEAR: i128 = 3_480;
const RENT_EXEMPT_YEARS: i128 = 2;

/// Derives the slot for `(owner, purpose)`.
///
/// The same pair always yields the same slot and different purposes yield
/// different slots for the same owner.
pub fn derive_slot(env: &Env, owner: &Address, purpose: &Symbol) -> Slot {
    let mut preimage = Bytes::new(env);
    preimage.append(&owner.clone().to_xdr(env));
    preimage.append(&purpose.clone().to_xdr(env));
    env.crypto().sha256(&preimage).into()
}

/// Balance a slot of `size` bytes must hold to stay alive.
pub fn minimum_balance(size: u32) -> i128 {
    (ENTRY_OVERHEAD_BYTES + size as i128) * RENT_PER_BYTE_YEAR * RENT_EXEMPT_YEARS
}

fn persist<V>(env: &Env, key: &DataKey, value: &V)
where
    V: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    let storage = env.storage().persistent();
    storage.set(key, value);
    storage.extend_ttl(key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub fn is_allocated(env: &Env, slot: &Slot) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::Allocation(slot.clone()))
}

/// Reserves the slot derived from `(owner, purpose)`.
pub fn allocate(env: &Env, owner: &Address, purpose: &Symbol, size: u32) -> Result<Slot, DoorError> {
    let slot = derive_slot(env, owner, purpose);
    if is_allocated(env, &slot) {
        return Err(DoorError::AlreadyCreated);
    }
    let allocation = Allocation {
        owner: owner.clone(),
        size,
    };
    persist(env, &DataKey::Allocation(slot.clone()), &allocation);
    Ok(slot)
}

pub fn load_allocation(env: &Env, slot: &Slot) -> Result<Allocation, DoorError> {
    env.storage()
        .persistent()
        .get(&DataKey::Allocation(slot.clone()))
        .ok_or(DoorError::StorageNotFound)
}

/// True if any record kind already occupies the slot.
pub fn is_occupied(env: &Env, slot: &Slot) -> bool {
    let storage = env.storage().persistent();
    storage.has(&DataKey::Authority(slot.clone()))
        || storage.has(&DataKey::Door(slot.clone()))
        || storage.has(&DataKey::Request(slot.clone()))
}

/// Checks that `initializer` may write the first record into `slot`.
///
/// `occupied` is the error reported when a record is already present, so
/// each record kind keeps its own "already there" code.
pub fn claim_slot(
    env: &Env,
    slot: &Slot,
    initializer: &Address,
    occupied: DoorError,
) -> Result<(), DoorError> {
    let allocation = load_allocation(env, slot)?;
    if allocation.owner != *initializer {
        return Err(DoorError::NotAuthorized);
    }
    if is_occupied(env, slot) {
        return Err(occupied);
    }
    Ok(())
}

/// Missing record: `NotInitialized` if the slot exists, else `StorageNotFound`.
fn missing(env: &Env, slot: &Slot) -> DoorError {
    if is_allocated(env, slot) {
        DoorError::NotInitialized
    } else {
        DoorError::StorageNotFound
    }
}

pub fn load_authority(env: &Env, slot: &Slot) -> Result<AuthorityConfig, DoorError> {
    env.storage()
        .persistent()
        .get(&DataKey::Authority(slot.clone()))
        .ok_or_else(|| missing(env, slot))
}

pub fn save_authority(env: &Env, slot: &Slot, config: &AuthorityConfig) {
    persist(env, &DataKey::Authority(slot.clone()), config);
}

pub fn load_door(env: &Env, slot: &Slot) -> Result<Door, DoorError> {
    env.storage()
        .persistent()
        .get(&DataKey::Door(slot.clone()))
        .ok_or_else(|| missing(env, slot))
}

pub fn save_door(env: &Env, slot: &Slot, door: &Door) {
    persist(env, &DataKey::Door(slot.clone()), door);
}

pub fn load_request(env: &Env, slot: &Slot) -> Result<ActionRequest, DoorError> {
    env.storage()
        .persistent()
        .get(&DataKey::Request(slot.clone()))
        .ok_or_else(|| missing(env, slot))
}

pub fn save_request(env: &Env, slot: &Slot, request: &ActionRequest) {
    persist(env, &DataKey::Request(slot.clone()), request);
}
