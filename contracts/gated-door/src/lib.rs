//! # Gated Door Contract
//!
//! A door whose lock can only be turned by the owners registered in an
//! authority record, either directly by a quorum of co-signers or through a request that
//! collected a quorum of owner approvals.
//!
//! Records live in slots. A client first derives and allocates a slot per
//! record, then initializes it:
//!
//! 1. [`GatedDoorContract::create_authority`] stores the owner set and
//!    threshold.
//! 2. [`GatedDoorContract::initialize_door`] binds a door (closed, locked)
//!    to that authority.
//! 3. [`GatedDoorContract::lock`]/[`GatedDoorContract::unlock`] co-signed
//!    by `threshold` owners, [`GatedDoorContract::open`]/
//!    [`GatedDoorContract::close`] while unlocked.
//! 4. [`GatedDoorContract::create_request`],
//!    [`GatedDoorContract::approve`] and [`GatedDoorContract::execute`] for
//!    transitions that need `threshold` owners.
//!
//! [`GatedDoorContract::process`] accepts the same operations as encoded
//! instruction records (see [`instruction`]).

#![no_std]

use soroban_sdk::{contract, contractimpl, log, Address, Bytes, Env, Symbol, Vec};

mod authority;
mod controller;
mod errors;
mod events;
pub mod instruction;
pub mod quorum;
mod storage;
mod types;

pub use errors::DoorError;
pub use instruction::{lookup, FieldKind, Instruction, OpcodeSpec, SCHEMA};
pub use storage::minimum_balance;
pub use types::{
    ActionRequest, Allocation, AuthorityConfig, DataKey, Door, DoorAction, DoorPosition,
    LockState, Slot, MAX_OWNERS,
};

use events::SlotAllocatedEvent;

#[cfg(test)]
mod tests;

#[contract]
pub struct GatedDoorContract;

/// `caller` followed by the accounts passed next to the payload.
fn cosigners(caller: Address, accounts: Vec<Address>) -> Vec<Address> {
    let mut signers = Vec::from_array(accounts.env(), [caller]);
    signers.append(&accounts);
    signers
}

#[contractimpl]
impl GatedDoorContract {
    // ── Slots ────────────────────────────────────────────────────────────────

    /// Slot id for `(owner, purpose)`. Pure; nothing is stored.
    pub fn derive_slot(env: Env, owner: Address, purpose: Symbol) -> Slot {
        storage::derive_slot(&env, &owner, &purpose)
    }

    /// Balance required to keep a slot of `size` bytes alive.
    pub fn minimum_balance(_env: Env, size: u32) -> i128 {
        storage::minimum_balance(size)
    }

    /// Reserves the slot for `(owner, purpose)`, paid for by `payer`.
    ///
    /// Only `owner` may later write the first record into it.
    pub fn allocate(
        env: Env,
        payer: Address,
        owner: Address,
        purpose: Symbol,
        size: u32,
    ) -> Result<Slot, DoorError> {
        payer.require_auth();
        let slot = storage::allocate(&env, &owner, &purpose, size)?;

        SlotAllocatedEvent {
            slot: slot.clone(),
            owner,
            size,
            minimum_balance: storage::minimum_balance(size),
        }
        .publish(&env);
        log!(&env, "allocated {} bytes for {}", size, purpose);
        Ok(slot)
    }

    // ── Authority ────────────────────────────────────────────────────────────

    pub fn create_authority(
        env: Env,
        caller: Address,
        authority: Slot,
        owners: Vec<Address>,
        threshold: u32,
    ) -> Result<(), DoorError> {
        caller.require_auth();
        authority::create_config(&env, &caller, &authority, owners, threshold)?;
        Ok(())
    }

    // ── Door ─────────────────────────────────────────────────────────────────

    pub fn initialize_door(
        env: Env,
        caller: Address,
        door: Slot,
        authority: Slot,
    ) -> Result<(), DoorError> {
        controller::initialize_door(&env, &caller, &door, &authority)?;
        Ok(())
    }

    /// Locks `door`. `signers` must hold at least `threshold` distinct
    /// owners of the door's authority, each of whom authorizes the call.
    pub fn lock(env: Env, door: Slot, signers: Vec<Address>) -> Result<(), DoorError> {
        controller::lock(&env, &door, &signers)?;
        Ok(())
    }

    pub fn unlock(env: Env, door: Slot, signers: Vec<Address>) -> Result<(), DoorError> {
        controller::unlock(&env, &door, &signers)?;
        Ok(())
    }

    pub fn open(env: Env, door: Slot) -> Result<(), DoorError> {
        controller::open(&env, &door)?;
        Ok(())
    }

    pub fn close(env: Env, door: Slot) -> Result<(), DoorError> {
        controller::close(&env, &door)?;
        Ok(())
    }

    // ── Requests ─────────────────────────────────────────────────────────────

    pub fn create_request(
        env: Env,
        proposer: Address,
        request: Slot,
        authority: Slot,
        door: Slot,
        action: DoorAction,
    ) -> Result<(), DoorError> {
        controller::create_request(&env, &proposer, &request, &authority, &door, action)?;
        Ok(())
    }

    pub fn approve(env: Env, request: Slot, signer: Address) -> Result<(), DoorError> {
        controller::approve(&env, &request, &signer)?;
        Ok(())
    }

    pub fn execute(env: Env, request: Slot) -> Result<(), DoorError> {
        controller::execute(&env, &request)?;
        Ok(())
    }

    pub fn can_execute(env: Env, request: Slot) -> Result<bool, DoorError> {
        controller::can_execute(&env, &request)
    }

    // ── Encoded instructions ─────────────────────────────────────────────────

    /// Decodes one instruction record and runs it with `caller` as the
    /// signer, proposer or initializer.
    ///
    /// `accounts` carries the owner list for `ConfigureAuthority` and the
    /// co-signers next to `caller` for `Lock` and `Unlock`. Other opcodes
    /// ignore it.
    pub fn process(
        env: Env,
        caller: Address,
        accounts: Vec<Address>,
        data: Bytes,
    ) -> Result<(), DoorError> {
        let instruction = Instruction::unpack(&env, &data)?;
        log!(&env, "instruction {}", instruction.opcode() as u32);

        match instruction {
            Instruction::InitializeDoor { door, authority } => {
                controller::initialize_door(&env, &caller, &door, &authority)?;
            }
            Instruction::ConfigureAuthority {
                authority,
                threshold,
            } => {
                caller.require_auth();
                authority::create_config(&env, &caller, &authority, accounts, threshold as u32)?;
            }
            Instruction::Lock { door } => {
                controller::lock(&env, &door, &cosigners(caller, accounts))?;
            }
            Instruction::Unlock { door } => {
                controller::unlock(&env, &door, &cosigners(caller, accounts))?;
            }
            Instruction::Open { door } => {
                controller::open(&env, &door)?;
            }
            Instruction::Close { door } => {
                controller::close(&env, &door)?;
            }
            Instruction::CreateRequest {
                request,
                authority,
                door,
                action,
            } => {
                controller::create_request(&env, &caller, &request, &authority, &door, action)?;
            }
            Instruction::Approve { request } => {
                controller::approve(&env, &request, &caller)?;
            }
            Instruction::Execute { request } => {
                controller::execute(&env, &request)?;
            }
        }
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn get_allocation(env: Env, slot: Slot) -> Result<Allocation, DoorError> {
        storage::load_allocation(&env, &slot)
    }

    pub fn get_authority(env: Env, authority: Slot) -> Result<AuthorityConfig, DoorError> {
        storage::load_authority(&env, &authority)
    }

    pub fn get_door(env: Env, door: Slot) -> Result<Door, DoorError> {
        storage::load_door(&env, &door)
    }

    pub fn get_request(env: Env, request: Slot) -> Result<ActionRequest, DoorError> {
        storage::load_request(&env, &request)
    }

    /// Owners whose approval is recorded on `request`.
    pub fn get_approvers(env: Env, request: Slot) -> Result<Vec<Address>, DoorError> {
        let request = storage::load_request(&env, &request)?;
        let config = storage::load_authority(&env, &request.authority)?;
        Ok(quorum::approvers(&env, &config, &request))
    }
}
