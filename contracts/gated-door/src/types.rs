use soroban_sdk::{contracttype, Address, BytesN, Vec};

use crate::errors::DoorError;

/// Maximum number of owners an authority can register.
pub const MAX_OWNERS: u32 = 11;

/// Storage slot identifier, derived from an owner identity and a purpose.
pub type Slot = BytesN<32>;

/// Who provisioned a slot and how many bytes were reserved for it.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Allocation {
    pub owner: Address,
    pub size: u32,
}

/// Owner set and quorum threshold. Never rewritten once stored.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuthorityConfig {
    /// Registered owners; position `i` maps to bit `i` of a request bitmap.
    pub owners: Vec<Address>,
    /// Distinct owner approvals required to execute a request.
    pub threshold: u32,
}

/// A privileged door transition awaiting owner approvals.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActionRequest {
    /// Authority whose owners approve this request
    pub authority: Slot,
    /// Door the action is applied to
    pub door: Slot,
    pub action: DoorAction,
    pub proposer: Address,
    /// Bit `i` set iff `owners[i]` approved
    pub approvals: u32,
    /// Flips to `true` exactly once, on successful execution
    pub executed: bool,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LockState {
    Locked,
    Unlocked,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DoorPosition {
    Closed,
    Open,
}

/// The gated resource: a door whose position can only change while unlocked.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Door {
    /// Authority that governs lock and unlock
    pub authority: Slot,
    pub lock: LockState,
    pub position: DoorPosition,
}

/// Target of an [`ActionRequest`], also the wire code used by the
/// instruction encoding.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum DoorAction {
    Lock = 0,
    Unlock = 1,
    Open = 2,
    Close = 3,
}

impl DoorAction {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Result<Self, DoorError> {
        match code {
            0 => Ok(DoorAction::Lock),
            1 => Ok(DoorAction::Unlock),
            2 => Ok(DoorAction::Open),
            3 => Ok(DoorAction::Close),
            _ => Err(DoorError::MalformedInstruction),
        }
    }
}

impl Door {
    /// A new door starts closed and locked.
    pub fn new(authority: Slot) -> Self {
        Door {
            authority,
            lock: LockState::Locked,
            position: DoorPosition::Closed,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lock == LockState::Locked
    }

    pub fn is_open(&self) -> bool {
        self.position == DoorPosition::Open
    }

    /// Applies one transition in place.
    ///
    /// Authorization is the caller's concern; this only enforces the state
    /// machine. Re-applying the current state is rejected rather than
    /// treated as a no-op.
    pub fn apply(&mut self, action: DoorAction) -> Result<(), DoorError> {
        match action {
            DoorAction::Lock => {
                if self.is_locked() {
                    return Err(DoorError::InvalidTransition);
                }
                self.lock = LockState::Locked;
            }
            DoorAction::Unlock => {
                if !self.is_locked() {
                    return Err(DoorError::InvalidTransition);
                }
                self.lock = LockState::Unlocked;
            }
            DoorAction::Open => {
                if self.is_locked() {
                    return Err(DoorError::Locked);
                }
                if self.is_open() {
                    return Err(DoorError::InvalidTransition);
                }
                self.position = DoorPosition::Open;
            }
            DoorAction::Close => {
                if !self.is_open() {
                    return Err(DoorError::InvalidTransition);
                }
                self.position = DoorPosition::Closed;
            }
        }
        Ok(())
    }
}

/// Storage keys. A slot holds at most one of the record kinds.
#[contracttype]
#[derive(Clone)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub enum DataKey {
    Allocation(Slot),
    Authority(Slot),
    Door(Slot),
    Request(Slot),
}
