//! Client-side instruction records.
//!
//! A [`Call`] is one [`Op`] plus the named accounts that travel next to the
//! payload. Encoding converts the op into the contract's own
//! [`gated_door::Instruction`] and packs it with the contract's encoder, so
//! the byte layout is defined in exactly one place.

use crate::error::{ClientError, Result};
use gated_door::instruction::{
    OP_APPROVE, OP_CLOSE, OP_CONFIGURE_AUTHORITY, OP_CREATE_REQUEST, OP_EXECUTE,
    OP_INITIALIZE_DOOR, OP_LOCK, OP_OPEN, OP_UNLOCK,
};
use gated_door::{lookup, DoorAction, Instruction};
use soroban_sdk::{Bytes, BytesN, Env};

/// Raw 32-byte slot id.
pub type SlotId = [u8; 32];

/// One instruction with host-independent slot ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    InitializeDoor { door: SlotId, authority: SlotId },
    ConfigureAuthority { authority: SlotId, threshold: u8 },
    Lock { door: SlotId },
    Unlock { door: SlotId },
    Open { door: SlotId },
    Close { door: SlotId },
    CreateRequest {
        request: SlotId,
        authority: SlotId,
        door: SlotId,
        action: DoorAction,
    },
    Approve { request: SlotId },
    Execute { request: SlotId },
}

impl Op {
    pub fn opcode(&self) -> u8 {
        match self {
            Op::InitializeDoor { .. } => OP_INITIALIZE_DOOR,
            Op::ConfigureAuthority { .. } => OP_CONFIGURE_AUTHORITY,
            Op::Lock { .. } => OP_LOCK,
            Op::Unlock { .. } => OP_UNLOCK,
            Op::Open { .. } => OP_OPEN,
            Op::Close { .. } => OP_CLOSE,
            Op::CreateRequest { .. } => OP_CREATE_REQUEST,
            Op::Approve { .. } => OP_APPROVE,
            Op::Execute { .. } => OP_EXECUTE,
        }
    }

    /// The contract-side instruction, with slots materialized in `env`.
    pub fn instruction(&self, env: &Env) -> Instruction {
        let slot = |id: &SlotId| BytesN::from_array(env, id);
        match self {
            Op::InitializeDoor { door, authority } => Instruction::InitializeDoor {
                door: slot(door),
                authority: slot(authority),
            },
            Op::ConfigureAuthority {
                authority,
                threshold,
            } => Instruction::ConfigureAuthority {
                authority: slot(authority),
                threshold: *threshold,
            },
            Op::Lock { door } => Instruction::Lock { door: slot(door) },
            Op::Unlock { door } => Instruction::Unlock { door: slot(door) },
            Op::Open { door } => Instruction::Open { door: slot(door) },
            Op::Close { door } => Instruction::Close { door: slot(door) },
            Op::CreateRequest {
                request,
                authority,
                door,
                action,
            } => Instruction::CreateRequest {
                request: slot(request),
                authority: slot(authority),
                door: slot(door),
                action: *action,
            },
            Op::Approve { request } => Instruction::Approve {
                request: slot(request),
            },
            Op::Execute { request } => Instruction::Execute {
                request: slot(request),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: Op,
    /// Identity names passed as accounts: the owner list for
    /// `configure_authority`, the co-signers for `lock` and `unlock`.
    pub accounts: Vec<String>,
}

impl Call {
    fn new(op: Op) -> Self {
        Self {
            op,
            accounts: Vec::new(),
        }
    }

    pub fn initialize_door(door: SlotId, authority: SlotId) -> Self {
        Self::new(Op::InitializeDoor { door, authority })
    }

    pub fn configure_authority<S: AsRef<str>>(
        authority: SlotId,
        owners: &[S],
        threshold: u8,
    ) -> Self {
        Self::new(Op::ConfigureAuthority {
            authority,
            threshold,
        })
        .with_accounts(owners)
    }

    pub fn lock(door: SlotId) -> Self {
        Self::new(Op::Lock { door })
    }

    pub fn unlock(door: SlotId) -> Self {
        Self::new(Op::Unlock { door })
    }

    pub fn open(door: SlotId) -> Self {
        Self::new(Op::Open { door })
    }

    pub fn close(door: SlotId) -> Self {
        Self::new(Op::Close { door })
    }

    /// The direct transition for `action` on `door`.
    pub fn transition(action: DoorAction, door: SlotId) -> Self {
        match action {
            DoorAction::Lock => Self::lock(door),
            DoorAction::Unlock => Self::unlock(door),
            DoorAction::Open => Self::open(door),
            DoorAction::Close => Self::close(door),
        }
    }

    pub fn create_request(
        request: SlotId,
        authority: SlotId,
        door: SlotId,
        action: DoorAction,
    ) -> Self {
        Self::new(Op::CreateRequest {
            request,
            authority,
            door,
            action,
        })
    }

    pub fn approve(request: SlotId) -> Self {
        Self::new(Op::Approve { request })
    }

    pub fn execute(request: SlotId) -> Self {
        Self::new(Op::Execute { request })
    }

    /// Owners signing a `lock` or `unlock` next to the submitting signer.
    pub fn cosigned<S: AsRef<str>>(self, cosigners: &[S]) -> Self {
        self.with_accounts(cosigners)
    }

    fn with_accounts<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.accounts = names.iter().map(|n| n.as_ref().to_string()).collect();
        self
    }

    /// Schema name of the opcode.
    pub fn name(&self) -> &'static str {
        lookup(self.op.opcode())
            .map(|spec| spec.name)
            .unwrap_or("unknown")
    }

    /// Packs the instruction record in `env`.
    ///
    /// A failure here is a local layout error and is reported as
    /// [`ClientError::Encoding`], never as a contract rejection.
    pub fn encode(&self, env: &Env) -> Result<Bytes> {
        self.op
            .instruction(env)
            .pack(env)
            .map_err(ClientError::Encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_matches_contract_decoder() {
        let env = Env::default();
        let (request, authority, door) = ([1u8; 32], [2u8; 32], [3u8; 32]);

        let call = Call::create_request(request, authority, door, DoorAction::Open);
        let decoded = Instruction::unpack(&env, &call.encode(&env).unwrap()).unwrap();

        assert_eq!(
            decoded,
            Instruction::CreateRequest {
                request: BytesN::from_array(&env, &request),
                authority: BytesN::from_array(&env, &authority),
                door: BytesN::from_array(&env, &door),
                action: DoorAction::Open,
            }
        );
        assert_eq!(decoded.opcode(), call.op.opcode());
    }

    #[test]
    fn test_owner_list_travels_as_accounts() {
        let env = Env::default();
        let call = Call::configure_authority([9u8; 32], &["alice", "bob"], 2);
        let encoded = call.encode(&env).unwrap();

        assert_eq!(call.accounts, vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(encoded.len(), 34);
        assert_eq!(encoded.get(33), Some(2));
        assert_eq!(call.name(), "configure_authority");
    }

    #[test]
    fn test_cosigners_travel_as_accounts() {
        let door = [4u8; 32];
        let call = Call::unlock(door).cosigned(&["bob", "carol"]);

        assert_eq!(call.op, Op::Unlock { door });
        assert_eq!(call.accounts, vec!["bob".to_string(), "carol".to_string()]);
        assert!(Call::unlock(door).accounts.is_empty());
    }

    #[test]
    fn test_every_op_has_a_schema_name() {
        let slot = [0u8; 32];
        let calls = [
            Call::initialize_door(slot, slot),
            Call::configure_authority::<&str>(slot, &[], 1),
            Call::lock(slot),
            Call::unlock(slot),
            Call::open(slot),
            Call::close(slot),
            Call::create_request(slot, slot, slot, DoorAction::Lock),
            Call::approve(slot),
            Call::execute(slot),
        ];
        for call in calls {
            assert_ne!(call.name(), "unknown");
            assert_eq!(lookup(call.op.opcode()).unwrap().opcode, call.op.opcode());
        }
    }

    #[test]
    fn test_encoding_error_is_not_a_rejection() {
        let err = ClientError::Encoding(gated_door::DoorError::MalformedInstruction);
        assert_eq!(err.rejection(), None);
        assert!(err.to_string().starts_with("Instruction encoding failed"));
    }

    #[test]
    fn test_transition_helper() {
        let env = Env::default();
        let door = [5u8; 32];
        assert_eq!(Call::transition(DoorAction::Close, door), Call::close(door));
        let encoded = Call::transition(DoorAction::Unlock, door).encode(&env).unwrap();
        assert_eq!(encoded.get(0), Some(OP_UNLOCK));
    }
}
