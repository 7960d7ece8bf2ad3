//! # Instruction encoding
//!
//! Every operation has a fixed-layout record: one opcode byte followed by
//! the fields listed for that opcode in [`SCHEMA`]. The table is the only
//! description of the layout; [`Instruction::pack`] and
//! [`Instruction::unpack`] both walk it, so the two directions cannot drift
//! apart.
//!
//! Owner lists are not part of the payload. Like signer accounts, they
//! travel next to the data (see `GatedDoorContract::process`).

use soroban_sdk::{Bytes, BytesN, Env};

use crate::errors::DoorError;
use crate::types::{DoorAction, Slot};

pub const OP_INITIALIZE_DOOR: u8 = 0;
pub const OP_CONFIGURE_AUTHORITY: u8 = 1;
pub const OP_LOCK: u8 = 2;
pub const OP_UNLOCK: u8 = 3;
pub const OP_OPEN: u8 = 4;
pub const OP_CLOSE: u8 = 5;
pub const OP_CREATE_REQUEST: u8 = 6;
pub const OP_APPROVE: u8 = 7;
pub const OP_EXECUTE: u8 = 8;

const SLOT_LEN: u32 = 32;
const MAX_FIELDS: usize = 4;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    /// 32-byte slot id
    Slot,
    /// Single byte: threshold or action code
    Byte,
}

impl FieldKind {
    pub const fn width(self) -> u32 {
        match self {
            FieldKind::Slot => SLOT_LEN,
            FieldKind::Byte => 1,
        }
    }
}

/// Layout of one instruction record.
#[derive(Debug)]
pub struct OpcodeSpec {
    pub opcode: u8,
    pub name: &'static str,
    pub fields: &'static [FieldKind],
}

impl OpcodeSpec {
    /// Encoded length, opcode byte included.
    pub fn encoded_len(&self) -> u32 {
        self.fields.iter().fold(1, |len, field| len + field.width())
    }
}

use self::FieldKind::{Byte, Slot as SlotField};

pub const SCHEMA: &[OpcodeSpec] = &[
    OpcodeSpec {
        opcode: OP_INITIALIZE_DOOR,
        name: "initialize_door",
        fields: &[SlotField, SlotField],
    },
    OpcodeSpec {
        opcode: OP_CONFIGURE_AUTHORITY,
        name: "configure_authority",
        fields: &[SlotField, Byte],
    },
    OpcodeSpec {
        opcode: OP_LOCK,
        name: "lock",
        fields: &[SlotField],
    },
    OpcodeSpec {
        opcode: OP_UNLOCK,
        name: "unlock",
        fields: &[SlotField],
    },
    OpcodeSpec {
        opcode: OP_OPEN,
        name: "open",
        fields: &[SlotField],
    },
    OpcodeSpec {
        opcode: OP_CLOSE,
        name: "close",
        fields: &[SlotField],
    },
    OpcodeSpec {
        opcode: OP_CREATE_REQUEST,
        name: "create_request",
        fields: &[SlotField, SlotField, SlotField, Byte],
    },
    OpcodeSpec {
        opcode: OP_APPROVE,
        name: "approve",
        fields: &[SlotField],
    },
    OpcodeSpec {
        opcode: OP_EXECUTE,
        name: "execute",
        fields: &[SlotField],
    },
];

pub fn lookup(opcode: u8) -> Result<&'static OpcodeSpec, DoorError> {
    SCHEMA
        .iter()
        .find(|spec| spec.opcode == opcode)
        .ok_or(DoorError::UnknownInstruction)
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldValue {
    Slot(Slot),
    Byte(u8),
}

impl FieldValue {
    fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Slot(_) => FieldKind::Slot,
            FieldValue::Byte(_) => FieldKind::Byte,
        }
    }
}

/// Decoded field values of one record, consumed in schema order.
struct Fields {
    values: [Option<FieldValue>; MAX_FIELDS],
    next: usize,
}

impl Fields {
    fn read(env: &Env, spec: &OpcodeSpec, payload: &Bytes) -> Result<Self, DoorError> {
        if payload.len() + 1 != spec.encoded_len() {
            return Err(DoorError::MalformedInstruction);
        }

        let mut values = [None, None, None, None];
        let mut offset = 0u32;
        for (i, field) in spec.fields.iter().enumerate() {
            let end = offset + field.width();
            let value = match field {
                FieldKind::Slot => {
                    let mut raw = [0u8; SLOT_LEN as usize];
                    payload.slice(offset..end).copy_into_slice(&mut raw);
                    FieldValue::Slot(BytesN::from_array(env, &raw))
                }
                FieldKind::Byte => {
                    FieldValue::Byte(payload.get(offset).ok_or(DoorError::MalformedInstruction)?)
                }
            };
            values[i] = Some(value);
            offset = end;
        }
        Ok(Fields { values, next: 0 })
    }

    fn take(&mut self) -> Result<FieldValue, DoorError> {
        let value = self
            .values
            .get_mut(self.next)
            .and_then(Option::take)
            .ok_or(DoorError::MalformedInstruction)?;
        self.next += 1;
        Ok(value)
    }

    fn slot(&mut self) -> Result<Slot, DoorError> {
        match self.take()? {
            FieldValue::Slot(slot) => Ok(slot),
            FieldValue::Byte(_) => Err(DoorError::MalformedInstruction),
        }
    }

    fn byte(&mut self) -> Result<u8, DoorError> {
        match self.take()? {
            FieldValue::Byte(byte) => Ok(byte),
            FieldValue::Slot(_) => Err(DoorError::MalformedInstruction),
        }
    }
}

/// Decoded operation intent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Instruction {
    InitializeDoor { door: Slot, authority: Slot },
    /// Owners are supplied alongside the payload.
    ConfigureAuthority { authority: Slot, threshold: u8 },
    Lock { door: Slot },
    Unlock { door: Slot },
    Open { door: Slot },
    Close { door: Slot },
    CreateRequest {
        request: Slot,
        authority: Slot,
        door: Slot,
        action: DoorAction,
    },
    Approve { request: Slot },
    Execute { request: Slot },
}

impl Instruction {
    pub fn opcode(&self) -> u8 {
        match self {
            Instruction::InitializeDoor { .. } => OP_INITIALIZE_DOOR,
            Instruction::ConfigureAuthority { .. } => OP_CONFIGURE_AUTHORITY,
            Instruction::Lock { .. } => OP_LOCK,
            Instruction::Unlock { .. } => OP_UNLOCK,
            Instruction::Open { .. } => OP_OPEN,
            Instruction::Close { .. } => OP_CLOSE,
            Instruction::CreateRequest { .. } => OP_CREATE_REQUEST,
            Instruction::Approve { .. } => OP_APPROVE,
            Instruction::Execute { .. } => OP_EXECUTE,
        }
    }

    fn field_values(&self) -> [Option<FieldValue>; MAX_FIELDS] {
        let slot = |s: &Slot| Some(FieldValue::Slot(s.clone()));
        match self {
            Instruction::InitializeDoor { door, authority } => {
                [slot(door), slot(authority), None, None]
            }
            Instruction::ConfigureAuthority {
                authority,
                threshold,
            } => [slot(authority), Some(FieldValue::Byte(*threshold)), None, None],
            Instruction::Lock { door }
            | Instruction::Unlock { door }
            | Instruction::Open { door }
            | Instruction::Close { door } => [slot(door), None, None, None],
            Instruction::CreateRequest {
                request,
                authority,
                door,
                action,
            } => [
                slot(request),
                slot(authority),
                slot(door),
                Some(FieldValue::Byte(action.code())),
            ],
            Instruction::Approve { request } | Instruction::Execute { request } => {
                [slot(request), None, None, None]
            }
        }
    }

    /// Encodes the record following the opcode's schema entry.
    pub fn pack(&self, env: &Env) -> Result<Bytes, DoorError> {
        let spec = lookup(self.opcode())?;
        let values = self.field_values();

        let mut out = Bytes::new(env);
        out.push_back(spec.opcode);
        for (i, kind) in spec.fields.iter().enumerate() {
            let value = values[i].as_ref().ok_or(DoorError::MalformedInstruction)?;
            if value.kind() != *kind {
                return Err(DoorError::MalformedInstruction);
            }
            match value {
                FieldValue::Slot(slot) => out.extend_from_array(&slot.to_array()),
                FieldValue::Byte(byte) => out.push_back(*byte),
            }
        }
        Ok(out)
    }

    /// Decodes one record.
    ///
    /// # Errors
    /// - [`DoorError::UnknownInstruction`] for an opcode missing from
    ///   [`SCHEMA`].
    /// - [`DoorError::MalformedInstruction`] for an empty, truncated or
    ///   oversized record, or an action byte outside [`DoorAction`].
    pub fn unpack(env: &Env, input: &Bytes) -> Result<Self, DoorError> {
        let opcode = input.first().ok_or(DoorError::MalformedInstruction)?;
        let spec = lookup(opcode)?;
        let mut fields = Fields::read(env, spec, &input.slice(1..))?;

        Ok(match spec.opcode {
            OP_INITIALIZE_DOOR => Instruction::InitializeDoor {
                door: fields.slot()?,
                authority: fields.slot()?,
            },
            OP_CONFIGURE_AUTHORITY => Instruction::ConfigureAuthority {
                authority: fields.slot()?,
                threshold: fields.byte()?,
            },
            OP_LOCK => Instruction::Lock {
                door: fields.slot()?,
            },
            OP_UNLOCK => Instruction::Unlock {
                door: fields.slot()?,
            },
            OP_OPEN => Instruction::Open {
                door: fields.slot()?,
            },
            OP_CLOSE => Instruction::Close {
                door: fields.slot()?,
            },
            OP_CREATE_REQUEST => Instruction::CreateRequest {
                request: fields.slot()?,
                authority: fields.slot()?,
                door: fields.slot()?,
                action: DoorAction::from_code(fields.byte()?)?,
            },
            OP_APPROVE => Instruction::Approve {
                request: fields.slot()?,
            },
            OP_EXECUTE => Instruction::Execute {
                request: fields.slot()?,
            },
            _ => return Err(DoorError::UnknownInstruction),
        })
    }
}
