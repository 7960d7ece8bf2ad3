use soroban_sdk::contracterror;

/// Errors returned by every gated door operation.
///
/// Codes are stable: clients match on them after a failed invocation
/// (`Error(Contract, #n)`).
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum DoorError {
    /// Signer is not registered in the authority's owner set
    NotAnOwner = 1,
    /// Signer already approved this request
    AlreadyApproved = 2,
    /// Request was already executed
    AlreadyExecuted = 3,
    /// Not enough distinct owner approvals yet
    QuorumNotMet = 4,
    /// Caller may not perform this operation on this record
    NotAuthorized = 5,
    /// Door is already in the requested state
    InvalidTransition = 6,
    /// Threshold is zero or larger than the owner set
    InvalidThreshold = 7,
    /// Owner list contains the same identity twice
    DuplicateOwner = 8,
    /// Door slot already holds an initialized door
    AlreadyInitialized = 9,
    /// Slot is already allocated or already holds a record
    AlreadyCreated = 10,
    /// Opcode not present in the instruction schema
    UnknownInstruction = 11,
    /// Slot was never allocated
    StorageNotFound = 12,
    /// Door cannot be opened while locked
    Locked = 13,
    /// Slot is allocated but holds no record yet
    NotInitialized = 14,
    /// Instruction payload is truncated, oversized or carries a bad field
    MalformedInstruction = 15,
    /// Owner list exceeds `MAX_OWNERS`
    TooManyOwners = 16,
}
