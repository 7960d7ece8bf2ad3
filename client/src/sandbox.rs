//! In-process [`Ledger`] backed by the Soroban host.
//!
//! The contract is registered in a fresh `Env` with every authorization
//! mocked, so a named identity signs simply by being passed as the caller.
//! Failed invocations are rolled back by the host exactly as on chain.

use crate::call::{Call, SlotId};
use crate::error::{ClientError, Result};
use crate::ledger::{AuthorityView, DoorView, Ledger, RequestView, SlotAllocation};
use async_trait::async_trait;
use gated_door::{DoorError, GatedDoorContract, GatedDoorContractClient};
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{Address, BytesN, Env, Symbol, Vec as SorobanVec};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::debug;

const MAX_PURPOSE_LEN: usize = 32;

pub struct SandboxLedger {
    env: Env,
    contract_id: Address,
    identities: RefCell<BTreeMap<String, Address>>,
}

/// Shape of every generated `try_*` client method.
type TryOutcome<T, C, H> =
    std::result::Result<std::result::Result<T, C>, std::result::Result<DoorError, H>>;

/// Flattens a `try_*` result: contract errors become
/// [`ClientError::Rejected`], anything else the host reports becomes
/// [`ClientError::Host`].
fn settle<T, C, H>(outcome: TryOutcome<T, C, H>) -> Result<T>
where
    C: Debug,
    H: Debug,
{
    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(conversion)) => Err(ClientError::Host(format!("{:?}", conversion))),
        Err(Ok(code)) => Err(ClientError::Rejected(code)),
        Err(Err(invoke)) => Err(ClientError::Host(format!("{:?}", invoke))),
    }
}

impl SandboxLedger {
    pub fn new() -> Self {
        let env = Env::default();
        env.mock_all_auths();
        let contract_id = env.register(GatedDoorContract, ());
        debug!("sandbox contract registered");

        Self {
            env,
            contract_id,
            identities: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn contract_id(&self) -> &Address {
        &self.contract_id
    }

    fn client(&self) -> GatedDoorContractClient<'_> {
        GatedDoorContractClient::new(&self.env, &self.contract_id)
    }

    fn address(&self, name: &str) -> Result<Address> {
        self.identities
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::UnknownIdentity(name.to_string()))
    }

    fn name_of(&self, address: &Address) -> String {
        self.identities
            .borrow()
            .iter()
            .find(|(_, known)| *known == address)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| format!("{:?}", address))
    }

    fn purpose(&self, purpose: &str) -> Result<Symbol> {
        let valid = !purpose.is_empty()
            && purpose.len() <= MAX_PURPOSE_LEN
            && purpose
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(ClientError::InvalidPurpose(purpose.to_string()));
        }
        Ok(Symbol::new(&self.env, purpose))
    }

    fn slot(&self, id: &SlotId) -> BytesN<32> {
        BytesN::from_array(&self.env, id)
    }
}

impl Default for SandboxLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Ledger for SandboxLedger {
    fn label(&self) -> &str {
        "sandbox"
    }

    async fn create_identity(&self, name: &str) -> Result<()> {
        let mut identities = self.identities.borrow_mut();
        if !identities.contains_key(name) {
            identities.insert(name.to_string(), Address::generate(&self.env));
            debug!("identity {} created", name);
        }
        Ok(())
    }

    async fn derive_slot(&self, owner: &str, purpose: &str) -> Result<SlotId> {
        let owner = self.address(owner)?;
        let purpose = self.purpose(purpose)?;
        Ok(self.client().derive_slot(&owner, &purpose).to_array())
    }

    async fn allocate(
        &self,
        payer: &str,
        owner: &str,
        purpose: &str,
        size: u32,
    ) -> Result<SlotAllocation> {
        let payer = self.address(payer)?;
        let owner_address = self.address(owner)?;
        let symbol = self.purpose(purpose)?;
        let client = self.client();

        let slot = settle(client.try_allocate(&payer, &owner_address, &symbol, &size))?;
        Ok(SlotAllocation {
            slot: slot.to_array(),
            owner: owner.to_string(),
            size,
            minimum_balance: client.minimum_balance(&size),
        })
    }

    async fn submit(&self, signer: &str, call: &Call) -> Result<()> {
        let caller = self.address(signer)?;
        let data = call.encode(&self.env)?;
        let mut accounts = SorobanVec::new(&self.env);
        for name in &call.accounts {
            accounts.push_back(self.address(name)?);
        }
        settle(self.client().try_process(&caller, &accounts, &data))
    }

    async fn authority(&self, slot: &SlotId) -> Result<AuthorityView> {
        let config = settle(self.client().try_get_authority(&self.slot(slot)))?;
        Ok(AuthorityView {
            owners: config.owners.iter().map(|o| self.name_of(&o)).collect(),
            threshold: config.threshold,
        })
    }

    async fn door(&self, slot: &SlotId) -> Result<DoorView> {
        let door = settle(self.client().try_get_door(&self.slot(slot)))?;
        Ok(DoorView {
            authority: door.authority.to_array(),
            lock: door.lock,
            position: door.position,
        })
    }

    async fn request(&self, slot: &SlotId) -> Result<RequestView> {
        let client = self.client();
        let id = self.slot(slot);
        let request = settle(client.try_get_request(&id))?;
        let approvers = settle(client.try_get_approvers(&id))?;
        let can_execute = settle(client.try_can_execute(&id))?;

        Ok(RequestView {
            authority: request.authority.to_array(),
            door: request.door.to_array(),
            action: request.action,
            proposer: self.name_of(&request.proposer),
            approvers: approvers.iter().map(|a| self.name_of(&a)).collect(),
            executed: request.executed,
            can_execute,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use gated_door::{DoorPosition, LockState};

    async fn ledger_with(names: &[&str]) -> SandboxLedger {
        let ledger = SandboxLedger::new();
        for name in names {
            ledger.create_identity(name).await.unwrap();
        }
        ledger
    }

    #[tokio::test]
    async fn test_identities_are_stable() {
        let ledger = ledger_with(&["alice"]).await;
        let first = ledger.address("alice").unwrap();
        ledger.create_identity("alice").await.unwrap();
        assert_eq!(ledger.address("alice").unwrap(), first);
        assert_eq!(ledger.name_of(&first), "alice");
        assert_matches!(ledger.address("bob"), Err(ClientError::UnknownIdentity(_)));
    }

    #[tokio::test]
    async fn test_allocate_matches_derivation() {
        let ledger = ledger_with(&["payer", "alice"]).await;
        let derived = ledger.derive_slot("alice", "door").await.unwrap();
        let allocation = ledger.allocate("payer", "alice", "door", 128).await.unwrap();

        assert_eq!(allocation.slot, derived);
        assert_eq!(allocation.minimum_balance, gated_door::minimum_balance(128));

        let again = ledger.allocate("payer", "alice", "door", 128).await;
        assert_eq!(again.unwrap_err().rejection(), Some(DoorError::AlreadyCreated));
    }

    #[tokio::test]
    async fn test_bad_purpose_is_refused() {
        let ledger = ledger_with(&["alice"]).await;
        assert_matches!(
            ledger.derive_slot("alice", "has space").await,
            Err(ClientError::InvalidPurpose(_))
        );
        assert_matches!(
            ledger.derive_slot("alice", "").await,
            Err(ClientError::InvalidPurpose(_))
        );
    }

    #[tokio::test]
    async fn test_submit_and_read_back() {
        let ledger = ledger_with(&["payer", "alice", "bob"]).await;
        let authority = ledger.allocate("payer", "alice", "authority", 256).await.unwrap().slot;
        let door = ledger.allocate("payer", "alice", "door", 256).await.unwrap().slot;

        ledger
            .submit("alice", &Call::configure_authority(authority, &["alice", "bob"], 1))
            .await
            .unwrap();
        ledger
            .submit("alice", &Call::initialize_door(door, authority))
            .await
            .unwrap();
        ledger.submit("bob", &Call::unlock(door)).await.unwrap();

        let view = ledger.authority(&authority).await.unwrap();
        assert_eq!(view.owners, vec!["alice".to_string(), "bob".to_string()]);
        let state = ledger.door(&door).await.unwrap();
        assert_eq!(state.lock, LockState::Unlocked);
        assert_eq!(state.position, DoorPosition::Closed);
        assert_eq!(state.authority, authority);
    }

    #[tokio::test]
    async fn test_rejection_keeps_contract_code() {
        let ledger = ledger_with(&["payer", "alice"]).await;
        let authority = ledger.allocate("payer", "alice", "authority", 256).await.unwrap().slot;
        let door = ledger.allocate("payer", "alice", "door", 256).await.unwrap().slot;
        ledger
            .submit("alice", &Call::configure_authority(authority, &["alice"], 1))
            .await
            .unwrap();
        ledger
            .submit("alice", &Call::initialize_door(door, authority))
            .await
            .unwrap();

        let err = ledger.submit("alice", &Call::open(door)).await.unwrap_err();
        assert_eq!(err.rejection(), Some(DoorError::Locked));
        assert!(ledger.door(&door).await.unwrap().is_locked());
    }

    #[tokio::test]
    async fn test_direct_unlock_needs_threshold_cosigners() {
        let ledger = ledger_with(&["payer", "alice", "bob", "carol"]).await;
        let authority = ledger.allocate("payer", "alice", "authority", 256).await.unwrap().slot;
        let door = ledger.allocate("payer", "alice", "door", 256).await.unwrap().slot;
        ledger
            .submit(
                "alice",
                &Call::configure_authority(authority, &["alice", "bob", "carol"], 3),
            )
            .await
            .unwrap();
        ledger
            .submit("alice", &Call::initialize_door(door, authority))
            .await
            .unwrap();

        let err = ledger.submit("alice", &Call::unlock(door)).await.unwrap_err();
        assert_eq!(err.rejection(), Some(DoorError::NotAuthorized));
        let err = ledger
            .submit("alice", &Call::unlock(door).cosigned(&["bob"]))
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(DoorError::NotAuthorized));
        assert!(ledger.door(&door).await.unwrap().is_locked());

        ledger
            .submit("alice", &Call::unlock(door).cosigned(&["bob", "carol"]))
            .await
            .unwrap();
        assert!(!ledger.door(&door).await.unwrap().is_locked());
    }
}
