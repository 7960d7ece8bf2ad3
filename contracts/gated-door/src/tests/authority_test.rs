use super::test_helpers::Fixture;
use crate::{DoorError, MAX_OWNERS};
use soroban_sdk::Vec;

#[test]
fn create_authority_stores_owners_and_threshold() {
    let f = Fixture::new();
    let owners = f.owners(3);
    let creator = owners.get(0).unwrap();
    let slot = f.authority(&creator, &owners, 2);

    let config = f.client.get_authority(&slot);
    assert_eq!(config.owners, owners);
    assert_eq!(config.threshold, 2);
}

#[test]
fn creator_need_not_be_an_owner() {
    let f = Fixture::new();
    let owners = f.owners(2);
    let creator = f.identity();
    let slot = f.authority(&creator, &owners, 1);

    assert_eq!(f.client.get_authority(&slot).owners.len(), 2);
}

#[test]
fn threshold_out_of_range_is_rejected() {
    let f = Fixture::new();
    let owners = f.owners(3);
    let creator = f.identity();
    let slot = f.allocate(&creator, "authority");

    for threshold in [0u32, 4, 10] {
        assert_eq!(
            f.client
                .try_create_authority(&creator, &slot, &owners, &threshold),
            Err(Ok(DoorError::InvalidThreshold))
        );
    }
    assert_eq!(
        f.client
            .try_create_authority(&creator, &slot, &Vec::new(&f.env), &1),
        Err(Ok(DoorError::InvalidThreshold))
    );
    assert_eq!(
        f.client.try_get_authority(&slot),
        Err(Ok(DoorError::NotInitialized))
    );
}

#[test]
fn duplicate_owner_is_rejected() {
    let f = Fixture::new();
    let mut owners = f.owners(2);
    let first = owners.get(0).unwrap();
    owners.push_back(first);
    let creator = f.identity();
    let slot = f.allocate(&creator, "authority");

    assert_eq!(
        f.client.try_create_authority(&creator, &slot, &owners, &2),
        Err(Ok(DoorError::DuplicateOwner))
    );
}

#[test]
fn owner_count_is_capped() {
    let f = Fixture::new();
    let creator = f.identity();
    let slot = f.allocate(&creator, "authority");

    let full = f.owners(MAX_OWNERS);
    let mut over = full.clone();
    over.push_back(f.identity());
    assert_eq!(
        f.client.try_create_authority(&creator, &slot, &over, &1),
        Err(Ok(DoorError::TooManyOwners))
    );

    f.client.create_authority(&creator, &slot, &full, &MAX_OWNERS);
    assert_eq!(f.client.get_authority(&slot).threshold, MAX_OWNERS);
}

#[test]
fn authority_is_created_once() {
    let f = Fixture::new();
    let owners = f.owners(2);
    let creator = owners.get(0).unwrap();
    let slot = f.authority(&creator, &owners, 2);

    let result = f
        .client
        .try_create_authority(&creator, &slot, &f.owners(3), &1);
    assert_eq!(result, Err(Ok(DoorError::AlreadyCreated)));
    assert_eq!(f.client.get_authority(&slot).owners, owners);
}

#[test]
fn only_slot_owner_may_create() {
    let f = Fixture::new();
    let owners = f.owners(2);
    let alice = owners.get(0).unwrap();
    let slot = f.allocate(&alice, "authority");

    let result = f
        .client
        .try_create_authority(&owners.get(1).unwrap(), &slot, &owners, &1);
    assert_eq!(result, Err(Ok(DoorError::NotAuthorized)));
}
