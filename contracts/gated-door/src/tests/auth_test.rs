//! Signature checks: each entrypoint must demand the auth of the account it
//! acts for, not just of whoever submits the call.

extern crate std;

use super::test_helpers::Fixture;
use crate::DoorAction;
use soroban_sdk::testutils::{AuthorizedFunction, AuthorizedInvocation, MockAuth, MockAuthInvoke};
use soroban_sdk::{vec, IntoVal, Symbol};

#[test]
fn approve_records_the_signers_auth() {
    let f = Fixture::new();
    let (owners, authority, door) = f.governed_door(3, 2);
    let (a, b) = (owners.get(0).unwrap(), owners.get(1).unwrap());
    let request = f.request(&a, "unlock", &authority, &door, DoorAction::Unlock);

    f.client.approve(&request, &b);

    assert_eq!(
        f.env.auths(),
        std::vec![(
            b.clone(),
            AuthorizedInvocation {
                function: AuthorizedFunction::Contract((
                    f.client.address.clone(),
                    Symbol::new(&f.env, "approve"),
                    (request.clone(), b.clone()).into_val(&f.env),
                )),
                sub_invocations: std::vec![],
            }
        )]
    );
}

#[test]
#[should_panic(expected = "Error(Auth, InvalidAction)")]
fn approval_for_another_owner_fails_without_their_auth() {
    let f = Fixture::new();
    let (owners, authority, door) = f.governed_door(3, 2);
    let (a, b) = (owners.get(0).unwrap(), owners.get(1).unwrap());
    let request = f.request(&a, "unlock", &authority, &door, DoorAction::Unlock);

    f.env.mock_auths(&[MockAuth {
        address: &a,
        invoke: &MockAuthInvoke {
            contract: &f.client.address,
            fn_name: "approve",
            args: (request.clone(), b.clone()).into_val(&f.env),
            sub_invokes: &[],
        },
    }]);
    f.client.approve(&request, &b);
}

#[test]
fn approval_with_the_owners_own_auth_is_counted() {
    let f = Fixture::new();
    let (owners, authority, door) = f.governed_door(3, 2);
    let (a, b) = (owners.get(0).unwrap(), owners.get(1).unwrap());
    let request = f.request(&a, "unlock", &authority, &door, DoorAction::Unlock);

    f.env.mock_auths(&[MockAuth {
        address: &b,
        invoke: &MockAuthInvoke {
            contract: &f.client.address,
            fn_name: "approve",
            args: (request.clone(), b.clone()).into_val(&f.env),
            sub_invokes: &[],
        },
    }]);
    f.client.approve(&request, &b);

    assert_eq!(f.client.get_approvers(&request), vec![&f.env, b]);
}

#[test]
#[should_panic(expected = "Error(Auth, InvalidAction)")]
fn create_request_needs_the_proposers_auth() {
    let f = Fixture::new();
    let (owners, authority, door) = f.governed_door(2, 2);
    let a = owners.get(0).unwrap();
    let request = f.allocate(&a, "unlock");

    f.env.mock_auths(&[]);
    f.client
        .create_request(&a, &request, &authority, &door, &DoorAction::Unlock);
}

#[test]
#[should_panic(expected = "Error(Auth, InvalidAction)")]
fn unlock_needs_every_cosigners_auth() {
    let f = Fixture::new();
    let (owners, _, door) = f.governed_door(3, 2);
    let signers = vec![&f.env, owners.get(0).unwrap(), owners.get(1).unwrap()];

    f.env.mock_auths(&[MockAuth {
        address: &owners.get(0).unwrap(),
        invoke: &MockAuthInvoke {
            contract: &f.client.address,
            fn_name: "unlock",
            args: (door.clone(), signers.clone()).into_val(&f.env),
            sub_invokes: &[],
        },
    }]);
    f.client.unlock(&door, &signers);
}

#[test]
fn lock_records_each_cosigner_once() {
    let f = Fixture::new();
    let (owners, _, door) = f.governed_door(3, 2);
    let (a, c) = (owners.get(0).unwrap(), owners.get(2).unwrap());
    f.client.unlock(&door, &vec![&f.env, a.clone(), c.clone()]);

    f.client
        .lock(&door, &vec![&f.env, c.clone(), a.clone(), c.clone()]);

    let signed: std::vec::Vec<_> = f.env.auths().into_iter().map(|(addr, _)| addr).collect();
    assert_eq!(signed.len(), 2);
    assert!(signed.contains(&a));
    assert!(signed.contains(&c));
}
