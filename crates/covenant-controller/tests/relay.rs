//! Generic calls, native currency and external token relays

use assert_matches::assert_matches;
use covenant_testkit::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn caller(fixture: &mut Organization, permissions: SchemePermissions) -> Address {
    let scheme = fixture.address("caller");
    fixture.register(scheme, permissions);
    scheme
}

#[test]
fn generic_call_returns_raw_result() {
    init_test_tracing();
    let target = Address::derive(b"target");
    let expected: Vec<u8> = (0u8..64).collect();
    let reply = expected.clone();
    let mut fixture = OrganizationBuilder::new()
        .seed(60)
        .call_target(target, move |_payload| Ok(reply.clone()))
        .build();
    let scheme = caller(
        &mut fixture,
        SchemePermissions::none().with(Permission::GenericCall),
    );
    let org = fixture.org;

    let output = fixture
        .controller
        .generic_call(scheme, target, vec![0xde, 0xad], &org)
        .unwrap();
    assert_eq!(output.len(), 64);
    assert_eq!(output, expected);
    assert_eq!(
        fixture.controller.avatar().calls(),
        &[(target, vec![0xde, 0xad])]
    );
}

#[test]
fn generic_call_echoes_any_length() {
    let target = Address::derive(b"echo");
    let mut fixture = OrganizationBuilder::new()
        .seed(61)
        .call_target(target, |payload| Ok(payload.to_vec()))
        .build();
    let deployer = fixture.deployer;
    let org = fixture.org;
    for len in [0usize, 1, 31, 32, 33, 1024] {
        let payload = vec![0xab; len];
        let output = fixture
            .controller
            .generic_call(deployer, target, payload.clone(), &org)
            .unwrap();
        assert_eq!(output, payload);
    }
}

#[test]
fn generic_call_needs_its_own_bit() {
    let target = Address::derive(b"target");
    let mut fixture = OrganizationBuilder::new()
        .seed(62)
        .call_target(target, |_| Ok(Vec::new()))
        .build();
    let scheme = caller(&mut fixture, SchemePermissions::from_bits(0b01111));
    let org = fixture.org;
    assert_matches!(
        fixture.controller.generic_call(scheme, target, Vec::new(), &org),
        Err(CovenantError::Unauthorized { .. })
    );
}

#[test]
fn reverted_generic_call_surfaces_as_collaborator_error() {
    let target = Address::derive(b"reverting");
    let mut fixture = OrganizationBuilder::new()
        .seed(63)
        .call_target(target, |_| Err(CovenantError::collaborator("reverted")))
        .build();
    let deployer = fixture.deployer;
    let org = fixture.org;
    assert_matches!(
        fixture.controller.generic_call(deployer, target, vec![1], &org),
        Err(CovenantError::Collaborator { .. })
    );
    assert!(fixture.controller.avatar().calls().is_empty());
}

#[test]
fn pre_constraint_stops_generic_call_before_execution() {
    let target = Address::derive(b"target");
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let mut fixture = OrganizationBuilder::new()
        .seed(64)
        .call_target(target, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        })
        .build();
    fixture.install(
        RejectingConstraint::new(CallPhase::Pre).only(Method::GenericCall),
        Hash32::ZERO,
    );
    let deployer = fixture.deployer;
    let org = fixture.org;

    let err = fixture
        .controller
        .generic_call(deployer, target, Vec::new(), &org)
        .unwrap_err();
    assert_matches!(err, CovenantError::ConstraintRejected { ref method, .. } if method == "genericCall");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn send_ether_moves_native_currency() {
    let mut fixture = OrganizationBuilder::new().seed(65).ether(1_000).build();
    let scheme = caller(&mut fixture, SchemePermissions::none());
    let org = fixture.org;
    let to = fixture.address("payee");

    assert!(fixture.controller.send_ether(scheme, 400, to, &org).unwrap());
    assert_eq!(fixture.controller.avatar().ether_of(&to), 400);
    assert_eq!(fixture.controller.avatar().ether_of(&org), 600);

    assert_matches!(
        fixture.controller.send_ether(scheme, 601, to, &org),
        Err(CovenantError::Collaborator { .. })
    );
    assert_eq!(fixture.controller.avatar().ether_of(&org), 600);
}

#[test]
fn send_ether_respects_amount_cap() {
    let mut fixture = OrganizationBuilder::new().seed(66).ether(1_000).build();
    let scheme = caller(&mut fixture, SchemePermissions::none());
    fixture.install(
        AmountCapConstraint::new(Method::SendEther, 100).with_phase(CallPhase::Post),
        Hash32::ZERO,
    );
    let org = fixture.org;
    let to = fixture.address("payee");

    assert_matches!(
        fixture.controller.send_ether(scheme, 101, to, &org),
        Err(CovenantError::ConstraintRejected { .. })
    );
    assert_eq!(fixture.controller.avatar().ether_of(&to), 0);
    assert!(fixture.controller.send_ether(scheme, 100, to, &org).unwrap());
    assert_eq!(fixture.controller.avatar().ether_of(&to), 100);
}

#[test]
fn external_token_relays() {
    let token = Address::derive(b"external-token");
    let holder = Address::derive(b"holder");
    let mut fixture = OrganizationBuilder::new()
        .seed(67)
        .external_balance(token, 500)
        .external_allowance(token, holder, 300)
        .build();
    let scheme = caller(&mut fixture, SchemePermissions::none());
    let org = fixture.org;
    let to = fixture.address("recipient");
    let spender = fixture.address("spender");

    assert!(fixture
        .controller
        .external_token_transfer(scheme, token, to, 200, &org)
        .unwrap());
    assert_eq!(fixture.controller.avatar().external_balance(&token, &org), 300);
    assert_eq!(fixture.controller.avatar().external_balance(&token, &to), 200);

    assert!(fixture
        .controller
        .external_token_transfer_from(scheme, token, holder, to, 250, &org)
        .unwrap());
    assert_eq!(fixture.controller.avatar().external_balance(&token, &holder), 50);
    assert_eq!(fixture.controller.avatar().external_balance(&token, &to), 450);
    assert_eq!(fixture.controller.avatar().allowance(&token, &holder, &org), 50);

    assert_matches!(
        fixture
            .controller
            .external_token_transfer_from(scheme, token, holder, to, 51, &org),
        Err(CovenantError::Collaborator { .. })
    );

    assert!(fixture
        .controller
        .external_token_increase_approval(scheme, token, spender, 70, &org)
        .unwrap());
    assert!(fixture
        .controller
        .external_token_decrease_approval(scheme, token, spender, 20, &org)
        .unwrap());
    assert_eq!(fixture.controller.avatar().allowance(&token, &org, &spender), 50);
}

#[test]
fn relays_carry_their_own_tags() {
    let token = Address::derive(b"external-token");
    let holder = Address::derive(b"holder");
    let mut fixture = OrganizationBuilder::new()
        .seed(68)
        .ether(10)
        .external_balance(token, 10)
        .external_allowance(token, holder, 10)
        .build();
    let scheme = caller(&mut fixture, SchemePermissions::none());
    let recorder = RecordingConstraint::new(CallPhase::Pre);
    fixture.install(recorder.clone(), Hash32::ZERO);
    let org = fixture.org;
    let other = fixture.address("other");

    fixture.controller.send_ether(scheme, 1, other, &org).unwrap();
    fixture
        .controller
        .external_token_transfer(scheme, token, other, 1, &org)
        .unwrap();
    fixture
        .controller
        .external_token_transfer_from(scheme, token, holder, other, 1, &org)
        .unwrap();
    fixture
        .controller
        .external_token_increase_approval(scheme, token, other, 1, &org)
        .unwrap();
    fixture
        .controller
        .external_token_decrease_approval(scheme, token, other, 1, &org)
        .unwrap();

    let tags: Vec<_> = recorder.observations().iter().map(|o| o.tag).collect();
    assert_eq!(
        tags,
        [
            "sendEther",
            "externalTokenTransfer",
            "externalTokenTransferFrom",
            "externalTokenIncreaseApproval",
            "externalTokenDecreaseApproval",
        ]
    );
}

#[test]
fn relays_check_organization() {
    let mut fixture = OrganizationBuilder::new().seed(69).ether(10).build();
    let deployer = fixture.deployer;
    let wrong = fixture.address("other-org");
    assert_matches!(
        fixture.controller.send_ether(deployer, 1, deployer, &wrong),
        Err(CovenantError::Unauthorized { .. })
    );
}
