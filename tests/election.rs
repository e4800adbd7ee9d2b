//! Full election cycle, exercised the way an operator would run it.

use tracing_test::traced_test; // enable logs in tests
use votan::{
    election::{Authority, ElectionPhase, Voter},
    sdk::api::{encode, VotanError},
    token::RejectReason,
};

fn voter_ids() -> Vec<String> {
    [
        "Alice_2024",
        "Bob_2024",
        "Carlos_2024",
        "Diana_2024",
        "Elena_2024",
        "Franco_2024",
        "Gloria_2024",
        "Héctor_2024",
    ]
    .iter()
    .map(|id| id.to_string())
    .collect()
}

#[test]
#[traced_test]
fn full_election_cycle() {
    let voter_ids = voter_ids();
    let choices = [true, false, true, true, false, true, false, true];

    let mut authority = Authority::new(128);
    let public_key = authority.setup_election().expect("setup failure");
    let tokens = authority
        .register_voters(&voter_ids)
        .expect("registration failure");
    let mut center = authority.voting_center().expect("voting centre failure");

    for (voter_id, choice) in voter_ids.iter().zip(choices) {
        let voter = Voter::new(voter_id.clone(), tokens[voter_id].clone());
        let ballot = voter.cast_vote(choice, &public_key).expect("cast failure");
        assert!(center.receive_vote(ballot));
    }

    let stats = center.statistics();
    assert_eq!(stats.total_votes, 8);
    assert_eq!(stats.valid_votes, 8);
    assert_eq!(stats.rejected_votes, 0);
    assert_eq!(stats.registered_voters, 8);
    assert!((stats.participation_rate - 100.0).abs() < f64::EPSILON);

    let tallying = authority.tallying_center().expect("tallying centre failure");
    let (yes, no) = tallying
        .tally_votes(&center.valid_votes())
        .expect("tally failure");
    assert_eq!((yes, no), (5, 3));

    let audit = authority.audit_log();
    let log = audit.lock().unwrap();
    assert!(log.verify_integrity());
    // SETUP + 8 REGISTRO + 8 VOTO + MEZCLA + CONTEO
    assert_eq!(log.len(), 19);
}

#[test]
#[traced_test]
fn double_vote_rejected() {
    let voter_ids = voter_ids();
    let choices = [true, false, true, true, false, true, false, true];

    let mut authority = Authority::new(64);
    let public_key = authority.setup_election().unwrap();
    let tokens = authority.register_voters(&voter_ids).unwrap();
    let mut center = authority.voting_center().unwrap();

    for (voter_id, choice) in voter_ids.iter().zip(choices) {
        let voter = Voter::new(voter_id.clone(), tokens[voter_id].clone());
        assert!(center.receive_vote(voter.cast_vote(choice, &public_key).unwrap()));
    }

    // Alice tries again with her spent token
    let alice = Voter::new("Alice_2024", tokens["Alice_2024"].clone());
    let second_ballot = alice.cast_vote(false, &public_key).unwrap();
    assert!(!center.receive_vote(second_ballot));

    assert_eq!(center.valid_votes().len(), 8);
    assert_eq!(center.rejected_votes().len(), 1);
    assert_eq!(
        center.rejected_votes()[0],
        ("Alice_2024".to_string(), RejectReason::TokenUsed)
    );

    // the double vote changed no tallied state
    let tallying = authority.tallying_center().unwrap();
    assert_eq!(
        tallying.tally_votes(&center.valid_votes()).unwrap(),
        (5, 3)
    );
}

#[test]
#[traced_test]
fn ballots_travel_as_bytes() {
    let voter_ids = vec!["Alice_2024".to_string()];

    let mut authority = Authority::new(64);
    let public_key = authority.setup_election().unwrap();
    let tokens = authority.register_voters(&voter_ids).unwrap();
    let mut center = authority.voting_center().unwrap();

    let voter = Voter::new("Alice_2024", tokens["Alice_2024"].clone());
    let ballot = voter.cast_vote(true, &public_key).unwrap();
    let bytes = encode(&ballot).unwrap();

    assert!(!center.receive_vote_bytes(b"not a ballot"));
    assert!(center.receive_vote_bytes(&bytes));
    assert_eq!(center.valid_votes().len(), 1);
}

#[test]
fn phases_are_enforced() {
    let voter_ids = voter_ids();

    let mut authority = Authority::new(64);
    assert_eq!(authority.phase(), ElectionPhase::Configured);
    assert_eq!(
        authority.register_voters(&voter_ids).unwrap_err(),
        VotanError::OutOfPhase
    );

    authority.setup_election().unwrap();
    assert_eq!(authority.phase(), ElectionPhase::Registering);
    assert_eq!(
        authority.setup_election().unwrap_err(),
        VotanError::OutOfPhase
    );
    assert_eq!(
        authority.tallying_center().unwrap_err(),
        VotanError::OutOfPhase
    );

    authority.register_voters(&voter_ids).unwrap();
    let center = authority.voting_center().unwrap();
    assert_eq!(authority.phase(), ElectionPhase::Voting);

    let tallying = authority.tallying_center().unwrap();
    assert_eq!(authority.phase(), ElectionPhase::Tallied);
    assert_eq!(
        authority.tallying_center().unwrap_err(),
        VotanError::OutOfPhase
    );

    // nothing was cast, tally is empty
    assert_eq!(tallying.tally_votes(&center.valid_votes()).unwrap(), (0, 0));
}

#[test]
fn duplicate_registration_rejected() {
    let mut authority = Authority::new(64);
    authority.setup_election().unwrap();

    let ids = vec!["Alice_2024".to_string(), "Alice_2024".to_string()];
    assert_eq!(
        authority.register_voters(&ids).unwrap_err(),
        VotanError::AlreadyIssued
    );
}
