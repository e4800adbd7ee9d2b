use std::sync::{Arc, Mutex};

use serde_json::json;
use tracing::{info, warn};

use crate::{
    audit::{AuditLog, EventKind},
    crypto_tools::{
        elgamal::{Ciphertext, PublicKey},
        zkp::disjunctive,
    },
    election::{lock, EncryptedVote, VotingStats},
    sdk::api::decode,
    token::{RejectReason, TokenAuthority},
};

/// Receives ballots: token check first, then proof check. Accepted ballots
/// are stored and audited; rejected ones are kept with their reason and
/// never reach the tally.
#[derive(Debug)]
pub struct VotingCenter {
    tokens: Arc<Mutex<TokenAuthority>>,
    public_key: PublicKey,
    audit: Arc<Mutex<AuditLog>>,
    valid_votes: Vec<EncryptedVote>,
    rejected_votes: Vec<(String, RejectReason)>,
}

impl VotingCenter {
    pub fn new(
        tokens: Arc<Mutex<TokenAuthority>>,
        public_key: PublicKey,
        audit: Arc<Mutex<AuditLog>>,
    ) -> Self {
        Self {
            tokens,
            public_key,
            audit,
            valid_votes: Vec::new(),
            rejected_votes: Vec::new(),
        }
    }

    /// Validate and store one ballot. Returns whether it was accepted; a
    /// rejection leaves all state unchanged apart from the rejection list.
    pub fn receive_vote(&mut self, vote: EncryptedVote) -> bool {
        // hold the registry lock across verify and mark-used so the same
        // token cannot be spent twice in between
        let mut tokens = lock(&self.tokens);

        if let Err(reason) = tokens.verify_token(&vote.token) {
            warn!("ballot from {} rejected: {:?}", vote.voter_id, reason);
            self.rejected_votes.push((vote.voter_id, reason));
            return false;
        }

        let stmt = disjunctive::Statement {
            public_key: &self.public_key,
            ciphertext: &vote.ciphertext,
        };
        if !disjunctive::verify(&stmt, &vote.proof) {
            warn!("ballot from {} rejected: invalid validity proof", vote.voter_id);
            self.rejected_votes
                .push((vote.voter_id, RejectReason::ProofInvalid));
            return false;
        }

        tokens.mark_used(&vote.token);
        drop(tokens);

        lock(&self.audit).record(
            EventKind::Voto,
            json!({
                "voter_id": vote.voter_id.as_str(),
                "voto_valido": true,
                "nizk_verificado": true,
            }),
        );
        info!("ballot from {} accepted", vote.voter_id);
        self.valid_votes.push(vote);
        true
    }

    /// Wire entry point: decode an encoded ballot bundle and process it.
    pub fn receive_vote_bytes(&mut self, bytes: &[u8]) -> bool {
        match decode::<EncryptedVote>(bytes) {
            Some(vote) => self.receive_vote(vote),
            None => {
                warn!("ballot bytes did not decode, discarding");
                false
            }
        }
    }

    /// Ciphertexts of the accepted ballots, in arrival order.
    pub fn valid_votes(&self) -> Vec<Ciphertext> {
        self.valid_votes
            .iter()
            .map(|vote| vote.ciphertext.clone())
            .collect()
    }

    pub fn rejected_votes(&self) -> &[(String, RejectReason)] {
        &self.rejected_votes
    }

    pub fn statistics(&self) -> VotingStats {
        let registered_voters = lock(&self.tokens).voter_count();
        let valid_votes = self.valid_votes.len();
        let rejected_votes = self.rejected_votes.len();
        let participation_rate = if registered_voters == 0 {
            0.0
        } else {
            valid_votes as f64 / registered_voters as f64 * 100.0
        };

        VotingStats {
            total_votes: valid_votes + rejected_votes,
            valid_votes,
            rejected_votes,
            registered_voters,
            participation_rate,
        }
    }
}
