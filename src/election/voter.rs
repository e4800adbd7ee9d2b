use crate::{
    crypto_tools::{
        elgamal::PublicKey,
        zkp::disjunctive::{self, Statement, Witness},
    },
    election::EncryptedVote,
    sdk::api::VotanResult,
    token::VoterToken,
};

/// A voter holding an eligibility token.
#[derive(Debug, Clone)]
pub struct Voter {
    voter_id: String,
    token: VoterToken,
}

impl Voter {
    pub fn new(voter_id: impl Into<String>, token: VoterToken) -> Self {
        Self {
            voter_id: voter_id.into(),
            token,
        }
    }

    pub fn voter_id(&self) -> &str {
        &self.voter_id
    }

    /// Encrypt the choice (yes = 1, no = 0) under fresh randomness and
    /// attach the validity proof.
    pub fn cast_vote(&self, choice: bool, public_key: &PublicKey) -> VotanResult<EncryptedVote> {
        let bit = u8::from(choice);
        let mut rng_core = rand::thread_rng();

        let (ciphertext, beta) = public_key.encrypt(&mut rng_core, bit)?;
        let stmt = Statement {
            public_key,
            ciphertext: &ciphertext,
        };
        let proof = disjunctive::prove(&mut rng_core, &stmt, &Witness { bit, beta: &beta })?;

        Ok(EncryptedVote {
            voter_id: self.voter_id.clone(),
            token: self.token.token.clone(),
            ciphertext,
            proof,
        })
    }
}
