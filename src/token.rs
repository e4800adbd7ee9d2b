//! Single-use eligibility tokens, HMAC-SHA-256 over an election secret.

use std::{
    collections::{HashMap, HashSet},
    fs,
    io,
    path::{Path, PathBuf},
};

use chrono::{Local, Utc};
use hmac::{Mac, SimpleHmac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::error;
use zeroize::Zeroize;

use crate::sdk::api::{VotanError, VotanResult};

/// The election HMAC secret. Lives for the election, cleared on drop.
#[derive(Debug, Zeroize)]
#[zeroize(drop)]
struct TokenSecret([u8; 32]);

/// An eligibility token bound to one voter id.
///
/// `token` is `voter_id ":" hex(HMAC-SHA256(K, voter_id || timestamp || nonce))`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterToken {
    pub voter_id: String,
    pub token: String,
    pub issued_at: String,
}

/// Why the voting centre refused a ballot. Recovered locally, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    TokenMalformed,
    TokenUnknown,
    TokenMismatch,
    TokenUsed,
    VoterAlreadyVoted,
    ProofInvalid,
}

/// Issues and validates voter tokens. Owns the secret and the
/// issued/used/voted registries; the only mutations it exposes are
/// issuance and mark-used.
#[derive(Debug)]
pub struct TokenAuthority {
    secret: TokenSecret,
    issued: HashMap<String, VoterToken>,
    used: HashSet<String>,
    voted: HashSet<String>,
}

impl Default for TokenAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenAuthority {
    pub fn new() -> Self {
        let mut secret = TokenSecret([0; 32]);
        rand::thread_rng().fill_bytes(&mut secret.0);
        Self::with_secret_inner(secret)
    }

    pub fn with_secret(secret: [u8; 32]) -> Self {
        Self::with_secret_inner(TokenSecret(secret))
    }

    fn with_secret_inner(secret: TokenSecret) -> Self {
        Self {
            secret,
            issued: HashMap::new(),
            used: HashSet::new(),
            voted: HashSet::new(),
        }
    }

    /// Issue a token for a new voter. Each voter id gets at most one.
    pub fn issue_token(&mut self, voter_id: &str) -> VotanResult<VoterToken> {
        if self.issued.contains_key(voter_id) {
            error!("voter {} already holds a token", voter_id);
            return Err(VotanError::AlreadyIssued);
        }

        let issued_at = Utc::now().to_rfc3339();
        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);
        let message = format!("{}||{}||{}", voter_id, issued_at, hex::encode(nonce));

        let token = format!("{}:{}", voter_id, self.mac_hex(message.as_bytes())?);
        let voter_token = VoterToken {
            voter_id: voter_id.to_string(),
            token,
            issued_at,
        };
        self.issued
            .insert(voter_id.to_string(), voter_token.clone());
        Ok(voter_token)
    }

    fn mac_hex(&self, message: &[u8]) -> VotanResult<String> {
        let mut mac = SimpleHmac::<Sha256>::new_from_slice(&self.secret.0).map_err(|_| {
            error!("failure to initialize hmac");
            VotanError::Fatal
        })?;
        mac.update(message);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Check a token: known voter, matching token string, never used, voter
    /// has not voted.
    pub fn verify_token(&self, token: &str) -> Result<(), RejectReason> {
        let (voter_id, _) = token.split_once(':').ok_or(RejectReason::TokenMalformed)?;

        let issued = self
            .issued
            .get(voter_id)
            .ok_or(RejectReason::TokenUnknown)?;
        if issued.token != token {
            return Err(RejectReason::TokenMismatch);
        }
        if self.used.contains(token) {
            return Err(RejectReason::TokenUsed);
        }
        if self.voted.contains(voter_id) {
            return Err(RejectReason::VoterAlreadyVoted);
        }
        Ok(())
    }

    /// Consume a token after its ballot was accepted. The only transition
    /// out of the issued state.
    pub fn mark_used(&mut self, token: &str) {
        if let Some((voter_id, _)) = token.split_once(':') {
            self.voted.insert(voter_id.to_string());
        }
        self.used.insert(token.to_string());
    }

    pub fn voter_count(&self) -> usize {
        self.issued.len()
    }

    pub fn voted_count(&self) -> usize {
        self.voted.len()
    }

    pub fn remaining_voters(&self) -> usize {
        self.voter_count() - self.voted_count()
    }
}

/// Write the confidential token sheet to
/// `<dir>/tokens_votacion_YYYYMMDD_HHMMSS.txt` and return the path.
pub fn export_tokens(dir: &Path, question: &str, tokens: &[VoterToken]) -> io::Result<PathBuf> {
    let now = Local::now();
    let path = dir.join(format!("tokens_votacion_{}.txt", now.format("%Y%m%d_%H%M%S")));

    let banner = "=".repeat(70);
    let mut contents = String::new();
    contents.push_str(&banner);
    contents.push_str("\n           TOKENS DE VOTACIÓN - CONFIDENCIAL\n");
    contents.push_str(&banner);
    contents.push_str("\n\n");
    contents.push_str(&format!("Elección: {}\n", question));
    contents.push_str(&format!("Fecha: {}\n", now.format("%Y-%m-%d %H:%M:%S")));
    contents.push_str(&format!("Total votantes: {}\n\n", tokens.len()));
    contents.push_str(&banner);
    contents.push_str("\n\n");
    for token in tokens {
        contents.push_str(&format!("Votante: {}\n", token.voter_id));
        contents.push_str(&format!("Token: {}\n\n", token.token));
    }

    fs::write(&path, contents)?;
    Ok(path)
}
