use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use num_bigint::BigUint;
use serde_json::json;
use tracing::{error, info};

use crate::{
    audit::{AuditLog, EventKind},
    crypto_tools::elgamal::{self, DecryptionKey, PublicKey},
    election::{lock, TallyingCenter, VotingCenter},
    sdk::api::{VotanError, VotanResult},
    token::{TokenAuthority, VoterToken},
};

/// Where the election stands. Out-of-phase calls are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectionPhase {
    Configured,
    Registering,
    Voting,
    Tallied,
}

/// The election authority: generates parameters, issues tokens, owns the
/// audit log, and hands the decryption key to the tallying centre exactly
/// once.
#[derive(Debug)]
pub struct Authority {
    bits: u64,
    phase: ElectionPhase,
    public_key: Option<PublicKey>,
    decryption_key: Option<DecryptionKey>,
    tokens: Arc<Mutex<TokenAuthority>>,
    audit: Arc<Mutex<AuditLog>>,
    registered_voters: Vec<String>,
}

impl Authority {
    pub fn new(bits: u64) -> Self {
        Self {
            bits,
            phase: ElectionPhase::Configured,
            public_key: None,
            decryption_key: None,
            tokens: Arc::new(Mutex::new(TokenAuthority::new())),
            audit: Arc::new(Mutex::new(AuditLog::new())),
            registered_voters: Vec::new(),
        }
    }

    /// Generate the election key pair and record `SETUP`.
    pub fn setup_election(&mut self) -> VotanResult<PublicKey> {
        if self.phase != ElectionPhase::Configured {
            error!("setup requested but election is already configured");
            return Err(VotanError::OutOfPhase);
        }

        info!("generating {}-bit election parameters", self.bits);
        let (public_key, decryption_key) = elgamal::keygen(&mut rand::thread_rng(), self.bits);

        lock(&self.audit).record(
            EventKind::Setup,
            json!({
                "p": truncated(public_key.group().p()),
                "g": truncated(public_key.group().g()),
                "bits": self.bits,
            }),
        );

        self.public_key = Some(public_key.clone());
        self.decryption_key = Some(decryption_key);
        self.phase = ElectionPhase::Registering;
        Ok(public_key)
    }

    /// Issue one eligibility token per voter, recording a `REGISTRO` event
    /// each. Fails on a duplicate voter id.
    pub fn register_voters(
        &mut self,
        voter_ids: &[String],
    ) -> VotanResult<HashMap<String, VoterToken>> {
        if self.phase != ElectionPhase::Registering {
            error!("registration requested in phase {:?}", self.phase);
            return Err(VotanError::OutOfPhase);
        }

        let mut tokens = HashMap::with_capacity(voter_ids.len());
        for voter_id in voter_ids {
            let token = lock(&self.tokens).issue_token(voter_id)?;
            lock(&self.audit).record(
                EventKind::Registro,
                json!({ "voter_id": voter_id, "token_emitido": true }),
            );
            self.registered_voters.push(voter_id.clone());
            tokens.insert(voter_id.clone(), token);
        }
        info!("registered {} voters", voter_ids.len());
        Ok(tokens)
    }

    /// Open the voting phase: build a centre sharing this authority's token
    /// registry and audit log.
    pub fn voting_center(&mut self) -> VotanResult<VotingCenter> {
        let public_key = match (self.phase, &self.public_key) {
            (ElectionPhase::Registering | ElectionPhase::Voting, Some(pk)) => pk.clone(),
            _ => {
                error!("voting centre requested in phase {:?}", self.phase);
                return Err(VotanError::OutOfPhase);
            }
        };
        self.phase = ElectionPhase::Voting;
        Ok(VotingCenter::new(
            Arc::clone(&self.tokens),
            public_key,
            Arc::clone(&self.audit),
        ))
    }

    /// Close voting and hand the decryption key to the tallying centre.
    /// Consumes the key, so it can succeed once.
    pub fn tallying_center(&mut self) -> VotanResult<TallyingCenter> {
        if self.phase != ElectionPhase::Voting {
            error!("tallying centre requested in phase {:?}", self.phase);
            return Err(VotanError::OutOfPhase);
        }
        let decryption_key = self.decryption_key.take().ok_or(VotanError::OutOfPhase)?;
        self.phase = ElectionPhase::Tallied;
        Ok(TallyingCenter::new(decryption_key, Arc::clone(&self.audit)))
    }

    pub fn phase(&self) -> ElectionPhase {
        self.phase
    }

    pub fn public_key(&self) -> Option<&PublicKey> {
        self.public_key.as_ref()
    }

    pub fn registered_voters(&self) -> &[String] {
        &self.registered_voters
    }

    pub fn audit_log(&self) -> Arc<Mutex<AuditLog>> {
        Arc::clone(&self.audit)
    }

    pub fn token_authority(&self) -> Arc<Mutex<TokenAuthority>> {
        Arc::clone(&self.tokens)
    }
}

/// Leading digits only; full parameters do not belong in audit payloads.
fn truncated(n: &BigUint) -> String {
    let digits = n.to_str_radix(10);
    if digits.len() <= 20 {
        digits
    } else {
        format!("{}...", &digits[..20])
    }
}
