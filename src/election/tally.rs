use std::sync::{Arc, Mutex};

use serde_json::json;
use tracing::{error, info};

use crate::{
    audit::{AuditLog, EventKind},
    crypto_tools::elgamal::{Ciphertext, DecryptionKey},
    election::lock,
    mixnet::Mixnet,
    sdk::api::{VotanError, VotanResult},
};

/// Sole holder of the decryption key. Mixes the ballots, aggregates them
/// homomorphically and decrypts only the sum.
#[derive(Debug)]
pub struct TallyingCenter {
    decryption_key: DecryptionKey,
    mixnet: Mixnet,
    audit: Arc<Mutex<AuditLog>>,
}

impl TallyingCenter {
    pub fn new(decryption_key: DecryptionKey, audit: Arc<Mutex<AuditLog>>) -> Self {
        let mixnet = Mixnet::new(decryption_key.public().clone());
        Self {
            decryption_key,
            mixnet,
            audit,
        }
    }

    /// Mix, verify the mix, aggregate and recover the yes-count by small
    /// discrete log. Returns `(yes, no)`; an empty input tallies `(0, 0)`.
    pub fn tally_votes(&self, ballots: &[Ciphertext]) -> VotanResult<(usize, usize)> {
        if ballots.is_empty() {
            info!("no ballots to tally");
            return Ok((0, 0));
        }

        let (mixed, mix_proof) = self
            .mixnet
            .shuffle_and_reencrypt(&mut rand::thread_rng(), ballots);
        if !self.mixnet.verify_mix(ballots, &mixed, mix_proof.as_ref()) {
            error!("mix verification failed, aborting tally");
            return Err(VotanError::MixInvalid);
        }
        lock(&self.audit).record(
            EventKind::Mezcla,
            json!({
                "votos_originales": ballots.len(),
                "votos_mezclados": mixed.len(),
                "mezcla_verificada": true,
            }),
        );

        let aggregate = self.decryption_key.public().homomorphic_add(&mixed)?;
        let yes = self.decryption_key.decrypt_sum(&aggregate, mixed.len())?;
        let no = mixed.len() - yes;

        lock(&self.audit).record(
            EventKind::Conteo,
            json!({
                "total_votos": mixed.len(),
                "votos_favor": yes,
                "votos_contra": no,
            }),
        );
        info!("tally complete: {} yes, {} no", yes, no);
        Ok((yes, no))
    }
}
