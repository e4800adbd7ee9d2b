//! Re-encryption mixnet: permutes and re-encrypts a ballot list to break
//! the voter-to-ballot correlation.

use num_bigint::BigUint;
use rand::{seq::SliceRandom, CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    constants,
    crypto_tools::{
        elgamal::{Ciphertext, PublicKey, Randomness},
        hash::{hash_to_challenge, Element},
    },
};

/// How many re-encryption exponents the shuffle commitment absorbs.
const COMMITTED_EXPONENTS: usize = 3;

/// Binding commitment to a shuffle.
///
/// Pins the permutation and leading re-encryption exponents but is NOT a
/// cryptographic shuffle argument: `verify_mix` establishes structural
/// consistency only. A production replacement would carry a Bayer-Groth or
/// Terelius-Wikstrom proof of correct re-encryption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixProof {
    commitment: BigUint,
    original_count: usize,
    mixed_count: usize,
    commitment_mod_q: BigUint,
}

#[derive(Debug, Clone)]
pub struct Mixnet {
    public_key: PublicKey,
}

impl Mixnet {
    pub fn new(public_key: PublicKey) -> Self {
        Self { public_key }
    }

    /// Shuffle with a uniform permutation and re-encrypt every ballot under
    /// a fresh exponent. Returns the mixed list and the shuffle commitment;
    /// an empty input yields `([], None)`.
    pub fn shuffle_and_reencrypt(
        &self,
        rng_core: &mut (impl CryptoRng + RngCore),
        ciphertexts: &[Ciphertext],
    ) -> (Vec<Ciphertext>, Option<MixProof>) {
        if ciphertexts.is_empty() {
            return (Vec::new(), None);
        }

        let n = ciphertexts.len();
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(rng_core);

        let q = self.public_key.group().q();
        let mut mixed = Vec::with_capacity(n);
        let mut committed_exponents = Vec::with_capacity(COMMITTED_EXPONENTS);
        for &original_index in &indices {
            let r = Randomness::generate(rng_core, q);
            mixed.push(
                self.public_key
                    .reencrypt(&ciphertexts[original_index], r.as_ref()),
            );
            if committed_exponents.len() < COMMITTED_EXPONENTS {
                committed_exponents.push(r);
            }
        }

        let commitment = mix_commitment(&indices, &committed_exponents, n, mixed.len());
        let commitment_mod_q = &commitment % q;
        let proof = MixProof {
            commitment,
            original_count: n,
            mixed_count: mixed.len(),
            commitment_mod_q,
        };

        (mixed, Some(proof))
    }

    /// Structural verification: the proof is present, cardinalities match
    /// its metadata, and every mixed component lies in `[1, p-1]`.
    pub fn verify_mix(
        &self,
        original: &[Ciphertext],
        mixed: &[Ciphertext],
        proof: Option<&MixProof>,
    ) -> bool {
        let proof = match proof {
            Some(proof) => proof,
            None => {
                warn!("mix verification: missing proof");
                return false;
            }
        };

        if original.len() != mixed.len() {
            warn!("mix verification: ballot count mismatch");
            return false;
        }
        if proof.original_count != original.len() || proof.mixed_count != mixed.len() {
            warn!("mix verification: proof does not match ballot counts");
            return false;
        }

        let group = self.public_key.group();
        for ct in mixed {
            if !group.is_group_element(&ct.v) || !group.is_group_element(&ct.e) {
                warn!("mix verification: ballot component out of range");
                return false;
            }
        }

        true
    }
}

fn mix_commitment(
    permutation: &[usize],
    exponents: &[Randomness],
    original_count: usize,
    mixed_count: usize,
) -> BigUint {
    let mut elements: Vec<Element> = permutation.iter().map(|&i| Element::Count(i)).collect();
    elements.extend(exponents.iter().map(|r| Element::Num(r.as_ref())));
    elements.push(Element::Count(original_count));
    elements.push(Element::Count(mixed_count));
    hash_to_challenge(constants::MIX_COMMIT_TAG, &elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto_tools::elgamal;
    use tracing_test::traced_test; // enable logs in tests

    const TEST_BITS: u64 = 64;

    #[test]
    #[traced_test]
    fn shuffle_preserves_cardinality_and_tally() {
        let mut rng_core = rand::thread_rng();
        let (pk, dk) = elgamal::keygen(&mut rng_core, TEST_BITS);
        let mixnet = Mixnet::new(pk.clone());

        let bits = [1u8, 0, 1, 1, 0, 1];
        let ballots: Vec<Ciphertext> = bits
            .iter()
            .map(|&b| pk.encrypt(&mut rng_core, b).unwrap().0)
            .collect();

        let (mixed, proof) = mixnet.shuffle_and_reencrypt(&mut rng_core, &ballots);
        assert_eq!(mixed.len(), ballots.len());
        assert!(mixnet.verify_mix(&ballots, &mixed, proof.as_ref()));

        let aggregate = pk.homomorphic_add(&mixed).unwrap();
        assert_eq!(dk.decrypt_sum(&aggregate, mixed.len()).unwrap(), 4);
    }

    #[test]
    fn empty_input_yields_no_proof() {
        let mut rng_core = rand::thread_rng();
        let (pk, _) = elgamal::keygen(&mut rng_core, TEST_BITS);
        let mixnet = Mixnet::new(pk);

        let (mixed, proof) = mixnet.shuffle_and_reencrypt(&mut rng_core, &[]);
        assert!(mixed.is_empty());
        assert!(proof.is_none());
    }

    #[test]
    #[traced_test]
    fn verification_failures() {
        let mut rng_core = rand::thread_rng();
        let (pk, _) = elgamal::keygen(&mut rng_core, TEST_BITS);
        let mixnet = Mixnet::new(pk.clone());

        let ballots: Vec<Ciphertext> = (0..4)
            .map(|_| pk.encrypt(&mut rng_core, 1).unwrap().0)
            .collect();
        let (mixed, proof) = mixnet.shuffle_and_reencrypt(&mut rng_core, &ballots);

        // missing proof
        assert!(!mixnet.verify_mix(&ballots, &mixed, None));

        // dropped ballot
        assert!(!mixnet.verify_mix(&ballots, &mixed[1..], proof.as_ref()));

        // out-of-range component
        let mut tampered = mixed.clone();
        tampered[0].v = pk.group().p().clone();
        assert!(!mixnet.verify_mix(&ballots, &tampered, proof.as_ref()));
    }
}
