//! Disjunctive Chaum-Pedersen proof that a ciphertext encrypts g^0 or g^1.
//!
//! For ciphertext (v, e) the prover shows knowledge of beta such that
//! (v = g^beta and e = u^beta) or (v = g^beta and e/g = u^beta), without
//! revealing which disjunct holds. Made non-interactive via Fiat-Shamir.

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::{
    constants,
    crypto_tools::{
        arith,
        elgamal::{Ciphertext, PublicKey, Randomness},
        hash::{hash_to_challenge, Element},
        rng,
    },
    sdk::api::{VotanError, VotanResult},
};

#[derive(Clone, Debug)]
pub struct Statement<'a> {
    pub public_key: &'a PublicKey,
    pub ciphertext: &'a Ciphertext,
}

#[derive(Clone, Debug)]
pub struct Witness<'a> {
    pub bit: u8,
    pub beta: &'a Randomness,
}

/// The eight transcript elements of the OR-proof.
/// Branch 1 covers b = 0, branch 2 covers b = 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    a1_v: BigUint,
    a1_e: BigUint,
    a2_v: BigUint,
    a2_e: BigUint,
    z1: BigUint,
    z2: BigUint,
    c1: BigUint,
    c2: BigUint,
}

/// Transcript challenge. Binds the proof to the exact (v, e): mutating
/// either invalidates it.
fn compute_challenge(
    stmt: &Statement,
    a1_v: &BigUint,
    a1_e: &BigUint,
    a2_v: &BigUint,
    a2_e: &BigUint,
) -> BigUint {
    let group = stmt.public_key.group();
    hash_to_challenge(
        constants::VOTE_PROOF_TAG,
        &[
            Element::Num(group.p()),
            Element::Num(group.q()),
            Element::Num(group.g()),
            Element::Num(stmt.public_key.u()),
            Element::Num(&stmt.ciphertext.v),
            Element::Num(&stmt.ciphertext.e),
            Element::Num(a1_v),
            Element::Num(a1_e),
            Element::Num(a2_v),
            Element::Num(a2_e),
        ],
    ) % group.q()
}

/// Prove that `stmt.ciphertext` encrypts the witness bit.
///
/// The commitment nonce is fresh per proof; reusing it (or beta) across
/// proofs leaks the witness.
pub fn prove(
    rng_core: &mut (impl CryptoRng + RngCore),
    stmt: &Statement,
    wit: &Witness,
) -> VotanResult<Proof> {
    match wit.bit {
        0 => prove_zero(rng_core, stmt, wit.beta),
        1 => prove_one(rng_core, stmt, wit.beta),
        _ => {
            error!("witness bit {} is not 0 or 1", wit.bit);
            Err(VotanError::InvalidMessage)
        }
    }
}

/// Real branch 1 (b = 0), simulated branch 2.
fn prove_zero(
    rng_core: &mut (impl CryptoRng + RngCore),
    stmt: &Statement,
    beta: &Randomness,
) -> VotanResult<Proof> {
    let group = stmt.public_key.group();
    let (p, q, g, u) = (group.p(), group.q(), group.g(), stmt.public_key.u());
    let Ciphertext { v, e } = stmt.ciphertext;

    let w = Randomness::generate(rng_core, q);
    let a1_v = g.modpow(w.as_ref(), p);
    let a1_e = u.modpow(w.as_ref(), p);

    // back-solve branch 2 commitments from its verification equations
    let c2 = rng::random_scalar(rng_core, q);
    let z2 = rng::random_scalar(rng_core, q);
    let v_c2_inv = arith::mod_inverse(&v.modpow(&c2, p), p)?;
    let a2_v = g.modpow(&z2, p) * v_c2_inv % p;
    let e_div_g = e * arith::mod_inverse(g, p)? % p;
    let e_div_g_c2_inv = arith::mod_inverse(&e_div_g.modpow(&c2, p), p)?;
    let a2_e = u.modpow(&z2, p) * e_div_g_c2_inv % p;

    let c = compute_challenge(stmt, &a1_v, &a1_e, &a2_v, &a2_e);
    let c1 = (&c + q - &c2) % q;
    let z1 = (w.as_ref() + &c1 * beta.as_ref()) % q;

    Ok(Proof {
        a1_v,
        a1_e,
        a2_v,
        a2_e,
        z1,
        z2,
        c1,
        c2,
    })
}

/// Simulated branch 1, real branch 2 (b = 1).
fn prove_one(
    rng_core: &mut (impl CryptoRng + RngCore),
    stmt: &Statement,
    beta: &Randomness,
) -> VotanResult<Proof> {
    let group = stmt.public_key.group();
    let (p, q, g, u) = (group.p(), group.q(), group.g(), stmt.public_key.u());
    let Ciphertext { v, e } = stmt.ciphertext;

    // back-solve branch 1 commitments from its verification equations
    let c1 = rng::random_scalar(rng_core, q);
    let z1 = rng::random_scalar(rng_core, q);
    let v_c1_inv = arith::mod_inverse(&v.modpow(&c1, p), p)?;
    let a1_v = g.modpow(&z1, p) * v_c1_inv % p;
    let e_c1_inv = arith::mod_inverse(&e.modpow(&c1, p), p)?;
    let a1_e = u.modpow(&z1, p) * e_c1_inv % p;

    let w = Randomness::generate(rng_core, q);
    let a2_v = g.modpow(w.as_ref(), p);
    let a2_e = u.modpow(w.as_ref(), p);

    let c = compute_challenge(stmt, &a1_v, &a1_e, &a2_v, &a2_e);
    let c2 = (&c + q - &c1) % q;
    let z2 = (w.as_ref() + &c2 * beta.as_ref()) % q;

    Ok(Proof {
        a1_v,
        a1_e,
        a2_v,
        a2_e,
        z1,
        z2,
        c1,
        c2,
    })
}

/// Verify the OR-proof against its ciphertext.
pub fn verify(stmt: &Statement, proof: &Proof) -> bool {
    let group = stmt.public_key.group();
    let (p, q, g, u) = (group.p(), group.q(), group.g(), stmt.public_key.u());
    let Ciphertext { v, e } = stmt.ciphertext;

    let c = compute_challenge(stmt, &proof.a1_v, &proof.a1_e, &proof.a2_v, &proof.a2_e);
    if (&proof.c1 + &proof.c2) % q != c {
        warn!("disjunctive proof: challenge split mismatch");
        return false;
    }

    // branch 1 (b = 0)
    if g.modpow(&proof.z1, p) != &proof.a1_v * v.modpow(&proof.c1, p) % p {
        warn!("disjunctive proof: branch 1 (v) check failed");
        return false;
    }
    if u.modpow(&proof.z1, p) != &proof.a1_e * e.modpow(&proof.c1, p) % p {
        warn!("disjunctive proof: branch 1 (e) check failed");
        return false;
    }

    // branch 2 (b = 1)
    if g.modpow(&proof.z2, p) != &proof.a2_v * v.modpow(&proof.c2, p) % p {
        warn!("disjunctive proof: branch 2 (v) check failed");
        return false;
    }
    let g_inv = match arith::mod_inverse(g, p) {
        Ok(inv) => inv,
        Err(_) => {
            warn!("disjunctive proof: generator not invertible");
            return false;
        }
    };
    let e_div_g = e * g_inv % p;
    if u.modpow(&proof.z2, p) != &proof.a2_e * e_div_g.modpow(&proof.c2, p) % p {
        warn!("disjunctive proof: branch 2 (e/g) check failed");
        return false;
    }

    true
}

#[cfg(any(test, feature = "malicious"))] // malicious module used in tests
pub mod malicious {
    use super::*;
    use num_traits::One;

    /// Flip the lowest bit of the branch 1 response.
    pub fn corrupt_proof(proof: &Proof) -> Proof {
        Proof {
            z1: &proof.z1 ^ BigUint::one(),
            ..proof.clone()
        }
    }
}
