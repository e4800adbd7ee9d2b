//! Multiplicative ElGamal over the order-q subgroup of Z*_p, p = 2q + 1.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use zeroize::Zeroize;

use crate::{
    constants,
    crypto_tools::{arith, rng, rng::SecretRecoveryKey},
    sdk::api::{VotanError, VotanResult},
};

/// Prime-order group parameters, immutable once created: `p = 2q + 1` with
/// both prime, and `g` of multiplicative order exactly `q` in Z*_p.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupParams {
    p: BigUint,
    q: BigUint,
    g: BigUint,
}

impl GroupParams {
    /// Fresh parameters: a `bits`-wide safe prime and a subgroup generator.
    pub fn generate(rng_core: &mut (impl CryptoRng + RngCore), bits: u64) -> Self {
        let (p, q) = arith::generate_safe_prime(rng_core, bits);
        let g = arith::find_subgroup_generator(rng_core, &p, &q);
        Self { p, q, g }
    }

    pub fn p(&self) -> &BigUint {
        &self.p
    }

    pub fn q(&self) -> &BigUint {
        &self.q
    }

    pub fn g(&self) -> &BigUint {
        &self.g
    }

    /// Membership in Z*_p, i.e. `[1, p-1]`.
    pub fn is_group_element(&self, x: &BigUint) -> bool {
        !x.is_zero() && x < &self.p
    }
}

/// An encryption exponent in `[1, q-1]`, cleared on drop.
#[derive(Debug, Clone, PartialEq)]
pub struct Randomness(BigUint);

impl Randomness {
    /// Draw a fresh exponent in `[1, q-1]`. Never reuse one across
    /// ciphertexts or proofs.
    pub fn generate(rng_core: &mut (impl CryptoRng + RngCore), q: &BigUint) -> Self {
        Self(rng::random_scalar(rng_core, q))
    }
}

impl AsRef<BigUint> for Randomness {
    fn as_ref(&self) -> &BigUint {
        &self.0
    }
}

impl Zeroize for Randomness {
    fn zeroize(&mut self) {
        self.0.set_zero();
    }
}

impl Drop for Randomness {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// The private exponent alpha. No accessor: decryption is the only way out.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct SecretExponent(BigUint);

impl Zeroize for SecretExponent {
    fn zeroize(&mut self) {
        self.0.set_zero();
    }
}

impl Drop for SecretExponent {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// ElGamal public key: group parameters and `u = g^alpha`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicKey {
    group: GroupParams,
    u: BigUint,
}

/// ElGamal ciphertext `(v, e) = (g^beta, u^beta * g^b)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    pub v: BigUint,
    pub e: BigUint,
}

impl PublicKey {
    pub fn group(&self) -> &GroupParams {
        &self.group
    }

    pub fn u(&self) -> &BigUint {
        &self.u
    }

    /// Encrypt a bit under fresh randomness.
    ///
    /// Returns the ciphertext together with the exponent beta, which the
    /// voter needs as the witness for the validity proof.
    pub fn encrypt(
        &self,
        rng_core: &mut (impl CryptoRng + RngCore),
        bit: u8,
    ) -> VotanResult<(Ciphertext, Randomness)> {
        if bit > 1 {
            error!("refuse to encrypt non-bit message {}", bit);
            return Err(VotanError::InvalidMessage);
        }

        let beta = Randomness::generate(rng_core, &self.group.q);
        let v = self.group.g.modpow(beta.as_ref(), &self.group.p);
        let u_beta = self.u.modpow(beta.as_ref(), &self.group.p);
        let e = if bit == 1 {
            u_beta * &self.group.g % &self.group.p
        } else {
            u_beta
        };

        Ok((Ciphertext { v, e }, beta))
    }

    /// Re-encrypt under exponent `r`: `(v * g^r, e * u^r)`.
    /// The result decrypts to the same plaintext.
    pub fn reencrypt(&self, ct: &Ciphertext, r: &BigUint) -> Ciphertext {
        Ciphertext {
            v: &ct.v * self.group.g.modpow(r, &self.group.p) % &self.group.p,
            e: &ct.e * self.u.modpow(r, &self.group.p) % &self.group.p,
        }
    }

    /// Component-wise product of all ciphertexts.
    /// The aggregate decrypts to `g^(sum of plaintext bits)`.
    pub fn homomorphic_add(&self, cts: &[Ciphertext]) -> VotanResult<Ciphertext> {
        if cts.is_empty() {
            warn!("homomorphic product over an empty ciphertext list");
            return Err(VotanError::EmptyAggregation);
        }

        let mut v = BigUint::one();
        let mut e = BigUint::one();
        for ct in cts {
            v = v * &ct.v % &self.group.p;
            e = e * &ct.e % &self.group.p;
        }
        Ok(Ciphertext { v, e })
    }
}

/// ElGamal decryption key. Owns alpha exclusively and is moved, not cloned,
/// into the tallying role.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct DecryptionKey {
    public: PublicKey,
    alpha: SecretExponent,
}

impl DecryptionKey {
    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    /// Decrypt to the group element `g^m`, not `m`.
    pub fn decrypt(&self, ct: &Ciphertext) -> VotanResult<BigUint> {
        let p = &self.public.group.p;
        let v_alpha = ct.v.modpow(&self.alpha.0, p);
        let v_alpha_inv = arith::mod_inverse(&v_alpha, p)?;
        Ok(&ct.e * v_alpha_inv % p)
    }

    /// Decrypt an aggregate and recover the plaintext sum in `[0, max_sum]`.
    pub fn decrypt_sum(&self, aggregate: &Ciphertext, max_sum: usize) -> VotanResult<usize> {
        let g_sum = self.decrypt(aggregate)?;
        arith::discrete_log_small(
            &self.public.group.g,
            &g_sum,
            &self.public.group.p,
            max_sum,
        )
    }
}

/// Generate an election key pair over a fresh `bits`-wide safe-prime group.
/// Alpha is uniform in `[1, q-1]`.
pub fn keygen(rng_core: &mut (impl CryptoRng + RngCore), bits: u64) -> (PublicKey, DecryptionKey) {
    let group = GroupParams::generate(rng_core, bits);
    let alpha = rng::random_scalar(rng_core, &group.q);
    let u = group.g.modpow(&alpha, &group.p);

    let public = PublicKey { group, u };
    let decryption = DecryptionKey {
        public: public.clone(),
        alpha: SecretExponent(alpha),
    };
    (public, decryption)
}

/// Deterministic key generation from a recovery secret: same key and nonce,
/// same key pair.
pub fn keygen_recoverable(
    secret_recovery_key: &SecretRecoveryKey,
    session_nonce: &[u8],
    bits: u64,
) -> VotanResult<(PublicKey, DecryptionKey)> {
    let mut rng_core = rng::rng_seed_election_key(
        constants::KEYGEN_RNG_TAG,
        secret_recovery_key,
        session_nonce,
    )?;
    Ok(keygen(&mut rng_core, bits))
}
