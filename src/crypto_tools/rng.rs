use hmac::{Mac, SimpleHmac};
use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use tracing::error;
use zeroize::Zeroize;

use crate::sdk::api::{VotanError, VotanResult};

const SESSION_NONCE_LENGTH_MIN: usize = 4;
const SESSION_NONCE_LENGTH_MAX: usize = 256;

/// Long-lived secret from which an authority can re-derive its election key
/// pair. Never leaves the authority role.
#[derive(Debug, Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretRecoveryKey(pub(crate) [u8; 64]);

impl TryFrom<&[u8]> for SecretRecoveryKey {
    type Error = std::array::TryFromSliceError;

    fn try_from(v: &[u8]) -> Result<Self, Self::Error> {
        Ok(Self(v.try_into()?))
    }
}

/// Sample a uniform scalar in `[1, q-1]`.
///
/// `gen_biguint_range` rejection-samples under the hood, so draws carry no
/// modulo bias. Every exponent in the crate (alpha, beta, proof nonces,
/// simulated challenges and responses, re-encryption exponents) comes from
/// here.
pub fn random_scalar(rng: &mut (impl CryptoRng + RngCore), q: &BigUint) -> BigUint {
    rng.gen_biguint_range(&BigUint::one(), q)
}

/// Initialize a RNG by hashing the arguments.
/// Intended for use re-deriving an election key pair from a recovery secret.
pub fn rng_seed_election_key(
    tag: u8,
    secret_recovery_key: &SecretRecoveryKey,
    session_nonce: &[u8],
) -> VotanResult<impl CryptoRng + RngCore> {
    if session_nonce.len() < SESSION_NONCE_LENGTH_MIN
        || session_nonce.len() > SESSION_NONCE_LENGTH_MAX
    {
        error!(
            "invalid session_nonce length {} not in [{},{}]",
            session_nonce.len(),
            SESSION_NONCE_LENGTH_MIN,
            SESSION_NONCE_LENGTH_MAX
        );
        return Err(VotanError::Fatal);
    }

    let mut prf =
        SimpleHmac::<Sha256>::new_from_slice(&secret_recovery_key.0[..]).map_err(|_| {
            error!("failure to initialize hmac");
            VotanError::Fatal
        })?;

    prf.update(&tag.to_be_bytes());
    prf.update(session_nonce);

    let seed = prf.finalize().into_bytes().into();

    Ok(ChaCha20Rng::from_seed(seed))
}
