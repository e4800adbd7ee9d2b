//! Primality testing and modular arithmetic over the safe-prime group.

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use tracing::warn;

use crate::sdk::api::{VotanError, VotanResult};

/// Composite escape probability is at most 4^-25.
pub const MILLER_RABIN_ROUNDS: u32 = 25;

/// Trial-division sieve applied before Miller-Rabin.
const SMALL_PRIMES: [u32; 54] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251,
];

/// Miller-Rabin primality test with CSPRNG-chosen bases.
pub fn is_prime(rng: &mut (impl CryptoRng + RngCore), n: &BigUint, rounds: u32) -> bool {
    let two = BigUint::from(2u32);
    if n < &two {
        return false;
    }
    for small in SMALL_PRIMES {
        let small = BigUint::from(small);
        if n == &small {
            return true;
        }
        if (n % &small).is_zero() {
            return false;
        }
    }

    // n - 1 = d * 2^s with d odd
    let n_minus_1 = n - 1u32;
    let s = n_minus_1.trailing_zeros().unwrap_or(0);
    let d = &n_minus_1 >> s;

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_1);
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_1 {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Smallest prime >= n (n odd assumed large; even inputs are bumped to odd).
fn next_prime(rng: &mut (impl CryptoRng + RngCore), n: &BigUint) -> BigUint {
    let mut candidate = n | BigUint::one();
    while !is_prime(rng, &candidate, MILLER_RABIN_ROUNDS) {
        candidate += 2u32;
    }
    candidate
}

/// Generate a safe prime `p = 2q + 1` where `q` is a (bits-1)-bit prime.
///
/// Returns `(p, q)`. Samples a (bits-1)-bit odd integer with the high bit
/// set, advances to the next prime, and accepts iff the width survived and
/// `2q + 1` is prime.
pub fn generate_safe_prime(rng: &mut (impl CryptoRng + RngCore), bits: u64) -> (BigUint, BigUint) {
    debug_assert!(bits >= 8);
    loop {
        let mut q = rng.gen_biguint(bits - 1);
        q.set_bit(bits - 2, true);
        q |= BigUint::one();
        let q = next_prime(rng, &q);

        if q.bits() != bits - 1 {
            continue;
        }

        let p = (&q << 1u32) | BigUint::one();
        if is_prime(rng, &p, MILLER_RABIN_ROUNDS) {
            return (p, q);
        }
    }
}

/// Find a generator of the order-q subgroup of Z*_p where `p = 2q + 1`.
///
/// Squaring a uniform `h` lands in the subgroup of quadratic residues, so
/// this yields a uniform generator.
pub fn find_subgroup_generator(
    rng: &mut (impl CryptoRng + RngCore),
    p: &BigUint,
    q: &BigUint,
) -> BigUint {
    let two = BigUint::from(2u32);
    loop {
        let h = rng.gen_biguint_range(&two, &(p - 1u32));
        let g = h.modpow(&two, p);
        if !g.is_one() && g.modpow(q, p).is_one() {
            return g;
        }
    }
}

/// Multiplicative inverse of `a` modulo `m`.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> VotanResult<BigUint> {
    let ext = BigInt::from(a.clone()).extended_gcd(&BigInt::from(m.clone()));
    if !ext.gcd.is_one() {
        warn!("no modular inverse: gcd is not 1");
        return Err(VotanError::NoInverse);
    }
    let inv = ext.x.mod_floor(&BigInt::from(m.clone()));
    inv.to_biguint().ok_or(VotanError::Fatal)
}

/// Find `x` in `[0, max_value]` with `g^x = h (mod p)` by linear search.
///
/// Only used for the aggregate tally, where `max_value` is the ballot count.
pub fn discrete_log_small(
    g: &BigUint,
    h: &BigUint,
    p: &BigUint,
    max_value: usize,
) -> VotanResult<usize> {
    let mut current = BigUint::one();
    for x in 0..=max_value {
        if &current == h {
            return Ok(x);
        }
        current = &current * g % p;
    }
    warn!("no discrete log found up to {}", max_value);
    Err(VotanError::DlNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test; // enable logs in tests

    #[test]
    fn primality() {
        let mut rng = rand::thread_rng();
        for known in [2u32, 3, 17, 101, 7919] {
            assert!(is_prime(&mut rng, &BigUint::from(known), MILLER_RABIN_ROUNDS));
        }
        // 561 is a Carmichael number
        for composite in [0u32, 1, 4, 561, 7917] {
            assert!(!is_prime(
                &mut rng,
                &BigUint::from(composite),
                MILLER_RABIN_ROUNDS
            ));
        }
    }

    #[test]
    #[traced_test]
    fn safe_prime_structure() {
        let mut rng = rand::thread_rng();
        let bits = 64;
        let (p, q) = generate_safe_prime(&mut rng, bits);

        assert_eq!(p.bits(), bits);
        assert_eq!(q.bits(), bits - 1);
        assert_eq!(p, (&q << 1u32) | BigUint::one());
        assert!(is_prime(&mut rng, &p, MILLER_RABIN_ROUNDS));
        assert!(is_prime(&mut rng, &q, MILLER_RABIN_ROUNDS));
    }

    #[test]
    fn generator_has_subgroup_order() {
        let mut rng = rand::thread_rng();
        let (p, q) = generate_safe_prime(&mut rng, 64);
        let g = find_subgroup_generator(&mut rng, &p, &q);

        assert!(!g.is_one());
        assert!(g.modpow(&q, &p).is_one());
    }

    #[test]
    fn mod_inverse_round_trip() {
        let a = BigUint::from(3u32);
        let m = BigUint::from(11u32);
        let inv = mod_inverse(&a, &m).unwrap();
        assert_eq!(inv, BigUint::from(4u32));
        assert!((a * inv % m).is_one());
    }

    #[test]
    fn mod_inverse_requires_coprimality() {
        let err = mod_inverse(&BigUint::from(4u32), &BigUint::from(8u32)).unwrap_err();
        assert_eq!(err, VotanError::NoInverse);
    }

    #[test]
    fn discrete_log_in_z23() {
        // successive powers of 5 mod 23
        let g = BigUint::from(5u32);
        let p = BigUint::from(23u32);
        let expected = [1u32, 5, 2, 10, 4, 20, 8, 17, 16, 11];
        let mut current = BigUint::one();
        for want in expected {
            assert_eq!(current, BigUint::from(want));
            current = current * &g % &p;
        }

        assert_eq!(
            discrete_log_small(&g, &BigUint::from(17u32), &p, 20).unwrap(),
            7
        );
    }

    #[test]
    fn discrete_log_out_of_range() {
        // 5^7 = 17 mod 23, unreachable with max_value 5
        let err = discrete_log_small(
            &BigUint::from(5u32),
            &BigUint::from(17u32),
            &BigUint::from(23u32),
            5,
        )
        .unwrap_err();
        assert_eq!(err, VotanError::DlNotFound);
    }
}
