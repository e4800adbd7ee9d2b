//! Fiat-Shamir transcript hashing.

use num_bigint::BigUint;
use num_traits::Zero;
use sha2::{Digest, Sha256};

/// One transcript element.
///
/// Canonicalisation: integers become their minimal big-endian bytes (zero
/// contributes nothing), counts are absorbed as integers, strings as UTF-8,
/// byte sequences as-is.
#[derive(Debug, Clone, Copy)]
pub enum Element<'a> {
    Num(&'a BigUint),
    Count(usize),
    Text(&'a str),
    Bytes(&'a [u8]),
}

/// Absorb `elements` in argument order into a single SHA-256 stream under a
/// domain-separation `tag` and read the digest as a big-endian unsigned
/// integer. Reductions mod q are performed by the caller.
///
/// Same element sequence, same digest. Any reordering changes the output,
/// which is what binds each proof to its transcript.
pub fn hash_to_challenge(tag: u8, elements: &[Element<'_>]) -> BigUint {
    let mut hasher = Sha256::new();
    hasher.update(tag.to_be_bytes());
    for element in elements {
        match element {
            Element::Num(n) => hasher.update(be_bytes_minimal(n)),
            Element::Count(n) => hasher.update(be_bytes_minimal(&BigUint::from(*n))),
            Element::Text(s) => hasher.update(s.as_bytes()),
            Element::Bytes(b) => hasher.update(b),
        }
    }
    BigUint::from_bytes_be(&hasher.finalize())
}

fn be_bytes_minimal(n: &BigUint) -> Vec<u8> {
    if n.is_zero() {
        Vec::new()
    } else {
        n.to_bytes_be()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let n = BigUint::from(123456789u64);
        let elements = [
            Element::Num(&n),
            Element::Text("transcript"),
            Element::Bytes(&[0x01, 0x02]),
            Element::Count(7),
        ];
        assert_eq!(
            hash_to_challenge(0x2a, &elements),
            hash_to_challenge(0x2a, &elements)
        );
    }

    #[test]
    fn order_sensitive() {
        let a = BigUint::from(17u32);
        let b = BigUint::from(23u32);
        assert_ne!(
            hash_to_challenge(0, &[Element::Num(&a), Element::Num(&b)]),
            hash_to_challenge(0, &[Element::Num(&b), Element::Num(&a)])
        );
    }

    #[test]
    fn tag_separates_domains() {
        let n = BigUint::from(42u32);
        assert_ne!(
            hash_to_challenge(0, &[Element::Num(&n)]),
            hash_to_challenge(1, &[Element::Num(&n)])
        );
    }

    #[test]
    fn zero_encodes_empty() {
        let zero = BigUint::zero();
        assert_eq!(
            hash_to_challenge(0, &[Element::Num(&zero)]),
            hash_to_challenge(0, &[])
        );
    }

    #[test]
    fn count_matches_num() {
        let n = BigUint::from(300usize);
        assert_eq!(
            hash_to_challenge(0, &[Element::Count(300)]),
            hash_to_challenge(0, &[Element::Num(&n)])
        );
    }
}
