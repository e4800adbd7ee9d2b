//! API for votan users
pub type VotanResult<T> = Result<T, VotanError>;
pub type BytesVec = Vec<u8>;

/// Failures surfaced to the caller.
///
/// Vote-level rejections (bad token, bad proof) are not errors: the voting
/// centre recovers from them locally and records a
/// [`RejectReason`](crate::token::RejectReason) instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotanError {
    /// Encryption of a message that is not a bit.
    InvalidMessage,
    /// Modular inverse of a value not coprime to the modulus.
    NoInverse,
    /// The aggregate discrete log exceeds the ballot count.
    DlNotFound,
    /// Homomorphic product over an empty ciphertext list.
    EmptyAggregation,
    /// A voter id was registered twice.
    AlreadyIssued,
    /// Structural mismatch or missing proof at mix verification.
    MixInvalid,
    /// The audit hash chain does not verify.
    IntegrityBroken,
    /// A role operation was invoked outside its election phase.
    OutOfPhase,
    /// Internal invariant violation, see logs for details.
    Fatal,
}

/// Expose votan's (de)serialization functions
/// that use the appropriate bincode config options.
pub use super::wire_bytes::{decode, encode};
