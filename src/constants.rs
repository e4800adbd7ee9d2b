// Domain separation constants for hash function calls
pub const VOTE_PROOF_TAG: u8 = 0x00;
pub const MIX_COMMIT_TAG: u8 = 0x01;
pub const AUDIT_EVENT_TAG: u8 = 0x02;
pub const KEYGEN_RNG_TAG: u8 = 0x03;
