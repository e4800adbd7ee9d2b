use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, warn};

use super::api::{BytesVec, VotanError, VotanResult};

const VOTAN_SERIALIZATION_VERSION: u16 = 0;

/// Serialize a payload inside a versioned envelope.
pub fn encode<T: Serialize>(payload: &T) -> VotanResult<BytesVec> {
    serialize(&BytesVecVersioned {
        version: VOTAN_SERIALIZATION_VERSION,
        payload: serialize(payload)?,
    })
}

/// deserialization failures are non-fatal: do not return VotanResult
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Option<T> {
    let bytes_versioned: BytesVecVersioned = bincode::deserialize(bytes)
        .map_err(|err| {
            warn!("outer deserialization failure: {}", err.to_string());
        })
        .ok()?;
    if bytes_versioned.version != VOTAN_SERIALIZATION_VERSION {
        warn!(
            "encoding version {}, expected {}",
            bytes_versioned.version, VOTAN_SERIALIZATION_VERSION
        );
        return None;
    }
    bincode::deserialize(&bytes_versioned.payload)
        .map_err(|err| {
            warn!("inner deserialization failure: {}", err.to_string());
        })
        .ok()
}

fn serialize<T: Serialize>(value: &T) -> VotanResult<BytesVec> {
    bincode::serialize(value).map_err(|err| {
        error!("serialization failure: {}", err.to_string());
        VotanError::Fatal
    })
}

#[derive(serde::Serialize, serde::Deserialize)]
struct BytesVecVersioned {
    version: u16,
    payload: BytesVec,
}
