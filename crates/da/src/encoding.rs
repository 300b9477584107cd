//! ID encoding used by the reference store.
//!
//! An ID is `LE64(height) ++ SHA-256(blob)`: the height prefix makes IDs of
//! identical blobs submitted at different heights distinct, the suffix is the
//! blob's commitment.

use crate::error::DaError;
use crate::Id;

/// Length of the little-endian height prefix of an ID.
pub const ID_PREFIX_LEN: usize = 8;

/// Build an ID from a height and a commitment.
pub fn encode_id(height: u64, commitment: &[u8]) -> Id {
    let mut id = Vec::with_capacity(ID_PREFIX_LEN + commitment.len());
    id.extend_from_slice(&height.to_le_bytes());
    id.extend_from_slice(commitment);
    id
}

/// Read the height prefix of an ID.
pub fn decode_height(id: &[u8]) -> Result<u64, DaError> {
    let prefix: [u8; ID_PREFIX_LEN] = id
        .get(..ID_PREFIX_LEN)
        .and_then(|p| p.try_into().ok())
        .ok_or(DaError::InvalidId)?;
    Ok(u64::from_le_bytes(prefix))
}

/// The commitment part of an ID, if the ID has a height prefix.
pub fn id_commitment(id: &[u8]) -> Option<&[u8]> {
    id.get(ID_PREFIX_LEN..)
}
