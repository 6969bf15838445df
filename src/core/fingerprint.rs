// strings-scanner - core/fingerprint.rs
//
// Content identifiers for string values.

use crate::core::model::ContentId;
use sha2::{Digest, Sha256};

/// Compute the content identifier of `value`: hex SHA-256 of its UTF-8 bytes.
pub fn fingerprint(value: &str) -> ContentId {
    let digest = Sha256::digest(value.as_bytes());
    ContentId::from_hex(hex::encode(digest))
}
