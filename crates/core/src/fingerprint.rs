//! Content fingerprinting for change detection.
//!
//! A fingerprint is the lowercase hex SHA-256 of the content. It only decides
//! whether cached content is still current; it is not a security boundary.

use sha2::{Digest, Sha256};

/// Compute the fingerprint of `content`.
pub fn fingerprint(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
