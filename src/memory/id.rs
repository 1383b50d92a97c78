//! Deterministic fragment identifiers.

use sha2::{Digest, Sha256};

/// Id of the fragment recording `(query, response)`.
///
/// Lowercase hex SHA-256 of the query length (little-endian `u64`), the
/// query bytes and the response bytes. The length prefix keeps the split
/// point between query and response part of the digest. Stable across
/// processes, so re-recording an exchange hits the same row.
pub fn fragment_id(query: &str, response: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update((query.len() as u64).to_le_bytes());
    hasher.update(query.as_bytes());
    hasher.update(response.as_bytes());
    format!("{:x}", hasher.finalize())
}
