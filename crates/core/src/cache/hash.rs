//! Content-addressed entry key generation.

use sha2::{Digest, Sha256};

use crate::http::RequestKey;

/// Compute the storage key for a request key.
pub fn compute_cache_key(key: &RequestKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.method.as_bytes());
    hasher.update(b"\n");
    hasher.update(key.url.as_bytes());
    hasher.update(b"\n");
    hasher.update(key.vary.as_bytes());
    hex::encode(hasher.finalize())
}
