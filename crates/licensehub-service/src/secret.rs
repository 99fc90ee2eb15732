//! Shared-secret comparison.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Whether `provided` equals `expected`, compared in constant time.
///
/// Both values are MACed under `expected` and the tags are checked with
/// [`Mac::verify_slice`], so neither content nor length leaks through
/// timing. An empty `expected` never matches.
pub fn secrets_match(expected: &[u8], provided: &[u8]) -> bool {
    if expected.is_empty() {
        return false;
    }
    let Ok(reference) = HmacSha256::new_from_slice(expected) else {
        return false;
    };
    let tag = reference.chain_update(expected).finalize().into_bytes();

    match HmacSha256::new_from_slice(expected) {
        Ok(mac) => mac.chain_update(provided).verify_slice(&tag).is_ok(),
        Err(_) => false,
    }
}
