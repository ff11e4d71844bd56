//! Transaction ID derivation.
//!
//! `txId = hex(SHA-256(nonce || creator))` with a fresh random nonce per
//! invocation. The creator bytes bind the ID to the submitting identity; the
//! nonce makes IDs from the same creator unique.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::config::TX_NONCE_LENGTH;

/// Generate a fresh transaction ID for `creator`.
pub fn generate(creator: &str) -> String {
    let mut nonce = [0u8; TX_NONCE_LENGTH];
    rand::thread_rng().fill_bytes(&mut nonce);
    compute(&nonce, creator.as_bytes())
}

/// Deterministic part of the derivation, split out for replay and tests.
pub fn compute(nonce: &[u8], creator: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(creator);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_id_is_64_hex_chars() {
        let id = generate("Org1MSP::admin");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn fresh_nonce_per_call() {
        assert_ne!(generate("creator"), generate("creator"));
    }

    #[test]
    fn compute_is_deterministic() {
        let nonce = [7u8; TX_NONCE_LENGTH];
        assert_eq!(compute(&nonce, b"alice"), compute(&nonce, b"alice"));
        assert_ne!(compute(&nonce, b"alice"), compute(&nonce, b"bob"));
    }
}
