//! Security utilities for token hashes and admin API key checks.

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use payflow_types::TokenHash;

/// Generates an unguessable token hash: 32 random bytes, hex encoded.
pub fn generate_token_hash() -> TokenHash {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    TokenHash::new(hex::encode(bytes))
}

/// Hashes an API key using SHA-256.
pub fn hash_api_key(key: &str) -> String {
    let hash = Sha256::digest(key.as_bytes());
    hex::encode(hash)
}

/// Verifies an API key against a stored hash using constant-time comparison.
pub fn verify_api_key(input: &str, stored_hash: &str) -> bool {
    let input_hash = hash_api_key(input);
    input_hash.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_hash_shape() {
        let hash = generate_token_hash();

        assert_eq!(hash.as_str().len(), 64);
        assert!(hash.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_token_hashes_are_unique() {
        let a = generate_token_hash();
        let b = generate_token_hash();
        assert_ne!(a, b);
    }

    #[test]
    fn test_api_key_hashing() {
        let key = "adm_test_abc123";
        let hash = hash_api_key(key);

        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_api_key(key));
    }

    #[test]
    fn test_api_key_verification() {
        let key = "adm_test_abc123";
        let hash = hash_api_key(key);

        assert!(verify_api_key(key, &hash));
        assert!(!verify_api_key("wrong_key", &hash));
    }
}
