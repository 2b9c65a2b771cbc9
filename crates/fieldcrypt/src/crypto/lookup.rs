//! Keyless helpers: lookup hashes and random identifiers.

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use sha2::{Digest, Sha256};

/// Default byte length of [`generate_secure_id`] output.
pub const DEFAULT_SECURE_ID_LEN: usize = 32;

/// Deterministic lowercase-hex SHA-256 of `plaintext`.
///
/// Stored next to an encrypted column so equality queries can run against
/// the digest. Independent of any key state.
pub fn hash_for_lookup(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}

/// `length` bytes from the OS CSPRNG, hex encoded.
pub fn generate_secure_id(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn lookup_hash_is_deterministic() {
        assert_eq!(
            hash_for_lookup("user@example.com"),
            hash_for_lookup("user@example.com")
        );
        assert_ne!(
            hash_for_lookup("user@example.com"),
            hash_for_lookup("user2@example.com")
        );
    }

    #[test]
    fn lookup_hash_known_vector() {
        assert_eq!(
            hash_for_lookup("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_for_lookup("").len(), 64);
    }

    #[test]
    fn secure_id_length() {
        let id = generate_secure_id(DEFAULT_SECURE_ID_LEN);
        assert_eq!(id.len(), 64);
        assert_eq!(hex::decode(&id).unwrap().len(), DEFAULT_SECURE_ID_LEN);
        assert_eq!(hex::decode(generate_secure_id(5)).unwrap().len(), 5);
        assert!(generate_secure_id(0).is_empty());
    }

    #[test]
    fn secure_ids_do_not_collide() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_secure_id(16)).collect();
        assert_eq!(ids.len(), 1000);
    }
}
