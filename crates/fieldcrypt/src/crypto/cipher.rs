//! AES-256-GCM encryption and decryption of individual field values.
//!
//! The cipher runs with a 16-byte (128-bit) nonce rather than the usual
//! 96-bit one: stored envelopes carry 16-byte nonces and must stay readable.
//! A fresh nonce is drawn from the OS CSPRNG for every call.

use aes_gcm::{
    aead::{consts::U16, rand_core::RngCore, AeadInPlace, KeyInit, OsRng},
    aes::Aes256,
    AesGcm, Nonce, Tag,
};
use thiserror::Error;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of the per-envelope nonce.
pub const NONCE_LEN: usize = 16;

/// Byte length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// AES-256-GCM with a 128-bit nonce and a 128-bit tag.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// The raw parts of one encrypted value, before text encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedField {
    pub nonce: [u8; NONCE_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The key is the wrong length (must be [`KEY_LEN`] bytes).
    #[error("invalid key length: expected {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    /// Encryption failed, or the tag did not verify on decryption.
    #[error("aead operation failed")]
    AeadFailure,
}

impl From<CipherError> for crate::error::CryptoError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::InvalidKeyLength(n) => Self::InvalidKeyLength(n),
            CipherError::AeadFailure => Self::AuthenticationFailure,
        }
    }
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes.
pub fn encrypt_field(plaintext: &[u8], key: &[u8]) -> Result<EncryptedField, CipherError> {
    let cipher = build_cipher(key)?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::<U16>::from_slice(&nonce), b"", &mut buffer)
        .map_err(|_| CipherError::AeadFailure)?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(&tag);

    Ok(EncryptedField {
        nonce,
        tag: tag_bytes,
        ciphertext: buffer,
    })
}

/// Decrypt an [`EncryptedField`] back to plaintext bytes.
///
/// No bytes are returned unless the tag verifies.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes.
/// Returns [`CipherError::AeadFailure`] if authentication fails (wrong key or tampered data).
pub fn decrypt_field(field: &EncryptedField, key: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = build_cipher(key)?;
    let mut buffer = field.ciphertext.clone();
    cipher
        .decrypt_in_place_detached(
            Nonce::<U16>::from_slice(&field.nonce),
            b"",
            &mut buffer,
            Tag::from_slice(&field.tag),
        )
        .map_err(|_| CipherError::AeadFailure)?;
    Ok(buffer)
}

fn build_cipher(key: &[u8]) -> Result<Aes256Gcm16, CipherError> {
    if key.len() != KEY_LEN {
        return Err(CipherError::InvalidKeyLength(key.len()));
    }
    Aes256Gcm16::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength(key.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_key() -> Vec<u8> {
        let mut key = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let key = random_key();
        let encrypted = encrypt_field(b"123-45-6789", &key).unwrap();
        assert_eq!(encrypted.ciphertext.len(), 11);
        let decrypted = decrypt_field(&encrypted, &key).unwrap();
        assert_eq!(decrypted, b"123-45-6789");
    }

    #[test]
    fn empty_plaintext_round_trip() {
        let key = random_key();
        let encrypted = encrypt_field(b"", &key).unwrap();
        assert!(encrypted.ciphertext.is_empty());
        assert!(decrypt_field(&encrypted, &key).unwrap().is_empty());
    }

    #[test]
    fn nonces_differ_between_calls() {
        let key = random_key();
        let a = encrypt_field(b"same", &key).unwrap();
        let b = encrypt_field(b"same", &key).unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn wrong_key_fails_decryption() {
        let encrypted = encrypt_field(b"secret", &random_key()).unwrap();
        assert!(matches!(
            decrypt_field(&encrypted, &random_key()),
            Err(CipherError::AeadFailure)
        ));
    }

    #[test]
    fn invalid_key_length_rejected() {
        assert!(matches!(
            encrypt_field(b"x", &[0u8; 16]),
            Err(CipherError::InvalidKeyLength(16))
        ));
    }

    #[test]
    fn tampered_tag_fails_auth() {
        let key = random_key();
        let mut field = encrypt_field(b"tamper me", &key).unwrap();
        field.tag[TAG_LEN - 1] ^= 0x01;
        assert!(decrypt_field(&field, &key).is_err());
    }

    #[test]
    fn tampered_nonce_fails_auth() {
        let key = random_key();
        let mut field = encrypt_field(b"tamper me", &key).unwrap();
        field.nonce[0] ^= 0x80;
        assert!(decrypt_field(&field, &key).is_err());
    }
}
