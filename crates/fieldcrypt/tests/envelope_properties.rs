//! End-to-end properties of the public `KeyManager` API with a fixed
//! derived test key: round trips, nonce freshness, tamper detection, and
//! the keyless helpers.

use std::{collections::HashSet, sync::Arc};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use fieldcrypt::{
    crypto::{Envelope, NONCE_LEN, TAG_LEN},
    dek::DerivedKeySource,
    generate_secure_id, hash_for_lookup, CryptoError, KeyManager, ManagerOptions,
};

const CARD: &str = "4111-1111-1111-1111";

fn manager(versioned: bool) -> KeyManager {
    KeyManager::new(
        Arc::new(DerivedKeySource::new(Some("fixed-test-key"))),
        ManagerOptions {
            versioned_envelopes: versioned,
            max_key_versions: 5,
        },
    )
}

/// Split a token into its optional `v<N>:` prefix and decoded payload.
fn split(token: &str) -> (&str, Vec<u8>) {
    match token.split_once(':') {
        Some((prefix, body)) => (&token[..prefix.len() + 1], STANDARD.decode(body).unwrap()),
        None => ("", STANDARD.decode(token).unwrap()),
    }
}

fn flip_bit(token: &str, index: usize) -> String {
    let (prefix, mut payload) = split(token);
    payload[index] ^= 0x01;
    format!("{prefix}{}", STANDARD.encode(payload))
}

#[tokio::test]
async fn card_number_round_trip() {
    for versioned in [false, true] {
        let keys = manager(versioned);
        let envelope = keys.encrypt(CARD).await.unwrap();
        assert_eq!(keys.decrypt(&envelope).await.unwrap(), CARD);
    }
}

#[tokio::test]
async fn corrupting_last_character_fails_authentication() {
    for versioned in [false, true] {
        let keys = manager(versioned);
        let envelope = keys.encrypt(CARD).await.unwrap();
        // 16 + 16 + 19 = 51 bytes: no base64 padding, the last char is data.
        assert!(!envelope.ends_with('='));

        let mut corrupted = envelope.clone();
        let last = corrupted.pop().unwrap();
        corrupted.push(if last == 'A' { 'B' } else { 'A' });

        assert!(matches!(
            keys.decrypt(&corrupted).await,
            Err(CryptoError::AuthenticationFailure)
        ));
    }
}

#[tokio::test]
async fn legacy_envelope_layout() {
    let keys = manager(false);
    let envelope = keys.encrypt(CARD).await.unwrap();
    let (prefix, payload) = split(&envelope);
    assert_eq!(prefix, "");
    assert_eq!(payload.len(), NONCE_LEN + TAG_LEN + CARD.len());
}

#[tokio::test]
async fn same_plaintext_gives_distinct_envelopes() {
    let keys = manager(true);
    let a = keys.encrypt("same value").await.unwrap();
    let b = keys.encrypt("same value").await.unwrap();
    assert_ne!(a, b);
    assert_eq!(keys.decrypt(&a).await.unwrap(), "same value");
    assert_eq!(keys.decrypt(&b).await.unwrap(), "same value");

    let nonce_a = Envelope::parse(&a).unwrap().field.nonce;
    let nonce_b = Envelope::parse(&b).unwrap().field.nonce;
    assert_ne!(nonce_a, nonce_b);
}

#[tokio::test]
async fn bit_flips_in_tag_or_ciphertext_fail_authentication() {
    let keys = manager(true);
    let envelope = keys.encrypt("integrity-protected").await.unwrap();
    let tag_index = NONCE_LEN + 3;
    let body_index = NONCE_LEN + TAG_LEN + 5;
    for index in [tag_index, body_index] {
        assert!(matches!(
            keys.decrypt(&flip_bit(&envelope, index)).await,
            Err(CryptoError::AuthenticationFailure)
        ));
    }
}

#[tokio::test]
async fn short_tokens_are_malformed() {
    let keys = manager(true);
    let short = STANDARD.encode([0u8; NONCE_LEN + TAG_LEN - 1]);
    for token in [short.clone(), format!("v1:{short}"), String::new()] {
        assert!(matches!(
            keys.decrypt(&token).await,
            Err(CryptoError::MalformedEnvelope(_))
        ));
    }
}

#[tokio::test]
async fn wrong_key_fails_authentication() {
    let writer = manager(false);
    let reader = KeyManager::new(
        Arc::new(DerivedKeySource::new(Some("another-key"))),
        ManagerOptions::default(),
    );
    let envelope = writer.encrypt(CARD).await.unwrap();
    assert!(matches!(
        reader.decrypt(&envelope).await,
        Err(CryptoError::AuthenticationFailure)
    ));
}

#[tokio::test]
async fn unicode_and_empty_values_round_trip() {
    let keys = manager(true);
    for value in ["", "Zoë Saldaña", "ключ", "🔐"] {
        let envelope = keys.encrypt(value).await.unwrap();
        assert_eq!(keys.decrypt(&envelope).await.unwrap(), value);
    }
}

#[test]
fn lookup_hash_scenario() {
    let first = hash_for_lookup("user@example.com");
    assert_eq!(first, hash_for_lookup("user@example.com"));
    assert_ne!(first, hash_for_lookup("user2@example.com"));
    assert_eq!(first.len(), 64);
    assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn secure_ids_decode_to_requested_length() {
    let ids: HashSet<String> = (0..256).map(|_| generate_secure_id(32)).collect();
    assert_eq!(ids.len(), 256);
    for id in &ids {
        assert_eq!(hex::decode(id).unwrap().len(), 32);
    }
}
