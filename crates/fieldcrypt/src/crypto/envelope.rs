//! Text encoding of encrypted field values.
//!
//! ```text
//! legacy:    base64(nonce[16] || tag[16] || ciphertext)
//! versioned: v<key-version>:base64(nonce[16] || tag[16] || ciphertext)
//! ```
//!
//! Base64 is the standard, padded alphabet. `:` never occurs in it, so the
//! presence of a `:` alone selects the versioned form.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::cipher::{EncryptedField, NONCE_LEN, TAG_LEN};
use crate::error::CryptoError;

/// Shortest decodable payload: nonce and tag with an empty ciphertext.
pub const MIN_PAYLOAD_LEN: usize = NONCE_LEN + TAG_LEN;

const VERSION_SEPARATOR: char = ':';
const VERSION_MARKER: char = 'v';

/// A parsed envelope: an optional key version plus the encrypted parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Key version named by the envelope; `None` for legacy envelopes.
    pub key_version: Option<u32>,
    pub field: EncryptedField,
}

impl Envelope {
    /// Encode to the text token handed to callers.
    pub fn encode(&self) -> String {
        let mut payload =
            Vec::with_capacity(MIN_PAYLOAD_LEN + self.field.ciphertext.len());
        payload.extend_from_slice(&self.field.nonce);
        payload.extend_from_slice(&self.field.tag);
        payload.extend_from_slice(&self.field.ciphertext);
        let body = STANDARD.encode(payload);

        match self.key_version {
            Some(v) => format!("{VERSION_MARKER}{v}{VERSION_SEPARATOR}{body}"),
            None => body,
        }
    }

    /// Parse a text token back into an [`Envelope`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedEnvelope`] if the version prefix is
    /// invalid, the body is not valid base64, or the decoded payload is
    /// shorter than [`MIN_PAYLOAD_LEN`].
    pub fn parse(token: &str) -> Result<Self, CryptoError> {
        let (key_version, body) = match token.split_once(VERSION_SEPARATOR) {
            Some((prefix, body)) => (Some(parse_version(prefix)?), body),
            None => (None, token),
        };

        let payload = STANDARD
            .decode(body)
            .map_err(|_| CryptoError::MalformedEnvelope("body is not valid base64".into()))?;
        if payload.len() < MIN_PAYLOAD_LEN {
            return Err(CryptoError::MalformedEnvelope(format!(
                "payload is {} bytes, need at least {MIN_PAYLOAD_LEN}",
                payload.len()
            )));
        }

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&payload[..NONCE_LEN]);
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&payload[NONCE_LEN..MIN_PAYLOAD_LEN]);

        Ok(Self {
            key_version,
            field: EncryptedField {
                nonce,
                tag,
                ciphertext: payload[MIN_PAYLOAD_LEN..].to_vec(),
            },
        })
    }
}

fn parse_version(prefix: &str) -> Result<u32, CryptoError> {
    prefix
        .strip_prefix(VERSION_MARKER)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| CryptoError::MalformedEnvelope(format!("invalid version prefix {prefix:?}")))
}
