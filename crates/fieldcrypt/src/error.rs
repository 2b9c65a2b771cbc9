//! Error taxonomy of the field encryption core.

use common::ServiceError;
use thiserror::Error;

use crate::crypto::KEY_LEN;
use crate::dek::store::DekError;

/// Errors returned by [`crate::dek::KeyManager`] operations.
///
/// Cryptographic failures are always propagated; the caller decides whether
/// to fail its request or surface a generic error.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The key source could not produce key material (managed service
    /// unreachable, request rejected, or unusable key returned).
    #[error("key source unavailable: {0}")]
    KeySourceUnavailable(String),

    /// The input to decrypt is not a syntactically valid envelope.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The authentication tag did not verify: tampered data or wrong key.
    #[error("envelope authentication failed")]
    AuthenticationFailure,

    /// The envelope names a key version that is not (or no longer) held.
    #[error("unknown key version: v{0}")]
    UnknownKeyVersion(u32),

    /// Key material of the wrong size reached the cipher layer.
    #[error("invalid key length: expected {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    /// No further key version can be issued.
    #[error("key versions exhausted at v{0}")]
    KeyVersionsExhausted(u32),
}

impl From<DekError> for CryptoError {
    fn from(e: DekError) -> Self {
        match e {
            DekError::InvalidLength(len) => CryptoError::InvalidKeyLength(len),
            DekError::VersionsExhausted(version) => CryptoError::KeyVersionsExhausted(version),
        }
    }
}

impl From<CryptoError> for ServiceError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::MalformedEnvelope(_) => ServiceError::BadRequest(e.to_string()),
            CryptoError::AuthenticationFailure | CryptoError::UnknownKeyVersion(_) => {
                ServiceError::Unprocessable(e.to_string())
            }
            CryptoError::KeySourceUnavailable(_) => ServiceError::Unavailable(e.to_string()),
            CryptoError::InvalidKeyLength(_) | CryptoError::KeyVersionsExhausted(_) => {
                ServiceError::Internal(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_service_status() {
        let status = |e: CryptoError| ServiceError::from(e).http_status();
        assert_eq!(status(CryptoError::MalformedEnvelope("short".into())), 400);
        assert_eq!(status(CryptoError::AuthenticationFailure), 422);
        assert_eq!(status(CryptoError::UnknownKeyVersion(3)), 422);
        assert_eq!(status(CryptoError::KeySourceUnavailable("down".into())), 503);
        assert_eq!(status(CryptoError::InvalidKeyLength(16)), 500);
        assert_eq!(status(CryptoError::KeyVersionsExhausted(u32::MAX)), 500);
    }

    #[test]
    fn dek_errors_convert() {
        assert!(matches!(
            CryptoError::from(DekError::VersionsExhausted(9)),
            CryptoError::KeyVersionsExhausted(9)
        ));
        assert!(matches!(
            CryptoError::from(DekError::InvalidLength(16)),
            CryptoError::InvalidKeyLength(16)
        ));
    }

    #[test]
    fn unknown_version_display() {
        assert_eq!(
            CryptoError::UnknownKeyVersion(7).to_string(),
            "unknown key version: v7"
        );
    }
}
