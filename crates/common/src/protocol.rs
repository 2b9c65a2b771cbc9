//! Request and response bodies of the field encryption HTTP API.
//!
//! All bodies are JSON. Envelopes are opaque text tokens; callers store them
//! verbatim and hand them back unchanged for decryption.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Encrypt / decrypt
// ---------------------------------------------------------------------------

/// Request body for `POST /encrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptRequest {
    /// Field value to protect.
    pub plaintext: String,
}

/// Successful response body for `POST /encrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptResponse {
    /// Encoded envelope to persist in place of the plaintext.
    pub envelope: String,
}

/// Request body for `POST /decrypt` and `POST /reencrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeRequest {
    /// Envelope previously returned by `POST /encrypt`.
    pub envelope: String,
}

/// Successful response body for `POST /decrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptResponse {
    pub plaintext: String,
}

/// Successful response body for `POST /reencrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReencryptResponse {
    /// The envelope under the active key. Equal to the input when
    /// `reencrypted` is `false`.
    pub envelope: String,
    /// Whether a new envelope was produced.
    pub reencrypted: bool,
}

// ---------------------------------------------------------------------------
// Lookup hashes and identifiers
// ---------------------------------------------------------------------------

/// Request body for `POST /hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashRequest {
    pub value: String,
}

/// Response body for `POST /hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashResponse {
    /// Lowercase hex SHA-256 digest.
    pub digest: String,
}

/// Query string of `GET /ids`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecureIdQuery {
    /// Number of random bytes. Defaults to 32.
    pub length: Option<usize>,
}

/// Response body for `GET /ids`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecureIdResponse {
    /// Hex-encoded random bytes.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Key management
// ---------------------------------------------------------------------------

/// Response body for `POST /keys/rotate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotateResponse {
    /// `"rotated"` or `"unsupported"`.
    pub status: String,
    /// Active key version after the call, if a key is held.
    pub version: Option<u32>,
    /// Versions dropped by this rotation; their envelopes no longer decrypt.
    #[serde(default)]
    pub evicted: Vec<u32>,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::ServiceError> for ErrorResponse {
    fn from(e: &crate::ServiceError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Whether an encryption key is currently held.
    pub key_ready: bool,
    /// Version of the active key, if any.
    pub active_version: Option<u32>,
    /// Kind of key source in use (`"managed"` or `"derived"`).
    pub key_source: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceError;

    #[test]
    fn encrypt_request_from_json() {
        let req: EncryptRequest =
            serde_json::from_str(r#"{"plaintext":"4111-1111-1111-1111"}"#).unwrap();
        assert_eq!(req.plaintext, "4111-1111-1111-1111");
    }

    #[test]
    fn secure_id_query_length_is_optional() {
        let q: SecureIdQuery = serde_json::from_str("{}").unwrap();
        assert!(q.length.is_none());
    }

    #[test]
    fn error_response_from_service_error() {
        let e = ServiceError::Unprocessable("authentication failed".into());
        let body = ErrorResponse::from(&e);
        assert_eq!(body.code, "unprocessable_envelope");
        assert!(body.message.contains("authentication failed"));
    }

    #[test]
    fn health_response_serde() {
        let h = HealthResponse {
            status: "ok".into(),
            key_ready: true,
            active_version: Some(2),
            key_source: "derived".into(),
        };
        let json = serde_json::to_string(&h).unwrap();
        let decoded: HealthResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.active_version, Some(2));
    }
}
