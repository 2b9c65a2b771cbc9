//! Pluggable origins of key material.
//!
//! A [`KeySource`] is chosen once at startup from configuration; nothing on
//! the encryption path inspects the runtime mode.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::store::DekBytes;
use crate::error::CryptoError;

/// Secret hashed into the development key when none is configured.
pub const DEFAULT_DEV_SECRET: &str = "safetypin-development-secret";

/// Which kind of source supplied the key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySourceKind {
    /// Fresh data keys from a managed key-management service.
    Managed,
    /// A stable key derived locally from a development secret.
    Derived,
}

impl KeySourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            KeySourceKind::Managed => "managed",
            KeySourceKind::Derived => "derived",
        }
    }
}

impl fmt::Display for KeySourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Produces 256-bit encryption keys.
#[async_trait]
pub trait KeySource: Send + Sync {
    fn kind(&self) -> KeySourceKind;

    /// Whether a new call to [`KeySource::generate_key`] can yield a different
    /// key, which is what makes rotation meaningful.
    fn supports_rotation(&self) -> bool;

    /// Obtain key material.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeySourceUnavailable`] on any failure. Callers
    /// decide whether to retry.
    async fn generate_key(&self) -> Result<DekBytes, CryptoError>;
}

/// Client for the "generate data key" call of a managed key service.
///
/// Implemented for the AWS KMS client in [`crate::aws`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataKeyClient: Send + Sync {
    /// Ask the service for a fresh 256-bit data key under `key_id` and return
    /// its plaintext bytes.
    async fn generate_data_key(&self, key_id: &str) -> anyhow::Result<Vec<u8>>;
}

/// [`KeySource`] backed by a managed key service.
pub struct ManagedKeySource {
    client: Arc<dyn DataKeyClient>,
    key_id: String,
}

impl ManagedKeySource {
    pub fn new(client: Arc<dyn DataKeyClient>, key_id: impl Into<String>) -> Self {
        Self {
            client,
            key_id: key_id.into(),
        }
    }
}

#[async_trait]
impl KeySource for ManagedKeySource {
    fn kind(&self) -> KeySourceKind {
        KeySourceKind::Managed
    }

    fn supports_rotation(&self) -> bool {
        true
    }

    async fn generate_key(&self) -> Result<DekBytes, CryptoError> {
        let mut plaintext = self
            .client
            .generate_data_key(&self.key_id)
            .await
            .map_err(|e| CryptoError::KeySourceUnavailable(format!("{e:#}")))?;

        let key = DekBytes::from_slice(&plaintext)
            .map_err(|e| CryptoError::KeySourceUnavailable(e.to_string()));
        plaintext.iter_mut().for_each(|b| *b = 0);
        debug!(key_id = %self.key_id, "data key generated");
        key
    }
}

/// [`KeySource`] that hashes a development secret into a stable key.
///
/// Must never be constructed in production; [`crate::config::Config`]
/// refuses configurations that would select it there.
pub struct DerivedKeySource {
    secret: String,
}

impl DerivedKeySource {
    /// Use `secret`, or [`DEFAULT_DEV_SECRET`] when `None`.
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret: secret.unwrap_or(DEFAULT_DEV_SECRET).to_owned(),
        }
    }
}

#[async_trait]
impl KeySource for DerivedKeySource {
    fn kind(&self) -> KeySourceKind {
        KeySourceKind::Derived
    }

    fn supports_rotation(&self) -> bool {
        false
    }

    async fn generate_key(&self) -> Result<DekBytes, CryptoError> {
        let digest = Sha256::digest(self.secret.as_bytes());
        DekBytes::from_slice(&digest).map_err(|e| CryptoError::KeySourceUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_LEN;

    #[tokio::test]
    async fn derived_key_is_stable() {
        let a = DerivedKeySource::new(Some("local")).generate_key().await.unwrap();
        let b = DerivedKeySource::new(Some("local")).generate_key().await.unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.as_bytes(), Sha256::digest(b"local").as_slice());
    }

    #[tokio::test]
    async fn derived_key_defaults_secret() {
        let source = DerivedKeySource::new(None);
        let key = source.generate_key().await.unwrap();
        assert_eq!(key.as_bytes(), Sha256::digest(DEFAULT_DEV_SECRET.as_bytes()).as_slice());
        assert_eq!(source.kind(), KeySourceKind::Derived);
        assert!(!source.supports_rotation());
    }

    #[tokio::test]
    async fn derived_keys_differ_by_secret() {
        let a = DerivedKeySource::new(Some("one")).generate_key().await.unwrap();
        let b = DerivedKeySource::new(Some("two")).generate_key().await.unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[tokio::test]
    async fn managed_source_passes_key_id() {
        let mut client = MockDataKeyClient::new();
        client
            .expect_generate_data_key()
            .withf(|key_id| key_id == "alias/safetypin-fields")
            .times(1)
            .returning(|_| Ok(vec![0x5A; KEY_LEN]));

        let source = ManagedKeySource::new(Arc::new(client), "alias/safetypin-fields");
        let key = source.generate_key().await.unwrap();
        assert_eq!(key.as_bytes(), &[0x5A; KEY_LEN]);
        assert!(source.supports_rotation());
    }

    #[tokio::test]
    async fn managed_source_failure_is_key_source_unavailable() {
        let mut client = MockDataKeyClient::new();
        client
            .expect_generate_data_key()
            .returning(|_| Err(anyhow::anyhow!("AccessDeniedException")));

        let source = ManagedKeySource::new(Arc::new(client), "alias/x");
        match source.generate_key().await {
            Err(CryptoError::KeySourceUnavailable(msg)) => {
                assert!(msg.contains("AccessDeniedException"))
            }
            other => panic!("expected KeySourceUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn managed_source_rejects_wrong_key_size() {
        let mut client = MockDataKeyClient::new();
        client
            .expect_generate_data_key()
            .returning(|_| Ok(vec![1u8; 16]));

        let source = ManagedKeySource::new(Arc::new(client), "alias/x");
        assert!(matches!(
            source.generate_key().await,
            Err(CryptoError::KeySourceUnavailable(_))
        ));
    }
}
