//! [`KeyManager`]: the field encryption entry point handed to every caller.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::source::{KeySource, KeySourceKind};
use super::store::{DekStore, KeyRing};
use crate::crypto::{
    cipher::{decrypt_field, encrypt_field},
    Envelope,
};
use crate::error::CryptoError;

/// Tunables for a [`KeyManager`].
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    /// Emit `v<N>:`-prefixed envelopes. Legacy envelopes are always readable.
    pub versioned_envelopes: bool,
    /// Number of key versions kept for decryption, including the active one.
    pub max_key_versions: usize,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            versioned_envelopes: true,
            max_key_versions: 5,
        }
    }
}

/// Result of [`KeyManager::rotate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    /// A new key is active under `version`. `evicted` lists versions dropped
    /// from the ring; envelopes under them can no longer be decrypted.
    Rotated { version: u32, evicted: Vec<u32> },
    /// The key source cannot rotate; nothing changed.
    Unsupported,
}

/// Point-in-time view of the manager, for health reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStatus {
    pub initialized: bool,
    pub active_version: Option<u32>,
    pub retained_versions: Vec<u32>,
    pub source: KeySourceKind,
}

/// Owns the key lifecycle and performs envelope encryption.
///
/// Cheap to clone; clones share the same key ring. Lifecycle:
/// `new → initialize → [rotate]* → shutdown`. Any operation that needs a key
/// initialises lazily, and concurrent first use reaches the key source once.
#[derive(Clone)]
pub struct KeyManager {
    source: Arc<dyn KeySource>,
    store: DekStore,
    options: ManagerOptions,
    // Serialises initialisation and rotation; readers never take it.
    write_lock: Arc<Mutex<()>>,
}

impl KeyManager {
    pub fn new(source: Arc<dyn KeySource>, options: ManagerOptions) -> Self {
        Self {
            source,
            store: DekStore::new(),
            options,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Establish the active key. A no-op while a key is held.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeySourceUnavailable`] if the source fails.
    pub async fn initialize(&self) -> Result<(), CryptoError> {
        self.ring().await.map(|_| ())
    }

    /// Encrypt `plaintext` under the active key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeySourceUnavailable`] if no key is held and
    /// the source fails.
    pub async fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let ring = self.ring().await?;
        let active = ring.active();
        let field = encrypt_field(plaintext.as_bytes(), active.key.as_bytes())?;
        let envelope = Envelope {
            key_version: self.options.versioned_envelopes.then_some(active.version),
            field,
        };
        Ok(envelope.encode())
    }

    /// Decrypt an envelope produced by [`KeyManager::encrypt`].
    ///
    /// Versioned envelopes are opened with the key they name. Legacy
    /// envelopes are tried against every retained key, newest first.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::MalformedEnvelope`] for undecodable input or non-UTF-8 plaintext.
    /// - [`CryptoError::UnknownKeyVersion`] if the named version is not retained.
    /// - [`CryptoError::AuthenticationFailure`] if the tag does not verify.
    /// - [`CryptoError::KeySourceUnavailable`] if lazy initialisation fails.
    pub async fn decrypt(&self, envelope: &str) -> Result<String, CryptoError> {
        let ring = self.ring().await?;
        let parsed = Envelope::parse(envelope)?;
        let plaintext = open(&ring, &parsed)?;
        String::from_utf8(plaintext)
            .map_err(|_| CryptoError::MalformedEnvelope("plaintext is not valid UTF-8".into()))
    }

    /// Replace the active key with a fresh one from the source.
    ///
    /// Older versions stay in the ring, up to
    /// [`ManagerOptions::max_key_versions`], so existing envelopes remain
    /// readable. Versions pushed out of the ring are logged at `warn` and
    /// returned in [`RotationOutcome::Rotated`]. When the source cannot
    /// rotate, logs a warning and returns [`RotationOutcome::Unsupported`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeySourceUnavailable`] if the source fails, or
    /// [`CryptoError::KeyVersionsExhausted`] past `u32::MAX`; in both cases
    /// the current ring is kept.
    pub async fn rotate(&self) -> Result<RotationOutcome, CryptoError> {
        if !self.source.supports_rotation() {
            warn!(
                key_source = %self.source.kind(),
                "key rotation requested but the key source cannot rotate; ignoring"
            );
            return Ok(RotationOutcome::Unsupported);
        }

        let _guard = self.write_lock.lock().await;
        let key = self.source.generate_key().await?;
        let pushed = self.store.push(key, self.options.max_key_versions)?;
        let version = pushed.ring.active().version;
        if !pushed.evicted.is_empty() {
            warn!(
                evicted = ?pushed.evicted,
                "key versions evicted; envelopes under them are no longer decryptable"
            );
        }
        info!(
            version,
            retained = ?pushed.ring.versions(),
            "encryption key rotated"
        );
        Ok(RotationOutcome::Rotated {
            version,
            evicted: pushed.evicted,
        })
    }

    /// Whether `envelope` should be rewritten under the active key.
    ///
    /// Versioned envelopes report `true` when they name an older version.
    /// Legacy envelopes report `true` when versioned output is enabled, and
    /// otherwise when the active key does not open them.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedEnvelope`] for undecodable input, or
    /// [`CryptoError::KeySourceUnavailable`] if lazy initialisation fails.
    pub async fn needs_reencryption(&self, envelope: &str) -> Result<bool, CryptoError> {
        let ring = self.ring().await?;
        let parsed = Envelope::parse(envelope)?;
        let active = ring.active();
        Ok(match parsed.key_version {
            Some(v) => v != active.version,
            None if self.options.versioned_envelopes => true,
            None => decrypt_field(&parsed.field, active.key.as_bytes()).is_err(),
        })
    }

    /// Decrypt `envelope` and encrypt the plaintext again under the active key.
    ///
    /// # Errors
    ///
    /// Same as [`KeyManager::decrypt`].
    pub async fn reencrypt(&self, envelope: &str) -> Result<String, CryptoError> {
        let plaintext = self.decrypt(envelope).await?;
        self.encrypt(&plaintext).await
    }

    /// Drop all held keys. The next operation initialises again.
    pub async fn shutdown(&self) {
        let _guard = self.write_lock.lock().await;
        if self.store.clear() {
            info!("encryption keys released");
        }
    }

    pub fn status(&self) -> KeyStatus {
        let ring = self.store.current();
        KeyStatus {
            initialized: ring.is_some(),
            active_version: ring.as_ref().map(|r| r.active().version),
            retained_versions: ring.map(|r| r.versions()).unwrap_or_default(),
            source: self.source.kind(),
        }
    }

    /// Current ring, initialising it on first use.
    async fn ring(&self) -> Result<Arc<KeyRing>, CryptoError> {
        if let Some(ring) = self.store.current() {
            return Ok(ring);
        }

        let _guard = self.write_lock.lock().await;
        if let Some(ring) = self.store.current() {
            return Ok(ring);
        }

        let key = self.source.generate_key().await?;
        let ring = self.store.push(key, self.options.max_key_versions)?.ring;
        info!(
            version = ring.active().version,
            key_source = %self.source.kind(),
            "encryption key initialised"
        );
        Ok(ring)
    }
}

fn open(ring: &KeyRing, envelope: &Envelope) -> Result<Vec<u8>, CryptoError> {
    match envelope.key_version {
        Some(version) => {
            let key = ring
                .get(version)
                .ok_or(CryptoError::UnknownKeyVersion(version))?;
            Ok(decrypt_field(&envelope.field, key.key.as_bytes())?)
        }
        None => ring
            .newest_first()
            .find_map(|k| {
                let opened = decrypt_field(&envelope.field, k.key.as_bytes()).ok();
                if opened.is_some() {
                    debug!(version = k.version, "legacy envelope opened");
                }
                opened
            })
            .ok_or(CryptoError::AuthenticationFailure),
    }
}
