//! [`DekStore`]: lock-free holder of the versioned key ring.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use thiserror::Error;

use crate::crypto::KEY_LEN;

/// Errors produced when building key material.
#[derive(Debug, Error)]
pub enum DekError {
    /// The key material has an unexpected length.
    #[error("DEK has invalid length: expected {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),

    /// The active version is `u32::MAX`; no further version can be issued.
    #[error("key version counter exhausted at v{0}")]
    VersionsExhausted(u32),
}

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// When this type is dropped, the memory is overwritten with zeroes to
/// minimise the window during which plaintext key material lives in RAM.
pub struct DekBytes(Box<[u8; KEY_LEN]>);

impl DekBytes {
    /// Copy `key_bytes` into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns [`DekError::InvalidLength`] if the slice is not [`KEY_LEN`] bytes.
    pub fn from_slice(key_bytes: &[u8]) -> Result<Self, DekError> {
        if key_bytes.len() != KEY_LEN {
            return Err(DekError::InvalidLength(key_bytes.len()));
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(key_bytes);
        Ok(Self(buf))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Drop for DekBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for DekBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.write_str("DekBytes([REDACTED])")
    }
}

/// A key together with the version stamped into envelopes it produces.
#[derive(Debug)]
pub struct VersionedKey {
    pub version: u32,
    pub key: DekBytes,
}

/// Immutable, ordered set of retained keys. The last entry is active.
///
/// A ring is never mutated after construction; rotation builds a new ring
/// and swaps it into the [`DekStore`].
#[derive(Debug)]
pub struct KeyRing {
    keys: Vec<Arc<VersionedKey>>,
}

impl KeyRing {
    /// The key used for new envelopes.
    pub fn active(&self) -> &VersionedKey {
        // A ring is only ever built by `DekStore::push`, which always appends.
        &self.keys[self.keys.len() - 1]
    }

    /// Look up a retained key by version.
    pub fn get(&self, version: u32) -> Option<&VersionedKey> {
        self.keys
            .iter()
            .find(|k| k.version == version)
            .map(Arc::as_ref)
    }

    /// Retained keys, active first.
    pub fn newest_first(&self) -> impl Iterator<Item = &VersionedKey> {
        self.keys.iter().rev().map(Arc::as_ref)
    }

    /// Retained versions, oldest first.
    pub fn versions(&self) -> Vec<u32> {
        self.keys.iter().map(|k| k.version).collect()
    }

}

/// Result of [`DekStore::push`].
#[derive(Debug)]
pub struct Pushed {
    /// The ring now installed.
    pub ring: Arc<KeyRing>,
    /// Versions dropped to stay within capacity, oldest first.
    pub evicted: Vec<u32>,
}

/// Shared store for the current key ring.
///
/// Backed by [`ArcSwapOption`] so that:
/// - Request paths load the ring without locking.
/// - A rotation swaps in a complete new ring; in-flight readers keep the ring
///   they loaded, never a partially updated one.
///
/// Writers must be serialised by the caller (see [`crate::dek::KeyManager`]).
/// Versions count up from 1 and restart after [`DekStore::clear`], exactly as
/// they do when the process restarts.
#[derive(Clone, Debug)]
pub struct DekStore {
    inner: Arc<ArcSwapOption<KeyRing>>,
}

impl DekStore {
    /// Create a new, empty [`DekStore`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwapOption::empty()),
        }
    }

    /// Snapshot of the current ring, if any.
    pub fn current(&self) -> Option<Arc<KeyRing>> {
        self.inner.load_full()
    }

    /// Install `key` as the new active version.
    ///
    /// Keeps at most `capacity` versions (minimum 1), evicting the oldest;
    /// the evicted versions are reported in [`Pushed::evicted`].
    ///
    /// # Errors
    ///
    /// Returns [`DekError::VersionsExhausted`] if the active version is
    /// `u32::MAX`. The current ring is left in place.
    pub fn push(&self, key: DekBytes, capacity: usize) -> Result<Pushed, DekError> {
        let (version, mut keys) = match self.current() {
            Some(ring) => {
                let active = ring.active().version;
                let next = active
                    .checked_add(1)
                    .ok_or(DekError::VersionsExhausted(active))?;
                (next, ring.keys.clone())
            }
            None => (1, Vec::new()),
        };
        keys.push(Arc::new(VersionedKey { version, key }));

        let capacity = capacity.max(1);
        let excess = keys.len().saturating_sub(capacity);
        let evicted = keys.drain(..excess).map(|k| k.version).collect();

        let ring = Arc::new(KeyRing { keys });
        self.inner.store(Some(Arc::clone(&ring)));
        Ok(Pushed { ring, evicted })
    }

    /// Drop the ring. Returns `true` if one was held.
    pub fn clear(&self) -> bool {
        self.inner.swap(None).is_some()
    }
}

impl Default for DekStore {
    fn default() -> Self {
        Self::new()
    }
}
