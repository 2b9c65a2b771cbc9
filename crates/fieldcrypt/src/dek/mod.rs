//! Data encryption key lifecycle: sources, the versioned key ring, and the
//! [`KeyManager`] that ties them to envelope encryption.
//!
//! # Lifecycle
//!
//! 1. At startup a [`KeySource`] is chosen from configuration: a managed KMS
//!    data key in production, a key derived from a development secret
//!    elsewhere.
//! 2. [`KeyManager::initialize`] (or the first encrypt/decrypt) obtains the key
//!    and installs it as version 1 of the key ring.
//! 3. [`rotation_task`] optionally calls [`KeyManager::rotate`] on an interval.
//!    Each rotation adds a version; the oldest is evicted past the configured
//!    capacity.
//! 4. [`KeyManager::shutdown`] drops the ring at process exit.
//!
//! # Security invariants
//!
//! - Plaintext keys are **never** written to disk, logged, or included in traces.
//! - Key buffers are zeroed on drop.

pub mod manager;
pub mod source;
pub mod store;

pub use manager::{KeyManager, KeyStatus, ManagerOptions, RotationOutcome};
pub use source::{DataKeyClient, DerivedKeySource, KeySource, KeySourceKind, ManagedKeySource};
pub use store::DekStore;

use std::time::Duration;

use tokio::time;
use tracing::{info, warn};

/// Spawn a background task that rotates the key every `interval`.
///
/// The first rotation fires after one full interval (startup initialisation
/// is assumed to have already populated the ring). On failure the current
/// ring is retained and a warning is emitted.
pub fn rotation_task(keys: KeyManager, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // First tick fires immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match keys.rotate().await {
                Ok(RotationOutcome::Rotated { version, .. }) => {
                    info!(version, "scheduled key rotation complete")
                }
                Ok(RotationOutcome::Unsupported) => {
                    warn!("scheduled key rotation unsupported by key source; stopping");
                    return;
                }
                Err(e) => warn!(error = %e, "key rotation failed; retaining current key"),
            }
        }
    })
}
