//! SafetyPin field encryption service.
//!
//! Sensitive column values are encrypted with AES-256-GCM before they are
//! stored, and a deterministic SHA-256 lookup hash is stored next to them for
//! equality search. [`dek::KeyManager`] owns the key lifecycle and is the
//! entry point for callers; [`server`] exposes it over HTTP.

pub mod aws;
pub mod config;
pub mod crypto;
pub mod dek;
pub mod error;
pub mod server;
pub mod telemetry;

pub use crypto::{generate_secure_id, hash_for_lookup};
pub use dek::{KeyManager, ManagerOptions, RotationOutcome};
pub use error::CryptoError;
