//! Field encryption primitives.
//!
//! This module is intentionally free of AWS and HTTP dependencies and holds
//! no key state; keys are passed in by [`crate::dek::KeyManager`].
//!
//! # Envelope format
//!
//! ```text
//! [v<version>:]base64(nonce[16] || tag[16] || ciphertext)
//! ```

pub mod cipher;
pub mod envelope;
pub mod lookup;

pub use cipher::{KEY_LEN, NONCE_LEN, TAG_LEN};
pub use envelope::Envelope;
pub use lookup::{generate_secure_id, hash_for_lookup, DEFAULT_SECURE_ID_LEN};
