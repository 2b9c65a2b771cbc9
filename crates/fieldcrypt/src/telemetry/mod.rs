//! Tracing setup: structured JSON logs, plus OTLP span export when an
//! endpoint is configured.
//!
//! # Telemetry invariants
//!
//! - **No plaintext, envelopes, or key material** may appear in any span
//!   attribute or log field. Key versions and source kinds are fine.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   takes precedence when set.

pub mod init;

pub use init::{init_telemetry, shutdown_telemetry};
