//! Axum HTTP server exposing the field encryption service to the backend.
//!
//! # Responsibilities
//! - Define the Axum router with all routes and shared middleware.
//! - Inject the shared [`crate::dek::KeyManager`] (`AppState`) into handlers.
//! - Map crypto errors to status codes without leaking plaintext.

pub mod handlers;
pub mod router;
pub mod state;
