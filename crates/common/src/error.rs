//! Caller-facing error type of the field encryption service.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::Unprocessable`] → 422
/// - [`ServiceError::Unavailable`] → 503
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request or the envelope it carries is syntactically invalid.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The envelope is well formed but cannot be opened: the tag did not
    /// verify or the key version it names is no longer held.
    #[error("unprocessable envelope: {0}")]
    Unprocessable(String),

    /// The key source could not provide key material.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::Unprocessable(_) => 422,
            ServiceError::Unavailable(_) => 503,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in [`crate::protocol::ErrorResponse`].
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::Unprocessable(_) => "unprocessable_envelope",
            ServiceError::Unavailable(_) => "service_unavailable",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes() {
        assert_eq!(ServiceError::BadRequest("x".into()).http_status(), 400);
        assert_eq!(ServiceError::Unprocessable("x".into()).http_status(), 422);
        assert_eq!(ServiceError::Unavailable("x".into()).http_status(), 503);
        assert_eq!(ServiceError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(ServiceError::BadRequest("x".into()).code(), "bad_request");
        assert_eq!(
            ServiceError::Unprocessable("x".into()).code(),
            "unprocessable_envelope"
        );
        assert_eq!(
            ServiceError::Unavailable("x".into()).code(),
            "service_unavailable"
        );
    }

    #[test]
    fn display_includes_message() {
        let e = ServiceError::BadRequest("envelope too short".into());
        assert!(e.to_string().contains("envelope too short"));
    }
}
