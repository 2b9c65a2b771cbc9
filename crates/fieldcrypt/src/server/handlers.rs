//! Axum request handlers for all service endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{
    protocol::{
        DecryptResponse, EncryptRequest, EncryptResponse, EnvelopeRequest, ErrorResponse,
        HashRequest, HashResponse, HealthResponse, ReencryptResponse, RotateResponse,
        SecureIdQuery, SecureIdResponse,
    },
    ServiceError,
};
use tracing::warn;

use super::state::AppState;
use crate::crypto::{generate_secure_id, hash_for_lookup, DEFAULT_SECURE_ID_LEN};
use crate::dek::RotationOutcome;
use crate::error::CryptoError;

/// Largest byte length accepted by `GET /ids`.
pub const MAX_SECURE_ID_LEN: usize = 1024;

/// Handler error: a [`ServiceError`] rendered as an [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError(ServiceError);

impl From<CryptoError> for ApiError {
    fn from(e: CryptoError) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

/// `POST /encrypt` — encrypt one field value.
pub async fn encrypt(
    State(state): State<AppState>,
    Json(req): Json<EncryptRequest>,
) -> Result<Json<EncryptResponse>, ApiError> {
    let envelope = state.keys.encrypt(&req.plaintext).await?;
    Ok(Json(EncryptResponse { envelope }))
}

/// `POST /decrypt` — recover the plaintext of an envelope.
pub async fn decrypt(
    State(state): State<AppState>,
    Json(req): Json<EnvelopeRequest>,
) -> Result<Json<DecryptResponse>, ApiError> {
    let plaintext = state.keys.decrypt(&req.envelope).await?;
    Ok(Json(DecryptResponse { plaintext }))
}

/// `POST /reencrypt` — move an envelope onto the active key if needed.
pub async fn reencrypt(
    State(state): State<AppState>,
    Json(req): Json<EnvelopeRequest>,
) -> Result<Json<ReencryptResponse>, ApiError> {
    if !state.keys.needs_reencryption(&req.envelope).await? {
        // Authenticate before echoing the envelope back.
        state.keys.decrypt(&req.envelope).await?;
        return Ok(Json(ReencryptResponse {
            envelope: req.envelope,
            reencrypted: false,
        }));
    }
    let envelope = state.keys.reencrypt(&req.envelope).await?;
    Ok(Json(ReencryptResponse {
        envelope,
        reencrypted: true,
    }))
}

/// `POST /hash` — deterministic lookup digest of a value.
pub async fn hash(Json(req): Json<HashRequest>) -> Json<HashResponse> {
    Json(HashResponse {
        digest: hash_for_lookup(&req.value),
    })
}

/// `GET /ids?length=N` — random hex identifier of `N` bytes (default 32).
pub async fn secure_id(
    Query(query): Query<SecureIdQuery>,
) -> Result<Json<SecureIdResponse>, ApiError> {
    let length = query.length.unwrap_or(DEFAULT_SECURE_ID_LEN);
    if length == 0 || length > MAX_SECURE_ID_LEN {
        return Err(ApiError(ServiceError::BadRequest(format!(
            "length must be between 1 and {MAX_SECURE_ID_LEN}"
        ))));
    }
    Ok(Json(SecureIdResponse {
        id: generate_secure_id(length),
    }))
}

/// `POST /keys/rotate` — rotate the active key.
///
/// Answers `200` with status `"unsupported"` when the key source cannot rotate.
pub async fn rotate(State(state): State<AppState>) -> Result<Json<RotateResponse>, ApiError> {
    let body = match state.keys.rotate().await? {
        RotationOutcome::Rotated { version, evicted } => RotateResponse {
            status: "rotated".into(),
            version: Some(version),
            evicted,
        },
        RotationOutcome::Unsupported => RotateResponse {
            status: "unsupported".into(),
            version: state.keys.status().active_version,
            evicted: Vec::new(),
        },
    };
    Ok(Json(body))
}

/// `GET /health` — liveness and readiness check.
///
/// Returns `200 OK` when a key is held, `503 Service Unavailable` otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let status = state.keys.status();

    let (status_code, status_str) = if status.initialized {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: status_str.into(),
        key_ready: status.initialized,
        active_version: status.active_version,
        key_source: status.source.to_string(),
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}
