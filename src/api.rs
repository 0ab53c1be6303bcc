// src/api.rs
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::post, Json, Router};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{debug, info};

use crate::session::{AuthError, SessionManager};
use crate::types::*;

pub type SharedSessions = Arc<SessionManager>;

pub fn router(sessions: SharedSessions, request_timeout: Duration) -> Router {
    Router::new()
        .route("/connect", post(connect))
        .route("/validate", post(validate))
        .with_state(sessions)
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

// ---------- API HANDLERS ---------- //

async fn connect(
    State(sessions): State<SharedSessions>,
    Json(req): Json<ConnectRequest>,
) -> Result<Json<ChallengeResponse>, (StatusCode, Json<ErrorResponse>)> {
    info!(device_id = %req.device_id, "connection from device");

    let Ok(signature) = hex::decode(req.signature_hex.trim()) else {
        debug!(device_id = %req.device_id, "signature is not hex");
        return Err(rejected(AuthError::SignatureInvalid));
    };

    let issued = sessions
        .generate_challenge(&req.device_id, &req.public_key, &signature)
        .map_err(rejected)?;

    Ok(Json(ChallengeResponse {
        challenge_encoded: issued.encoded_challenge,
        server_public_key: issued.server_public_key,
    }))
}

async fn validate(
    State(sessions): State<SharedSessions>,
    Json(req): Json<ValidateRequest>,
) -> Json<ValidateResponse> {
    let status = if sessions.validate_response(&req.device_id, &req.response_encoded) {
        Status::Success
    } else {
        Status::Failure
    };
    info!(device_id = %req.device_id, ?status, "validation");
    Json(ValidateResponse { status })
}

fn rejected(e: AuthError) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}
