//! HTTP handlers: one per endpoint.
//!
//! Each handler is a thin translation between HTTP and one allocator
//! call:
//!   - `GET  /room/gen_code` → `allocate`
//!   - `POST /room/create`   → `confirm`  (relay webhook)
//!   - `POST /room/close`    → `release`  (relay webhook)
//!   - `GET  /health`        → `stats`
//!
//! Webhook bodies are read as raw bytes and decoded through the server's
//! codec, so a missing `Content-Type` header doesn't get a request
//! rejected before we can log it. Replies go back through the same codec.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use roomcode_alloc::{AllocError, AllocatorStats, ReleaseOutcome};
use roomcode_protocol::{CloseRoomRequest, Codec, CreateRoomRequest, WebhookResponse};
use serde::Serialize;

use crate::server::ServerState;
use crate::RoomcodeError;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    stats: AllocatorStats,
}

/// Encodes a webhook reply with the server's codec.
fn reply(state: &ServerState, body: &WebhookResponse) -> Result<Response, RoomcodeError> {
    let bytes = state.codec.encode(body)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}

/// `GET /room/gen_code` — hands out a fresh code as plain text.
pub(crate) async fn gen_code(
    State(state): State<Arc<ServerState>>,
) -> Result<String, RoomcodeError> {
    let code = state.allocator.allocate().await?;
    Ok(code.to_string())
}

/// `POST /room/create` — the relay reports a room was created.
pub(crate) async fn create_room(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Result<Response, RoomcodeError> {
    let req: CreateRoomRequest = state.codec.decode(&body)?;
    let code = req.code()?;

    match state.allocator.confirm(code).await {
        Ok(()) => reply(&state, &WebhookResponse::ok()),
        Err(AllocError::UnknownCode(code)) => {
            // Most likely the allocation timed out before the relay
            // called back.
            tracing::info!(
                %code,
                user_id = %req.user_id,
                region = %req.region,
                "create webhook for code with no pending allocation"
            );
            Err(RoomcodeError::NoPendingAllocation {
                code,
                user_id: req.user_id,
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// `POST /room/close` — the relay reports a room was closed.
///
/// Always succeeds for a well-formed body: closing a room whose code was
/// already reclaimed is normal.
pub(crate) async fn close_room(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Result<Response, RoomcodeError> {
    let req: CloseRoomRequest = state.codec.decode(&body)?;
    let code = req.code()?;

    if state.allocator.release(code).await == ReleaseOutcome::AlreadyReleased {
        tracing::debug!(%code, actor_count = req.actor_count, "close webhook for released code");
    }
    reply(&state, &WebhookResponse::ok())
}

/// `GET /health` — liveness plus pool counts.
pub(crate) async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        stats: state.allocator.stats().await,
    })
}

/// Fallback for unmatched routes when no static directory is configured.
pub(crate) async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
