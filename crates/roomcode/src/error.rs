//! Unified error type for the Roomcode server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use roomcode_alloc::AllocError;
use roomcode_protocol::{Code, ProtocolError};

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// Handlers return `Result<_, RoomcodeError>`; the `IntoResponse` impl
/// below is the ONLY place allocator and protocol errors are mapped to
/// HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum RoomcodeError {
    /// Malformed request body or room code, or a reply that failed to
    /// encode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An allocator error (exhausted pool, unknown code, invariant).
    #[error(transparent)]
    Alloc(#[from] AllocError),

    /// The relay confirmed a room whose code has no live allocation.
    /// Carries the relay's user id for the response text.
    #[error("No code for user: {user_id}")]
    NoPendingAllocation { code: Code, user_id: String },

    /// Bad configuration at startup.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Binding or serving failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RoomcodeError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Protocol(ProtocolError::Encode(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Protocol(_) => StatusCode::BAD_REQUEST,
            Self::Alloc(e) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            Self::Alloc(e) if e.is_internal() => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Alloc(_) => StatusCode::BAD_REQUEST,
            Self::NoPendingAllocation { .. } => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` if the error is a server-side fault whose details
    /// stay out of the response body.
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Alloc(e) => e.is_internal(),
            Self::Protocol(ProtocolError::Encode(_)) | Self::Config(_) | Self::Io(_) => true,
            Self::Protocol(_) | Self::NoPendingAllocation { .. } => false,
        }
    }
}

impl IntoResponse for RoomcodeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if self.is_internal() {
            tracing::error!(error = %self, "request failed");
            "internal error".to_string()
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
            self.to_string()
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(v: u16) -> Code {
        Code::new(v).unwrap()
    }

    #[test]
    fn test_from_protocol_error_is_bad_request() {
        let err: RoomcodeError = ProtocolError::InvalidCode("x".into()).into();
        assert!(matches!(err, RoomcodeError::Protocol(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_pool_exhausted_is_service_unavailable() {
        let err: RoomcodeError = AllocError::PoolExhausted.into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "no free room codes available");
    }

    #[test]
    fn test_unknown_code_is_bad_request() {
        let err: RoomcodeError = AllocError::UnknownCode(code(1)).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invariant_violation_is_internal() {
        let err: RoomcodeError = AllocError::DuplicateCode(code(1)).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_internal());
    }

    #[test]
    fn test_pool_exhausted_message_is_not_hidden() {
        let err: RoomcodeError = AllocError::PoolExhausted.into();
        assert!(!err.is_internal());
    }

    #[tokio::test]
    async fn test_into_response_hides_internal_details() {
        let err: RoomcodeError = AllocError::Invariant("pool and registry overlap".into()).into();

        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"internal error");
    }

    #[tokio::test]
    async fn test_into_response_exhausted_keeps_message() {
        let err: RoomcodeError = AllocError::PoolExhausted.into();

        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"no free room codes available");
    }

    #[test]
    fn test_no_pending_allocation_message() {
        let err = RoomcodeError::NoPendingAllocation {
            code: code(12),
            user_id: "player-7".into(),
        };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "No code for user: player-7");
    }
}
