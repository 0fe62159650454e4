use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::session::SessionError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    /// This is the only place internal errors are logged.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UnknownOption(_) | SessionError::IndexOutOfRange { .. } => {
                Self::BadRequest(err.to_string())
            }
            SessionError::WrongPhase(_)
            | SessionError::AlreadySubmitted
            | SessionError::NoQuestions
            | SessionError::SubmitUnavailable => Self::Conflict(err.to_string()),
            SessionError::Encode(_) => Self::internal(err, "Failed to assemble answers"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::session::SessionPhase;

    #[test]
    fn session_errors_map_to_client_statuses() {
        let cases = [
            (SessionError::UnknownOption("z".to_string()), StatusCode::BAD_REQUEST),
            (SessionError::WrongPhase(SessionPhase::AwaitingRegistration), StatusCode::CONFLICT),
            (SessionError::AlreadySubmitted, StatusCode::CONFLICT),
            (SessionError::SubmitUnavailable, StatusCode::CONFLICT),
            (SessionError::Encode("boom".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn internal_errors_expose_context_not_cause() {
        let response = ApiError::internal("disk on fire", "Failed to assemble answers").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(
            ApiError::internal("disk on fire", "Failed to assemble answers"),
            ApiError::Internal(message) if message == "Failed to assemble answers"
        ));
    }
}
