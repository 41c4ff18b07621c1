/*
 * Responsibility
 * - App-wide AppError
 * - IntoResponse (HTTP status / JSON error body)
 * - Convert CAS client / session index / session store errors into one shape
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::cas::CasError;
use crate::services::cas::session_index::SessionIndexError;
use crate::services::session::SessionStoreError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("{0}")]
    Unauthorized(String),
    #[error("CAS server unavailable")]
    BadGateway,
    #[error("request timed out")]
    Timeout,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, "AUTHENTICATION_FAILED", message)
            }
            AppError::BadGateway => (
                StatusCode::BAD_GATEWAY,
                "CAS_UNAVAILABLE",
                "CAS server unavailable".into(),
            ),
            AppError::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                "REQUEST_TIMEOUT",
                "request timed out".into(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<CasError> for AppError {
    fn from(e: CasError) -> Self {
        match e {
            // Ticket rejected or unreadable answer: the sign-in attempt failed
            CasError::Rejected { code, .. } => {
                AppError::unauthorized(format!("service ticket rejected ({code})"))
            }
            CasError::InvalidResponse(_) => {
                AppError::unauthorized("service ticket could not be validated")
            }
            CasError::Transport(_) => AppError::BadGateway,
            // Logout URL misuse is a programming error
            CasError::ServiceNotAccepted => AppError::Internal,
        }
    }
}

impl From<SessionIndexError> for AppError {
    fn from(_: SessionIndexError) -> Self {
        AppError::Internal
    }
}

impl From<SessionStoreError> for AppError {
    fn from(_: SessionStoreError) -> Self {
        AppError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn rejected_ticket_is_unauthorized() {
        let err: AppError = CasError::Rejected {
            code: "INVALID_TICKET".into(),
            message: "Ticket ST-1 not recognized".into(),
        }
        .into();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "AUTHENTICATION_FAILED");
        assert_eq!(
            body["error"]["message"],
            "service ticket rejected (INVALID_TICKET)"
        );
    }

    #[tokio::test]
    async fn bad_request_keeps_code() {
        let response = AppError::bad_request("MISSING_TICKET", "ticket is required").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "MISSING_TICKET");
    }
}
