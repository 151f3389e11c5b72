//! Mapping of gateway errors onto HTTP responses

use super::wire::ErrorResponse;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use counsel_application::AskError;
use tracing::{debug, warn};

/// An error response: status code plus `{"error": ...}` body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    /// Refused at admission; never reached a batch.
    rejected: bool,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            rejected: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_rejection(&self) -> bool {
        self.rejected
    }
}

impl From<AskError> for ApiError {
    fn from(e: AskError) -> Self {
        let status = match &e {
            AskError::UnknownUser(_) | AskError::InvalidQuestion(_) => StatusCode::BAD_REQUEST,
            AskError::ResponderFailure(_) => StatusCode::BAD_GATEWAY,
            AskError::QueueFull(_) | AskError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            AskError::PersistenceFailure(_)
            | AskError::BatchDispatchFailure(_)
            | AskError::Abandoned => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            rejected: e.is_admission_rejection(),
            ..Self::new(status, e.to_string())
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.rejected {
            debug!(status = self.status.as_u16(), "Request rejected: {}", self.message);
        } else if self.status.is_server_error() {
            warn!(status = self.status.as_u16(), "Request failed: {}", self.message);
        }
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AskError::UnknownUser("Zed".into()), StatusCode::BAD_REQUEST),
            (AskError::InvalidQuestion("blank".into()), StatusCode::BAD_REQUEST),
            (AskError::ResponderFailure("down".into()), StatusCode::BAD_GATEWAY),
            (AskError::QueueFull(8), StatusCode::SERVICE_UNAVAILABLE),
            (AskError::ShuttingDown, StatusCode::SERVICE_UNAVAILABLE),
            (AskError::PersistenceFailure("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AskError::BatchDispatchFailure("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AskError::Abandoned, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }

    #[test]
    fn test_admission_rejections_are_flagged() {
        assert!(ApiError::from(AskError::QueueFull(4)).is_rejection());
        assert!(ApiError::from(AskError::ShuttingDown).is_rejection());
        assert!(ApiError::from(AskError::UnknownUser("Zed".into())).is_rejection());
        assert!(!ApiError::from(AskError::Abandoned).is_rejection());
        assert!(!ApiError::from(AskError::ResponderFailure("down".into())).is_rejection());
    }
}
