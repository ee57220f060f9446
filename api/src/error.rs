use application::{ApplicationError, ErrorResponse};
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::warn;

/// Everything a handler can fail with, already tied to an HTTP status.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Application(#[from] ApplicationError),
    /// `:id` segment that is not an integer. Distinct from "not found".
    #[error("Invalid id: {}", .0.body_text())]
    InvalidId(#[from] PathRejection),
    #[error("Invalid query: {}", .0.body_text())]
    InvalidQuery(#[from] QueryRejection),
    /// Malformed JSON or a missing required field.
    #[error("Invalid body: {}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Application(ApplicationError::DomainError(_)) => StatusCode::NOT_FOUND,
            ApiError::Application(ApplicationError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::InvalidId(rejection) => rejection.status(),
            ApiError::InvalidQuery(rejection) => rejection.status(),
            ApiError::InvalidBody(rejection) => rejection.status(),
        }
    }
}

/// Maps an error to its status code and an `ErrorResponse` JSON body.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Application(ApplicationError::InvalidInput(msg)) => {
                warn!("Request validation failed: {}", msg);
                msg.clone()
            }
            other => {
                warn!(status = status.as_u16(), "{}", other);
                other.to_string()
            }
        };
        let body = ErrorResponse {
            status_code: status.as_u16(),
            message,
            error: status.canonical_reason().unwrap_or("Error").to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::DomainError;

    #[test]
    fn application_errors_map_to_client_statuses() {
        let not_found = ApiError::from(ApplicationError::from(DomainError::NotFound {
            kind: "User",
            id: 3,
        }));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid = ApiError::from(ApplicationError::InvalidInput("userId".to_string()));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
