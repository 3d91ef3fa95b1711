//! Error types for the HTTP API

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quizme_core::QuizMeError;
use serde::Serialize;
use std::fmt;
use tracing::error;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Internal server error (500); the message is safe to show to clients
    Internal(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    /// Map a core error, replacing internal details with `fallback`
    pub fn from_core(err: QuizMeError, fallback: &str) -> Self {
        match err {
            QuizMeError::NotFound(_) => ApiError::NotFound("Quiz not found".to_string()),
            QuizMeError::InvalidInput(msg) => ApiError::BadRequest(msg),
            QuizMeError::Forbidden(msg) => ApiError::Forbidden(msg),
            other => {
                error!("{}: {}", fallback, other);
                ApiError::Internal(fallback.to_string())
            }
        }
    }

    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Internal(_) => "internal_error",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
        }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Internal(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<QuizMeError> for ApiError {
    fn from(err: QuizMeError) -> Self {
        ApiError::from_core(err, "Internal server error")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid JSON: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        crate::metrics::record_error(self.kind());

        let body = Json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.message().to_string(),
        });

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::BadRequest("Domain is required".to_string());
        assert_eq!(format!("{}", err), "Bad request: Domain is required");

        let err = ApiError::NotFound("Quiz not found".to_string());
        assert_eq!(format!("{}", err), "Not found: Quiz not found");
    }

    #[test]
    fn test_core_error_mapping() {
        let err: ApiError = QuizMeError::NotFound("q-9".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = QuizMeError::InvalidInput("Domain is required".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = QuizMeError::Forbidden("nope".into()).into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = ApiError::from_core(
            QuizMeError::Storage("disk /var/lib/quizme full".into()),
            "Failed to add domain",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Failed to add domain");
    }

    #[tokio::test]
    async fn test_into_response_forbidden() {
        let (status, json) = body_json(ApiError::Forbidden(
            "This quiz cannot be embedded on this domain".to_string(),
        ))
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "forbidden");
        assert_eq!(json["message"], "This quiz cannot be embedded on this domain");
    }

    #[tokio::test]
    async fn test_into_response_not_found() {
        let (status, json) = body_json(ApiError::NotFound("Quiz not found".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn test_into_response_service_unavailable() {
        let (status, json) =
            body_json(ApiError::ServiceUnavailable("No quizzes loaded".to_string())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "service_unavailable");
        assert_eq!(json["message"], "No quizzes loaded");
    }
}
