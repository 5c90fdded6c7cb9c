use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::response::json_response;
use crate::types::ErrorBody;

/// Body text returned for every 5xx; internal detail stays in the logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Request timed out")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::InvalidJson => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message placed in the `error` key of the response body.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!(%detail, "request failed with an internal error");
        }

        let body = ErrorBody {
            error: self.public_message(),
        };
        json_response(self.status(), &body)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use http_body_util::BodyExt;

    async fn body_string(resp: axum::response::Response) -> String {
        let bytes = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_yields_404_with_fixed_body() {
        let resp = ApiError::NotFound.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(resp).await, r#"{"error":"Not found"}"#);
    }

    #[tokio::test]
    async fn test_invalid_json_yields_400_with_fixed_body() {
        let resp = ApiError::InvalidJson.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(resp).await, r#"{"error":"Invalid JSON"}"#);
    }

    #[tokio::test]
    async fn test_internal_yields_500_without_detail() {
        let resp = ApiError::Internal("db password is hunter2".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(resp).await;
        assert_eq!(body, r#"{"error":"Internal server error"}"#);
        assert!(!body.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_timeout_yields_408() {
        assert_eq!(ApiError::Timeout.into_response().status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_payload_too_large_yields_413() {
        assert_eq!(
            ApiError::PayloadTooLarge.into_response().status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn test_method_not_allowed_yields_405() {
        let resp = ApiError::MethodNotAllowed.into_response();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_string(resp).await, r#"{"error":"Method not allowed"}"#);
    }

    #[tokio::test]
    async fn test_error_response_is_utf8_json() {
        let resp = ApiError::NotFound.into_response();
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "application/json; charset=utf-8"
        );
    }
}
