use crate::error::ApiError;

/// Any path other than the rewrite endpoint.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// The rewrite endpoint called with a method other than `POST`.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
