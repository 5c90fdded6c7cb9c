use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

pub const JSON_UTF8: &str = "application/json; charset=utf-8";

const SERIALIZE_FAILURE_BODY: &[u8] = br#"{"error":"Internal server error"}"#;

/// Serialize `value` as a JSON body labelled `application/json; charset=utf-8`.
///
/// axum's `Json` responder omits the charset parameter.
pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(bytes) => with_json_header(status, Body::from(bytes)),
        Err(err) => {
            error!(error = %err, "failed to serialize response body");
            with_json_header(
                StatusCode::INTERNAL_SERVER_ERROR,
                Body::from(SERIALIZE_FAILURE_BODY),
            )
        }
    }
}

fn with_json_header(status: StatusCode, body: Body) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8))],
        body,
    )
        .into_response()
}
