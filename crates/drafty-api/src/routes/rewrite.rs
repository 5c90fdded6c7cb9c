use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::Response,
    Extension,
};
use serde_json::Value;
use tracing::{debug, instrument, Span};

use crate::{
    error::{ApiError, ApiResult},
    response::json_response,
    rewriter::Rewriter,
    types::{RewriteRequest, RewriteResponse},
};

const EMPTY_BODY: &[u8] = b"{}";

/// `POST /api/rewrite`
#[instrument(skip_all, fields(body_len = tracing::field::Empty))]
pub async fn rewrite(
    Extension(rewriter): Extension<Arc<dyn Rewriter>>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Response> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            debug!(reason = %rejection.body_text(), "failed to read request body");
            ApiError::InvalidJson
        }
    })?;
    Span::current().record("body_len", body.len());

    let request = parse_request(&body)?;
    let result = rewriter
        .rewrite(&request)
        .await
        .map_err(|err| ApiError::Internal(format!("rewriter failed: {err:#}")))?;

    Ok(json_response(StatusCode::OK, &RewriteResponse { result }))
}

/// Decode a raw request body into [`RewriteRequest`].
///
/// An empty body reads as `{}`. Bytes that are not UTF-8 JSON are
/// [`ApiError::InvalidJson`]; well-formed JSON that is not an object has no
/// fields to extract and is reported as [`ApiError::Internal`].
pub fn parse_request(body: &[u8]) -> ApiResult<RewriteRequest> {
    let body = if body.is_empty() { EMPTY_BODY } else { body };

    let text = std::str::from_utf8(body).map_err(|_| ApiError::InvalidJson)?;
    let value: Value = serde_json::from_str(text).map_err(|_| ApiError::InvalidJson)?;

    if !value.is_object() {
        return Err(ApiError::Internal(format!(
            "request body is a JSON {}, expected an object",
            json_kind(&value)
        )));
    }

    serde_json::from_value(value)
        .map_err(|err| ApiError::Internal(format!("field extraction failed: {err}")))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_reads_as_empty_object() {
        assert_eq!(parse_request(b"").unwrap(), RewriteRequest::default());
    }

    #[test]
    fn malformed_json_is_invalid() {
        assert!(matches!(parse_request(b"not json"), Err(ApiError::InvalidJson)));
    }

    #[test]
    fn truncated_json_is_invalid() {
        assert!(matches!(
            parse_request(br#"{"text":"hel"#),
            Err(ApiError::InvalidJson)
        ));
    }

    #[test]
    fn invalid_utf8_is_invalid() {
        assert!(matches!(
            parse_request(b"{\"text\":\"\xff\xfe\"}"),
            Err(ApiError::InvalidJson)
        ));
    }

    #[test]
    fn non_object_json_is_internal() {
        assert!(matches!(parse_request(b"[1,2,3]"), Err(ApiError::Internal(_))));
        assert!(matches!(parse_request(b"\"text\""), Err(ApiError::Internal(_))));
    }

    #[test]
    fn object_body_is_extracted() {
        let req = parse_request(br#"{"text":"hello world"}"#).unwrap();
        assert_eq!(req.text, "hello world");
        assert_eq!(req.kind, "community");
    }
}
