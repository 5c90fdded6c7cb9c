use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{info_span, Span};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

const ACCESS_CONTROL_ALLOW_PRIVATE_NETWORK: &str = "access-control-allow-private-network";

/// Cross-origin headers stamped onto every response.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    /// Answer Chromium's Private Network Access check so public HTTPS pages
    /// may reach a loopback server.
    pub allow_private_network: bool,
}

/// Injects a `X-Request-Id` header into every request and response.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = HeaderValue::from_str(&Uuid::new_v4().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
    req.headers_mut().insert(X_REQUEST_ID, request_id.clone());
    let mut response = next.run(req).await;
    response.headers_mut().insert(X_REQUEST_ID, request_id);
    response
}

/// Span for one HTTP request, tagged with the id set by [`request_id_middleware`].
pub fn make_request_span(req: &Request) -> Span {
    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");
    info_span!(
        "request",
        method = %req.method(),
        uri = %req.uri(),
        version = ?req.version(),
        request_id = %request_id,
    )
}

/// Answers `OPTIONS` on any path with an empty 204.
pub async fn handle_options(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    next.run(req).await
}

/// Adds the CORS headers regardless of status, including on errors and panics.
pub async fn apply_cors(State(policy): State<CorsPolicy>, req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    if policy.allow_private_network {
        headers.insert(
            ACCESS_CONTROL_ALLOW_PRIVATE_NETWORK,
            HeaderValue::from_static("true"),
        );
    }
    response
}
