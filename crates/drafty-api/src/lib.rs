//! # drafty-api
//!
//! Stateless JSON rewrite endpoint used by the Drafty browser extension and
//! keyboard.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | `POST` | `/api/rewrite` | Rewrite `text` for a `type`, `tone` and `language` |
//! | `OPTIONS` | any | CORS preflight, always `204` |
//!
//! Every other path answers `404 {"error":"Not found"}`. All responses carry
//! permissive CORS headers.

pub mod error;
pub mod middleware;
pub mod response;
pub mod rewriter;
pub mod routes;
pub mod server;
pub mod types;


pub use error::{ApiError, ApiResult};
pub use middleware::CorsPolicy;
pub use rewriter::{PlaceholderRewriter, Rewriter, DEFAULT_BANNER};
pub use server::{
    build_router, serve, RewriteServer, ServerConfig, ServerHandle, DEFAULT_ENDPOINT_PATH,
};
pub use types::{RewriteRequest, RewriteResponse};
