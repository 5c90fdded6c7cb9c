use anyhow::Result;
use async_trait::async_trait;

use crate::types::RewriteRequest;

pub const DEFAULT_BANNER: &str = "✨ REWRITTEN";

/// Turns a text plus its formatting options into the rewritten text.
///
/// Implementations are shared across concurrent requests and must not keep
/// per-request state. An `Err` surfaces to the caller as a generic 500.
#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String>;
}

/// Deterministic stand-in until a real rewriting backend is wired in.
///
/// Produces `"{banner} ({type}/{tone}/{language})\n\n{text}"`.
#[derive(Debug, Clone)]
pub struct PlaceholderRewriter {
    banner: String,
}

impl PlaceholderRewriter {
    pub fn new(banner: impl Into<String>) -> Self {
        Self {
            banner: banner.into(),
        }
    }
}

impl Default for PlaceholderRewriter {
    fn default() -> Self {
        Self::new(DEFAULT_BANNER)
    }
}

#[async_trait]
impl Rewriter for PlaceholderRewriter {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String> {
        Ok(format!(
            "{} ({}/{}/{})\n\n{}",
            self.banner, request.kind, request.tone, request.language, request.text
        ))
    }
}
