pub mod fallback;
pub mod rewrite;
