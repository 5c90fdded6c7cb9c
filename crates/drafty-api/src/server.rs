use std::{any::Any, future::Future, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Response},
    routing::post,
    BoxError, Extension, Router,
};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, Level};

use crate::{
    error::ApiError,
    middleware::{
        apply_cors, handle_options, make_request_span, request_id_middleware, CorsPolicy,
    },
    rewriter::Rewriter,
    routes::{
        fallback::{method_not_allowed, not_found},
        rewrite::rewrite,
    },
};

pub const DEFAULT_ENDPOINT_PATH: &str = "/api/rewrite";

/// Configuration for the API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// The single path that accepts `POST`; everything else is a 404.
    pub endpoint_path: String,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
    pub cors: CorsPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
            cors: CorsPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Reject values the router would panic on or that make the server unusable.
    pub fn validate(&self) -> anyhow::Result<()> {
        let path = &self.endpoint_path;
        if !path.starts_with('/') {
            bail!("endpoint path must start with '/', got {path:?}");
        }
        if path.contains(['{', '}'])
            || path
                .split('/')
                .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
        {
            bail!("endpoint path must be a literal path without captures, got {path:?}");
        }
        if self.request_timeout_secs == 0 {
            bail!("request timeout must be at least one second");
        }
        Ok(())
    }
}

/// Build the axum router for the rewrite endpoint and its middleware stack.
///
/// Layers run outermost first: request id, tracing, CORS headers, panic
/// recovery, preflight short-circuit, request timeout, body limit.
pub fn build_router(rewriter: Arc<dyn Rewriter>, config: &ServerConfig) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(make_request_span)
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let timeout = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_middleware_error))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )));

    Router::new()
        .route(
            &config.endpoint_path,
            post(rewrite).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(Extension(rewriter))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(timeout)
        .layer(middleware::from_fn(handle_options))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(config.cors.clone(), apply_cors))
        .layer(trace_layer)
        .layer(middleware::from_fn(request_id_middleware))
}

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Internal(format!("middleware error: {err}"))
    }
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}

/// A bound, not yet serving, rewrite server.
///
/// The listening socket is owned here from [`bind`](Self::bind) until the
/// server shuts down.
pub struct RewriteServer {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
}

impl RewriteServer {
    pub async fn bind(config: &ServerConfig, rewriter: Arc<dyn Rewriter>) -> anyhow::Result<Self> {
        config.validate().context("Invalid server configuration")?;

        let router = build_router(rewriter, config);
        let listener = TcpListener::bind((config.host.as_str(), config.port))
            .await
            .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
        let local_addr = listener.local_addr()?;

        info!(
            address = %local_addr,
            endpoint = %config.endpoint_path,
            "Rewrite server bound"
        );
        Ok(Self {
            listener,
            router,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve in the current task until `shutdown` resolves, then drain
    /// in-flight requests.
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(address = %self.local_addr, "Serving rewrite requests");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server shut down gracefully");
        Ok(())
    }

    /// Serve on a background task. Stop it through the returned handle.
    pub fn start(self) -> ServerHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let local_addr = self.local_addr;
        let task = tokio::spawn(self.run_until(async move {
            // A dropped sender also counts as a stop request.
            let _ = shutdown_rx.await;
        }));

        ServerHandle {
            local_addr,
            shutdown_tx,
            task,
        }
    }
}

/// Handle to a server started with [`RewriteServer::start`].
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<anyhow::Result<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn stop(self) -> anyhow::Result<()> {
        let _ = self.shutdown_tx.send(());
        self.task.await.context("Server task failed to join")?
    }
}

/// Bind per `config` and serve until SIGINT or SIGTERM.
pub async fn serve(config: &ServerConfig, rewriter: Arc<dyn Rewriter>) -> anyhow::Result<()> {
    RewriteServer::bind(config, rewriter)
        .await?
        .run_until(shutdown_signal())
        .await
}

/// Resolves on SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_loopback_8080() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.endpoint_path, "/api/rewrite");
        assert!(!cfg.cors.allow_private_network);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn relative_endpoint_path_is_rejected() {
        let cfg = ServerConfig {
            endpoint_path: "api/rewrite".to_string(),
            ..ServerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn capture_segments_are_rejected() {
        for path in ["/api/{id}", "/api/:id", "/api/*rest"] {
            let cfg = ServerConfig {
                endpoint_path: path.to_string(),
                ..ServerConfig::default()
            };
            assert!(cfg.validate().is_err(), "{path} should be rejected");
        }
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = ServerConfig {
            request_timeout_secs: 0,
            ..ServerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
