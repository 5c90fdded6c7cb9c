use std::sync::Arc;

use tracing::info;

use drafty_api::{serve, CorsPolicy, PlaceholderRewriter, Rewriter, ServerConfig};

use crate::config::AppConfig;

/// Start the rewrite HTTP server and block until Ctrl-C or SIGTERM.
pub async fn run(host: Option<&str>, port: Option<u16>, config: &AppConfig) -> anyhow::Result<()> {
    let server_config = server_config(host, port, config);
    let rewriter: Arc<dyn Rewriter> =
        Arc::new(PlaceholderRewriter::new(config.rewrite.banner.clone()));

    info!(
        host = %server_config.host,
        port = server_config.port,
        endpoint = %server_config.endpoint_path,
        private_network = server_config.cors.allow_private_network,
        "Server starting"
    );

    serve(&server_config, rewriter).await
}

/// Merge command-line overrides over the loaded configuration.
fn server_config(host: Option<&str>, port: Option<u16>, config: &AppConfig) -> ServerConfig {
    ServerConfig {
        host: host.unwrap_or(&config.server.host).to_string(),
        port: port.unwrap_or(config.server.port),
        endpoint_path: config.server.endpoint_path.clone(),
        request_timeout_secs: config.server.request_timeout_secs,
        max_body_bytes: config.server.max_body_bytes,
        cors: CorsPolicy {
            allow_private_network: config.cors.allow_private_network,
        },
    }
}
