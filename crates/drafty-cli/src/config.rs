use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use drafty_api::{ServerConfig, DEFAULT_BANNER};
use serde::{Deserialize, Serialize};

/// Full runtime configuration loaded from TOML + env vars.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub server: ServerSection,
    pub cors: CorsSection,
    pub rewrite: RewriteSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub endpoint_path: String,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsSection {
    pub allow_private_network: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RewriteSection {
    /// Prefix the placeholder rewriter puts in front of every result.
    pub banner: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let server = ServerConfig::default();
        Self {
            server: ServerSection {
                host: server.host,
                port: server.port,
                endpoint_path: server.endpoint_path,
                request_timeout_secs: server.request_timeout_secs,
                max_body_bytes: server.max_body_bytes,
            },
            cors: CorsSection {
                allow_private_network: server.cors.allow_private_network,
            },
            rewrite: RewriteSection {
                banner: DEFAULT_BANNER.to_string(),
            },
        }
    }
}

/// Load configuration from:
/// 1. Built-in defaults (`AppConfig::default`, derived from drafty-api)
/// 2. `config/default.toml` (if present)
/// 3. A custom config file path (if provided)
/// 4. Environment variables prefixed with `DRAFTY_`, sections split by `__`
pub fn load_config(config_file: Option<&PathBuf>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder()
        // Layer 1: defaults baked in
        .add_source(Config::try_from(&AppConfig::default())?)
        // Layer 2: project default.toml
        .add_source(File::with_name("config/default").required(false));

    // Layer 3: optional user-supplied config file
    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    // Layer 4: environment variables (DRAFTY_SERVER__PORT, DRAFTY_CORS__ALLOW_PRIVATE_NETWORK, ...)
    builder = builder.add_source(
        Environment::with_prefix("DRAFTY")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
