use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "SPIDERHOOK_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/spiderhook.toml";
const ENV_PREFIX: &str = "SPIDERHOOK";
const ENV_SEPARATOR: &str = "__";
const AUTH_TOKEN_ENV_VAR: &str = "SPIDERHOOK_AUTH_TOKEN";

/// Resolve the configuration file path: explicit path, then `SPIDERHOOK_CONFIG`, then the default
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load(explicit_path: Option<PathBuf>) -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let mut config = load_from_sources(config_path(explicit_path))?;

    load_secrets(&mut config);

    Ok(config)
}

/// Secrets are never stored in TOML files, only in environment
fn load_secrets(config: &mut Config) {
    if let Ok(token) = env::var(AUTH_TOKEN_ENV_VAR) {
        if !token.is_empty() {
            config.server.auth_token = Some(token);
        }
    }

    for provider in &mut config.download_providers {
        if let Some(var) = &provider.rpc_secret_env {
            match env::var(var) {
                Ok(secret) => provider.rpc_secret = Some(secret),
                Err(_) => tracing::warn!(
                    provider = %provider.name,
                    var = %var,
                    "RPC secret variable is not set"
                ),
            }
        }
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // SPIDERHOOK__SERVER__BIND_ADDR -> server.bind_addr
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
