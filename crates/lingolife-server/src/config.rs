//! Server configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use lingolife_dictionary::YoudaoConfig;
use lingolife_store::StoreConfig;

/// Secret used when none is configured. Tokens signed with it are only fit
/// for local development.
pub const FALLBACK_JWT_SECRET: &str = "your-secret-key-change-in-production";

/// HTTP listener and token settings.
///
/// Note: Custom Debug impl masks the JWT secret to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Lifetime of issued tokens.
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: u32,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "***"))
            .field("token_ttl_days", &self.token_ttl_days)
            .finish()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_token_ttl_days() -> u32 {
    7
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            jwt_secret: None,
            token_ttl_days: default_token_ttl_days(),
        }
    }
}

impl ServerConfig {
    /// The configured secret, or the development fallback with a warning.
    pub fn jwt_secret(&self) -> &str {
        match self.jwt_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET is not set, using the insecure development secret");
                FALLBACK_JWT_SECRET
            }
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Top-level lingolife configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LingoConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: StoreConfig,
    #[serde(default)]
    pub youdao: YoudaoConfig,
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are inserted verbatim and never expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + len];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + len + 1..]);
        from = start + value.len();
    }
    result
}

fn resolve_opt(value: &mut Option<String>) {
    if let Some(v) = value.as_mut() {
        *v = resolve_env_vars(v);
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `lingolife.toml` in the current directory
/// 2. `~/.config/lingolife/config.toml`
///
/// Environment variable overrides: `PORT`, `JWT_SECRET`, `SUPABASE_URL`,
/// `SUPABASE_SERVICE_ROLE_KEY` (or `SUPABASE_ANON_KEY`), `YOUDAO_APP_KEY`,
/// `YOUDAO_APP_SECRET`.
pub fn load_config() -> Result<LingoConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<LingoConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => default_config_paths().into_iter().find(|p| p.exists()),
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<LingoConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => LingoConfig::default(),
    };

    resolve_opt(&mut config.server.jwt_secret);
    resolve_opt(&mut config.database.url);
    resolve_opt(&mut config.database.api_key);
    resolve_opt(&mut config.youdao.app_key);
    resolve_opt(&mut config.youdao.app_secret);

    apply_env_overrides(&mut config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut LingoConfig) -> Result<()> {
    if let Some(port) = env_non_empty("PORT") {
        config.server.port = port
            .parse()
            .with_context(|| format!("PORT is not a valid port number: {port}"))?;
    }
    if let Some(secret) = env_non_empty("JWT_SECRET") {
        config.server.jwt_secret = Some(secret);
    }
    if let Some(url) = env_non_empty("SUPABASE_URL") {
        config.database.url = Some(url);
    }
    if let Some(key) = env_non_empty("SUPABASE_SERVICE_ROLE_KEY").or_else(|| env_non_empty("SUPABASE_ANON_KEY")) {
        config.database.api_key = Some(key);
    }
    if let Some(key) = env_non_empty("YOUDAO_APP_KEY") {
        config.youdao.app_key = Some(key);
    }
    if let Some(secret) = env_non_empty("YOUDAO_APP_SECRET") {
        config.youdao.app_secret = Some(secret);
    }
    Ok(())
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("lingolife.toml")];
    if let Some(dir) = config_dir() {
        paths.push(dir.join("config.toml"));
    }
    paths
}

/// `~/.config/lingolife`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("lingolife"))
}
