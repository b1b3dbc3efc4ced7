use hocon::HoconLoader;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const INSECURE_DEFAULT_SECRET: &str = "insecure-default-for-testing-only-change-in-production";
const MASKED: &str = "***MASKED***";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub token: TokenConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
    /// Key for the HMAC-SHA256 access token strategy.
    pub hmac_secret: String,
    #[serde(default = "default_access_token_lifespan_secs")]
    pub access_token_lifespan_secs: u64,
    /// Scopes the token endpoint may grant.
    #[serde(default = "default_allowed_scopes")]
    pub allowed_scopes: Vec<String>,
}

fn default_access_token_lifespan_secs() -> u64 {
    3600
}

fn default_allowed_scopes() -> Vec<String> {
    vec!["read".to_string(), "write".to_string()]
}

/// Split a comma and/or whitespace separated scope list.
pub fn parse_scope_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        // HOCON file first, then nested `OAUTH2_*__*` variables, then flat variables.
        Self::from_hocon().unwrap_or_else(|e| {
            tracing::warn!(
                "Failed to load HOCON config: {}. Falling back to environment variables.",
                e
            );
            Self::from_env().unwrap_or_else(|e| {
                tracing::debug!("Nested environment configuration incomplete: {}", e);
                Self::from_env_fallback()
            })
        })
    }
}

impl Config {
    /// Load configuration from HOCON file with environment variable substitution
    pub fn from_hocon() -> Result<Self, String> {
        Self::from_hocon_path("application.conf")
    }

    /// Load configuration from a specific HOCON file path
    pub fn from_hocon_path<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(format!("Configuration file not found: {}", path.display()));
        }

        let mut config: Config = HoconLoader::new()
            .load_file(path)
            .map_err(|e| format!("Failed to load HOCON file: {}", e))?
            .resolve()
            .map_err(|e| format!("Failed to parse and resolve HOCON: {}", e))?;

        // HOCON doesn't support array substitution from env vars directly
        if let Ok(scopes) = std::env::var("OAUTH2_TOKEN_ALLOWED_SCOPES") {
            config.token.allowed_scopes = parse_scope_list(&scopes);
        }

        Ok(config)
    }

    /// Load from `OAUTH2_`-prefixed environment variables using `__` for nesting,
    /// e.g. `OAUTH2_TOKEN__HMAC_SECRET`.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("OAUTH2")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("token.allowed_scopes")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Fallback configuration from flat environment variables.
    fn from_env_fallback() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("OAUTH2_SERVER_HOST")
                    .unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: std::env::var("OAUTH2_SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            database: DatabaseConfig {
                url: std::env::var("OAUTH2_DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:oauth2.db?mode=rwc".to_string()),
            },
            token: TokenConfig {
                hmac_secret: std::env::var("OAUTH2_TOKEN_HMAC_SECRET").unwrap_or_else(|_| {
                    tracing::warn!(
                        "OAUTH2_TOKEN_HMAC_SECRET not set. Using insecure default for testing only!"
                    );
                    INSECURE_DEFAULT_SECRET.to_string()
                }),
                access_token_lifespan_secs: std::env::var("OAUTH2_TOKEN_LIFESPAN_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_else(default_access_token_lifespan_secs),
                allowed_scopes: std::env::var("OAUTH2_TOKEN_ALLOWED_SCOPES")
                    .map(|v| parse_scope_list(&v))
                    .unwrap_or_else(|_| default_allowed_scopes()),
            },
        }
    }

    pub fn access_token_lifespan(&self) -> Duration {
        Duration::from_secs(self.token.access_token_lifespan_secs)
    }

    /// Validate configuration for production use
    pub fn validate_for_production(&self) -> Result<(), String> {
        if self.token.hmac_secret == INSECURE_DEFAULT_SECRET {
            return Err("OAUTH2_TOKEN_HMAC_SECRET must be explicitly set for production. Generate a secure random string (minimum 32 characters).".to_string());
        }

        if self.token.hmac_secret.len() < 32 {
            return Err(format!(
                "OAUTH2_TOKEN_HMAC_SECRET must be at least 32 characters long (current: {} characters)",
                self.token.hmac_secret.len()
            ));
        }

        if self.token.access_token_lifespan_secs == 0 {
            return Err("access_token_lifespan_secs must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Produce a version safe to log (secrets masked).
    pub fn sanitized(&self) -> Self {
        let mut clone = self.clone();
        clone.token.hmac_secret = MASKED.to_string();
        clone
    }
}
