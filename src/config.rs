use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;
use url::Url;

/// Configuration for the impact rewards service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Reward engine behaviour
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub postgres_url: String,
    /// Enable PostgreSQL (if false, uses the in-memory store)
    pub postgres_enabled: bool,
    /// Pool size
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Mask credentials in logged connection strings
    pub sanitize_logs: bool,
    /// Emit span open/close events for HTTP requests
    pub log_requests: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Serialize impact updates per user (guards against lost updates)
    pub serialize_updates: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            postgres_url: "postgresql://localhost:5432/impact".to_string(),
            postgres_enabled: false,
            max_connections: 10,
        }
    }
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                sanitize_logs: true,
                log_requests: false,
            },
            engine: EngineConfig {
                serialize_updates: false,
            },
        }
    }
}

impl ImpactConfig {
    /// Load configuration from environment variables and validate it
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Server configuration
        if let Some(host) = lookup("IMPACT_HOST") {
            config.server.host = host;
        }

        if let Some(port) = lookup("IMPACT_PORT") {
            config.server.port = port.parse().context("Invalid IMPACT_PORT value")?;
        }

        // Database configuration
        if let Some(url) = lookup("IMPACT_POSTGRES_URL") {
            config.database.postgres_url = url;
        }

        if let Some(enabled) = lookup("IMPACT_POSTGRES_ENABLED") {
            config.database.postgres_enabled = enabled
                .parse()
                .context("Invalid IMPACT_POSTGRES_ENABLED value")?;
        }

        if let Some(max) = lookup("IMPACT_POSTGRES_MAX_CONNECTIONS") {
            config.database.max_connections = max
                .parse()
                .context("Invalid IMPACT_POSTGRES_MAX_CONNECTIONS value")?;
        }

        // Logging configuration
        if let Some(level) = lookup("IMPACT_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(sanitize) = lookup("IMPACT_SANITIZE_LOGS") {
            config.logging.sanitize_logs = sanitize
                .parse()
                .context("Invalid IMPACT_SANITIZE_LOGS value")?;
        }

        if let Some(log_requests) = lookup("IMPACT_LOG_REQUESTS") {
            config.logging.log_requests = log_requests
                .parse()
                .context("Invalid IMPACT_LOG_REQUESTS value")?;
        }

        // Engine configuration
        if let Some(serialize) = lookup("IMPACT_SERIALIZE_UPDATES") {
            config.engine.serialize_updates = serialize
                .parse()
                .context("Invalid IMPACT_SERIALIZE_UPDATES value")?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration for consistency
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(anyhow::anyhow!("Server host cannot be empty"));
        }

        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port must be non-zero"));
        }

        if self.database.postgres_enabled {
            let url = Url::parse(&self.database.postgres_url)
                .context("Invalid IMPACT_POSTGRES_URL format")?;
            if !matches!(url.scheme(), "postgres" | "postgresql") {
                return Err(anyhow::anyhow!(
                    "PostgreSQL URL must use the postgres:// or postgresql:// scheme: {}",
                    sanitize_for_logging(&self.database.postgres_url)
                ));
            }

            if self.database.max_connections == 0 {
                return Err(anyhow::anyhow!("PostgreSQL pool needs at least one connection"));
            }
        }

        if !matches!(
            self.logging.level.to_lowercase().as_str(),
            "error" | "warn" | "info" | "debug" | "trace"
        ) {
            warn!(level = %self.logging.level, "Unknown log level, falling back to info");
        }

        Ok(())
    }
}

/// Mask the credentials of a connection string before logging it.
///
/// Anything that does not parse as a URL is hidden entirely.
pub fn sanitize_for_logging(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return "<unparseable url>".to_string();
    };
    if url.username().is_empty() && url.password().is_none() {
        return url.to_string();
    }
    if url.set_username("***").is_err() || url.set_password(None).is_err() {
        return "<unparseable url>".to_string();
    }
    url.to_string()
}
