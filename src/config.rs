//! Service configuration.
//!
//! All settings load from environment variables via [`ConfigBuilder::from_env`],
//! with a `COURSE_WEBHOOK_` prefix taking precedence over the bare variable
//! name. The Stripe signing secret is held as a [`SecretString`] and injected
//! into the receiver at construction; nothing reads ambient process state at
//! request time.

use std::net::SocketAddr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Main configuration for the webhook service.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// Database connection string (`DATABASE_URL`).
    pub database_url: Option<String>,
    /// Stripe webhook signing secret (`STRIPE_WEBHOOK_SECRET`).
    ///
    /// `None` is not a startup error: deliveries are then rejected at the
    /// signature-verification step with a 400.
    pub webhook_secret: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            database_url: None,
            webhook_secret: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Look up `COURSE_WEBHOOK_<key>`, falling back to the bare variable name.
fn env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("COURSE_WEBHOOK_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Builder for [`Config`] with environment variable support.
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<SecretString>) -> Self {
        self.config.webhook_secret = Some(secret.into());
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env(mut self) -> Self {
        if let Some(host) = env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = env_with_prefix("PORT") {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(level) = env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }
        if let Some(url) = env_with_prefix("DATABASE_URL") {
            self.config.database_url = Some(url);
        }
        if let Some(secret) = env_with_prefix("STRIPE_WEBHOOK_SECRET") {
            self.config.webhook_secret = Some(SecretString::from(secret));
        }
        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the server address does not parse, the port is
    /// zero, or the log level is not one of the tracing levels.
    pub fn build(self) -> anyhow::Result<Config> {
        if self.config.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        self.config.server.addr().map_err(|e| {
            anyhow::anyhow!(
                "Invalid server address {}:{} - {}",
                self.config.server.host,
                self.config.server.port,
                e
            )
        })?;

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            );
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
