//! Configuration management for the coupon alert relay.

use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::{directory::FetchConfig, dispatch::DispatchConfig};

const CONFIG_FILE: &str = "config.toml";

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`config.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// `DIRECTORY_URL` has no usable default and must be provided. The webhook
/// secret may be absent at load time; the webhook handler answers 500 for
/// every delivery until it is set, so the misconfiguration is observable
/// without crashing the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Relay
    /// Shared secret for webhook signature verification.
    ///
    /// Environment variable: `WEBHOOK_SECRET`
    #[serde(default, alias = "WEBHOOK_SECRET")]
    pub webhook_secret: String,
    /// URL of the coupon-to-destination directory document.
    ///
    /// Environment variable: `DIRECTORY_URL`
    #[serde(default, alias = "DIRECTORY_URL")]
    pub directory_url: String,

    // Server
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,
    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // Outbound HTTP
    /// Directory fetch timeout in seconds.
    ///
    /// Environment variable: `DIRECTORY_TIMEOUT_SECONDS`
    #[serde(default = "default_directory_timeout", alias = "DIRECTORY_TIMEOUT_SECONDS")]
    pub directory_timeout_seconds: u64,
    /// Alert delivery timeout per destination in seconds.
    ///
    /// Environment variable: `DELIVERY_TIMEOUT_SECONDS`
    #[serde(default = "default_delivery_timeout", alias = "DELIVERY_TIMEOUT_SECONDS")]
    pub delivery_timeout_seconds: u64,

    // Logging
    /// Log level configuration.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default = "default_log_level", alias = "RUST_LOG")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment
    /// variable overrides.
    ///
    /// # Errors
    ///
    /// Fails when no source provides a directory URL or when a value fails
    /// validation.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Convert to the directory fetcher configuration.
    pub fn to_fetch_config(&self) -> FetchConfig {
        FetchConfig {
            url: self.directory_url.clone(),
            timeout: Duration::from_secs(self.directory_timeout_seconds),
            ..FetchConfig::default()
        }
    }

    /// Convert to the alert dispatch configuration.
    pub fn to_dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            timeout: Duration::from_secs(self.delivery_timeout_seconds),
            ..DispatchConfig::default()
        }
    }

    /// Parse server socket address from host and port configuration.
    ///
    /// # Errors
    ///
    /// Fails when host and port do not form a valid socket address.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Whether a webhook secret has been provided.
    pub fn has_secret(&self) -> bool {
        !self.webhook_secret.is_empty()
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.directory_url.is_empty() {
            anyhow::bail!("directory_url must be set (DIRECTORY_URL)");
        }

        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.directory_timeout_seconds == 0 {
            anyhow::bail!("directory_timeout_seconds must be greater than 0");
        }

        if self.delivery_timeout_seconds == 0 {
            anyhow::bail!("delivery_timeout_seconds must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_secret: String::new(),
            directory_url: String::new(),
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            directory_timeout_seconds: default_directory_timeout(),
            delivery_timeout_seconds: default_delivery_timeout(),
            rust_log: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_directory_timeout() -> u64 {
    10
}

fn default_delivery_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}
