use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::scraper::ExtractorConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub extractor: ExtractorConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup, falling back to defaults
    /// for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ExtractorConfig::default();

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let ip = IpAddr::from_str(host.trim())
            .map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;

        let timeout_ms = parse_or(&lookup, "FETCH_TIMEOUT_MS", defaults.timeout.as_millis() as u64)?;
        let connect_timeout_ms = parse_or(
            &lookup,
            "CONNECT_TIMEOUT_MS",
            defaults.connect_timeout.as_millis() as u64,
        )?;
        let parse_timeout_ms = parse_or(
            &lookup,
            "PARSE_TIMEOUT_MS",
            defaults.parse_timeout.as_millis() as u64,
        )?;
        if timeout_ms == 0 || connect_timeout_ms == 0 || parse_timeout_ms == 0 {
            return Err(AppError::ConfigError(
                "Timeouts must be greater than zero".to_string(),
            ));
        }

        let extractor = ExtractorConfig {
            timeout: Duration::from_millis(timeout_ms),
            parse_timeout: Duration::from_millis(parse_timeout_ms),
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            max_redirects: parse_or(&lookup, "MAX_REDIRECTS", defaults.max_redirects)?,
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", defaults.max_body_bytes)?,
            user_agent: lookup("USER_AGENT")
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or(defaults.user_agent),
        };

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            extractor,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}
