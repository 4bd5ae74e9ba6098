use std::fmt;

use crate::constants::*;

/// Process configuration, read from the environment (and `.env` via `dotenv`).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: String,
    pub data_path: String,
    pub jwt_secret: String,
    pub token_expiry_hours: i64,
    pub frontend_origin: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} is required", key),
            ConfigError::Invalid { key, reason } => write!(f, "{} is invalid: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so tests need not touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("must be at least {} bytes", MIN_JWT_SECRET_LENGTH),
            });
        }

        let token_expiry_hours = match lookup("TOKEN_EXPIRY_HOURS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    key: "TOKEN_EXPIRY_HOURS",
                    reason: format!("expected a positive number of hours, got '{}'", raw),
                })?,
            None => DEFAULT_TOKEN_EXPIRY_HOURS,
        };

        let port = lookup("PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
        if port.parse::<u16>().is_err() {
            return Err(ConfigError::Invalid {
                key: "PORT",
                reason: format!("'{}' is not a valid port", port),
            });
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            data_path: lookup("DATA_PATH").unwrap_or_else(|| DEFAULT_DATA_PATH.to_string()),
            jwt_secret,
            token_expiry_hours,
            frontend_origin: lookup("FRONTEND_ORIGIN")
                .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGIN.to_string()),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
