use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::forms::decimal::DecimalLocale;

const DEFAULT_HOUSES_PER_PAGE: usize = 3;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the rental service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub listings: ListingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let decimal_locale = match env::var("APP_DECIMAL_SEPARATOR") {
            Ok(raw) => parse_separator(&raw)?,
            Err(_) => DecimalLocale::default(),
        };

        let houses_per_page = match env::var("APP_HOUSES_PER_PAGE") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(ConfigError::InvalidPageSize)?,
            Err(_) => DEFAULT_HOUSES_PER_PAGE,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            listings: ListingConfig {
                decimal_locale,
                houses_per_page,
            },
        })
    }
}

fn parse_separator(raw: &str) -> Result<DecimalLocale, ConfigError> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(separator), None) => {
            DecimalLocale::new(separator).ok_or(ConfigError::InvalidDecimalSeparator {
                value: trimmed.to_string(),
            })
        }
        _ => Err(ConfigError::InvalidDecimalSeparator {
            value: trimmed.to_string(),
        }),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Listing presentation and form-binding defaults.
#[derive(Debug, Clone)]
pub struct ListingConfig {
    pub decimal_locale: DecimalLocale,
    pub houses_per_page: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            decimal_locale: DecimalLocale::default(),
            houses_per_page: DEFAULT_HOUSES_PER_PAGE,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDecimalSeparator { value: String },
    InvalidPageSize,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDecimalSeparator { value } => {
                write!(f, "APP_DECIMAL_SEPARATOR must be '.' or ',' (found '{value}')")
            }
            ConfigError::InvalidPageSize => {
                write!(f, "APP_HOUSES_PER_PAGE must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidDecimalSeparator { .. }
            | ConfigError::InvalidPageSize => None,
        }
    }
}
