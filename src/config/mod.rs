use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::allotment::{AllotmentPolicy, EligibilityOrder, DEFAULT_CATEGORY_CUTOFF};

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub allotment: AllotmentPolicy,
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

        let allotment = load_allotment_policy()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            allotment,
        })
    }
}

fn load_allotment_policy() -> Result<AllotmentPolicy, ConfigError> {
    let category_cutoff = match env::var("APP_CATEGORY_CUTOFF") {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(value) if value > 0 => value,
            _ => return Err(ConfigError::InvalidCutoff { value: raw }),
        },
        Err(_) => DEFAULT_CATEGORY_CUTOFF,
    };

    let order = match env::var("APP_ELIGIBILITY_ORDER") {
        Ok(raw) => raw
            .parse::<EligibilityOrder>()
            .map_err(|_| ConfigError::InvalidEligibilityOrder { value: raw })?,
        Err(_) => EligibilityOrder::default(),
    };

    Ok(AllotmentPolicy {
        category_cutoff,
        order,
    })
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

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCutoff { value: String },
    InvalidEligibilityOrder { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCutoff { value } => write!(
                f,
                "APP_CATEGORY_CUTOFF must be a positive integer (found '{}')",
                value
            ),
            ConfigError::InvalidEligibilityOrder { value } => write!(
                f,
                "APP_ELIGIBILITY_ORDER must be 'category_major' or 'rank_major' (found '{}')",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidCutoff { .. }
            | ConfigError::InvalidEligibilityOrder { .. } => None,
        }
    }
}
