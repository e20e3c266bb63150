// Centralized configuration for the realty back office
// Every env var is read once at startup; the result is injected through AppState

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub payments: PaymentsConfig,
    pub ai: AiConfig,
    pub notifications: NotificationsConfig,
    pub store_backend: StoreBackend,
    pub disable_embedded_migrations: bool,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub environment: Environment,
    pub rust_log: String,
    pub cors_allowed_origins: Vec<String>,
}

/// Environment type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which `Store` implementation backs the service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: u64,
    pub idle_timeout: u64,
    pub max_lifetime: u64,
}

/// Identity provider token verification. Exactly one key source is used,
/// the public key wins when both are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub jwt_secret: Option<String>,
    pub jwt_public_key: Option<String>,
    pub audience: Option<String>,
    pub issuer: Option<String>,
    pub leeway_secs: u64,
}

/// Payment provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub webhook_secret: String,
    pub webhook_tolerance_secs: u64,
    pub price_ids_basic: Vec<String>,
    pub price_ids_pro: Vec<String>,
    pub price_ids_premium: Vec<String>,
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
}

/// Chat-completion provider used for maintenance triage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub lease_window_days: i64,
    pub sweep_on_property_list: bool,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_required = |key: &str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVar(key.to_string()))
        };

        let get_optional =
            |key: &str| -> Option<String> { lookup(key).filter(|v| !v.trim().is_empty()) };

        let get_or_default =
            |key: &str, default: &str| -> String { get_optional(key).unwrap_or_else(|| default.to_string()) };

        let parse_or_default = |key: &str, default: &str| -> Result<u32, ConfigError> {
            get_or_default(key, default).parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid u32".to_string())
            })
        };

        let parse_u64_or_default = |key: &str, default: &str| -> Result<u64, ConfigError> {
            get_or_default(key, default).parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid u64".to_string())
            })
        };

        let parse_bool_or_default = |key: &str, default: &str| -> bool {
            get_or_default(key, default).to_lowercase() == "true"
        };

        let get_url_or_default = |key: &str, default: &str| -> Result<String, ConfigError> {
            let value = get_or_default(key, default);
            match url::Url::parse(&value) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                    Ok(value.trim_end_matches('/').to_string())
                },
                _ => Err(ConfigError::InvalidValue(
                    key.to_string(),
                    "not an absolute http(s) URL".to_string(),
                )),
            }
        };

        let parse_list = |key: &str| -> Vec<String> {
            get_or_default(key, "")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        // Server
        let bind_address = get_or_default("BIND_ADDRESS", "0.0.0.0:8080");
        let port = bind_address
            .rsplit(':')
            .next()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let environment = Environment::from(get_or_default("ENVIRONMENT", "development"));
        let rust_log = get_or_default("RUST_LOG", "realty_backend_core=debug,tower_http=info");
        let cors_allowed_origins: Vec<String> = get_or_default("CORS_ALLOWED_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let store_backend = match get_or_default("STORE_BACKEND", "postgres")
            .to_lowercase()
            .as_str()
        {
            "postgres" | "postgresql" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORE_BACKEND".to_string(),
                    format!("expected postgres or memory, got {}", other),
                ))
            },
        };

        // Database. The memory backend never opens a connection.
        let database_url = match store_backend {
            StoreBackend::Postgres => get_required("DATABASE_URL")?,
            StoreBackend::Memory => get_or_default("DATABASE_URL", ""),
        };
        let database = DatabaseConfig {
            url: database_url,
            max_connections: parse_or_default("DATABASE_MAX_CONNECTIONS", "20")?,
            min_connections: parse_or_default("DATABASE_MIN_CONNECTIONS", "2")?,
            connect_timeout: parse_u64_or_default("DATABASE_CONNECT_TIMEOUT", "30")?,
            idle_timeout: parse_u64_or_default("DATABASE_IDLE_TIMEOUT", "600")?,
            max_lifetime: parse_u64_or_default("DATABASE_MAX_LIFETIME", "1800")?,
        };

        // Identity
        let jwt_secret = get_optional("IDENTITY_JWT_SECRET");
        let jwt_public_key = get_optional("IDENTITY_JWT_PUBLIC_KEY");
        match (&jwt_secret, &jwt_public_key) {
            (None, None) => {
                return Err(ConfigError::MissingVar(
                    "IDENTITY_JWT_SECRET or IDENTITY_JWT_PUBLIC_KEY".to_string(),
                ))
            },
            (Some(secret), None) if secret.len() < 32 => {
                return Err(ConfigError::InvalidValue(
                    "IDENTITY_JWT_SECRET".to_string(),
                    "Secret must be at least 32 characters long".to_string(),
                ))
            },
            _ => {},
        }
        let identity = IdentityConfig {
            jwt_secret,
            jwt_public_key,
            audience: get_optional("IDENTITY_JWT_AUDIENCE"),
            issuer: get_optional("IDENTITY_JWT_ISSUER"),
            leeway_secs: parse_u64_or_default("IDENTITY_JWT_LEEWAY_SECS", "30")?,
        };

        // Payments
        let payments = PaymentsConfig {
            api_base: get_url_or_default("PAYMENTS_API_BASE", "https://api.stripe.com")?,
            api_key: get_optional("PAYMENTS_API_KEY"),
            webhook_secret: get_required("PAYMENTS_WEBHOOK_SECRET")?,
            webhook_tolerance_secs: parse_u64_or_default("PAYMENTS_WEBHOOK_TOLERANCE_SECS", "300")?,
            price_ids_basic: parse_list("PAYMENTS_PRICE_BASIC"),
            price_ids_pro: parse_list("PAYMENTS_PRICE_PRO"),
            price_ids_premium: parse_list("PAYMENTS_PRICE_PREMIUM"),
            checkout_success_url: get_url_or_default(
                "PAYMENTS_CHECKOUT_SUCCESS_URL",
                "http://localhost:3000/dashboard/realtor?checkout=success",
            )?,
            checkout_cancel_url: get_url_or_default(
                "PAYMENTS_CHECKOUT_CANCEL_URL",
                "http://localhost:3000/pricing",
            )?,
        };

        // AI triage
        let ai = AiConfig {
            api_base: get_url_or_default("AI_API_BASE", "https://api.openai.com/v1")?,
            api_key: get_optional("AI_API_KEY"),
            model: get_or_default("AI_MODEL", "gpt-4o-mini"),
            timeout_secs: parse_u64_or_default("AI_TIMEOUT_SECS", "10")?,
        };

        let lease_window_days = get_or_default("LEASE_EXPIRY_WINDOW_DAYS", "30")
            .parse::<i64>()
            .ok()
            .filter(|days| *days >= 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "LEASE_EXPIRY_WINDOW_DAYS".to_string(),
                    "not a non-negative number of days".to_string(),
                )
            })?;
        let notifications = NotificationsConfig {
            lease_window_days,
            sweep_on_property_list: parse_bool_or_default("LEASE_SWEEP_ON_PROPERTY_LIST", "true"),
        };

        Ok(Self {
            server: ServerConfig {
                bind_address,
                port,
                environment,
                rust_log,
                cors_allowed_origins,
            },
            database,
            identity,
            payments,
            ai,
            notifications,
            store_backend,
            disable_embedded_migrations: parse_bool_or_default(
                "DISABLE_EMBEDDED_MIGRATIONS",
                "false",
            ),
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.server.environment == Environment::Production
    }
}
