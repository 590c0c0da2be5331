//! Configuration management

use argon2::password_hash::PasswordHash;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::identity::firebase::DEFAULT_FIREBASE_AUTH_URL;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/mygrade";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default inactivity timeout for admin and student sessions (10 minutes).
pub const DEFAULT_INACTIVITY_TIMEOUT_SECS: u64 = 600;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreBackend,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub session: SessionConfig,
    pub cors: CorsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Which document store backs the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            _ => Err(anyhow::anyhow!("Invalid document store backend: {}", s)),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// Which identity service checks administrator credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdentityBackend {
    #[default]
    Local,
    Firebase,
}

impl FromStr for IdentityBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(IdentityBackend::Local),
            "firebase" => Ok(IdentityBackend::Firebase),
            _ => Err(anyhow::anyhow!("Invalid identity backend: {}", s)),
        }
    }
}

/// One configured administrator account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAccount {
    pub email: String,
    /// Argon2 PHC string of the password
    pub password_hash: String,
}

/// Identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub backend: IdentityBackend,
    pub admin_accounts: Vec<AdminAccount>,
    pub firebase_api_key: Option<String>,
    pub firebase_auth_url: String,
}

/// Browser session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub inactivity_timeout_secs: u64,
    pub secure_cookies: bool,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Parse `email:phc;email:phc`.
///
/// Each password is an argon2 PHC string (`$argon2id$v=19$m=...`). PHC
/// strings contain commas, so accounts are separated by `;`. In a `.env` file
/// the value needs single quotes to keep the `$` signs literal.
pub fn parse_admin_accounts(raw: &str) -> anyhow::Result<Vec<AdminAccount>> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (email, phc) = entry
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("Admin account '{}' must be email:hash", entry))?;
            let (email, phc) = (email.trim(), phc.trim());
            match PasswordHash::new(phc) {
                Ok(hash) if hash.algorithm.as_str().starts_with("argon2") => {},
                _ => anyhow::bail!("Admin account '{}' needs an argon2 PHC password hash", email),
            }
            Ok(AdminAccount {
                email: email.to_string(),
                password_hash: phc.to_string(),
            })
        })
        .collect()
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let store = match std::env::var("MYGRADE_STORE") {
            Ok(value) => value.parse()?,
            Err(_) => StoreBackend::default(),
        };

        let identity_backend = match std::env::var("MYGRADE_IDENTITY") {
            Ok(value) => value.parse()?,
            Err(_) => IdentityBackend::default(),
        };

        let admin_accounts = match std::env::var("MYGRADE_ADMIN_ACCOUNTS") {
            Ok(value) => parse_admin_accounts(&value)?,
            Err(_) => Vec::new(),
        };

        let config = Config {
            server: ServerConfig {
                host: std::env::var("MYGRADE_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("MYGRADE_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "MYGRADE_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            store,
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or(
                    "DATABASE_IDLE_TIMEOUT",
                    DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                ),
            },
            identity: IdentityConfig {
                backend: identity_backend,
                admin_accounts,
                firebase_api_key: std::env::var("FIREBASE_API_KEY").ok(),
                firebase_auth_url: std::env::var("FIREBASE_AUTH_URL")
                    .unwrap_or_else(|_| DEFAULT_FIREBASE_AUTH_URL.to_string()),
            },
            session: SessionConfig {
                inactivity_timeout_secs: env_or(
                    "MYGRADE_INACTIVITY_TIMEOUT_SECS",
                    DEFAULT_INACTIVITY_TIMEOUT_SECS,
                ),
                secure_cookies: env_or("MYGRADE_SECURE_COOKIES", false),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.store == StoreBackend::Postgres {
            if self.database.url.is_empty() {
                anyhow::bail!("Database URL cannot be empty");
            }

            if self.database.max_connections == 0 {
                anyhow::bail!("Database max_connections must be greater than 0");
            }

            if self.database.min_connections > self.database.max_connections {
                anyhow::bail!(
                    "Database min_connections ({}) cannot be greater than max_connections ({})",
                    self.database.min_connections,
                    self.database.max_connections
                );
            }
        }

        match self.identity.backend {
            IdentityBackend::Firebase => {
                if self
                    .identity
                    .firebase_api_key
                    .as_deref()
                    .map_or(true, |key| key.trim().is_empty())
                {
                    anyhow::bail!("FIREBASE_API_KEY is required for the firebase identity backend");
                }
            },
            IdentityBackend::Local => {
                if self.identity.admin_accounts.is_empty() {
                    tracing::warn!("No admin accounts configured - nobody can sign in");
                }
            },
        }

        if self.session.inactivity_timeout_secs == 0 {
            anyhow::bail!("Inactivity timeout must be greater than 0");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            store: StoreBackend::Memory,
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            identity: IdentityConfig {
                backend: IdentityBackend::Local,
                admin_accounts: Vec::new(),
                firebase_api_key: None,
                firebase_auth_url: DEFAULT_FIREBASE_AUTH_URL.to_string(),
            },
            session: SessionConfig {
                inactivity_timeout_secs: DEFAULT_INACTIVITY_TIMEOUT_SECS,
                secure_cookies: false,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const PHC: &str = "$argon2id$v=19$m=1024,t=1,p=1$c29tZXNhbHQ$RdescudvJCsgt3ub+b+dWRWJTmaaJObG";
    const SHA256_HEX: &str = "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b";

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_parse_admin_accounts() {
        let accounts =
            parse_admin_accounts(&format!("admin@school.edu:{}; dean@school.edu:{}", PHC, PHC))
                .unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[1].email, "dean@school.edu");
        assert_eq!(accounts[1].password_hash, PHC);

        assert!(parse_admin_accounts("admin@school.edu").is_err());
        assert!(parse_admin_accounts("admin@school.edu:abc").is_err());
        // unsalted digests are no longer accepted
        assert!(parse_admin_accounts(&format!("admin@school.edu:{}", SHA256_HEX)).is_err());
        assert!(parse_admin_accounts("").unwrap().is_empty());
    }

    #[test]
    fn test_firebase_requires_api_key() {
        let mut config = Config::default();
        config.identity.backend = IdentityBackend::Firebase;
        assert!(config.validate().is_err());

        config.identity.firebase_api_key = Some("key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_postgres_pool_bounds() {
        let mut config = Config::default();
        config.store = StoreBackend::Postgres;
        config.database.min_connections = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_load_from_env() {
        std::env::set_var("MYGRADE_PORT", "9100");
        std::env::set_var("MYGRADE_STORE", "memory");
        std::env::set_var("MYGRADE_INACTIVITY_TIMEOUT_SECS", "60");
        std::env::set_var("MYGRADE_ADMIN_ACCOUNTS", format!("admin@school.edu:{}", PHC));

        let config = Config::load().unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.session.inactivity_timeout_secs, 60);
        assert_eq!(config.identity.admin_accounts.len(), 1);

        for key in [
            "MYGRADE_PORT",
            "MYGRADE_STORE",
            "MYGRADE_INACTIVITY_TIMEOUT_SECS",
            "MYGRADE_ADMIN_ACCOUNTS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_invalid_backend_is_rejected() {
        std::env::set_var("MYGRADE_STORE", "mongo");
        assert!(Config::load().is_err());
        std::env::remove_var("MYGRADE_STORE");
    }
}
