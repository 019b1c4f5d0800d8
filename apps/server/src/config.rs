//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     FARMASYS_PORT=8080                                                  │
//! │     FARMASYS_DB_PATH=/var/lib/farmasys/farmasys.db                      │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     $FARMASYS_CONFIG, or                                                │
//! │     ~/.config/pos/farmasys.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.farmasys.pos/farmasys.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! │     127.0.0.1:5000, admin / 123                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 5000
//!
//! [database]
//! path = "/var/lib/farmasys/farmasys.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//!
//! [auth]
//! jwt_secret = "a long random string"
//! token_lifetime_secs = 43200
//! admin_username = "admin"
//! admin_password = "123"
//!
//! [store]
//! name = "Farmacia Central"
//! low_stock_threshold = 10
//! seed_demo_inventory = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use farmasys_db::DbConfig;

/// Secret used when none is configured. Tokens signed with it are only fit
/// for a development counter.
pub const DEV_JWT_SECRET: &str = "farmasys-dev-secret-change-me";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl HttpSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file, or `:memory:` for a throwaway database.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits on a locked database.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

/// Platform data directory, falling back to the working directory.
fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "farmasys", "pos")
        .map(|dirs| dirs.data_dir().join("farmasys.db"))
        .unwrap_or_else(|| PathBuf::from("farmasys.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Default: 12 hours, one counter shift.
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: i64,

    /// Admin created on first start when there are no users.
    #[serde(default = "default_admin_username")]
    pub admin_username: String,

    #[serde(default = "default_admin_password")]
    pub admin_password: String,
}

fn default_jwt_secret() -> String {
    DEV_JWT_SECRET.to_string()
}

fn default_token_lifetime() -> i64 {
    12 * 60 * 60
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "123".to_string()
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            jwt_secret: default_jwt_secret(),
            token_lifetime_secs: default_token_lifetime(),
            admin_username: default_admin_username(),
            admin_password: default_admin_password(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_name")]
    pub name: String,

    /// Products at or below this stock count as low.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,

    /// Load the demo products when the inventory is empty.
    #[serde(default)]
    pub seed_demo_inventory: bool,
}

fn default_store_name() -> String {
    "FarmaSys".to_string()
}

fn default_low_stock_threshold() -> i64 {
    farmasys_core::DEFAULT_LOW_STOCK_THRESHOLD
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            low_stock_threshold: default_low_stock_threshold(),
            seed_demo_inventory: false,
        }
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

impl ServerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, else `FARMASYS_CONFIG`, else the
    ///    platform config directory)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var("FARMASYS_CONFIG").ok().map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading server config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        if config.auth.jwt_secret == DEV_JWT_SECRET {
            warn!("Using the development JWT secret, set FARMASYS_JWT_SECRET in production");
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("port must be greater than 0".into()));
        }

        if self.auth.jwt_secret.len() < 16 {
            return Err(ConfigError::Invalid(
                "jwt_secret must be at least 16 bytes".into(),
            ));
        }

        if self.auth.token_lifetime_secs <= 0 {
            return Err(ConfigError::Invalid(
                "token_lifetime_secs must be greater than 0".into(),
            ));
        }

        if self.auth.admin_username.trim().is_empty() || self.auth.admin_password.is_empty() {
            return Err(ConfigError::Invalid(
                "admin_username and admin_password must be set".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.store.low_stock_threshold < 0 {
            return Err(ConfigError::Invalid(
                "low_stock_threshold must not be negative".into(),
            ));
        }

        Ok(())
    }

    /// Pool settings for the configured database.
    pub fn database_config(&self) -> DbConfig {
        if self.database.path.as_os_str() == ":memory:" {
            return DbConfig::in_memory();
        }

        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `FARMASYS_*` overrides read through `var`.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = var("FARMASYS_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(port) = var("FARMASYS_PORT") {
            match port.parse::<u16>() {
                Ok(p) => {
                    debug!(port = p, "Overriding port from environment");
                    self.server.port = p;
                }
                Err(_) => warn!(port = %port, "Ignoring invalid FARMASYS_PORT"),
            }
        }

        if let Some(path) = var("FARMASYS_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(secret) = var("FARMASYS_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Some(username) = var("FARMASYS_ADMIN_USERNAME") {
            self.auth.admin_username = username;
        }

        if let Some(password) = var("FARMASYS_ADMIN_PASSWORD") {
            self.auth.admin_password = password;
        }

        if let Some(seed) = var("FARMASYS_SEED_DEMO") {
            match seed.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.store.seed_demo_inventory = true,
                "0" | "false" | "no" | "off" => self.store.seed_demo_inventory = false,
                _ => warn!(value = %seed, "Ignoring invalid FARMASYS_SEED_DEMO"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "farmasys", "pos")
            .map(|dirs| dirs.config_dir().join("farmasys.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.server.bind_address(), "127.0.0.1:5000");
        assert_eq!(config.auth.admin_username, "admin");
        assert_eq!(config.store.low_stock_threshold, 10);
        assert!(!config.store.seed_demo_inventory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [store]
            seed_demo_inventory = true
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind_addr, "127.0.0.1");
        assert!(config.store.seed_demo_inventory);
        assert_eq!(config.auth.token_lifetime_secs, 43_200);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("FARMASYS_PORT", "9000"),
            ("FARMASYS_DB_PATH", ":memory:"),
            ("FARMASYS_SEED_DEMO", "yes"),
            ("FARMASYS_ADMIN_PASSWORD", "s3creto"),
        ]
        .into_iter()
        .collect();

        let mut config = ServerConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 9000);
        assert!(config.store.seed_demo_inventory);
        assert_eq!(config.auth.admin_password, "s3creto");
        assert!(config.database_config().is_in_memory());
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let mut config = ServerConfig::default();
        config.apply_overrides(|key| match key {
            "FARMASYS_PORT" => Some("not-a-port".to_string()),
            "FARMASYS_SEED_DEMO" => Some("maybe".to_string()),
            _ => None,
        });

        assert_eq!(config.server.port, 5000);
        assert!(!config.store.seed_demo_inventory);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ServerConfig::default();

        config.auth.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());

        config.auth.jwt_secret = "x".repeat(32);
        config.auth.admin_password = String::new();
        assert!(config.validate().is_err());

        config.auth.admin_password = "123".to_string();
        config.store.low_stock_threshold = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("farmasys.toml");
        std::fs::write(
            &path,
            "[auth]\njwt_secret = \"0123456789abcdef0123\"\n[store]\nname = \"Farmacia Central\"\n",
        )
        .unwrap();

        let config = ServerConfig::load(Some(path)).unwrap();
        assert_eq!(config.store.name, "Farmacia Central");
        assert_eq!(config.auth.jwt_secret, "0123456789abcdef0123");
    }

    #[test]
    fn test_toml_serialization() {
        let config = ServerConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[store]"));
    }
}
