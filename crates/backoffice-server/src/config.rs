use backoffice_auth::{AuthConfig, Role};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Credential signing and cookie settings
    #[serde(default)]
    pub auth: AuthConfig,
    /// Redis configuration
    #[serde(default)]
    pub redis: RedisConfig,
    /// Cache TTLs
    #[serde(default)]
    pub cache: CacheConfig,
    /// Users created on startup
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.host.parse::<std::net::IpAddr>().is_err() {
            return Err(format!(
                "server.host must be an IP address, got '{}'",
                self.server.host
            ));
        }
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        self.auth.validate().map_err(|e| e.to_string())?;
        if self.redis.enabled {
            if self.redis.url.is_empty() {
                return Err("redis.enabled=true requires redis.url".into());
            }
            if self.redis.pool_size == 0 {
                return Err("redis.pool_size must be > 0".into());
            }
            if self.redis.timeout_ms == 0 {
                return Err("redis.timeout_ms must be > 0".into());
            }
        }
        if self.cache.users_ttl_secs == 0 {
            return Err("cache.users_ttl_secs must be > 0".into());
        }
        for (i, user) in self.bootstrap.users.iter().enumerate() {
            if user.email.trim().is_empty() {
                return Err(format!("bootstrap.users[{i}].email cannot be empty"));
            }
            let password = user
                .resolve_password()
                .map_err(|e| format!("bootstrap.users[{i}].password_env: {e}"))?;
            if password.is_empty() {
                return Err(format!("bootstrap.users[{i}].password cannot be empty"));
            }
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        let ip = self
            .server
            .host
            .parse()
            .unwrap_or(std::net::IpAddr::from([0, 0, 0, 0]));
        SocketAddr::new(ip, self.server.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Redis configuration. Without it the cache lives in process memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Use Redis as the cache store.
    /// Default: false
    #[serde(default)]
    pub enabled: bool,

    /// Redis connection URL (e.g., "redis://localhost:6379")
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Bound on pool wait, connection setup and each command, in milliseconds
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_timeout_ms() -> u64 {
    1000
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for cached user directory entries, in seconds
    #[serde(default = "default_users_ttl_secs")]
    pub users_ttl_secs: u64,
}

fn default_users_ttl_secs() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            users_ttl_secs: default_users_ttl_secs(),
        }
    }
}

/// Users seeded into storage on startup.
///
/// Keep passwords out of the file with `password_env`, which names an
/// environment variable to read the password from.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub users: Vec<BootstrapUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapUser {
    pub email: String,
    /// Plain text, hashed before storage.
    #[serde(default)]
    pub password: String,
    /// Environment variable holding the password. Wins over `password`.
    #[serde(default)]
    pub password_env: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub image: Option<String>,
}

impl BootstrapUser {
    /// The plain-text password, read from `password_env` when it is set.
    pub fn resolve_password(&self) -> Result<String, String> {
        let Some(var) = &self.password_env else {
            return Ok(self.password.clone());
        };
        match std::env::var(var) {
            Ok(value) => Ok(value),
            Err(std::env::VarError::NotPresent) => {
                Err(format!("environment variable {var} is not set"))
            }
            Err(e) => Err(format!("failed to read {var}: {e}")),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_PATH: &str = "backoffice.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., BACKOFFICE__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("BACKOFFICE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SECRET: &str = "config-test-secret-with-32-bytes-min";

    fn valid() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.auth.secret = SECRET.to_string();
        cfg
    }

    #[test]
    fn test_defaults_need_only_a_secret() {
        assert!(AppConfig::default().validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = valid();
        cfg.server.port = 0;
        assert!(cfg.validate().unwrap_err().contains("server.port"));

        let mut cfg = valid();
        cfg.server.host = "localhost".into();
        assert!(cfg.validate().unwrap_err().contains("server.host"));

        let mut cfg = valid();
        cfg.server.host = "127.0.0.1".into();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.addr().to_string(), "127.0.0.1:8080");

        let mut cfg = valid();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().unwrap_err().contains("logging.level"));

        let mut cfg = valid();
        cfg.auth.secret = "short".into();
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.auth.token_ttl = std::time::Duration::ZERO;
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.redis.enabled = true;
        cfg.redis.timeout_ms = 0;
        assert!(cfg.validate().unwrap_err().contains("redis.timeout_ms"));

        let mut cfg = valid();
        cfg.redis.enabled = true;
        cfg.redis.pool_size = 0;
        assert!(cfg.validate().unwrap_err().contains("redis.pool_size"));
    }

    #[test]
    fn test_validate_rejects_incomplete_bootstrap_user() {
        let mut cfg = valid();
        cfg.bootstrap.users.push(BootstrapUser {
            email: "admin@example.com".into(),
            password: String::new(),
            password_env: None,
            name: None,
            role: Role::Administrator,
            image: None,
        });
        assert!(cfg.validate().unwrap_err().contains("password"));
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9191

[logging]
level = "debug"

[auth]
secret = "{SECRET}"
token_ttl = "12h"

[auth.cookie]
secure = false

[cache]
users_ttl_secs = 30

[[bootstrap.users]]
email = "admin@example.com"
password = "admin"
role = "ADMINISTRATOR"
"#
        )
        .unwrap();

        let cfg = loader::load_config(file.path().to_str()).unwrap();
        assert_eq!(cfg.server.port, 9191);
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.auth.token_ttl, std::time::Duration::from_secs(12 * 3600));
        assert!(!cfg.auth.cookie.secure);
        assert_eq!(cfg.auth.cookie.name, "auth-token");
        assert_eq!(cfg.cache.users_ttl_secs, 30);
        assert_eq!(cfg.bootstrap.users.len(), 1);
        assert_eq!(cfg.bootstrap.users[0].role, Role::Administrator);
        assert!(!cfg.redis.enabled);
    }

    #[test]
    fn test_bootstrap_password_from_env() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[auth]
secret = "{SECRET}"

[[bootstrap.users]]
email = "admin@example.com"
password_env = "TEST_BACKOFFICE_ADMIN_PASSWORD"
role = "ADMINISTRATOR"
"#
        )
        .unwrap();

        // Unset variable: the file is rejected at load time.
        let err = loader::load_config(file.path().to_str()).unwrap_err();
        assert!(err.contains("TEST_BACKOFFICE_ADMIN_PASSWORD"));

        unsafe {
            std::env::set_var("TEST_BACKOFFICE_ADMIN_PASSWORD", "env-pw");
        }
        let cfg = loader::load_config(file.path().to_str()).unwrap();
        unsafe {
            std::env::remove_var("TEST_BACKOFFICE_ADMIN_PASSWORD");
        }

        let user = &cfg.bootstrap.users[0];
        assert!(user.password.is_empty());
        assert_eq!(user.password_env.as_deref(), Some("TEST_BACKOFFICE_ADMIN_PASSWORD"));
    }

    #[test]
    fn test_resolve_password_prefers_env() {
        let mut user = BootstrapUser {
            email: "admin@example.com".into(),
            password: "from-file".into(),
            password_env: None,
            name: None,
            role: Role::Administrator,
            image: None,
        };
        assert_eq!(user.resolve_password().unwrap(), "from-file");

        user.password_env = Some("TEST_BACKOFFICE_RESOLVE_PASSWORD".into());
        assert!(user.resolve_password().is_err());

        unsafe {
            std::env::set_var("TEST_BACKOFFICE_RESOLVE_PASSWORD", "from-env");
        }
        assert_eq!(user.resolve_password().unwrap(), "from-env");
        unsafe {
            std::env::remove_var("TEST_BACKOFFICE_RESOLVE_PASSWORD");
        }
    }

    #[test]
    fn test_missing_secret_fails_to_load() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let err = loader::load_config(file.path().to_str()).unwrap_err();
        assert!(err.contains("auth.secret"));
    }
}
