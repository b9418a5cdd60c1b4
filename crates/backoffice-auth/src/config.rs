//! Authentication configuration.
//!
//! Holds the signing secret, credential lifetime and the cookie settings used
//! to carry the credential between browser and server.

use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

/// Minimum length of the HMAC signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Default credential lifetime (30 days).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 3600);

/// Root authentication configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// secret = "change-me-to-a-long-random-string-of-32-bytes"
/// issuer = "backoffice"
/// token_ttl = "30d"
///
/// [auth.cookie]
/// secure = false
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HMAC secret used to sign and verify credentials.
    pub secret: String,

    /// Value of the `iss` claim.
    pub issuer: String,

    /// How long an issued credential stays valid.
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,

    /// Cookie carrying the credential.
    pub cookie: CookieConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "backoffice".to_string(),
            token_ttl: DEFAULT_TOKEN_TTL,
            cookie: CookieConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the secret is missing or too short, the issuer
    /// is empty, or the token lifetime is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::MissingValue("auth.secret".to_string()));
        }
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue(format!(
                "auth.secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidValue(
                "auth.issuer cannot be empty".to_string(),
            ));
        }
        if self.token_ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "auth.token_ttl must be > 0".to_string(),
            ));
        }
        self.cookie.validate()
    }
}

/// Settings for the credential cookie.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie name.
    pub name: String,

    /// Set the `Secure` attribute. Disable only for local development over http.
    pub secure: bool,

    /// `SameSite` attribute: "lax", "strict" or "none".
    pub same_site: String,

    /// Cookie path.
    pub path: String,

    /// Optional cookie domain.
    pub domain: Option<String>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "auth-token".to_string(),
            secure: true,
            same_site: "lax".to_string(),
            path: "/".to_string(),
            domain: None,
        }
    }
}

impl CookieConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::InvalidValue(
                "auth.cookie.name cannot be empty".to_string(),
            ));
        }
        match self.same_site.to_ascii_lowercase().as_str() {
            "lax" | "strict" | "none" => Ok(()),
            other => Err(ConfigError::InvalidValue(format!(
                "Invalid auth.cookie.same_site: '{other}'. Must be lax, strict, or none"
            ))),
        }
    }

    fn same_site(&self) -> SameSite {
        match self.same_site.to_ascii_lowercase().as_str() {
            "strict" => SameSite::Strict,
            "none" => SameSite::None,
            _ => SameSite::Lax,
        }
    }

    /// Builds the cookie that carries a freshly issued credential.
    #[must_use]
    pub fn build_cookie(&self, token: impl Into<String>, max_age: Duration) -> Cookie<'static> {
        let max_age = time::Duration::seconds(i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX));
        self.base_cookie(token.into()).max_age(max_age).build()
    }

    /// Builds an empty, already-expired cookie that overwrites the credential.
    #[must_use]
    pub fn build_clear_cookie(&self) -> Cookie<'static> {
        self.base_cookie(String::new())
            .max_age(time::Duration::ZERO)
            .expires(time::OffsetDateTime::UNIX_EPOCH)
            .build()
    }

    fn base_cookie(&self, value: String) -> cookie::CookieBuilder<'static> {
        let mut builder = Cookie::build((self.name.clone(), value))
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site())
            .path(self.path.clone());
        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        builder
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    MissingValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AuthConfig {
        AuthConfig {
            secret: "a".repeat(MIN_SECRET_LEN),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.token_ttl, DEFAULT_TOKEN_TTL);
        assert_eq!(config.cookie.name, "auth-token");
        assert!(config.cookie.secure);
        assert_eq!(config.cookie.path, "/");
    }

    #[test]
    fn test_validate_requires_secret() {
        let config = AuthConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingValue(_))
        ));
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let config = AuthConfig {
            secret: "short".to_string(),
            ..AuthConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = AuthConfig {
            token_ttl: Duration::ZERO,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_same_site() {
        let mut config = valid_config();
        config.cookie.same_site = "sometimes".to_string();
        assert!(config.validate().is_err());
        config.cookie.same_site = "Strict".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_build_cookie() {
        let config = CookieConfig::default();
        let cookie = config
            .build_cookie("my_token_value", DEFAULT_TOKEN_TTL)
            .to_string();

        assert!(cookie.contains("auth-token=my_token_value"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=2592000"));
    }

    #[test]
    fn test_build_cookie_insecure_for_development() {
        let config = CookieConfig {
            secure: false,
            ..CookieConfig::default()
        };
        let cookie = config
            .build_cookie("value", Duration::from_secs(60))
            .to_string();
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_build_clear_cookie() {
        let cookie = CookieConfig::default().build_clear_cookie().to_string();
        assert!(cookie.starts_with("auth-token=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }

    #[test]
    fn test_deserialize_humantime_ttl() {
        let config: AuthConfig =
            serde_json::from_str(r#"{"secret":"s","token_ttl":"7d"}"#).unwrap();
        assert_eq!(config.token_ttl, Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.issuer, "backoffice");
    }
}
