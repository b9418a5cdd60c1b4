//! JWT credential authority.
//!
//! Signs identity claims with a single shared HMAC-SHA256 secret and verifies
//! them back into an [`Identity`].
//!
//! ## Example
//!
//! ```ignore
//! use std::time::Duration;
//! use backoffice_auth::token::TokenAuthority;
//!
//! let authority = TokenAuthority::new(secret, "backoffice")?;
//! let token = authority.issue(&identity, Duration::from_secs(3600))?;
//! let decoded = authority.verify(&token)?;
//! assert_eq!(decoded, identity);
//! ```

use std::fmt;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::config::{AuthConfig, ConfigError};
use crate::identity::Identity;
use crate::role::Role;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while issuing or verifying credentials.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The credential could not be parsed at all.
    #[error("Malformed token: {message}")]
    Malformed {
        /// Description of what could not be parsed.
        message: String,
    },

    /// The signature does not match the payload.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The embedded expiry is in the past.
    #[error("Token expired")]
    Expired,

    /// Failed to encode a credential.
    #[error("Failed to encode token: {message}")]
    Encoding {
        /// Description of the encoding error.
        message: String,
    },
}

impl TokenError {
    /// Creates a new `Malformed` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates a new `Encoding` error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Returns `true` for the three verification failures
    /// (malformed, invalid signature, expired).
    #[must_use]
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            Self::Malformed { .. } | Self::InvalidSignature | Self::Expired
        )
    }

    /// Short name of the failure kind, for structured logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "malformed",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired",
            Self::Encoding { .. } => "encoding",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::malformed(err.to_string()),
        }
    }
}

// ============================================================================
// Claims
// ============================================================================

/// Claims embedded in a session credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Issuer.
    pub iss: String,

    /// Subject (user id).
    pub sub: String,

    /// User email.
    pub email: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Role at issuance.
    pub role: Role,

    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Unique credential id, for log correlation.
    pub jti: String,
}

impl SessionClaims {
    /// Creates a new builder for the given identity.
    #[must_use]
    pub fn builder(issuer: impl Into<String>, identity: &Identity) -> SessionClaimsBuilder {
        SessionClaimsBuilder::new(issuer, identity)
    }

    /// Converts the claims back into the identity they were built from.
    #[must_use]
    pub fn into_identity(self) -> Identity {
        Identity {
            id: self.sub,
            email: self.email,
            name: self.name,
            role: self.role,
            image: self.image,
        }
    }
}

/// Builder for `SessionClaims`.
pub struct SessionClaimsBuilder {
    claims: SessionClaims,
}

impl SessionClaimsBuilder {
    fn new(issuer: impl Into<String>, identity: &Identity) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Self {
            claims: SessionClaims {
                iss: issuer.into(),
                sub: identity.id.clone(),
                email: identity.email.clone(),
                name: identity.name.clone(),
                role: identity.role,
                image: identity.image.clone(),
                iat: now,
                exp: now + 3600, // Default 1 hour
                jti: uuid::Uuid::new_v4().to_string(),
            },
        }
    }

    /// Sets the expiration relative to the issue time.
    #[must_use]
    pub fn expires_in(mut self, ttl: Duration) -> Self {
        let secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        self.claims.exp = self.claims.iat.saturating_add(secs);
        self
    }

    /// Sets an absolute expiration timestamp.
    #[must_use]
    pub fn expires_at(mut self, exp: i64) -> Self {
        self.claims.exp = exp;
        self
    }

    /// Overrides the issue timestamp.
    #[must_use]
    pub fn issued_at(mut self, iat: i64) -> Self {
        self.claims.iat = iat;
        self
    }

    /// Builds the claims.
    #[must_use]
    pub fn build(self) -> SessionClaims {
        self.claims
    }
}

// ============================================================================
// Token Authority
// ============================================================================

/// Only `exp` is read before the signature check.
#[derive(Deserialize)]
struct ExpiryProbe {
    exp: i64,
}

/// Issues and verifies session credentials with a shared HMAC secret.
///
/// Pure computation; thread-safe and cheap to share behind an `Arc`.
pub struct TokenAuthority {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenAuthority {
    /// Creates an authority from a shared secret.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingValue` if the secret is empty.
    pub fn new(secret: impl AsRef<[u8]>, issuer: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(ConfigError::MissingValue("auth.secret".to_string()));
        }

        let issuer = issuer.into();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&issuer]);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        Ok(Self {
            issuer,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Creates an authority from the auth configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the secret is empty.
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        Self::new(config.secret.as_bytes(), config.issuer.clone())
    }

    /// Returns the issuer claim value.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issues a credential for `identity` that expires after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if the claims cannot be serialized.
    pub fn issue(&self, identity: &Identity, ttl: Duration) -> Result<String, TokenError> {
        let claims = SessionClaims::builder(&self.issuer, identity)
            .expires_in(ttl)
            .build();
        self.encode(&claims)
    }

    /// Signs arbitrary session claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if encoding fails.
    pub fn encode(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::encoding(e.to_string()))
    }

    /// Verifies a credential and returns the identity it carries.
    ///
    /// Expiry is read from the payload before the signature is checked, so a
    /// past-dated credential reports `Expired` whether or not it is authentic.
    ///
    /// # Errors
    ///
    /// - `TokenError::Malformed` if the credential cannot be parsed
    /// - `TokenError::Expired` if the expiry is in the past
    /// - `TokenError::InvalidSignature` if the signature does not match
    pub fn verify(&self, credential: &str) -> Result<Identity, TokenError> {
        let exp = peek_expiry(credential)?;
        let now = OffsetDateTime::now_utc().unix_timestamp();
        if exp < now {
            return Err(TokenError::Expired);
        }

        let data = decode::<SessionClaims>(credential, &self.decoding_key, &self.validation)?;
        Ok(data.claims.into_identity())
    }
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

/// Reads the `exp` claim without checking the signature.
fn peek_expiry(credential: &str) -> Result<i64, TokenError> {
    let mut segments = credential.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::malformed(
            "expected three dot-separated segments",
        ));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| TokenError::malformed(format!("payload is not base64url: {e}")))?;
    let probe: ExpiryProbe = serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::malformed(format!("payload has no usable exp: {e}")))?;
    Ok(probe.exp)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn authority() -> TokenAuthority {
        TokenAuthority::new(SECRET, "backoffice").unwrap()
    }

    fn identity() -> Identity {
        Identity::new("user-1", "ada@example.com", Role::Manager)
            .with_name("Ada Lovelace")
            .with_image("https://cdn.example.com/ada.png")
    }

    fn now() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            TokenAuthority::new("", "backoffice"),
            Err(ConfigError::MissingValue(_))
        ));
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let authority = authority();
        let original = identity();

        let token = authority
            .issue(&original, Duration::from_secs(3600))
            .unwrap();
        assert_eq!(token.split('.').count(), 3);

        let decoded = authority.verify(&token).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_round_trip_without_optional_fields() {
        let authority = authority();
        let original = Identity::new("user-2", "bob@example.com", Role::Collaborator);

        let token = authority.issue(&original, Duration::from_secs(60)).unwrap();
        assert_eq!(authority.verify(&token).unwrap(), original);
    }

    #[test]
    fn test_claims_carry_expiry_and_role() {
        let claims = SessionClaims::builder("backoffice", &identity())
            .expires_in(Duration::from_secs(30 * 24 * 3600))
            .build();

        assert_eq!(claims.exp - claims.iat, 30 * 24 * 3600);
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, Role::Manager);

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["role"], "MANAGER");
        assert_eq!(json["email"], "ada@example.com");
    }

    #[test]
    fn test_expired_token_rejected() {
        let authority = authority();
        let claims = SessionClaims::builder("backoffice", &identity())
            .issued_at(now() - 7200)
            .expires_at(now() - 3600)
            .build();

        let token = authority.encode(&claims).unwrap();
        assert!(matches!(authority.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_expired_reported_regardless_of_signature() {
        let other = TokenAuthority::new("another-secret-that-is-long-enough!!", "backoffice")
            .unwrap();
        let claims = SessionClaims::builder("backoffice", &identity())
            .expires_at(now() - 10)
            .build();

        let token = other.encode(&claims).unwrap();
        assert!(matches!(authority().verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_invalid_signature_rejected() {
        let other = TokenAuthority::new("another-secret-that-is-long-enough!!", "backoffice")
            .unwrap();

        let token = other.issue(&identity(), Duration::from_secs(3600)).unwrap();
        assert!(matches!(
            authority().verify(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let authority = authority();
        let token = authority
            .issue(&identity(), Duration::from_secs(3600))
            .unwrap();

        let forged_claims = SessionClaims::builder("backoffice", &identity())
            .expires_in(Duration::from_secs(3600))
            .build();
        let forged = SessionClaims {
            role: Role::Administrator,
            ..forged_claims
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());

        let parts: Vec<&str> = token.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(matches!(
            authority.verify(&tampered),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let authority = authority();

        for garbage in ["", "garbage", "a.b", "a.b.c.d", "a.!!!.c", "e30.e30.e30"] {
            let result = authority.verify(garbage);
            assert!(
                matches!(result, Err(TokenError::Malformed { .. })),
                "{garbage:?} -> {result:?}"
            );
        }
    }

    #[test]
    fn test_wrong_issuer_is_malformed() {
        let foreign = TokenAuthority::new(SECRET, "someone-else").unwrap();
        let token = foreign.issue(&identity(), Duration::from_secs(60)).unwrap();

        assert!(matches!(
            authority().verify(&token),
            Err(TokenError::Malformed { .. })
        ));
    }

    #[test]
    fn test_error_predicates() {
        assert!(TokenError::Expired.is_verification_failure());
        assert!(TokenError::InvalidSignature.is_verification_failure());
        assert!(TokenError::malformed("x").is_verification_failure());
        assert!(!TokenError::encoding("x").is_verification_failure());

        assert_eq!(TokenError::Expired.kind(), "expired");
        assert_eq!(TokenError::InvalidSignature.kind(), "invalid_signature");
        assert_eq!(TokenError::malformed("x").kind(), "malformed");
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", authority());
        assert!(debug.contains("backoffice"));
        assert!(!debug.contains(SECRET));
    }
}
