//! Session resolution: inbound cookie jar → trusted identity.
//!
//! This is the single choke point between a request and a trusted
//! [`Identity`]. All verification failures collapse into "no session", so
//! callers only ever see "logged in" or "not logged in".

use std::sync::Arc;

use axum_extra::extract::cookie::CookieJar;

use crate::error::AuthError;
use crate::identity::Identity;
use crate::token::TokenAuthority;

/// Resolves the caller's identity from the credential cookie.
#[derive(Debug, Clone)]
pub struct SessionResolver {
    authority: Arc<TokenAuthority>,
    cookie_name: String,
}

impl SessionResolver {
    /// Creates a resolver reading the credential from `cookie_name`.
    pub fn new(authority: Arc<TokenAuthority>, cookie_name: impl Into<String>) -> Self {
        Self {
            authority,
            cookie_name: cookie_name.into(),
        }
    }

    /// Name of the cookie carrying the credential.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Returns the identity carried by the request's credential, or `None`
    /// when the cookie is absent, empty, malformed, forged or expired.
    #[must_use]
    pub fn resolve_current_user(&self, jar: &CookieJar) -> Option<Identity> {
        let token = jar.get(&self.cookie_name)?.value().trim();
        if token.is_empty() {
            return None;
        }

        match self.authority.verify(token) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::debug!(kind = e.kind(), error = %e, "Session credential rejected");
                None
            }
        }
    }

    /// Like [`resolve_current_user`](Self::resolve_current_user), but fails
    /// with `AuthenticationRequired` when there is no valid session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AuthenticationRequired` if no identity can be resolved.
    pub fn require_current_user(&self, jar: &CookieJar) -> Result<Identity, AuthError> {
        self.resolve_current_user(jar)
            .ok_or(AuthError::AuthenticationRequired)
    }
}
