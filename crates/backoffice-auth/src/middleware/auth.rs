//! Cookie session extractors.

use std::marker::PhantomData;
use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;

use crate::config::{AuthConfig, ConfigError};
use crate::error::AuthError;
use crate::identity::Identity;
use crate::role::Role;
use crate::session::SessionResolver;
use crate::storage::UserStorage;
use crate::token::TokenAuthority;

// =============================================================================
// Auth State
// =============================================================================

/// State required by the session extractors and auth handlers.
///
/// Include it in the application state and expose it through `FromRef`:
///
/// ```ignore
/// #[derive(Clone)]
/// struct AppState {
///     auth: AuthState,
/// }
///
/// impl FromRef<AppState> for AuthState {
///     fn from_ref(state: &AppState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthState {
    /// Issues and verifies credentials.
    pub authority: Arc<TokenAuthority>,

    /// Resolves the caller from the credential cookie.
    pub resolver: SessionResolver,

    /// User lookups for sign-in and refresh.
    pub user_storage: Arc<dyn UserStorage>,

    /// Token lifetime and cookie settings.
    pub config: Arc<AuthConfig>,
}

impl AuthState {
    /// Creates the auth state from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the signing secret is not configured.
    pub fn new(config: AuthConfig, user_storage: Arc<dyn UserStorage>) -> Result<Self, ConfigError> {
        let authority = Arc::new(TokenAuthority::from_config(&config)?);
        let resolver = SessionResolver::new(authority.clone(), config.cookie.name.clone());
        Ok(Self {
            authority,
            resolver,
            user_storage,
            config: Arc::new(config),
        })
    }
}

/// Session resolved once per request and cached in the request extensions.
#[derive(Clone)]
struct ResolvedSession(Option<Identity>);

fn resolve_session(parts: &mut Parts, state: &AuthState) -> Option<Identity> {
    if let Some(ResolvedSession(identity)) = parts.extensions.get::<ResolvedSession>() {
        return identity.clone();
    }

    let jar = CookieJar::from_headers(&parts.headers);
    let identity = state.resolver.resolve_current_user(&jar);
    parts.extensions.insert(ResolvedSession(identity.clone()));
    identity
}

// =============================================================================
// Extractors
// =============================================================================

/// Extractor yielding the authenticated caller.
///
/// Rejects with `AuthError::AuthenticationRequired` (401) when the request
/// has no valid credential.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        resolve_session(parts, &auth_state)
            .map(CurrentUser)
            .ok_or(AuthError::AuthenticationRequired)
    }
}

/// Extractor yielding the caller if there is a valid session. Never rejects.
#[derive(Debug, Clone)]
pub struct OptionalCurrentUser(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalCurrentUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        Ok(OptionalCurrentUser(resolve_session(parts, &auth_state)))
    }
}

/// A minimum role, expressed as a type for use with [`RequireRole`].
pub trait RoleRequirement: Send + Sync + 'static {
    /// The least privileged role that passes.
    const ROLE: Role;
}

/// Requires at least [`Role::Collaborator`].
pub struct Collaborator;
/// Requires at least [`Role::Employee`].
pub struct Employee;
/// Requires at least [`Role::Manager`].
pub struct Manager;
/// Requires at least [`Role::Administrator`].
pub struct Administrator;

impl RoleRequirement for Collaborator {
    const ROLE: Role = Role::Collaborator;
}
impl RoleRequirement for Employee {
    const ROLE: Role = Role::Employee;
}
impl RoleRequirement for Manager {
    const ROLE: Role = Role::Manager;
}
impl RoleRequirement for Administrator {
    const ROLE: Role = Role::Administrator;
}

/// Extractor yielding the caller when their role satisfies `R`.
///
/// Rejects with 401 when there is no session and with
/// `AuthError::InsufficientRole` (403) when the role is too low.
pub struct RequireRole<R: RoleRequirement>(pub Identity, pub PhantomData<R>);

impl<S, R> FromRequestParts<S> for RequireRole<R>
where
    S: Send + Sync,
    R: RoleRequirement,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(identity) = CurrentUser::from_request_parts(parts, state).await?;

        if let Err(e) = identity.role.require(R::ROLE) {
            tracing::debug!(
                user_id = %identity.id,
                role = %identity.role,
                required = %R::ROLE,
                "Access denied: insufficient role"
            );
            return Err(e);
        }

        Ok(RequireRole(identity, PhantomData))
    }
}

// =============================================================================
// Tests
// =============================================================================
