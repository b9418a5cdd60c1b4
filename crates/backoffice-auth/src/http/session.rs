//! Sign-in, sign-out, session lookup and credential refresh.

use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::AuthResult;
use crate::error::AuthError;
use crate::identity::Identity;
use crate::middleware::{AuthState, CurrentUser, OptionalCurrentUser};
use crate::password::{verify_dummy, verify_password};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Sign-in request body.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    /// Account email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Current session as seen by the client.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionResponse {
    /// The signed-in user, or `null`.
    pub user: Option<Identity>,
}

/// Response from the sign-out endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignOutResponse {
    /// Always `true`; sign-out cannot fail.
    pub success: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Handler for POST /auth/sign-in.
///
/// Checks the password against the stored Argon2 hash, issues a credential
/// with the configured lifetime and sets it as the session cookie.
///
/// # Errors
///
/// - `InvalidRequest` if email or password is empty
/// - `InvalidCredentials` for unknown email, wrong password or inactive user
pub async fn sign_in_handler(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(request): Json<SignInRequest>,
) -> AuthResult<(CookieJar, Json<SessionResponse>)> {
    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Err(AuthError::invalid_request("email and password are required"));
    }

    let user = match state.user_storage.find_by_email(email).await? {
        Some(user) if user.active => user,
        Some(user) => {
            info!(user_id = %user.id, "Sign-in rejected: inactive user");
            return reject_without_hash(request.password).await;
        }
        None => {
            info!(email = %email, "Sign-in rejected: unknown email");
            return reject_without_hash(request.password).await;
        }
    };

    let Some(hash) = user.password_hash.clone() else {
        info!(user_id = %user.id, "Sign-in rejected: user has no password");
        return reject_without_hash(request.password).await;
    };

    // Argon2 is deliberately slow; keep it off the async workers.
    let password = request.password;
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::internal(format!("password check task failed: {e}")))?
        .map_err(|e| {
            warn!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
            AuthError::internal(e.to_string())
        })?;

    if !matches {
        info!(user_id = %user.id, "Sign-in rejected: wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    let identity = user.identity();
    let jar = jar.add(issue_cookie(&state, &identity)?);

    info!(user_id = %identity.id, role = %identity.role, "User signed in");
    Ok((
        jar,
        Json(SessionResponse {
            user: Some(identity),
        }),
    ))
}

/// Handler for POST /auth/sign-out.
///
/// Overwrites the session cookie with an empty, already-expired one. The
/// credential itself stays valid until its expiry.
pub async fn sign_out_handler(
    State(state): State<AuthState>,
    OptionalCurrentUser(user): OptionalCurrentUser,
    jar: CookieJar,
) -> (CookieJar, Json<SignOutResponse>) {
    if let Some(user) = user {
        info!(user_id = %user.id, "User signed out");
    }
    let jar = jar.add(state.config.cookie.build_clear_cookie());
    (jar, Json(SignOutResponse { success: true }))
}

/// Handler for GET /auth/session.
pub async fn session_handler(OptionalCurrentUser(user): OptionalCurrentUser) -> Json<SessionResponse> {
    Json(SessionResponse { user })
}

/// Handler for POST /auth/refresh.
///
/// Re-reads the user record and issues a new credential carrying the
/// current role, so role changes apply without signing in again.
///
/// # Errors
///
/// Returns `AuthenticationRequired` if the user no longer exists or is inactive.
pub async fn refresh_handler(
    State(state): State<AuthState>,
    CurrentUser(current): CurrentUser,
    jar: CookieJar,
) -> AuthResult<(CookieJar, Json<SessionResponse>)> {
    let user = match state.user_storage.find_by_id(&current.id).await? {
        Some(user) if user.active => user,
        _ => {
            debug!(user_id = %current.id, "Refresh rejected: user missing or inactive");
            return Err(AuthError::AuthenticationRequired);
        }
    };

    let identity = user.identity();
    if identity.role != current.role {
        info!(
            user_id = %identity.id,
            from = %current.role,
            to = %identity.role,
            "Role changed since last issuance"
        );
    }

    let jar = jar.add(issue_cookie(&state, &identity)?);
    Ok((
        jar,
        Json(SessionResponse {
            user: Some(identity),
        }),
    ))
}

/// Rejects with `InvalidCredentials` after a dummy Argon2 check, so response
/// time doesn't reveal whether the account exists.
async fn reject_without_hash<T>(password: String) -> AuthResult<T> {
    let _ = tokio::task::spawn_blocking(move || verify_dummy(&password)).await;
    Err(AuthError::InvalidCredentials)
}

fn issue_cookie(
    state: &AuthState,
    identity: &Identity,
) -> AuthResult<axum_extra::extract::cookie::Cookie<'static>> {
    let ttl = state.config.token_ttl;
    let token = state
        .authority
        .issue(identity, ttl)
        .map_err(|e| AuthError::internal(e.to_string()))?;
    Ok(state.config.cookie.build_cookie(token, ttl))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::http::{HeaderMap, HeaderValue, header::COOKIE};

    use super::*;
    use crate::config::AuthConfig;
    use crate::password::hash_password;
    use crate::role::Role;
    use crate::storage::{User, UserStorage};

    struct StaticUsers(Mutex<Vec<User>>);

    #[async_trait]
    impl UserStorage for StaticUsers {
        async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<User>> {
            Ok(self.0.lock().unwrap().iter().find(|u| u.id == user_id).cloned())
        }
        async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email.eq_ignore_ascii_case(email))
                .cloned())
        }
        async fn list(&self) -> AuthResult<Vec<User>> {
            Ok(self.0.lock().unwrap().clone())
        }
        async fn create(&self, user: &User) -> AuthResult<()> {
            self.0.lock().unwrap().push(user.clone());
            Ok(())
        }
        async fn update_role(&self, user_id: &str, role: Role) -> AuthResult<User> {
            let mut users = self.0.lock().unwrap();
            let user = users
                .iter_mut()
                .find(|u| u.id == user_id)
                .ok_or_else(|| AuthError::not_found(user_id))?;
            user.role = role;
            Ok(user.clone())
        }
    }

    fn state() -> (AuthState, Arc<StaticUsers>) {
        let users = Arc::new(StaticUsers(Mutex::new(vec![
            User::new("ada@example.com", Role::Employee)
                .with_id("u1")
                .with_password_hash(hash_password("pw-ada").unwrap()),
            User::new("old@example.com", Role::Manager)
                .with_id("u2")
                .with_password_hash(hash_password("pw-old").unwrap())
                .with_active(false),
        ])));
        let config = AuthConfig {
            secret: "http-test-secret-that-is-long-enough!".to_string(),
            ..AuthConfig::default()
        };
        (AuthState::new(config, users.clone()).unwrap(), users)
    }

    fn sign_in_request(email: &str, password: &str) -> Json<SignInRequest> {
        Json(SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    fn jar_from(jar: &CookieJar) -> CookieJar {
        let token = jar.get("auth-token").unwrap().value();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("auth-token={token}")).unwrap(),
        );
        CookieJar::from_headers(&headers)
    }

    #[tokio::test]
    async fn test_sign_in_sets_cookie() {
        let (state, _) = state();
        let (jar, Json(session)) = sign_in_handler(
            State(state.clone()),
            CookieJar::new(),
            sign_in_request("ADA@example.com", "pw-ada"),
        )
        .await
        .unwrap();

        let user = session.user.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.role, Role::Employee);

        let cookie = jar.get("auth-token").unwrap();
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(
            state.resolver.resolve_current_user(&jar_from(&jar)),
            Some(user)
        );
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password() {
        let (state, _) = state();
        let result = sign_in_handler(
            State(state),
            CookieJar::new(),
            sign_in_request("ada@example.com", "nope"),
        )
        .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_sign_in_unknown_and_inactive_users() {
        let (state, _) = state();
        let unknown = sign_in_handler(
            State(state.clone()),
            CookieJar::new(),
            sign_in_request("nobody@example.com", "pw"),
        )
        .await;
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));

        let inactive = sign_in_handler(
            State(state),
            CookieJar::new(),
            sign_in_request("old@example.com", "pw-old"),
        )
        .await;
        assert!(matches!(inactive, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_email_costs_a_password_check() {
        let (state, _) = state();
        // Warm the dummy hash so its one-off construction isn't measured.
        verify_dummy("warm-up");

        let started = std::time::Instant::now();
        let wrong = sign_in_handler(
            State(state.clone()),
            CookieJar::new(),
            sign_in_request("ada@example.com", "nope"),
        )
        .await;
        let wrong_elapsed = started.elapsed();
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

        let started = std::time::Instant::now();
        let unknown = sign_in_handler(
            State(state),
            CookieJar::new(),
            sign_in_request("nobody@example.com", "nope"),
        )
        .await;
        let unknown_elapsed = started.elapsed();
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));

        assert!(
            unknown_elapsed * 10 >= wrong_elapsed,
            "unknown email took {unknown_elapsed:?}, wrong password took {wrong_elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_sign_in_requires_fields() {
        let (state, _) = state();
        let result = sign_in_handler(State(state), CookieJar::new(), sign_in_request(" ", "")).await;
        assert!(matches!(result, Err(AuthError::InvalidRequest { .. })));
    }

    #[tokio::test]
    async fn test_sign_out_clears_cookie() {
        let (state, _) = state();
        let (jar, Json(response)) =
            sign_out_handler(State(state), OptionalCurrentUser(None), CookieJar::new()).await;

        assert!(response.success);
        let cookie = jar.get("auth-token").unwrap();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }

    #[tokio::test]
    async fn test_session_handler() {
        let Json(anonymous) = session_handler(OptionalCurrentUser(None)).await;
        assert!(anonymous.user.is_none());
        assert_eq!(
            serde_json::to_value(&anonymous).unwrap(),
            serde_json::json!({ "user": null })
        );
    }

    #[tokio::test]
    async fn test_refresh_picks_up_role_change() {
        let (state, users) = state();
        let stale = Identity::new("u1", "ada@example.com", Role::Employee);
        users.update_role("u1", Role::Manager).await.unwrap();

        let (jar, Json(session)) =
            refresh_handler(State(state.clone()), CurrentUser(stale), CookieJar::new())
                .await
                .unwrap();

        assert_eq!(session.user.unwrap().role, Role::Manager);
        let resolved = state.resolver.resolve_current_user(&jar_from(&jar)).unwrap();
        assert_eq!(resolved.role, Role::Manager);
    }

    #[tokio::test]
    async fn test_refresh_rejects_missing_user() {
        let (state, _) = state();
        let ghost = Identity::new("gone", "gone@example.com", Role::Administrator);
        let result = refresh_handler(State(state), CurrentUser(ghost), CookieJar::new()).await;
        assert!(matches!(result, Err(AuthError::AuthenticationRequired)));
    }
}
