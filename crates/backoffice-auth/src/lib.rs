//! # backoffice-auth
//!
//! Authentication and authorization core for the Backoffice server.
//!
//! This crate provides:
//! - Signed, self-contained session credentials (HS256 JWT)
//! - The fixed four-level role hierarchy and its comparisons
//! - Cookie-based session resolution for incoming requests
//! - Axum extractors guarding routes by minimum role
//! - Sign-in, sign-out, session and refresh handlers
//!
//! ## Modules
//!
//! - [`config`] - Signing secret, credential lifetime and cookie settings
//! - [`token`] - Credential issuance and verification
//! - [`role`] - Role hierarchy
//! - [`session`] - Resolves the caller from the credential cookie
//! - [`middleware`] - Axum extractors and error responses
//! - [`password`] - Argon2 password hashing
//! - [`storage`] - User storage trait
//! - [`http`] - Axum HTTP handlers for the session endpoints

pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod middleware;
pub mod password;
pub mod role;
pub mod session;
pub mod storage;
pub mod token;

pub use config::{AuthConfig, ConfigError, CookieConfig};
pub use error::{AuthError, ErrorCategory};
pub use http::{
    SessionResponse, SignInRequest, SignOutResponse, refresh_handler, session_handler,
    sign_in_handler, sign_out_handler,
};
pub use identity::Identity;
pub use middleware::{
    Administrator, AuthState, Collaborator, CurrentUser, Employee, Manager, OptionalCurrentUser,
    RequireRole, RoleRequirement,
};
pub use role::{Role, UnknownRole, rank, require_role, satisfies};
pub use session::SessionResolver;
pub use storage::{User, UserStorage};
pub use token::{SessionClaims, TokenAuthority, TokenError};

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
