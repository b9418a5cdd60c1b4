//! HTTP middleware for authentication and authorization.
//!
//! Axum extractors resolving the caller from the credential cookie:
//!
//! - [`CurrentUser`]: rejects with 401 when there is no valid session
//! - [`OptionalCurrentUser`]: never rejects
//! - [`RequireRole`]: 401 without a session, 403 when the role is too low
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use backoffice_auth::middleware::{CurrentUser, Manager, RequireRole};
//!
//! async fn me(CurrentUser(user): CurrentUser) -> String {
//!     format!("Hello, {}!", user.email)
//! }
//!
//! async fn report(RequireRole(user, _): RequireRole<Manager>) -> String {
//!     format!("Report for {}", user.email)
//! }
//!
//! let app = Router::new()
//!     .route("/me", get(me))
//!     .route("/report", get(report))
//!     .with_state(auth_state);
//! ```

pub mod auth;
pub mod error;

pub use auth::{
    Administrator, AuthState, Collaborator, CurrentUser, Employee, Manager, OptionalCurrentUser,
    RequireRole, RoleRequirement,
};
