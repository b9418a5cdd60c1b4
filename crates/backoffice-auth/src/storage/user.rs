//! User storage trait.
//!
//! Defines the user-record lookups the auth core needs for sign-in and for
//! re-issuing credentials with a fresh role.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::AuthResult;
use crate::identity::Identity;
use crate::role::Role;

// =============================================================================
// User Type
// =============================================================================

/// A stored user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier.
    pub id: String,

    /// Unique email address, used to sign in.
    pub email: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Assigned role.
    pub role: Role,

    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Argon2 PHC hash. Never serialized.
    #[serde(skip)]
    pub password_hash: Option<String>,

    /// Inactive users cannot sign in or refresh their credential.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Creates a new active user with a random id.
    #[must_use]
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.into(),
            name: None,
            role,
            image: None,
            password_hash: None,
            active: true,
        }
    }

    /// Sets the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the avatar URL.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Sets the password hash.
    #[must_use]
    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(hash.into());
        self
    }

    /// Sets the active flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// The identity a credential issued for this user carries.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            image: self.image.clone(),
        }
    }
}

// =============================================================================
// Storage Trait
// =============================================================================

/// Storage operations for users.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Find a user by id. Returns `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<User>>;

    /// Find a user by email (case-insensitive). Returns `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// List all users, ordered by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list(&self) -> AuthResult<Vec<User>>;

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns an error if a user with the same id or email exists, or if the
    /// storage operation fails.
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Change a user's role and return the updated record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if the user doesn't exist.
    async fn update_role(&self, user_id: &str, role: Role) -> AuthResult<User>;
}
