//! The decoded, trusted caller identity.

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// A user identity decoded from a verified credential.
///
/// Trusted for the duration of one request. Never persisted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Opaque user identifier.
    pub id: String,

    /// Unique email address.
    pub email: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Role at the time the credential was issued.
    pub role: Role,

    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Identity {
    /// Creates an identity without name or image.
    #[must_use]
    pub fn new(id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: None,
            role,
            image: None,
        }
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

    /// Returns `true` if this identity's role satisfies `required`.
    #[must_use]
    pub fn has_role(&self, required: Role) -> bool {
        self.role.satisfies(required)
    }
}
