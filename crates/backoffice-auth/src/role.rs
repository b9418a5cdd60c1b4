//! Role hierarchy.
//!
//! Roles form a closed, totally ordered set:
//!
//! ```text
//! COLLABORATOR (1) < EMPLOYEE (2) < MANAGER (3) < ADMINISTRATOR (4)
//! ```
//!
//! A role satisfies a requirement when its rank is at least the required rank.
//! The string-level helpers accept arbitrary input: unknown role names rank 0
//! and satisfy nothing, not even themselves.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// A user role, ordered by increasing privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// External collaborator, lowest privilege.
    Collaborator,
    /// Regular employee.
    Employee,
    /// Department manager.
    Manager,
    /// Full administrative access.
    Administrator,
}

impl Role {
    /// All roles, lowest privilege first.
    pub const ALL: [Role; 4] = [
        Role::Collaborator,
        Role::Employee,
        Role::Manager,
        Role::Administrator,
    ];

    /// Numeric rank (1 = lowest).
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Collaborator => 1,
            Self::Employee => 2,
            Self::Manager => 3,
            Self::Administrator => 4,
        }
    }

    /// Wire name of the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Collaborator => "COLLABORATOR",
            Self::Employee => "EMPLOYEE",
            Self::Manager => "MANAGER",
            Self::Administrator => "ADMINISTRATOR",
        }
    }

    /// Returns `true` if this role grants at least the privileges of `required`.
    #[must_use]
    pub fn satisfies(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    /// Like [`Role::satisfies`], but fails with `InsufficientRole`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InsufficientRole` carrying both roles.
    pub fn require(self, required: Role) -> Result<(), AuthError> {
        if self.satisfies(required) {
            Ok(())
        } else {
            Err(AuthError::insufficient_role(self.as_str(), required))
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Rank of a role name; 0 for unknown names.
#[must_use]
pub fn rank(role: &str) -> u8 {
    role.parse::<Role>().map(Role::rank).unwrap_or(0)
}

/// Returns `true` iff both names are known roles and `actual` ranks at least
/// as high as `required`.
#[must_use]
pub fn satisfies(actual: &str, required: &str) -> bool {
    let actual = rank(actual);
    let required = rank(required);
    actual > 0 && required > 0 && actual >= required
}

/// Like [`satisfies`], but fails with `InsufficientRole` carrying both names.
///
/// # Errors
///
/// Returns `AuthError::InsufficientRole` when `actual` does not satisfy `required`.
pub fn require_role(actual: &str, required: &str) -> Result<(), AuthError> {
    if satisfies(actual, required) {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole {
            actual: actual.to_string(),
            required: required.to_string(),
        })
    }
}
