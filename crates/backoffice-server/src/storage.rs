//! In-memory user storage.

use async_trait::async_trait;
use backoffice_auth::{AuthError, AuthResult, Role, User, UserStorage};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// [`UserStorage`] over a concurrent map keyed by lower-cased email.
///
/// Email uniqueness is enforced atomically by the map's entry API; lookups by
/// id scan, which is fine at back-office scale.
#[derive(Debug, Default)]
pub struct InMemoryUserStorage {
    users: DashMap<String, User>,
}

impl InMemoryUserStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn email_key(email: &str) -> String {
        email.trim().to_lowercase()
    }

    fn key_for_id(&self, user_id: &str) -> Option<String> {
        self.users
            .iter()
            .find(|entry| entry.value().id == user_id)
            .map(|entry| entry.key().clone())
    }
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().id == user_id)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .get(&Self::email_key(email))
            .map(|entry| entry.value().clone()))
    }

    async fn list(&self) -> AuthResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by(|a, b| a.email.to_lowercase().cmp(&b.email.to_lowercase()));
        Ok(users)
    }

    async fn create(&self, user: &User) -> AuthResult<()> {
        if self.key_for_id(&user.id).is_some() {
            return Err(AuthError::invalid_request(format!(
                "user with id '{}' already exists",
                user.id
            )));
        }
        match self.users.entry(Self::email_key(&user.email)) {
            Entry::Occupied(_) => Err(AuthError::invalid_request(format!(
                "user with email '{}' already exists",
                user.email
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(())
            }
        }
    }

    async fn update_role(&self, user_id: &str, role: Role) -> AuthResult<User> {
        let key = self
            .key_for_id(user_id)
            .ok_or_else(|| AuthError::not_found(format!("user '{user_id}' not found")))?;
        let mut entry = self
            .users
            .get_mut(&key)
            .ok_or_else(|| AuthError::not_found(format!("user '{user_id}' not found")))?;
        entry.role = role;
        Ok(entry.clone())
    }
}
