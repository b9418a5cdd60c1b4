//! Role-gated user directory and cache administration.
//!
//! | Method | Path | Minimum role |
//! |--------|------|--------------|
//! | GET | `/api/users` | MANAGER |
//! | GET | `/api/users/{id}` | EMPLOYEE |
//! | PUT | `/api/users/{id}/role` | ADMINISTRATOR |
//! | DELETE | `/api/cache` | ADMINISTRATOR |

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use backoffice_auth::{
    Administrator, AuthError, AuthResult, Employee, Manager, RequireRole, Role, User, UserStorage,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::Cache;
use crate::config::CacheConfig;

pub const USERS_LIST_KEY: &str = "users:list";

/// Single-user entries live under `users:id:` so no id can collide with the list.
pub fn user_key(id: &str) -> String {
    format!("users:id:{id}")
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheClearResponse {
    pub cleared: bool,
}

/// GET /api/users
pub async fn list_users(
    RequireRole(_caller, _): RequireRole<Manager>,
    State(users): State<Arc<dyn UserStorage>>,
    State(cache): State<Cache>,
    State(ttl): State<CacheConfig>,
) -> AuthResult<Json<Vec<User>>> {
    let list = cache
        .get_or_load(USERS_LIST_KEY, ttl.users_ttl_secs, || users.list())
        .await?;
    Ok(Json(list))
}

/// GET /api/users/{id}
pub async fn get_user(
    RequireRole(_caller, _): RequireRole<Employee>,
    Path(id): Path<String>,
    State(users): State<Arc<dyn UserStorage>>,
    State(cache): State<Cache>,
    State(ttl): State<CacheConfig>,
) -> AuthResult<Json<User>> {
    let user = cache
        .get_or_load(&user_key(&id), ttl.users_ttl_secs, || async {
            users
                .find_by_id(&id)
                .await?
                .ok_or_else(|| AuthError::not_found(format!("user '{id}' not found")))
        })
        .await?;
    Ok(Json(user))
}

/// PUT /api/users/{id}/role
///
/// The affected user's existing credential keeps the old role until it is
/// refreshed or expires.
pub async fn update_user_role(
    RequireRole(caller, _): RequireRole<Administrator>,
    Path(id): Path<String>,
    State(users): State<Arc<dyn UserStorage>>,
    State(cache): State<Cache>,
    Json(request): Json<UpdateRoleRequest>,
) -> AuthResult<Json<User>> {
    let role: Role = request
        .role
        .parse()
        .map_err(|e: backoffice_auth::UnknownRole| AuthError::invalid_request(e.to_string()))?;

    let user = users.update_role(&id, role).await?;

    cache.delete(USERS_LIST_KEY).await;
    cache.delete(&user_key(&id)).await;

    info!(
        user_id = %user.id,
        role = %user.role,
        changed_by = %caller.id,
        "User role updated"
    );
    Ok(Json(user))
}

/// DELETE /api/cache
pub async fn clear_cache(
    RequireRole(caller, _): RequireRole<Administrator>,
    State(cache): State<Cache>,
) -> Json<CacheClearResponse> {
    let cleared = cache.clear_all().await;
    info!(user_id = %caller.id, cleared, backend = cache.backend(), "Cache cleared");
    Json(CacheClearResponse { cleared })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_keys_never_alias_the_list() {
        assert_eq!(user_key("42"), "users:id:42");
        assert_ne!(user_key("list"), USERS_LIST_KEY);
    }

    #[tokio::test]
    async fn test_cached_list_is_not_read_as_a_user() {
        let cache = Cache::memory();
        let list = vec![User::new("a@example.com", Role::Employee)];
        assert!(cache.set(USERS_LIST_KEY, &list, 60).await);

        assert!(cache.get::<User>(&user_key("list")).await.is_none());
        assert_eq!(cache.get::<Vec<User>>(USERS_LIST_KEY).await.map(|l| l.len()), Some(1));
    }
}
