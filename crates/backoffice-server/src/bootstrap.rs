//! Bootstrap module for seeding users from configuration.
//!
//! Runs once on startup. Users that already exist (by email) are left alone,
//! so restarting with the same configuration is idempotent.

use backoffice_auth::password::hash_password;
use backoffice_auth::{User, UserStorage};
use tracing::{info, warn};

use crate::config::BootstrapConfig;

/// Outcome of a bootstrap run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapStats {
    pub created: usize,
    pub skipped: usize,
}

/// Creates the configured users that don't exist yet.
///
/// # Errors
///
/// Returns an error if a password can't be resolved, hashing fails or a
/// storage operation fails.
pub async fn bootstrap_users(
    config: &BootstrapConfig,
    storage: &dyn UserStorage,
) -> anyhow::Result<BootstrapStats> {
    let mut stats = BootstrapStats::default();

    for entry in &config.users {
        if storage.find_by_email(&entry.email).await?.is_some() {
            info!(email = %entry.email, "Bootstrap user already exists, skipping");
            stats.skipped += 1;
            continue;
        }

        let password = entry.resolve_password().map_err(anyhow::Error::msg)?;
        let hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

        let mut user = User::new(entry.email.trim(), entry.role).with_password_hash(hash);
        if let Some(name) = &entry.name {
            user = user.with_name(name.clone());
        }
        if let Some(image) = &entry.image {
            user = user.with_image(image.clone());
        }

        storage.create(&user).await?;
        info!(user_id = %user.id, email = %user.email, role = %user.role, "Bootstrap user created");
        stats.created += 1;
    }

    if config.users.is_empty() {
        warn!("No bootstrap users configured; nobody will be able to sign in");
    }

    Ok(stats)
}
