use thiserror::Error;
use tracing::info;

use crate::auth::{hash_password, PasswordError};
use crate::config::BootstrapConfig;
use crate::database::models::{NewUser, Role, User};
use crate::database::{Store, StoreError};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("store error while seeding administrator: {0}")]
    Store(#[from] StoreError),

    #[error("could not hash administrator password: {0}")]
    Password(#[from] PasswordError),
}

/// Create the seed administrator when no ADMIN exists yet.
///
/// Returns the created user, or `None` when an administrator was already present.
/// Running it repeatedly is safe.
pub async fn ensure_default_admin(store: &dyn Store, seed: &BootstrapConfig) -> Result<Option<User>, BootstrapError> {
    if store.admin_exists().await? {
        info!("Administrator already present, skipping seed");
        return Ok(None);
    }

    let password = hash_password(seed.admin_password.clone()).await?;
    let admin = store
        .insert_user(NewUser {
            name: seed.admin_name.clone(),
            surname: seed.admin_surname.clone(),
            username: seed.admin_username.clone(),
            email: seed.admin_email.clone(),
            password,
            phone: None,
            role: Role::Admin,
        })
        .await?;

    info!("Seeded administrator '{}' ({})", admin.username, admin.id);
    Ok(Some(admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    #[tokio::test]
    async fn seeds_once() {
        let store = MemoryStore::new();
        let seed = BootstrapConfig::default();

        let first = ensure_default_admin(&store, &seed).await.unwrap().unwrap();
        assert_eq!(first.username, "admin123");
        assert_eq!(first.role, Role::Admin);
        assert_ne!(first.password, "admin123");

        assert!(ensure_default_admin(&store, &seed).await.unwrap().is_none());
    }
}
