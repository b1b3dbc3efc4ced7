use async_trait::async_trait;

use oauth2_core::verify_password;
use oauth2_ports::{CredentialAuthenticator, CredentialError, DynStorage};

/// Checks resource owner passwords against the Argon2 hashes held in `Storage`.
///
/// Unknown, disabled and mismatching users all report `NotFound`.
pub struct UserStoreAuthenticator {
    storage: DynStorage,
}

impl UserStoreAuthenticator {
    pub fn new(storage: DynStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl CredentialAuthenticator for UserStoreAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> Result<(), CredentialError> {
        let user = self
            .storage
            .get_user_by_username(username)
            .await
            .map_err(|e| CredentialError::Backend(e.to_string()))?
            .ok_or(CredentialError::NotFound)?;

        if !user.enabled {
            tracing::debug!(user_id = %user.id, "resource owner is disabled");
            return Err(CredentialError::NotFound);
        }

        match verify_password(password, &user.password_hash) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CredentialError::NotFound),
            Err(e) => Err(CredentialError::Backend(format!(
                "stored password hash for user {} is unreadable: {e}",
                user.id
            ))),
        }
    }
}
