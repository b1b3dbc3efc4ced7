use async_trait::async_trait;
use std::sync::Arc;

use oauth2_core::{AccessRequest, AccessTokenSession, OAuth2Error, User};

/// Trait implemented by all persistence backends.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the backing store (e.g., bootstrap schema / create indexes).
    async fn init(&self) -> Result<(), OAuth2Error>;

    // User operations
    async fn save_user(&self, user: &User) -> Result<(), OAuth2Error>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, OAuth2Error>;

    // Access token session operations
    /// Persist the session for a freshly issued token. Duplicate signatures are rejected
    /// by the backend.
    async fn create_access_token_session(
        &self,
        signature: &str,
        request: &AccessRequest,
    ) -> Result<(), OAuth2Error>;
    async fn get_access_token_session(
        &self,
        signature: &str,
    ) -> Result<Option<AccessTokenSession>, OAuth2Error>;
    async fn delete_access_token_session(&self, signature: &str) -> Result<(), OAuth2Error>;

    /// Lightweight liveness/readiness check.
    ///
    /// Implementations may override to do something cheaper than `init()`.
    async fn healthcheck(&self) -> Result<(), OAuth2Error> {
        self.init().await
    }
}

pub type DynStorage = Arc<dyn Storage>;
