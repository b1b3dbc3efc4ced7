use async_trait::async_trait;
use std::sync::Arc;

/// Outcome of a failed credential check.
///
/// `NotFound` is the expected answer for an unknown user or a wrong password and must not
/// be used for infrastructure failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("resource owner credentials not found")]
    NotFound,
    #[error("credential backend failure: {0}")]
    Backend(String),
}

/// Verifies resource owner credentials.
#[async_trait]
pub trait CredentialAuthenticator: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> Result<(), CredentialError>;
}

pub type DynCredentialAuthenticator = Arc<dyn CredentialAuthenticator>;
