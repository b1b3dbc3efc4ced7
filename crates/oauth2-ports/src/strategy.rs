use async_trait::async_trait;
use std::sync::Arc;

use oauth2_core::{AccessRequest, OAuth2Error};

/// A freshly minted access token and the opaque signature used as its storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedToken {
    pub token: String,
    pub signature: String,
}

/// Produces access tokens. The signature must be derivable from the token but must not
/// reveal it.
#[async_trait]
pub trait AccessTokenStrategy: Send + Sync {
    async fn generate_access_token(
        &self,
        request: &AccessRequest,
    ) -> Result<GeneratedToken, OAuth2Error>;

    /// Recover the signature of a token previously issued by this strategy.
    ///
    /// Returns `None` for malformed or forged tokens.
    fn signature(&self, token: &str) -> Option<String>;
}

pub type DynAccessTokenStrategy = Arc<dyn AccessTokenStrategy>;
