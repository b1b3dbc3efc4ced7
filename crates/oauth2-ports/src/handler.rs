use async_trait::async_trait;
use std::sync::Arc;

use oauth2_core::{AccessRequest, AccessResponse, OAuth2Error};

/// One grant type strategy at the token endpoint.
///
/// The endpoint calls every registered handler for both phases. A handler that does not
/// recognise the request's grant type must return `Ok(())` without touching the request or
/// the response.
#[async_trait]
pub trait TokenEndpointHandler: Send + Sync {
    /// RFC 6749 request validation. Handlers that accept the request mark its grant type
    /// handled.
    async fn validate_token_endpoint_request(
        &self,
        request: &mut AccessRequest,
    ) -> Result<(), OAuth2Error>;

    /// Token issuance. Always called after validation of the same request.
    async fn handle_token_endpoint_request(
        &self,
        request: &AccessRequest,
        response: &mut AccessResponse,
    ) -> Result<(), OAuth2Error>;
}

pub type DynTokenEndpointHandler = Arc<dyn TokenEndpointHandler>;
