use async_trait::async_trait;
use std::time::Duration;
use tracing::Instrument;

use oauth2_core::{
    join_scopes, AccessRequest, AccessResponse, OAuth2Error, GRANT_TYPE_PASSWORD,
    TOKEN_TYPE_BEARER,
};
use oauth2_observability::annotate_span_with_trace_ids;
use oauth2_ports::{
    CredentialError, DynAccessTokenStrategy, DynCredentialAuthenticator, DynStorage,
    GeneratedToken, TokenEndpointHandler,
};

// Missing fields, unknown users and wrong passwords share one message.
const INVALID_CREDENTIALS: &str =
    "The request is missing resource owner credentials or the credentials are invalid";
const SERVER_FAILURE: &str =
    "The authorization server encountered an unexpected condition while issuing the token";

fn invalid_credentials() -> OAuth2Error {
    OAuth2Error::invalid_request(INVALID_CREDENTIALS)
}

fn server_failure() -> OAuth2Error {
    OAuth2Error::server_error(SERVER_FAILURE)
}

/// Resource Owner Password Credentials grant (RFC 6749 §4.3).
///
/// Holds only shared, read-only collaborators, so one instance serves every request.
pub struct ResourceOwnerPasswordGrantHandler {
    access_token_strategy: DynAccessTokenStrategy,
    authenticator: DynCredentialAuthenticator,
    store: DynStorage,
    access_token_lifespan: Duration,
}

impl ResourceOwnerPasswordGrantHandler {
    pub fn new(
        access_token_strategy: DynAccessTokenStrategy,
        authenticator: DynCredentialAuthenticator,
        store: DynStorage,
        access_token_lifespan: Duration,
    ) -> Self {
        Self {
            access_token_strategy,
            authenticator,
            store,
            access_token_lifespan,
        }
    }

    pub fn access_token_lifespan(&self) -> Duration {
        self.access_token_lifespan
    }
}

#[async_trait]
impl TokenEndpointHandler for ResourceOwnerPasswordGrantHandler {
    /// RFC 6749 §4.3.2
    async fn validate_token_endpoint_request(
        &self,
        request: &mut AccessRequest,
    ) -> Result<(), OAuth2Error> {
        // grant_type REQUIRED. Value MUST be set to "password".
        if request.grant_type() != GRANT_TYPE_PASSWORD {
            tracing::debug!(grant_type = %request.grant_type(), "not a password grant, skipping");
            return Ok(());
        }

        let span = tracing::info_span!(
            "grant.password.validate",
            trace_id = tracing::field::Empty,
            span_id = tracing::field::Empty,
            client_id = %request.client_id,
            request_id = %request.id
        );
        annotate_span_with_trace_ids(&span);

        async move {
            let username = request.form_value("username");
            let password = request.form_value("password");
            if username.is_empty() || password.is_empty() {
                tracing::warn!("password grant rejected: missing username or password");
                return Err(invalid_credentials());
            }

            match self.authenticator.authenticate(username, password).await {
                Ok(()) => {
                    tracing::info!(username = %username, "resource owner authenticated");
                }
                Err(CredentialError::NotFound) => {
                    tracing::warn!(
                        username = %username,
                        "password grant rejected: invalid credentials"
                    );
                    return Err(invalid_credentials());
                }
                Err(CredentialError::Backend(reason)) => {
                    tracing::error!(error = %reason, "credential backend failed");
                    return Err(server_failure());
                }
            }

            // The raw password must not travel any further, in particular not into storage.
            request.remove_form_value("password");
            request.set_grant_type_handled(GRANT_TYPE_PASSWORD);
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// RFC 6749 §4.3.3
    async fn handle_token_endpoint_request(
        &self,
        request: &AccessRequest,
        response: &mut AccessResponse,
    ) -> Result<(), OAuth2Error> {
        if request.grant_type() != GRANT_TYPE_PASSWORD {
            return Ok(());
        }

        let span = tracing::info_span!(
            "grant.password.handle",
            trace_id = tracing::field::Empty,
            span_id = tracing::field::Empty,
            client_id = %request.client_id,
            request_id = %request.id
        );
        annotate_span_with_trace_ids(&span);

        async move {
            let GeneratedToken { token, signature } = self
                .access_token_strategy
                .generate_access_token(request)
                .await
                .map_err(|err| {
                    tracing::error!(error = %err, "access token generation failed");
                    server_failure()
                })?;

            let signature_prefix = signature.chars().take(12).collect::<String>();
            self.store
                .create_access_token_session(&signature, request)
                .await
                .map_err(|err| {
                    tracing::error!(
                        error = %err,
                        signature_prefix = %signature_prefix,
                        "persisting access token session failed"
                    );
                    server_failure()
                })?;

            response.set_access_token(token);
            response.set_token_type(TOKEN_TYPE_BEARER);
            response.set_extra("expires_in", self.access_token_lifespan.as_secs());
            response.set_extra("scope", join_scopes(request.granted_scopes()));

            // No refresh token for this grant (RFC 6819 §5.2.2.1, §4.4.3.3).

            tracing::info!(
                signature_prefix = %signature_prefix,
                expires_in = self.access_token_lifespan.as_secs(),
                "access token issued"
            );
            Ok(())
        }
        .instrument(span)
        .await
    }
}
