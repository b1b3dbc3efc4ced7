use std::collections::BTreeMap;
use tracing::Instrument;

use oauth2_core::{AccessRequest, AccessResponse, OAuth2Error};
use oauth2_observability::annotate_span_with_trace_ids;
use oauth2_ports::DynTokenEndpointHandler;

/// Token endpoint pipeline.
///
/// Every registered handler sees every request in both phases; handlers ignore grant
/// types they do not own, so adding a grant type means registering one more handler.
#[derive(Clone)]
pub struct TokenEndpoint {
    handlers: Vec<DynTokenEndpointHandler>,
    allowed_scopes: Vec<String>,
}

impl TokenEndpoint {
    pub fn new(allowed_scopes: Vec<String>) -> Self {
        Self {
            handlers: Vec::new(),
            allowed_scopes,
        }
    }

    pub fn with_handler(mut self, handler: DynTokenEndpointHandler) -> Self {
        self.register(handler);
        self
    }

    pub fn register(&mut self, handler: DynTokenEndpointHandler) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Build an access request from the posted form and run the validation phase.
    pub async fn new_access_request(
        &self,
        client_id: &str,
        form: BTreeMap<String, String>,
    ) -> Result<AccessRequest, OAuth2Error> {
        // Taken verbatim: handlers match the exact value.
        let grant_type = form.get("grant_type").cloned().unwrap_or_default();
        if grant_type.is_empty() {
            return Err(OAuth2Error::invalid_request("Missing grant_type"));
        }

        let span = tracing::info_span!(
            "token_endpoint.validate",
            trace_id = tracing::field::Empty,
            span_id = tracing::field::Empty,
            client_id = %client_id,
            grant_type = %grant_type
        );
        annotate_span_with_trace_ids(&span);

        async move {
            let mut request = AccessRequest::new(client_id, grant_type.clone(), form);
            self.grant_scopes(&mut request)?;

            for handler in &self.handlers {
                handler.validate_token_endpoint_request(&mut request).await?;
            }

            if !request.is_grant_type_handled(&grant_type) {
                tracing::warn!("no handler accepted the grant type");
                return Err(OAuth2Error::unsupported_grant_type(&format!(
                    "Grant type '{grant_type}' not supported"
                )));
            }

            Ok(request)
        }
        .instrument(span)
        .await
    }

    /// Run the issuance phase for a validated request.
    pub async fn new_access_response(
        &self,
        request: &AccessRequest,
    ) -> Result<AccessResponse, OAuth2Error> {
        let span = tracing::info_span!(
            "token_endpoint.handle",
            trace_id = tracing::field::Empty,
            span_id = tracing::field::Empty,
            client_id = %request.client_id,
            grant_type = %request.grant_type(),
            request_id = %request.id
        );
        annotate_span_with_trace_ids(&span);

        async move {
            let mut response = AccessResponse::new();
            for handler in &self.handlers {
                handler
                    .handle_token_endpoint_request(request, &mut response)
                    .await?;
            }

            if !response.is_populated() {
                tracing::error!("handlers completed without issuing an access token");
                return Err(OAuth2Error::server_error(
                    "An access token was not issued for this request",
                ));
            }

            Ok(response)
        }
        .instrument(span)
        .await
    }

    fn grant_scopes(&self, request: &mut AccessRequest) -> Result<(), OAuth2Error> {
        let requested = request.requested_scopes().to_vec();
        for scope in &requested {
            if !self.allowed_scopes.contains(scope) {
                return Err(OAuth2Error::invalid_scope(&format!(
                    "Scope '{scope}' is not allowed"
                )));
            }
            request.grant_scope(scope);
        }
        Ok(())
    }
}
