use async_trait::async_trait;
use tracing::{field, Instrument};

use oauth2_core::{AccessRequest, AccessTokenSession, OAuth2Error, User};
use oauth2_ports::{DynStorage, Storage};

use crate::telemetry::annotate_span_with_trace_ids;

/// A thin wrapper around a `DynStorage` that creates a tracing span for each storage call.
///
/// This lets request spans extend naturally through the grant handlers down into
/// persistence calls.
pub struct ObservedStorage {
    inner: DynStorage,
    db_system: String,
}

impl ObservedStorage {
    pub fn new(inner: DynStorage, db_system: String) -> Self {
        Self { inner, db_system }
    }

    fn span(&self, operation: &'static str) -> tracing::Span {
        let span = tracing::info_span!(
            "db",
            trace_id = field::Empty,
            span_id = field::Empty,
            db_system = %self.db_system,
            db_operation = operation
        );
        annotate_span_with_trace_ids(&span);
        span
    }

    fn signature_span(&self, operation: &'static str, signature: &str) -> tracing::Span {
        // Never log full signatures.
        let signature_prefix = signature.chars().take(12).collect::<String>();
        let span = tracing::info_span!(
            "db",
            trace_id = field::Empty,
            span_id = field::Empty,
            db_system = %self.db_system,
            db_operation = operation,
            signature_prefix = %signature_prefix
        );
        annotate_span_with_trace_ids(&span);
        span
    }
}

#[async_trait]
impl Storage for ObservedStorage {
    async fn init(&self) -> Result<(), OAuth2Error> {
        let span = self.span("init");
        async move { self.inner.init().await }
            .instrument(span)
            .await
    }

    async fn healthcheck(&self) -> Result<(), OAuth2Error> {
        let span = self.span("healthcheck");
        async move { self.inner.healthcheck().await }
            .instrument(span)
            .await
    }

    async fn save_user(&self, user: &User) -> Result<(), OAuth2Error> {
        let span = tracing::info_span!(
            "db",
            trace_id = field::Empty,
            span_id = field::Empty,
            db_system = %self.db_system,
            db_operation = "save_user",
            user_id = %user.id,
            username = %user.username
        );
        annotate_span_with_trace_ids(&span);
        async move { self.inner.save_user(user).await }
            .instrument(span)
            .await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, OAuth2Error> {
        let span = tracing::info_span!(
            "db",
            trace_id = field::Empty,
            span_id = field::Empty,
            db_system = %self.db_system,
            db_operation = "get_user_by_username",
            username = %username
        );
        annotate_span_with_trace_ids(&span);
        async move { self.inner.get_user_by_username(username).await }
            .instrument(span)
            .await
    }

    async fn create_access_token_session(
        &self,
        signature: &str,
        request: &AccessRequest,
    ) -> Result<(), OAuth2Error> {
        let span = self.signature_span("create_access_token_session", signature);
        span.in_scope(|| {
            tracing::debug!(
                client_id = %request.client_id,
                request_id = %request.id,
                "persisting access token session"
            )
        });
        async move {
            self.inner
                .create_access_token_session(signature, request)
                .await
        }
        .instrument(span)
        .await
    }

    async fn get_access_token_session(
        &self,
        signature: &str,
    ) -> Result<Option<AccessTokenSession>, OAuth2Error> {
        let span = self.signature_span("get_access_token_session", signature);
        async move { self.inner.get_access_token_session(signature).await }
            .instrument(span)
            .await
    }

    async fn delete_access_token_session(&self, signature: &str) -> Result<(), OAuth2Error> {
        let span = self.signature_span("delete_access_token_session", signature);
        async move { self.inner.delete_access_token_session(signature).await }
            .instrument(span)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingStorage {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingStorage {
        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }
    }

    #[async_trait]
    impl Storage for RecordingStorage {
        async fn init(&self) -> Result<(), OAuth2Error> {
            self.record("init");
            Ok(())
        }

        async fn save_user(&self, _user: &User) -> Result<(), OAuth2Error> {
            self.record("save_user");
            Ok(())
        }

        async fn get_user_by_username(&self, _username: &str) -> Result<Option<User>, OAuth2Error> {
            self.record("get_user_by_username");
            Ok(None)
        }

        async fn create_access_token_session(
            &self,
            signature: &str,
            _request: &AccessRequest,
        ) -> Result<(), OAuth2Error> {
            self.record(&format!("create:{signature}"));
            Err(OAuth2Error::invalid_request("duplicate key"))
        }

        async fn get_access_token_session(
            &self,
            _signature: &str,
        ) -> Result<Option<AccessTokenSession>, OAuth2Error> {
            self.record("get");
            Ok(None)
        }

        async fn delete_access_token_session(&self, _signature: &str) -> Result<(), OAuth2Error> {
            self.record("delete");
            Ok(())
        }
    }

    #[tokio::test]
    async fn delegates_every_call_and_passes_errors_through() {
        let inner = Arc::new(RecordingStorage::default());
        let observed = ObservedStorage::new(inner.clone(), "memory".to_string());
        let request = AccessRequest::new("client", "password", BTreeMap::new());

        observed.healthcheck().await.unwrap();
        assert!(observed.get_user_by_username("alice").await.unwrap().is_none());
        let err = observed
            .create_access_token_session("sig-1", &request)
            .await
            .unwrap_err();
        assert_eq!(err, OAuth2Error::invalid_request("duplicate key"));
        observed.delete_access_token_session("sig-1").await.unwrap();

        assert_eq!(
            *inner.calls.lock().unwrap(),
            vec!["init", "get_user_by_username", "create:sig-1", "delete"]
        );
    }
}
