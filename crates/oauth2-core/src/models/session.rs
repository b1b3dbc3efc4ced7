use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::AccessRequest;

/// Form parameters that are never copied into persisted state.
const SENSITIVE_FORM_KEYS: [&str; 2] = ["password", "client_secret"];

/// Durable record binding an access token signature to the request that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenSession {
    pub signature: String,
    pub request_id: String,
    pub client_id: String,
    pub grant_type: String,
    pub granted_scopes: Vec<String>,
    pub form: BTreeMap<String, String>,
    pub requested_at: DateTime<Utc>,
}

impl AccessTokenSession {
    pub fn from_request(signature: impl Into<String>, request: &AccessRequest) -> Self {
        let form = request
            .form()
            .iter()
            .filter(|(k, _)| !SENSITIVE_FORM_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            signature: signature.into(),
            request_id: request.id.clone(),
            client_id: request.client_id.clone(),
            grant_type: request.grant_type().to_string(),
            granted_scopes: request.granted_scopes().to_vec(),
            form,
            requested_at: request.requested_at,
        }
    }
}
