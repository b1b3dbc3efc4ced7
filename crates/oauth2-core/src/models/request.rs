use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A token endpoint request, tagged with the grant type the client declared.
///
/// One flow owns the request: grant handlers validate it through `&mut` (which lets them
/// scrub credentials and claim the grant) and read it through `&` when issuing tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRequest {
    pub id: String,
    pub requested_at: DateTime<Utc>,
    pub client_id: String,
    grant_type: String,
    form: BTreeMap<String, String>,
    requested_scopes: Vec<String>,
    granted_scopes: Vec<String>,
    handled_grant_types: Vec<String>,
}

impl AccessRequest {
    pub fn new(
        client_id: impl Into<String>,
        grant_type: impl Into<String>,
        form: BTreeMap<String, String>,
    ) -> Self {
        let requested_scopes = form
            .get("scope")
            .map(|raw| crate::parse_scopes(raw))
            .unwrap_or_default();

        Self {
            id: Uuid::new_v4().to_string(),
            requested_at: Utc::now(),
            client_id: client_id.into(),
            grant_type: grant_type.into(),
            form,
            requested_scopes,
            granted_scopes: Vec::new(),
            handled_grant_types: Vec::new(),
        }
    }

    pub fn grant_type(&self) -> &str {
        &self.grant_type
    }

    pub fn form(&self) -> &BTreeMap<String, String> {
        &self.form
    }

    /// Value of a form parameter, or `""` when it is absent.
    pub fn form_value(&self, key: &str) -> &str {
        self.form.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn remove_form_value(&mut self, key: &str) -> Option<String> {
        self.form.remove(key)
    }

    pub fn set_grant_type_handled(&mut self, grant_type: &str) {
        if !self.is_grant_type_handled(grant_type) {
            self.handled_grant_types.push(grant_type.to_string());
        }
    }

    pub fn is_grant_type_handled(&self, grant_type: &str) -> bool {
        self.handled_grant_types.iter().any(|g| g == grant_type)
    }

    pub fn handled_grant_types(&self) -> &[String] {
        &self.handled_grant_types
    }

    pub fn requested_scopes(&self) -> &[String] {
        &self.requested_scopes
    }

    pub fn grant_scope(&mut self, scope: &str) {
        if !self.granted_scopes.iter().any(|s| s == scope) {
            self.granted_scopes.push(scope.to_string());
        }
    }

    pub fn granted_scopes(&self) -> &[String] {
        &self.granted_scopes
    }
}
