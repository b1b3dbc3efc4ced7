use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A token endpoint response under construction (RFC 6749 §5.1).
///
/// Handlers populate it incrementally. Extra fields keep insertion order so the
/// serialized body is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(flatten)]
    extra: IndexMap<String, Value>,
}

impl AccessResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn set_token_type(&mut self, token_type: impl Into<String>) {
        self.token_type = token_type.into();
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.insert(key.into(), value.into());
    }

    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn extras(&self) -> &IndexMap<String, Value> {
        &self.extra
    }

    pub fn is_populated(&self) -> bool {
        !self.access_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_to_rfc6749_body_with_extras_in_order() {
        let mut resp = AccessResponse::new();
        resp.set_access_token("abc.def");
        resp.set_token_type("bearer");
        resp.set_extra("expires_in", 3600);
        resp.set_extra("scope", "read write");

        let body = serde_json::to_string(&resp).unwrap();
        assert_eq!(
            body,
            r#"{"access_token":"abc.def","token_type":"bearer","expires_in":3600,"scope":"read write"}"#
        );
    }

    #[test]
    fn empty_response_is_not_populated() {
        let resp = AccessResponse::new();
        assert!(!resp.is_populated());
        assert_eq!(resp.extra("scope"), None);

        let parsed: AccessResponse =
            serde_json::from_value(json!({"access_token": "t", "token_type": "bearer"})).unwrap();
        assert!(parsed.is_populated());
    }
}
