use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(feature = "actix")]
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

pub const INVALID_REQUEST: &str = "invalid_request";
pub const INVALID_CLIENT: &str = "invalid_client";
pub const INVALID_SCOPE: &str = "invalid_scope";
pub const UNSUPPORTED_GRANT_TYPE: &str = "unsupported_grant_type";
pub const SERVER_ERROR: &str = "server_error";

/// RFC 6749 §5.2 error body.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OAuth2Error {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
}

impl OAuth2Error {
    pub fn new(error: &str, description: Option<&str>) -> Self {
        Self {
            error: error.to_string(),
            error_description: description.map(|s| s.to_string()),
            error_uri: None,
        }
    }

    pub fn invalid_request(description: &str) -> Self {
        Self::new(INVALID_REQUEST, Some(description))
    }

    pub fn invalid_client(description: &str) -> Self {
        Self::new(INVALID_CLIENT, Some(description))
    }

    pub fn unsupported_grant_type(description: &str) -> Self {
        Self::new(UNSUPPORTED_GRANT_TYPE, Some(description))
    }

    pub fn invalid_scope(description: &str) -> Self {
        Self::new(INVALID_SCOPE, Some(description))
    }

    pub fn server_error(description: &str) -> Self {
        Self::new(SERVER_ERROR, Some(description))
    }

    /// True when this error carries the given RFC 6749 error code.
    pub fn is(&self, code: &str) -> bool {
        self.error == code
    }
}

impl fmt::Display for OAuth2Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_description {
            Some(description) => write!(f, "{}: {}", self.error, description),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuth2Error {}

#[cfg(feature = "actix")]
impl ResponseError for OAuth2Error {
    fn status_code(&self) -> StatusCode {
        match self.error.as_str() {
            INVALID_CLIENT => StatusCode::UNAUTHORIZED,
            SERVER_ERROR => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header((actix_web::http::header::CACHE_CONTROL, "no-store"))
            .json(self)
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for OAuth2Error {
    fn from(err: sqlx::Error) -> Self {
        // Provide a stable, non-leaky mapping for common constraint violations.
        if let sqlx::Error::Database(db_err) = &err {
            let code = db_err.code().unwrap_or_default();
            let msg = db_err.message();

            // Postgres unique violation: 23505
            // SQLite constraint error codes vary by extended code; also match by message.
            let is_unique = code == "23505"
                || code == "2067"
                || code == "1555"
                || msg.contains("UNIQUE constraint failed")
                || msg.contains("duplicate key");

            if is_unique {
                return Self::invalid_request("duplicate key");
            }
        }

        Self::server_error(&err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_without_empty_optionals() {
        let err = OAuth2Error::new(SERVER_ERROR, None);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "server_error" }));
    }

    #[test]
    fn is_matches_error_code() {
        let err = OAuth2Error::invalid_request("nope");
        assert!(err.is(INVALID_REQUEST));
        assert!(!err.is(SERVER_ERROR));
        assert_eq!(err.to_string(), "invalid_request: nope");
    }

    #[cfg(feature = "actix")]
    #[test]
    fn status_codes_follow_the_error_code() {
        assert_eq!(
            OAuth2Error::invalid_client("who?").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            OAuth2Error::server_error("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            OAuth2Error::invalid_scope("admin").status_code(),
            StatusCode::BAD_REQUEST
        );

        let resp = OAuth2Error::invalid_request("nope").error_response();
        assert_eq!(
            resp.headers()
                .get(actix_web::http::header::CACHE_CONTROL)
                .unwrap(),
            "no-store"
        );
    }
}
