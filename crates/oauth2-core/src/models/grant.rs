//! Grant type and token type identifiers from RFC 6749.

pub const GRANT_TYPE_PASSWORD: &str = "password";

/// Token type reported for every issued access token.
pub const TOKEN_TYPE_BEARER: &str = "bearer";
