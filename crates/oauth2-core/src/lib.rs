//! Framework-agnostic domain types for the OAuth2 token endpoint.
//!
//! Everything here is plain data plus pure helpers; I/O lives behind the traits in
//! `oauth2-ports`.

pub mod models;

pub use models::*;
