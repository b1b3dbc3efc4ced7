//! Grant handlers for the OAuth2 token endpoint.
//!
//! - [`ResourceOwnerPasswordGrantHandler`] implements RFC 6749 §4.3.
//! - [`TokenEndpoint`] runs every registered handler through the validate and handle
//!   phases, letting each one claim the grant types it understands.
//! - [`HmacSha256Strategy`] mints opaque bearer tokens.
//! - [`UserStoreAuthenticator`] checks resource owner passwords against `Storage`.

pub mod credentials;
pub mod endpoint;
pub mod password;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

pub use credentials::UserStoreAuthenticator;
pub use endpoint::TokenEndpoint;
pub use password::ResourceOwnerPasswordGrantHandler;
pub use strategy::HmacSha256Strategy;
