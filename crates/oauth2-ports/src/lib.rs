//! Integration ports for the token endpoint.
//!
//! Implement these traits in your own crate to plug in custom persistence, credential
//! backends or token formats without forking.

pub mod credentials;
pub mod handler;
pub mod storage;
pub mod strategy;

pub use credentials::*;
pub use handler::*;
pub use storage::*;
pub use strategy::*;
