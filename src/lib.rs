//! Library exports.
//!
//! The workspace crates carry the implementation; this facade keeps a single import
//! path for the binaries and integration tests.

pub use oauth2_actix as http;
pub use oauth2_config as config;
pub use oauth2_core as domain;
pub use oauth2_grants as grants;
pub use oauth2_observability as observability;
pub use oauth2_ports as ports;
pub use oauth2_server as server;
pub use oauth2_storage_sqlx as storage;
