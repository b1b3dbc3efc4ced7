//! Actix-web HTTP surface for the token endpoint.
//!
//! Grant logic lives in `oauth2-grants`; this crate only decodes requests, maps errors
//! onto HTTP responses and exposes health and metrics routes.

pub mod handlers;

use actix_web::web;

/// Mount the token, health and metrics routes.
///
/// Callers provide `web::Data` for `TokenEndpoint`, `Metrics` and `DynStorage`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/oauth/token", web::post().to(handlers::token))
        .route("/health", web::get().to(handlers::health))
        .route("/metrics", web::get().to(handlers::metrics));
}
