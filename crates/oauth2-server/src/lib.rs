//! Server assembly: configuration, telemetry, storage and the HTTP listener.

use actix_web::{web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use oauth2_config::Config;
use oauth2_core::OAuth2Error;
use oauth2_grants::{
    HmacSha256Strategy, ResourceOwnerPasswordGrantHandler, TokenEndpoint, UserStoreAuthenticator,
};
use oauth2_observability::actix::MetricsMiddleware;
use oauth2_observability::{init_telemetry, shutdown_telemetry, Metrics, ObservedStorage};
use oauth2_ports::{DynStorage, Storage};
use oauth2_storage_sqlx::SqlxStorage;

const SERVICE_NAME: &str = "oauth2_ropc";

/// Connect to `database_url`, bootstrap the schema and wrap the result in tracing spans.
pub async fn build_storage(database_url: &str) -> Result<DynStorage, OAuth2Error> {
    let storage = SqlxStorage::new(database_url).await?;
    storage.init().await?;

    let db_system = storage.db_system().to_string();
    Ok(Arc::new(ObservedStorage::new(Arc::new(storage), db_system)))
}

/// Wire the password grant into a token endpoint using `config.token`.
pub fn build_token_endpoint(
    config: &Config,
    storage: DynStorage,
) -> Result<TokenEndpoint, OAuth2Error> {
    let strategy = Arc::new(HmacSha256Strategy::new(config.token.hmac_secret.as_bytes())?);
    let authenticator = Arc::new(UserStoreAuthenticator::new(storage.clone()));
    let password = ResourceOwnerPasswordGrantHandler::new(
        strategy,
        authenticator,
        storage,
        config.access_token_lifespan(),
    );

    Ok(TokenEndpoint::new(config.token.allowed_scopes.clone()).with_handler(Arc::new(password)))
}

fn to_io(e: impl std::fmt::Display) -> io::Error {
    io::Error::other(e.to_string())
}

pub async fn run() -> io::Result<()> {
    let config = Config::default();

    init_telemetry(SERVICE_NAME).map_err(to_io)?;

    let sanitized = serde_json::to_string(&config.sanitized()).map_err(to_io)?;
    tracing::info!(config = %sanitized, "configuration loaded");

    if let Err(e) = config.validate_for_production() {
        tracing::warn!("configuration is not production ready: {}", e);
    }

    let storage = build_storage(&config.database.url).await.map_err(to_io)?;
    let endpoint = build_token_endpoint(&config, storage.clone()).map_err(to_io)?;
    let metrics = Metrics::new().map_err(to_io)?;

    let bind = (config.server.host.clone(), config.server.port);
    tracing::info!(host = %bind.0, port = bind.1, "starting token endpoint");

    let storage = web::Data::new(storage);
    let endpoint = web::Data::new(endpoint);
    let metrics_data = web::Data::new(metrics.clone());

    let result = HttpServer::new(move || {
        App::new()
            .app_data(storage.clone())
            .app_data(endpoint.clone())
            .app_data(metrics_data.clone())
            .wrap(MetricsMiddleware::new(metrics.clone()))
            .wrap(TracingLogger::default())
            .configure(oauth2_actix::configure)
    })
    .bind(bind)?
    .run()
    .await;

    shutdown_telemetry();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use oauth2_config::{DatabaseConfig, ServerConfig, TokenConfig};

    fn config(secret: &str) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
            },
            token: TokenConfig {
                hmac_secret: secret.to_string(),
                access_token_lifespan_secs: 60,
                allowed_scopes: vec!["read".to_string()],
            },
        }
    }

    #[actix_rt::test]
    async fn endpoint_requires_a_strong_secret() {
        let storage = build_storage("sqlite::memory:").await.unwrap();

        assert!(build_token_endpoint(&config("short"), storage.clone()).is_err());

        let endpoint =
            build_token_endpoint(&config("0123456789abcdef0123456789abcdef"), storage).unwrap();
        assert_eq!(endpoint.handler_count(), 1);
    }
}
